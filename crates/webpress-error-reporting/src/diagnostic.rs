//! Core diagnostic types.
//!
//! This module defines the record shape used across the pipeline for user
//! facing problems, and the bag that collects and deduplicates them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// A fatal problem; no output is produced for the affected stylesheet.
    Error,
    /// A problem worth reporting that does not prevent output.
    Warning,
    /// Informational message.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single diagnostic record.
///
/// The location fields are optional: parse errors carry a file and a line,
/// while policy violations usually carry only a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How bad it is.
    pub severity: Severity,

    /// Human-readable description of the problem.
    pub message: String,

    /// The stylesheet (or asset) the diagnostic applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// One-based source line, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file_path: None,
            line: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Attach a file path.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Attach a one-based source line.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Whether this diagnostic prevents output for its stylesheet.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(path) = &self.file_path {
            write!(f, " ({}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics.
///
/// Insertion order is preserved; [`DiagnosticBag::dedup`] removes exact
/// repeats (same severity, message and location), keeping the first
/// occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Add many diagnostics.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    /// Remove exact duplicates, keeping the first occurrence of each
    /// (severity, message, file, line) combination.
    pub fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.items.retain(|d| {
            let key = (
                d.severity,
                d.message.clone(),
                d.file_path.clone(),
                d.line,
            );
            seen.insert(key)
        });
    }

    /// Whether any fatal diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_fatal)
    }

    /// Iterate over the recorded diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over the fatal diagnostics only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_fatal())
    }

    /// Iterate over the warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the bag, returning the diagnostics in insertion order.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let d = Diagnostic::error("unexpected token")
            .with_file("/site/a.css")
            .with_line(12);
        assert_eq!(d.to_string(), "error: unexpected token (/site/a.css:12)");
    }

    #[test]
    fn test_dedup_by_message_and_location() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::error("bad selector").with_file("/a.css").with_line(3));
        bag.push(Diagnostic::error("bad selector").with_file("/a.css").with_line(3));
        bag.push(Diagnostic::error("bad selector").with_file("/a.css").with_line(9));
        bag.push(Diagnostic::warning("bad selector").with_file("/a.css").with_line(3));
        bag.dedup();

        // Same message at a different line or severity is not a duplicate.
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning("w"));
        bag.push(Diagnostic::error("e"));
        bag.push(Diagnostic::warning("w"));
        bag.dedup();

        let items = bag.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].severity, Severity::Warning);
        assert_eq!(items[1].severity, Severity::Error);
    }

    #[test]
    fn test_has_errors() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning("only a warning"));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::error("fatal"));
        assert!(bag.has_errors());
        assert_eq!(bag.errors().count(), 1);
        assert_eq!(bag.warnings().count(), 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let d = Diagnostic::warning("hack selector").with_file("/a.css");
        let json = serde_json::to_value(&d).expect("serialize");
        assert_eq!(json["severity"], "Warning");
        assert_eq!(json["message"], "hack selector");
        assert!(json.get("line").is_none());
    }
}
