/*
 * error.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Error types for CSS parsing.

use thiserror::Error;

/// A single syntax problem with its one-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parse failure carrying every syntax error found in one pass.
///
/// The parser recovers after each error and keeps scanning, so a caller can
/// report all problems in a malformed stylesheet at once. Errors are not
/// deduplicated here; aggregation happens at the reporting layer.
#[derive(Debug, Clone, Error)]
#[error("{} syntax error(s): {}", .errors.len(), .errors.first().map(ToString::to_string).unwrap_or_default())]
pub struct ParseError {
    pub errors: Vec<SyntaxError>,
}

impl ParseError {
    pub fn new(errors: Vec<SyntaxError>) -> Self {
        Self { errors }
    }
}
