/*
 * visitors/lowercase.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Lowercase validation.
//!
//! Warns when selector text or property names contain uppercase ASCII.
//! Casing is a style rule, not a correctness rule, so every finding is a
//! warning and the pipeline always continues.

use std::convert::Infallible;

use webpress_css::ast::{Declaration, Ruleset};
use webpress_css::visitor::{Visitor, walk_ruleset};
use webpress_error_reporting::Diagnostic;

#[derive(Default)]
pub struct LowercaseValidationVisitor {
    diagnostics: Vec<Diagnostic>,
}

impl LowercaseValidationVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

fn has_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_uppercase())
}

impl Visitor for LowercaseValidationVisitor {
    type Error = Infallible;

    fn visit_ruleset(&mut self, node: Ruleset) -> Result<Ruleset, Self::Error> {
        for selector in &node.selectors {
            if has_uppercase(&selector.text) {
                self.diagnostics.push(Diagnostic::warning(format!(
                    "selector `{}` should be lowercase",
                    selector.text
                )));
            }
        }
        walk_ruleset(self, node)
    }

    fn visit_declaration(&mut self, node: Declaration) -> Result<Declaration, Self::Error> {
        if has_uppercase(&node.property) {
            self.diagnostics.push(
                Diagnostic::warning(format!(
                    "property `{}` should be lowercase",
                    node.property
                ))
                .with_line(node.line),
            );
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::parse;

    fn run(source: &str) -> Vec<Diagnostic> {
        let sheet = parse(source).expect("parse");
        let mut visitor = LowercaseValidationVisitor::new();
        let Ok(_) = visitor.visit_stylesheet(sheet);
        visitor.take_diagnostics()
    }

    #[test]
    fn test_uppercase_selector_warns() {
        let diagnostics = run("#Nav { color: red; }");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("#Nav"));
    }

    #[test]
    fn test_uppercase_property_warns_with_line() {
        let diagnostics = run("p {\n  Color: red;\n}");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_lowercase_passes() {
        assert!(run("#nav p { color: red; }").is_empty());
    }

    #[test]
    fn test_values_are_not_checked() {
        // Only selectors and property names are validated; values may
        // legitimately carry case (e.g. font names).
        assert!(run("p { font-family: Arial; }").is_empty());
    }
}
