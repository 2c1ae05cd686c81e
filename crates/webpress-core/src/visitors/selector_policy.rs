/*
 * visitors/selector_policy.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Selector policy validation.
//!
//! Two lists drive this pass. A selector on the *banned* list is a build
//! failure: the pipeline rejects the stylesheet and produces no output. A
//! selector only on the *hack* list (legacy/SEO hacks worth flagging but
//! not worth breaking the build over) produces a warning and the pipeline
//! continues.

use std::collections::HashSet;
use std::convert::Infallible;

use webpress_css::ast::Ruleset;
use webpress_css::visitor::Visitor;
use webpress_error_reporting::Diagnostic;

pub struct SelectorPolicyVisitor {
    banned: HashSet<String>,
    hack: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
    banned_found: bool,
}

impl SelectorPolicyVisitor {
    pub fn new(banned: HashSet<String>, hack: HashSet<String>) -> Self {
        Self {
            banned,
            hack,
            diagnostics: Vec::new(),
            banned_found: false,
        }
    }

    /// Whether a banned selector was seen; the pipeline must reject the
    /// stylesheet when this is set.
    pub fn banned_found(&self) -> bool {
        self.banned_found
    }

    /// Diagnostics collected during the traversal.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Visitor for SelectorPolicyVisitor {
    type Error = Infallible;

    fn visit_ruleset(&mut self, node: Ruleset) -> Result<Ruleset, Self::Error> {
        for selector in &node.selectors {
            if self.banned.contains(&selector.text) {
                self.banned_found = true;
                self.diagnostics.push(Diagnostic::error(format!(
                    "banned selector `{}` is not allowed",
                    selector.text
                )));
            } else if self.hack.contains(&selector.text) {
                tracing::warn!(selector = %selector.text, "hack selector found");
                self.diagnostics.push(Diagnostic::warning(format!(
                    "hack selector `{}` found",
                    selector.text
                )));
            }
        }
        // Declarations are irrelevant to selector policy.
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::parse;
    use webpress_error_reporting::Severity;

    fn run(source: &str, banned: &[&str], hack: &[&str]) -> (bool, Vec<Diagnostic>) {
        let sheet = parse(source).expect("parse");
        let mut visitor = SelectorPolicyVisitor::new(
            banned.iter().map(|s| s.to_string()).collect(),
            hack.iter().map(|s| s.to_string()).collect(),
        );
        let Ok(_) = visitor.visit_stylesheet(sheet);
        (visitor.banned_found(), visitor.take_diagnostics())
    }

    #[test]
    fn test_banned_selector_is_fatal() {
        let (found, diagnostics) = run("html>body { color: red; }", &["html>body"], &[]);
        assert!(found);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(diagnostics[0].message.contains("html>body"));
    }

    #[test]
    fn test_hack_selector_is_a_warning() {
        let (found, diagnostics) = run("* html { color: red; }", &[], &["* html"]);
        assert!(!found);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_banned_wins_over_hack() {
        let (found, diagnostics) = run("* html { color: red; }", &["* html"], &["* html"]);
        assert!(found);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_normalized_selector_matches_list() {
        // Spacing differences in the source should not defeat the policy.
        let (found, _) = run("html  >  body { color: red; }", &["html>body"], &[]);
        assert!(found);
    }

    #[test]
    fn test_selectors_inside_media_are_checked() {
        let (found, _) = run(
            "@media screen { html>body { color: red; } }",
            &["html>body"],
            &[],
        );
        assert!(found);
    }

    #[test]
    fn test_clean_stylesheet_passes() {
        let (found, diagnostics) = run("#nav { color: red; }", &["html>body"], &["* html"]);
        assert!(!found);
        assert!(diagnostics.is_empty());
    }
}
