/*
 * visitors/exclude_properties.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Property exclusion.
//!
//! Removes declarations whose property name is on the configured exclusion
//! list (case-insensitive). Used to strip build-internal or vendor-staging
//! properties before output.

use std::collections::HashSet;
use std::convert::Infallible;

use webpress_css::ast::{BlockItem, Page, Ruleset};
use webpress_css::visitor::Visitor;

pub struct ExcludePropertiesVisitor {
    keys: HashSet<String>,
    removed: usize,
}

impl ExcludePropertiesVisitor {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| k.to_ascii_lowercase()).collect(),
            removed: 0,
        }
    }

    /// Number of declarations removed so far.
    pub fn removed(&self) -> usize {
        self.removed
    }

    fn filter(&mut self, items: Vec<BlockItem>) -> Vec<BlockItem> {
        let before = items.len();
        let kept: Vec<BlockItem> = items
            .into_iter()
            .filter(|item| match item {
                BlockItem::Declaration(declaration) => {
                    !self.keys.contains(&declaration.property.to_ascii_lowercase())
                }
                BlockItem::ImportantComment(_) => true,
            })
            .collect();
        self.removed += before - kept.len();
        kept
    }
}

impl Visitor for ExcludePropertiesVisitor {
    type Error = Infallible;

    fn visit_ruleset(&mut self, mut node: Ruleset) -> Result<Ruleset, Self::Error> {
        node.items = self.filter(node.items);
        Ok(node)
    }

    fn visit_page(&mut self, mut node: Page) -> Result<Page, Self::Error> {
        node.items = self.filter(node.items);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::{PrintMode, parse, print};

    fn run(source: &str, keys: &[&str]) -> (String, usize) {
        let sheet = parse(source).expect("parse");
        let mut visitor = ExcludePropertiesVisitor::new(keys.iter().map(|k| k.to_string()));
        let Ok(sheet) = visitor.visit_stylesheet(sheet);
        (print(&sheet, PrintMode::Minified), visitor.removed())
    }

    #[test]
    fn test_excluded_property_is_removed() {
        let (out, removed) = run(
            "p { -wg-exclude: 1; color: red; }",
            &["-wg-exclude"],
        );
        assert_eq!(out, "p{color:red;}");
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        let (out, removed) = run("p { -WG-Exclude: 1; }", &["-wg-exclude"]);
        assert_eq!(out, "p{}");
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_exclusion_applies_inside_media_and_page() {
        let (out, removed) = run(
            "@media screen { p { zap: 1; } @page { zap: 2; margin: 0; } }",
            &["zap"],
        );
        assert!(!out.contains("zap"));
        assert!(out.contains("margin:0"));
        assert_eq!(removed, 2);
    }

    #[test]
    fn test_other_properties_untouched() {
        let (out, removed) = run("p { color: red; }", &["zap"]);
        assert_eq!(out, "p{color:red;}");
        assert_eq!(removed, 0);
    }
}
