/*
 * ast.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The stylesheet syntax tree.
//!
//! Nodes form a tree: each node owns its children exclusively, and visitors
//! replace subtrees rather than mutating them in place (see
//! [`crate::visitor`]). Ordinary comments are dropped at parse time; comments
//! whose body starts with `!` are preserved as [`ImportantComment`] nodes at
//! the stylesheet, block and value level so the printer can reproduce them
//! verbatim.

use serde::{Deserialize, Serialize};

/// Root of a parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub rules: Vec<Rule>,
}

/// A top-level stylesheet construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    Ruleset(Ruleset),
    Media(Media),
    Page(Page),
    /// A block-less at-rule kept verbatim, e.g. `@charset "utf-8";`.
    AtStatement(AtStatement),
    ImportantComment(ImportantComment),
}

/// A selector group with its declaration block.
///
/// At-rules whose body is a plain declaration block (such as `@font-face`)
/// are represented as rulesets whose single selector is the at-keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub selectors: Vec<Selector>,
    pub items: Vec<BlockItem>,
}

/// An `@media` block. May contain rulesets, page rules and important
/// comments, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    /// The raw media query text, whitespace-normalized.
    pub query: String,
    pub rules: Vec<Rule>,
}

/// An `@page` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page pseudo-selector (e.g. `:first`), without the `@page` keyword.
    pub pseudo: Option<String>,
    pub items: Vec<BlockItem>,
}

/// A block-less at-rule kept as raw text, terminated by `;` in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtStatement {
    /// Full rule text including the at-keyword, excluding the terminator.
    pub text: String,
}

/// A single selector within a selector group.
///
/// Selector text is whitespace-normalized at parse time (runs collapsed to
/// one space, no spaces around `>`, `+`, `~`) so policy lists can match
/// textually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub text: String,
}

impl Selector {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// An element of a declaration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockItem {
    Declaration(Declaration),
    ImportantComment(ImportantComment),
}

/// A property declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: Expression,
    /// Whether the declaration carried `!important`.
    pub important: bool,
    /// One-based source line of the property name.
    pub line: u32,
}

impl Declaration {
    /// Case-insensitive property-name comparison.
    pub fn has_property(&self, name: &str) -> bool {
        self.property.eq_ignore_ascii_case(name)
    }
}

/// A declaration value: terms interleaved with preserved comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub items: Vec<ValueItem>,
}

impl Expression {
    /// Build an expression from bare terms, space-separated after the first.
    pub fn from_terms(terms: Vec<Term>) -> Self {
        let items = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| {
                ValueItem::Term(TermWithOperator {
                    operator: if i == 0 { None } else { Some(Operator::Space) },
                    term,
                })
            })
            .collect();
        Self { items }
    }

    /// Iterate over the value's terms, skipping interleaved comments.
    pub fn terms(&self) -> impl Iterator<Item = &TermWithOperator> {
        self.items.iter().filter_map(|item| match item {
            ValueItem::Term(t) => Some(t),
            ValueItem::Comment(_) => None,
        })
    }
}

/// One element of an expression, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueItem {
    Term(TermWithOperator),
    Comment(ImportantComment),
}

/// A term together with the operator separating it from the previous term.
///
/// The first term of an expression has no operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWithOperator {
    pub operator: Option<Operator>,
    pub term: Term,
}

/// Separator between two value terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Space,
    Slash,
    Comma,
}

/// A single value term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    Number {
        value: f64,
        unit: Option<String>,
    },
    Ident(String),
    /// String literal including its quotes.
    QuotedString(String),
    /// `url(...)` reference; the inner value without quotes.
    Url(String),
    /// Hex color or hash token, without the leading `#`.
    Hex(String),
    /// Function call with raw argument text, reproduced verbatim.
    Function {
        name: String,
        arguments: String,
    },
}

impl Term {
    pub fn ident(text: impl Into<String>) -> Self {
        Term::Ident(text.into())
    }

    pub fn url(target: impl Into<String>) -> Self {
        Term::Url(target.into())
    }

    pub fn number(value: f64) -> Self {
        Term::Number { value, unit: None }
    }

    pub fn length(value: f64, unit: impl Into<String>) -> Self {
        Term::Number {
            value,
            unit: Some(unit.into()),
        }
    }

    /// The url target if this term is a `url(...)` reference.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Term::Url(target) => Some(target),
            _ => None,
        }
    }
}

/// A comment of the form `/*! ... */`, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantComment {
    /// Full comment text including the `/*!` and `*/` delimiters.
    pub text: String,
}

impl ImportantComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
