/*
 * lib.rs
 * Copyright (c) 2025 the webpress developers
 *
 * CSS syntax tree, parser, visitor protocol and printer.
 */

//! CSS syntax support for the webpress pipeline.
//!
//! This crate owns the stylesheet syntax tree and the passes protocol:
//!
//! - [`ast`] - the tree of stylesheet constructs
//! - [`parser`] - CSS text to tree, with error recovery
//! - [`visitor`] - the double-dispatch protocol independent passes use to
//!   traverse and rewrite the tree
//! - [`printer`] - tree back to CSS text, minified or pretty
//!
//! Grammar coverage is intentionally partial (full CSS3 is a non-goal of the
//! pipeline); what is parsed round-trips faithfully, including `/*!`
//! important comments at stylesheet, block and value position.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod visitor;

pub use ast::StyleSheet;
pub use error::{ParseError, SyntaxError};
pub use parser::parse;
pub use printer::{PrintMode, print};
pub use visitor::Visitor;
