/*
 * printer.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Serialization of the syntax tree back to CSS text.
//!
//! Contract: important comments are reproduced verbatim in their recorded
//! position; ordinary comments were dropped at parse time and never
//! reappear; the printer never emits two consecutive statement separators;
//! whitespace is normalized but comment content is not touched.

use crate::ast::{
    BlockItem, Declaration, Expression, Media, Operator, Page, Rule, Ruleset, StyleSheet,
    Term, ValueItem,
};

/// Output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// Compact output: no indentation, single-space only where required.
    #[default]
    Minified,
    /// Human-readable output with indentation and blank separators.
    Pretty,
}

/// Serialize a stylesheet.
pub fn print(sheet: &StyleSheet, mode: PrintMode) -> String {
    let mut writer = CssWriter {
        out: String::new(),
        mode,
        depth: 0,
    };
    writer.write_stylesheet(sheet);
    writer.out
}

struct CssWriter {
    out: String,
    mode: PrintMode,
    depth: usize,
}

impl CssWriter {
    fn minified(&self) -> bool {
        self.mode == PrintMode::Minified
    }

    fn newline(&mut self) {
        if !self.minified() {
            self.out.push('\n');
        }
    }

    fn indent(&mut self) {
        if !self.minified() {
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
        }
    }

    fn write_stylesheet(&mut self, sheet: &StyleSheet) {
        for (index, rule) in sheet.rules.iter().enumerate() {
            if index > 0 {
                self.newline();
            }
            self.write_rule(rule);
        }
        if !sheet.rules.is_empty() {
            self.newline();
        }
    }

    fn write_rule(&mut self, rule: &Rule) {
        match rule {
            Rule::Ruleset(ruleset) => self.write_ruleset(ruleset),
            Rule::Media(media) => self.write_media(media),
            Rule::Page(page) => self.write_page(page),
            Rule::AtStatement(statement) => {
                self.indent();
                self.out.push_str(&statement.text);
                self.out.push(';');
            }
            Rule::ImportantComment(comment) => {
                self.indent();
                self.out.push_str(&comment.text);
            }
        }
    }

    fn write_ruleset(&mut self, ruleset: &Ruleset) {
        self.indent();
        for (index, selector) in ruleset.selectors.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
                if !self.minified() {
                    self.out.push(' ');
                }
            }
            self.out.push_str(&selector.text);
        }
        self.open_block();
        self.write_block_items(&ruleset.items);
        self.close_block();
    }

    fn write_media(&mut self, media: &Media) {
        self.indent();
        self.out.push_str("@media ");
        self.out.push_str(&media.query);
        self.open_block();
        for (index, rule) in media.rules.iter().enumerate() {
            if index > 0 {
                self.newline();
            }
            self.write_rule(rule);
        }
        self.close_block();
    }

    fn write_page(&mut self, page: &Page) {
        self.indent();
        self.out.push_str("@page");
        if let Some(pseudo) = &page.pseudo {
            self.out.push(' ');
            self.out.push_str(pseudo);
        }
        self.open_block();
        self.write_block_items(&page.items);
        self.close_block();
    }

    fn open_block(&mut self) {
        if !self.minified() {
            self.out.push(' ');
        }
        self.out.push('{');
        self.depth += 1;
        self.newline();
    }

    fn close_block(&mut self) {
        self.depth -= 1;
        self.newline();
        self.indent();
        self.out.push('}');
    }

    fn write_block_items(&mut self, items: &[BlockItem]) {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.newline();
            }
            match item {
                BlockItem::Declaration(declaration) => self.write_declaration(declaration),
                BlockItem::ImportantComment(comment) => {
                    self.indent();
                    self.out.push_str(&comment.text);
                }
            }
        }
    }

    fn write_declaration(&mut self, declaration: &Declaration) {
        self.indent();
        self.out.push_str(&declaration.property);
        self.out.push(':');
        if !self.minified() {
            self.out.push(' ');
        }
        self.write_expression(&declaration.value);
        if declaration.important {
            if !self.minified() {
                self.out.push(' ');
            }
            self.out.push_str("!important");
        }
        self.out.push(';');
    }

    fn write_expression(&mut self, expression: &Expression) {
        for item in &expression.items {
            match item {
                ValueItem::Term(term) => {
                    match term.operator {
                        None => {}
                        Some(Operator::Space) => self.out.push(' '),
                        Some(Operator::Slash) => self.out.push('/'),
                        Some(Operator::Comma) => {
                            self.out.push(',');
                            if !self.minified() {
                                self.out.push(' ');
                            }
                        }
                    }
                    self.write_term(&term.term);
                }
                ValueItem::Comment(comment) => self.out.push_str(&comment.text),
            }
        }
    }

    fn write_term(&mut self, term: &Term) {
        match term {
            Term::Number { value, unit } => {
                self.out.push_str(&format_number(*value, unit.as_deref()));
            }
            Term::Ident(text) => self.out.push_str(text),
            Term::QuotedString(text) => self.out.push_str(text),
            Term::Url(target) => {
                self.out.push_str("url(");
                self.out.push_str(target);
                self.out.push(')');
            }
            Term::Hex(text) => {
                self.out.push('#');
                self.out.push_str(text);
            }
            Term::Function { name, arguments } => {
                self.out.push_str(name);
                self.out.push('(');
                self.out.push_str(arguments);
                self.out.push(')');
            }
        }
    }
}

/// Format a numeric value with an optional unit, trimming a fractional part
/// of zero. Used by both the printer and selector-text reconstruction.
pub(crate) fn format_number(value: f64, unit: Option<&str>) -> String {
    let number = if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    };
    match unit {
        Some(unit) => format!("{}{}", number, unit),
        None => number,
    }
}
