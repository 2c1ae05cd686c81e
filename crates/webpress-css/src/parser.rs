/*
 * parser.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Recursive-descent parser from CSS source text to the [`crate::ast`] tree.
//!
//! The parser is deliberately not a full CSS3 grammar: selectors and media
//! queries are captured as normalized text, function arguments stay raw, and
//! unknown at-rules are kept verbatim. What it does guarantee is positional
//! fidelity for important comments and per-declaration line numbers, which
//! downstream passes and diagnostics depend on.
//!
//! On error the parser records the problem and resynchronizes (to the next
//! `;` or the end of the enclosing block), so one pass reports every syntax
//! error in the input.

use crate::ast::{
    AtStatement, BlockItem, Declaration, Expression, ImportantComment, Media, Operator, Page,
    Rule, Ruleset, Selector, StyleSheet, Term, TermWithOperator, ValueItem,
};
use crate::error::{ParseError, SyntaxError};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::printer::format_number;

/// Parse a stylesheet, returning every syntax error found on failure.
pub fn parse(source: &str) -> Result<StyleSheet, ParseError> {
    let (tokens, lex_errors) = tokenize(source);
    let mut parser = Parser {
        tokens,
        pos: 0,
        errors: lex_errors,
    };
    let stylesheet = parser.parse_stylesheet();
    if parser.errors.is_empty() {
        Ok(stylesheet)
    } else {
        Err(ParseError::new(parser.errors))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Whitespace)) {
            self.pos += 1;
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let line = self.line();
        self.errors.push(SyntaxError::new(message, line));
    }

    /// Skip to the end of the current block (consuming the matching `}`),
    /// tolerating nested blocks.
    fn recover_block(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.bump() {
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    /// Skip to the next `;` (consumed) or the enclosing `}` (not consumed).
    fn recover_declaration(&mut self) {
        loop {
            match self.peek() {
                None | Some(TokenKind::RBrace) => return,
                Some(TokenKind::Semicolon) => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_stylesheet(&mut self) -> StyleSheet {
        let mut rules = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(TokenKind::ImportantComment(_)) => {
                    if let Some(Token {
                        kind: TokenKind::ImportantComment(text),
                        ..
                    }) = self.bump()
                    {
                        rules.push(Rule::ImportantComment(ImportantComment::new(text)));
                    }
                }
                Some(TokenKind::AtKeyword(name)) => {
                    let rule = match name.to_ascii_lowercase().as_str() {
                        "media" => self.parse_media().map(Rule::Media),
                        "page" => self.parse_page().map(Rule::Page),
                        _ => self.parse_other_at_rule(),
                    };
                    if let Some(rule) = rule {
                        rules.push(rule);
                    }
                }
                Some(TokenKind::RBrace) => {
                    self.error("unexpected `}`");
                    self.bump();
                }
                _ => {
                    if let Some(ruleset) = self.parse_ruleset() {
                        rules.push(Rule::Ruleset(ruleset));
                    }
                }
            }
        }
        StyleSheet { rules }
    }

    /// Parse `selector[, selector]* {` and the following declaration block.
    fn parse_ruleset(&mut self) -> Option<Ruleset> {
        let selectors = self.parse_selector_list()?;
        let items = self.parse_block_items();
        Some(Ruleset { selectors, items })
    }

    /// Parse a comma-separated selector group, consuming the opening `{`.
    fn parse_selector_list(&mut self) -> Option<Vec<Selector>> {
        let mut selectors = Vec::new();
        let mut current = String::new();
        loop {
            match self.peek() {
                None | Some(TokenKind::Semicolon) => {
                    self.error("expected `{` after selector");
                    self.bump();
                    return None;
                }
                Some(TokenKind::LBrace) => {
                    self.bump();
                    let text = normalize_selector(&current);
                    if text.is_empty() {
                        self.error("missing selector before `{`");
                        self.recover_block();
                        return None;
                    }
                    selectors.push(Selector::new(text));
                    return Some(selectors);
                }
                Some(TokenKind::Comma) => {
                    self.bump();
                    let text = normalize_selector(&current);
                    if text.is_empty() {
                        self.error("empty selector in selector group");
                    } else {
                        selectors.push(Selector::new(text));
                    }
                    current.clear();
                }
                Some(_) => {
                    if let Some(token) = self.bump() {
                        current.push_str(&fragment_text(&token.kind));
                    }
                }
            }
        }
    }

    /// Parse the contents of a declaration block, consuming the closing `}`.
    fn parse_block_items(&mut self) -> Vec<BlockItem> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    self.error("unexpected end of file in declaration block");
                    return items;
                }
                Some(TokenKind::RBrace) => {
                    self.bump();
                    return items;
                }
                Some(TokenKind::Semicolon) => {
                    self.bump();
                }
                Some(TokenKind::ImportantComment(_)) => {
                    if let Some(Token {
                        kind: TokenKind::ImportantComment(text),
                        ..
                    }) = self.bump()
                    {
                        items.push(BlockItem::ImportantComment(ImportantComment::new(text)));
                    }
                }
                Some(TokenKind::Ident(_)) => {
                    if let Some(declaration) = self.parse_declaration() {
                        items.push(BlockItem::Declaration(declaration));
                    }
                }
                Some(other) => {
                    let found = describe(other);
                    self.error(format!("expected property name, found {}", found));
                    self.recover_declaration();
                }
            }
        }
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let line = self.line();
        let property = match self.bump() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name,
            _ => return None,
        };
        self.skip_whitespace();
        if !matches!(self.peek(), Some(TokenKind::Colon)) {
            self.error(format!("expected `:` after property `{}`", property));
            self.recover_declaration();
            return None;
        }
        self.bump();

        let mut items: Vec<ValueItem> = Vec::new();
        let mut pending_operator: Option<Operator> = None;
        let mut has_term = false;
        let mut important = false;
        loop {
            match self.peek() {
                None | Some(TokenKind::RBrace) => break,
                Some(TokenKind::Semicolon) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::Whitespace) => {
                    self.bump();
                }
                Some(TokenKind::ImportantComment(_)) => {
                    if let Some(Token {
                        kind: TokenKind::ImportantComment(text),
                        ..
                    }) = self.bump()
                    {
                        items.push(ValueItem::Comment(ImportantComment::new(text)));
                    }
                }
                Some(TokenKind::Comma) => {
                    self.bump();
                    pending_operator = Some(Operator::Comma);
                }
                Some(TokenKind::Delim('/')) => {
                    self.bump();
                    pending_operator = Some(Operator::Slash);
                }
                Some(TokenKind::Delim('!')) => {
                    self.bump();
                    self.skip_whitespace();
                    match self.bump() {
                        Some(Token {
                            kind: TokenKind::Ident(word),
                            ..
                        }) if word.eq_ignore_ascii_case("important") => important = true,
                        _ => {
                            self.error("expected `important` after `!`");
                            self.recover_declaration();
                            return None;
                        }
                    }
                }
                Some(_) => {
                    let Some(token) = self.bump() else { break };
                    match term_from_token(token.kind) {
                        Some(term) => {
                            let operator = if has_term {
                                Some(pending_operator.take().unwrap_or(Operator::Space))
                            } else {
                                None
                            };
                            items.push(ValueItem::Term(TermWithOperator { operator, term }));
                            has_term = true;
                        }
                        None => {
                            self.error(format!(
                                "unexpected token in value of `{}`",
                                property
                            ));
                            self.recover_declaration();
                            return None;
                        }
                    }
                }
            }
        }
        if !has_term {
            self.error(format!("declaration `{}` has no value", property));
            return None;
        }
        Some(Declaration {
            property,
            value: Expression { items },
            important,
            line,
        })
    }

    fn parse_media(&mut self) -> Option<Media> {
        self.bump();
        let mut query = String::new();
        loop {
            match self.peek() {
                None | Some(TokenKind::Semicolon) => {
                    self.error("expected `{` after media query");
                    self.bump();
                    return None;
                }
                Some(TokenKind::LBrace) => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    if let Some(token) = self.bump() {
                        query.push_str(&fragment_text(&token.kind));
                    }
                }
            }
        }
        let query = normalize_selector(&query);

        let mut rules = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    self.error("unexpected end of file in media block");
                    break;
                }
                Some(TokenKind::RBrace) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::ImportantComment(_)) => {
                    if let Some(Token {
                        kind: TokenKind::ImportantComment(text),
                        ..
                    }) = self.bump()
                    {
                        rules.push(Rule::ImportantComment(ImportantComment::new(text)));
                    }
                }
                Some(TokenKind::AtKeyword(name)) => match name.to_ascii_lowercase().as_str() {
                    "page" => {
                        if let Some(page) = self.parse_page() {
                            rules.push(Rule::Page(page));
                        }
                    }
                    "media" => {
                        if let Some(media) = self.parse_media() {
                            rules.push(Rule::Media(media));
                        }
                    }
                    other => {
                        self.error(format!("`@{}` is not allowed inside `@media`", other));
                        self.bump();
                        self.recover_block();
                    }
                },
                _ => {
                    if let Some(ruleset) = self.parse_ruleset() {
                        rules.push(Rule::Ruleset(ruleset));
                    }
                }
            }
        }
        Some(Media { query, rules })
    }

    fn parse_page(&mut self) -> Option<Page> {
        self.bump();
        let mut pseudo = String::new();
        loop {
            match self.peek() {
                None | Some(TokenKind::Semicolon) => {
                    self.error("expected `{` after `@page`");
                    self.bump();
                    return None;
                }
                Some(TokenKind::LBrace) => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    if let Some(token) = self.bump() {
                        pseudo.push_str(&fragment_text(&token.kind));
                    }
                }
            }
        }
        let pseudo = normalize_selector(&pseudo);
        let items = self.parse_block_items();
        Some(Page {
            pseudo: if pseudo.is_empty() { None } else { Some(pseudo) },
            items,
        })
    }

    /// An at-rule other than `@media`/`@page`: a statement (`@import ...;`)
    /// stays raw; an at-rule with a declaration block (`@font-face {...}`)
    /// becomes a ruleset whose selector is the at-keyword.
    fn parse_other_at_rule(&mut self) -> Option<Rule> {
        let Some(Token {
            kind: TokenKind::AtKeyword(name),
            ..
        }) = self.bump()
        else {
            return None;
        };
        let mut text = format!("@{}", name);
        loop {
            match self.peek() {
                None => {
                    self.error(format!("unterminated `@{}` rule", name));
                    return None;
                }
                Some(TokenKind::Semicolon) => {
                    self.bump();
                    return Some(Rule::AtStatement(AtStatement {
                        text: text.trim_end().to_string(),
                    }));
                }
                Some(TokenKind::LBrace) => {
                    self.bump();
                    let items = self.parse_block_items();
                    return Some(Rule::Ruleset(Ruleset {
                        selectors: vec![Selector::new(normalize_selector(&text))],
                        items,
                    }));
                }
                Some(_) => {
                    if let Some(token) = self.bump() {
                        text.push_str(&fragment_text(&token.kind));
                    }
                }
            }
        }
    }
}

/// Reconstruct source text for a token when building selector, media-query
/// or raw at-rule text.
fn fragment_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => s.clone(),
        TokenKind::AtKeyword(s) => format!("@{}", s),
        TokenKind::Hash(s) => format!("#{}", s),
        TokenKind::QuotedString(s) => s.clone(),
        TokenKind::Url(s) => format!("url({})", s),
        TokenKind::Function { name, arguments } => format!("{}({})", name, arguments),
        TokenKind::Number { value, unit } => format_number(*value, unit.as_deref()),
        TokenKind::ImportantComment(_) => String::new(),
        TokenKind::Whitespace => " ".to_string(),
        TokenKind::Colon => ":".to_string(),
        TokenKind::Semicolon => ";".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::Delim(c) => c.to_string(),
    }
}

fn term_from_token(kind: TokenKind) -> Option<Term> {
    match kind {
        TokenKind::Ident(s) => Some(Term::Ident(s)),
        TokenKind::Number { value, unit } => Some(Term::Number { value, unit }),
        TokenKind::QuotedString(s) => Some(Term::QuotedString(s)),
        TokenKind::Url(s) => Some(Term::Url(s)),
        TokenKind::Hash(s) => Some(Term::Hex(s)),
        TokenKind::Function { name, arguments } => Some(Term::Function { name, arguments }),
        _ => None,
    }
}

/// Collapse whitespace runs to a single space and drop spaces around the
/// `>`, `+` and `~` combinators so policy lists can match selector text.
fn normalize_selector(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        let is_combinator = matches!(c, '>' | '+' | '~');
        if pending_space && !out.is_empty() && !is_combinator && !out.ends_with(['>', '+', '~']) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => format!("`{}`", s),
        TokenKind::AtKeyword(s) => format!("`@{}`", s),
        TokenKind::Hash(s) => format!("`#{}`", s),
        TokenKind::QuotedString(_) => "string".to_string(),
        TokenKind::Url(_) => "url".to_string(),
        TokenKind::Function { name, .. } => format!("`{}(`", name),
        TokenKind::Number { .. } => "number".to_string(),
        TokenKind::ImportantComment(_) => "comment".to_string(),
        TokenKind::Whitespace => "whitespace".to_string(),
        TokenKind::Colon => "`:`".to_string(),
        TokenKind::Semicolon => "`;`".to_string(),
        TokenKind::Comma => "`,`".to_string(),
        TokenKind::LBrace => "`{`".to_string(),
        TokenKind::RBrace => "`}`".to_string(),
        TokenKind::LBracket => "`[`".to_string(),
        TokenKind::RBracket => "`]`".to_string(),
        TokenKind::LParen => "`(`".to_string(),
        TokenKind::RParen => "`)`".to_string(),
        TokenKind::Delim(c) => format!("`{}`", c),
    }
}
