/*
 * lexer.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Tokenizer for CSS source text.
//!
//! The lexer tracks one-based line numbers, classifies comments (`/*!` bodies
//! become [`TokenKind::ImportantComment`] tokens; ordinary comments collapse
//! to whitespace) and captures `url(...)` references and function arguments
//! as single tokens so their contents round-trip verbatim through the
//! printer.

use crate::error::SyntaxError;

/// A token with its one-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// `@media`, `@page`, `@charset`, ... (name without the `@`).
    AtKeyword(String),
    /// `#fff` color or `#id` selector fragment (text without the `#`).
    Hash(String),
    /// String literal including its quotes.
    QuotedString(String),
    /// `url(...)` reference; the target without quotes.
    Url(String),
    /// A function call: `name(` through the matching `)`, arguments raw.
    Function { name: String, arguments: String },
    Number { value: f64, unit: Option<String> },
    /// `/*! ... */` comment, full text including delimiters.
    ImportantComment(String),
    /// A run of whitespace (ordinary comments are folded in here).
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Delim(char),
}

/// Tokenize `source`, returning the token stream and any lexical errors.
///
/// Lexical errors (unterminated strings, comments or url references) do not
/// stop scanning; the lexer records the problem and resynchronizes so the
/// parser can surface every error in one pass.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SyntaxError>) {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<SyntaxError>) {
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => self.lex_whitespace(),
                '/' if self.peek_at(1) == Some('*') => self.lex_comment(),
                '\'' | '"' => self.lex_string(c),
                '@' => self.lex_at_keyword(),
                '#' => self.lex_hash(),
                c if c.is_ascii_digit() => self.lex_number(),
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.lex_number(),
                '+' | '-'
                    if self.peek_at(1).is_some_and(|n| n.is_ascii_digit())
                        || (self.peek_at(1) == Some('.')
                            && self.peek_at(2).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.lex_number()
                }
                c if is_ident_start(c) => self.lex_ident_like(),
                '-' if self.peek_at(1).is_some_and(is_ident_char) => self.lex_ident_like(),
                '{' => self.punct(TokenKind::LBrace),
                '}' => self.punct(TokenKind::RBrace),
                '[' => self.punct(TokenKind::LBracket),
                ']' => self.punct(TokenKind::RBracket),
                '(' => self.punct(TokenKind::LParen),
                ')' => self.punct(TokenKind::RParen),
                ':' => self.punct(TokenKind::Colon),
                ';' => self.punct(TokenKind::Semicolon),
                ',' => self.punct(TokenKind::Comma),
                other => self.punct(TokenKind::Delim(other)),
            }
        }
        (self.tokens, self.errors)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn emit(&mut self, kind: TokenKind, line: u32) {
        self.tokens.push(Token { kind, line });
    }

    fn error(&mut self, message: impl Into<String>, line: u32) {
        self.errors.push(SyntaxError::new(message, line));
    }

    fn punct(&mut self, kind: TokenKind) {
        let line = self.line;
        self.bump();
        self.emit(kind, line);
    }

    fn emit_whitespace(&mut self, line: u32) {
        if !matches!(
            self.tokens.last(),
            Some(Token {
                kind: TokenKind::Whitespace,
                ..
            })
        ) {
            self.emit(TokenKind::Whitespace, line);
        }
    }

    fn lex_whitespace(&mut self) {
        let line = self.line;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.emit_whitespace(line);
    }

    fn lex_comment(&mut self) {
        let line = self.line;
        self.bump();
        self.bump();
        let important = self.peek() == Some('!');
        let mut body = String::new();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    break;
                }
                Some(c) => body.push(c),
                None => {
                    self.error("unterminated comment", line);
                    break;
                }
            }
        }
        if important {
            self.emit(TokenKind::ImportantComment(format!("/*{}*/", body)), line);
        } else {
            // Ordinary comments separate tokens the way whitespace does.
            self.emit_whitespace(line);
        }
    }

    fn lex_string(&mut self, quote: char) {
        let line = self.line;
        self.bump();
        let mut text = String::new();
        text.push(quote);
        loop {
            match self.bump() {
                Some('\\') => {
                    text.push('\\');
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                }
                Some(c) if c == quote => {
                    text.push(quote);
                    break;
                }
                Some('\n') => {
                    self.error("unterminated string", line);
                    break;
                }
                Some(c) => text.push(c),
                None => {
                    self.error("unterminated string", line);
                    break;
                }
            }
        }
        self.emit(TokenKind::QuotedString(text), line);
    }

    fn lex_at_keyword(&mut self) {
        let line = self.line;
        self.bump();
        let name = self.take_ident();
        if name.is_empty() {
            self.emit(TokenKind::Delim('@'), line);
        } else {
            self.emit(TokenKind::AtKeyword(name), line);
        }
    }

    fn lex_hash(&mut self) {
        let line = self.line;
        self.bump();
        let text = self.take_ident();
        if text.is_empty() {
            self.emit(TokenKind::Delim('#'), line);
        } else {
            self.emit(TokenKind::Hash(text), line);
        }
    }

    fn lex_number(&mut self) {
        let line = self.line;
        let mut text = String::new();
        if matches!(self.peek(), Some('+') | Some('-')) {
            if let Some(sign) = self.bump() {
                text.push(sign);
            }
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            if let Some(d) = self.bump() {
                text.push(d);
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            if let Some(dot) = self.bump() {
                text.push(dot);
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                if let Some(d) = self.bump() {
                    text.push(d);
                }
            }
        }
        let value = text.parse::<f64>().unwrap_or_else(|_| {
            // Only reachable on a lexer bug; surface it as an error instead
            // of panicking in library code.
            self.errors.push(SyntaxError::new(
                format!("malformed number `{}`", text),
                line,
            ));
            0.0
        });
        let unit = if self.peek() == Some('%') {
            self.bump();
            Some("%".to_string())
        } else if self.peek().is_some_and(is_ident_start) {
            Some(self.take_ident())
        } else {
            None
        };
        self.emit(TokenKind::Number { value, unit }, line);
    }

    fn lex_ident_like(&mut self) {
        let line = self.line;
        let name = self.take_ident();
        if self.peek() == Some('(') {
            self.bump();
            if name.eq_ignore_ascii_case("url") {
                self.lex_url(line);
            } else {
                self.lex_function(name, line);
            }
        } else {
            self.emit(TokenKind::Ident(name), line);
        }
    }

    fn lex_url(&mut self, line: u32) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let mut target = String::new();
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(c) => target.push(c),
                        None => {
                            self.error("unterminated url", line);
                            self.emit(TokenKind::Url(target), line);
                            return;
                        }
                    }
                }
                while self.peek().is_some_and(char::is_whitespace) {
                    self.bump();
                }
                if self.peek() == Some(')') {
                    self.bump();
                } else {
                    self.error("unterminated url", line);
                }
            }
            _ => loop {
                match self.bump() {
                    Some(')') => break,
                    Some(c) => target.push(c),
                    None => {
                        self.error("unterminated url", line);
                        break;
                    }
                }
            },
        }
        self.emit(TokenKind::Url(target.trim().to_string()), line);
    }

    fn lex_function(&mut self, name: String, line: u32) {
        let mut arguments = String::new();
        let mut depth = 1usize;
        loop {
            match self.bump() {
                Some('(') => {
                    depth += 1;
                    arguments.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    arguments.push(')');
                }
                Some(quote @ ('\'' | '"')) => {
                    arguments.push(quote);
                    loop {
                        match self.bump() {
                            Some(c) => {
                                arguments.push(c);
                                if c == quote {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
                Some(c) => arguments.push(c),
                None => {
                    self.error(format!("unterminated `{}(` function", name), line);
                    break;
                }
            }
        }
        self.emit(TokenKind::Function { name, arguments }, line);
    }

    fn take_ident(&mut self) -> String {
        let mut text = String::new();
        while self.peek().is_some_and(is_ident_char) {
            if let Some(c) = self.bump() {
                text.push(c);
            }
        }
        text
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declaration_tokens() {
        let kinds = kinds("color:red;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("color".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("red".to_string()),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_url_with_and_without_quotes() {
        assert_eq!(
            kinds("url(../i/a.gif)"),
            vec![TokenKind::Url("../i/a.gif".to_string())]
        );
        assert_eq!(
            kinds("url( \"a b.png\" )"),
            vec![TokenKind::Url("a b.png".to_string())]
        );
    }

    #[test]
    fn test_negative_length() {
        assert_eq!(
            kinds("-10px"),
            vec![TokenKind::Number {
                value: -10.0,
                unit: Some("px".to_string())
            }]
        );
    }

    #[test]
    fn test_percentage_unit() {
        assert_eq!(
            kinds("50%"),
            vec![TokenKind::Number {
                value: 50.0,
                unit: Some("%".to_string())
            }]
        );
    }

    #[test]
    fn test_important_comment_token() {
        let kinds = kinds("/*! keep */");
        assert_eq!(
            kinds,
            vec![TokenKind::ImportantComment("/*! keep */".to_string())]
        );
    }

    #[test]
    fn test_plain_comment_folds_to_whitespace() {
        let kinds = kinds("a/* drop */b");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Whitespace,
                TokenKind::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_function_arguments_kept_raw() {
        let kinds = kinds("calc(100%/3 - 2*1em)");
        assert_eq!(
            kinds,
            vec![TokenKind::Function {
                name: "calc".to_string(),
                arguments: "100%/3 - 2*1em".to_string()
            }]
        );
    }

    #[test]
    fn test_nested_function_parens() {
        let kinds = kinds("min(10% + 20px,max(1px,2px))");
        assert_eq!(
            kinds,
            vec![TokenKind::Function {
                name: "min".to_string(),
                arguments: "10% + 20px,max(1px,2px)".to_string()
            }]
        );
    }

    #[test]
    fn test_line_tracking() {
        let (tokens, _) = tokenize("a{\n  color: red;\n}");
        let color = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Ident("color".to_string()))
            .expect("color token");
        assert_eq!(color.line, 2);
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let (_, errors) = tokenize("content: \"oops");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unterminated string"));
    }

    #[test]
    fn test_hash_and_at_tokens() {
        assert_eq!(
            kinds("#fff"),
            vec![TokenKind::Hash("fff".to_string())]
        );
        assert_eq!(
            kinds("@media"),
            vec![TokenKind::AtKeyword("media".to_string())]
        );
    }
}
