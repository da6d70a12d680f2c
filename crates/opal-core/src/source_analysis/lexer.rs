// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Opal source code.
//!
//! This module converts source text into a stream of [`RawToken`]s. The
//! lexer is hand-written for maximum control over error recovery.
//!
//! # Design Principles
//!
//! - **Error recovery**: never panic on malformed input; emit
//!   [`Kind::Error`] tokens and keep going
//! - **Trivia as tokens**: whitespace and comments are ordinary tokens
//!   (the parse stream decides what is trivia), so every byte of input is
//!   covered by exactly one token
//! - **Exactly one end marker**: the final token is [`Kind::EndMarker`],
//!   emitted once, never repeated
//!
//! # Example
//!
//! ```
//! use opal_core::source_analysis::{Kind, Lexer};
//!
//! let tokens: Vec<_> = Lexer::new("x + 1").collect();
//! // x, space, +, space, 1, end marker
//! assert_eq!(tokens.len(), 6);
//! assert_eq!(tokens[0].kind(), Kind::Identifier);
//! assert_eq!(tokens[5].kind(), Kind::EndMarker);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use super::{Kind, RawToken};

/// A lexer that tokenizes Opal source code.
///
/// Produces [`RawToken`]s with 0-based half-open byte offsets.
/// Implements [`Iterator`]; the last item yielded is always a zero-width
/// [`Kind::EndMarker`].
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Whether the end marker has been emitted.
    emitted_end: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            emitted_end: false,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is the same as
    /// `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Lexes the next token. Returns `None` after the end marker.
    fn next_token(&mut self) -> Option<RawToken> {
        let start = self.current_position();
        let Some(c) = self.advance() else {
            if self.emitted_end {
                return None;
            }
            self.emitted_end = true;
            return Some(RawToken::new(Kind::EndMarker, start, start, false, false));
        };

        let mut dotted = false;
        let kind = match c {
            ' ' | '\t' | '\n' | '\r' => self.lex_whitespace(c),
            '#' => self.lex_comment(),
            '"' => self.lex_string('"', Kind::String),
            '`' => self.lex_string('`', Kind::CmdString),
            '\'' => self.lex_char(),
            '(' => Kind::LParen,
            ')' => Kind::RParen,
            '[' => Kind::LBracket,
            ']' => Kind::RBracket,
            '{' => Kind::LBrace,
            '}' => Kind::RBrace,
            ',' => Kind::Comma,
            ';' => Kind::Semicolon,
            ':' => Kind::Colon,
            '?' => Kind::Question,
            '~' => Kind::Tilde,
            '=' => self.lex_eq_or(Kind::Equals, Kind::EqEq),
            '+' => self.lex_eq_or(Kind::Plus, Kind::PlusEq),
            '-' => self.lex_eq_or(Kind::Minus, Kind::MinusEq),
            '*' => self.lex_eq_or(Kind::Star, Kind::StarEq),
            '/' => self.lex_eq_or(Kind::Slash, Kind::SlashEq),
            '.' => match self.peek_char() {
                Some(d) if d.is_ascii_digit() => self.lex_number_fraction(),
                Some('+' | '-' | '*' | '/') => {
                    dotted = true;
                    let op = self.advance().unwrap_or('+');
                    match op {
                        '+' => self.lex_eq_or(Kind::Plus, Kind::PlusEq),
                        '-' => self.lex_eq_or(Kind::Minus, Kind::MinusEq),
                        '*' => self.lex_eq_or(Kind::Star, Kind::StarEq),
                        _ => self.lex_eq_or(Kind::Slash, Kind::SlashEq),
                    }
                }
                _ => Kind::Dot,
            },
            d if d.is_ascii_digit() => self.lex_number(d),
            a if a.is_alphabetic() || a == '_' => self.lex_identifier(start),
            _ => Kind::Error,
        };

        // Operator name suffixes: one or more primes, e.g. `+′`.
        let mut suffix = false;
        if kind.is_operator() {
            while self.peek_char() == Some('\u{2032}') {
                self.advance();
                suffix = true;
            }
        }

        Some(RawToken::new(
            kind,
            start,
            self.current_position(),
            dotted,
            suffix,
        ))
    }

    /// Lexes a whitespace run. A run containing a newline becomes
    /// [`Kind::NewlineWs`]; newlines separate statements and matrix rows.
    fn lex_whitespace(&mut self, first: char) -> Kind {
        let mut saw_newline = matches!(first, '\n' | '\r');
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' | '\r' => {
                    saw_newline = true;
                    self.advance();
                }
                _ => break,
            }
        }
        if saw_newline {
            Kind::NewlineWs
        } else {
            Kind::Whitespace
        }
    }

    /// Lexes a `#` line comment or nestable `#= =#` block comment.
    fn lex_comment(&mut self) -> Kind {
        if self.peek_char() == Some('=') {
            self.advance();
            let mut depth = 1u32;
            while depth > 0 {
                match self.advance() {
                    None => return Kind::Error, // unterminated block comment
                    Some('#') if self.peek_char() == Some('=') => {
                        self.advance();
                        depth += 1;
                    }
                    Some('=') if self.peek_char() == Some('#') => {
                        self.advance();
                        depth -= 1;
                    }
                    Some(_) => {}
                }
            }
            Kind::Comment
        } else {
            self.advance_while(|c| c != '\n');
            Kind::Comment
        }
    }

    /// Lexes a delimited literal (string or command). The opening
    /// delimiter has been consumed.
    fn lex_string(&mut self, close: char, kind: Kind) -> Kind {
        loop {
            match self.advance() {
                None => return Kind::Error, // unterminated
                Some('\\') => {
                    self.advance();
                }
                Some(c) if c == close => return kind,
                Some(_) => {}
            }
        }
    }

    /// Lexes a character literal. The opening quote has been consumed.
    fn lex_char(&mut self) -> Kind {
        match self.advance() {
            None | Some('\'') => return Kind::Error, // empty or unterminated
            Some('\\') => {
                self.advance();
            }
            Some(_) => {}
        }
        if self.peek_char() == Some('\'') {
            self.advance();
            Kind::Char
        } else {
            Kind::Error
        }
    }

    /// Lexes `=`-suffixed operator pairs: `+` vs `+=`, `=` vs `==`.
    fn lex_eq_or(&mut self, plain: Kind, with_eq: Kind) -> Kind {
        if self.peek_char() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// Lexes a number starting with a digit.
    fn lex_number(&mut self, first: char) -> Kind {
        if first == '0' && matches!(self.peek_char(), Some('x' | 'X')) {
            self.advance();
            let digits_start = self.position;
            self.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
            return if self.position == digits_start {
                Kind::Error // `0x` with no digits
            } else {
                Kind::Integer
            };
        }

        self.advance_while(|c| c.is_ascii_digit() || c == '_');
        let mut kind = Kind::Integer;

        // Fraction: only when a digit follows the dot, so `1.x` lexes as
        // a field access on `1`.
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit() || c == '_');
            kind = Kind::Float;
        }

        self.lex_exponent(kind)
    }

    /// Lexes a leading-dot float such as `.5`. The dot has been consumed.
    fn lex_number_fraction(&mut self) -> Kind {
        self.advance_while(|c| c.is_ascii_digit() || c == '_');
        self.lex_exponent(Kind::Float)
    }

    /// Lexes an optional exponent suffix, upgrading the kind to float.
    fn lex_exponent(&mut self, kind: Kind) -> Kind {
        if !matches!(self.peek_char(), Some('e' | 'E')) {
            return kind;
        }
        let sign_offset = usize::from(matches!(self.peek_char_n(1), Some('+' | '-')));
        if self
            .peek_char_n(sign_offset + 1)
            .is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // e
            if sign_offset == 1 {
                self.advance(); // sign
            }
            self.advance_while(|c| c.is_ascii_digit() || c == '_');
            Kind::Float
        } else {
            // `1e` or `1e+` with no digits: `e` here can only be an
            // exponent, so take the malformed spelling as one token.
            self.advance();
            if sign_offset == 1 {
                self.advance();
            }
            Kind::Error
        }
    }

    /// Lexes an identifier, keyword, or `var"..."` raw identifier. The
    /// first character has been consumed; `start` is its byte offset.
    fn lex_identifier(&mut self, start: u32) -> Kind {
        self.advance_while(|c| c.is_alphanumeric() || c == '_' || c == '!');
        let text = &self.source[start as usize..self.position];

        if text == "var" && self.peek_char() == Some('"') {
            self.advance();
            return match self.lex_string('"', Kind::VarIdentifier) {
                Kind::Error => Kind::Error,
                _ => Kind::VarIdentifier,
            };
        }

        match text {
            "end" => Kind::End,
            "else" => Kind::Else,
            "elseif" => Kind::Elseif,
            "catch" => Kind::Catch,
            "finally" => Kind::Finally,
            "for" => Kind::For,
            "in" => Kind::In,
            "where" => Kind::Where,
            "true" => Kind::True,
            "false" => Kind::False,
            _ => Kind::Identifier,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = RawToken;

    fn next(&mut self) -> Option<RawToken> {
        self.next_token()
    }
}

/// Tokenizes an entire source string, including the end marker.
#[must_use]
pub fn lex(source: &str) -> Vec<RawToken> {
    Lexer::new(source).collect()
}
