// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for Opal source code.
//!
//! **DDD Context:** Source Analysis
//!
//! This module contains the lexer, the parse stream, and the recursive
//! descent parser.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`RawToken`]s.
//! Trivia (whitespace and comments) are ordinary tokens, so the token
//! stream covers every byte of the input.
//!
//! ```
//! use opal_core::source_analysis::{Kind, Lexer};
//!
//! let tokens: Vec<_> = Lexer::new("x + 1").collect();
//! assert_eq!(tokens.len(), 6); // x, space, +, space, 1, end marker
//! ```
//!
//! # Parsing
//!
//! The [`parse`] function drives the descent productions over a
//! [`ParseStream`] and folds the resulting span log into a lossless
//! [`crate::tree::GreenNode`]. Rendering the tree reproduces the source
//! byte-for-byte, errors included.
//!
//! ```
//! use opal_core::source_analysis::parse;
//!
//! let (tree, diagnostics) = parse("x = [1, 2]");
//! assert!(diagnostics.is_empty());
//! assert_eq!(tree.render("x = [1, 2]"), "x = [1, 2]");
//! ```
//!
//! # Error Handling
//!
//! Neither the lexer nor the parser ever fails: malformed input becomes
//! [`Kind::Error`] tokens and in-band error spans, each with a
//! [`Diagnostic`] attached. Use [`render_diagnostics`] to print them
//! against the source.

mod diagnostic;
mod lexer;
mod parser;
mod state;
mod stream;
mod token;

pub use diagnostic::{normalized_range, render_diagnostic, render_diagnostics};
pub use lexer::{Lexer, lex};
pub use parser::{parse, parse_at_version};
pub use state::{LanguageVersion, ParseState};
pub use stream::{Diagnostic, Mark, PEEK_LIMIT, ParseStream, Severity, TaggedRange};
pub use token::{Kind, RawToken, SyntaxFlags, SyntaxHead, SyntaxToken};
