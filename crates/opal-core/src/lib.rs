// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Opal compiler core.
//!
//! This crate contains the source-analysis core of the Opal compiler:
//! - Lexical analysis (tokenization with trivia preserved)
//! - Parsing (lossless concrete syntax tree construction)
//! - Diagnostics (collection and terminal rendering)
//!
//! The parser is designed as a language-service front end: it always
//! produces a tree covering every byte of the input, recovering from
//! syntax errors locally and reporting all of them.
//!
//! # Example
//!
//! ```
//! use opal_core::prelude::*;
//!
//! let source = "x = [1 2; 3 4]";
//! let (tree, diagnostics) = parse(source);
//! assert!(diagnostics.is_empty());
//! // The tree is lossless: its leaves reproduce the source exactly.
//! assert_eq!(tree.render(source), source);
//! ```

pub mod source_analysis;
pub mod tree;

/// Re-export of commonly used types.
pub mod prelude {
    pub use crate::source_analysis::{
        Diagnostic, Kind, LanguageVersion, Severity, SyntaxFlags, SyntaxHead, parse,
        parse_at_version, render_diagnostics,
    };
    pub use crate::tree::{GreenNode, TreeError, build_tree};
}
