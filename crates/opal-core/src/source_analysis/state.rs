// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parser context threading.
//!
//! [`ParseState`] carries the context flags that make Opal's grammatical
//! corner cases decidable with a single production per nonterminal:
//! whether `:` forms ranges, whether whitespace before a unary operator
//! starts a new matrix element, whether `end` is an index symbol, and so
//! on.
//!
//! A production that needs different context builds a *derived* state
//! ([`ParseState::derived`] plus the `with_*` constructors) and passes it
//! down; the caller's state is never touched. Because the flags live in a
//! small by-value struct, this costs nothing, and a production that bails
//! out mid-way never has to restore anything.
//!
//! The state also wraps the token I/O of the underlying
//! [`ParseStream`], defaulting `skip_newlines` to the
//! `whitespace_newline` flag so productions read and consume tokens under
//! the newline discipline of their own context.

use super::stream::{Mark, ParseStream};
use super::token::{Kind, SyntaxFlags, SyntaxToken};

/// The language version the parser targets.
///
/// Stored on every [`ParseState`] so version-gated grammar can be added
/// without replumbing; the current grammar accepts the same input at
/// every version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl LanguageVersion {
    /// The version parsed by default.
    pub const CURRENT: Self = Self { major: 1, minor: 0 };

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

/// Parser context: a borrowed stream plus the six context flags.
///
/// Flag defaults match the top level of a source file: ranges enabled,
/// `where` enabled, everything else off.
///
/// | Flag | Meaning when true |
/// |------|-------------------|
/// | `range_colon_enabled` | `:` forms ranges; disabled inside ternary `?:` |
/// | `space_sensitive` | whitespace before a unary operator starts a new expression |
/// | `for_generator` | `for` terminates expression parsing and forms a generator |
/// | `end_symbol` | `end` is a plain index symbol, not a block terminator |
/// | `whitespace_newline` | newlines are ordinary whitespace |
/// | `where_enabled` | `where` clauses parse at higher-than-assignment precedence |
#[derive(Debug)]
pub struct ParseState<'a, 'src> {
    stream: &'a mut ParseStream<'src>,
    version: LanguageVersion,
    pub(crate) range_colon_enabled: bool,
    pub(crate) space_sensitive: bool,
    pub(crate) for_generator: bool,
    pub(crate) end_symbol: bool,
    pub(crate) whitespace_newline: bool,
    pub(crate) where_enabled: bool,
}

impl<'a, 'src> ParseState<'a, 'src> {
    /// Creates a top-level parse state over a stream.
    pub fn new(stream: &'a mut ParseStream<'src>, version: LanguageVersion) -> Self {
        Self {
            stream,
            version,
            range_colon_enabled: true,
            space_sensitive: false,
            for_generator: false,
            end_symbol: false,
            whitespace_newline: false,
            where_enabled: true,
        }
    }

    /// Returns the target language version.
    #[must_use]
    pub fn version(&self) -> LanguageVersion {
        self.version
    }

    /// Returns a derived state borrowing the same stream, with the same
    /// flags. Combine with the `with_*` constructors to override flags
    /// for a nested grammatical context:
    ///
    /// ```ignore
    /// let mut inner = ps.derived().with_end_symbol(true);
    /// parse_atom(&mut inner, true);
    /// // `ps` is unchanged.
    /// ```
    pub fn derived(&mut self) -> ParseState<'_, 'src> {
        ParseState {
            stream: &mut *self.stream,
            version: self.version,
            range_colon_enabled: self.range_colon_enabled,
            space_sensitive: self.space_sensitive,
            for_generator: self.for_generator,
            end_symbol: self.end_symbol,
            whitespace_newline: self.whitespace_newline,
            where_enabled: self.where_enabled,
        }
    }

    /// Sets whether `:` forms ranges.
    #[must_use]
    pub fn with_range_colon_enabled(mut self, value: bool) -> Self {
        self.range_colon_enabled = value;
        self
    }

    /// Sets whether leading whitespace before a unary operator starts a
    /// new expression.
    #[must_use]
    pub fn with_space_sensitive(mut self, value: bool) -> Self {
        self.space_sensitive = value;
        self
    }

    /// Sets whether `for` terminates expression parsing to form a
    /// generator.
    #[must_use]
    pub fn with_for_generator(mut self, value: bool) -> Self {
        self.for_generator = value;
        self
    }

    /// Sets whether `end` is a plain index symbol.
    #[must_use]
    pub fn with_end_symbol(mut self, value: bool) -> Self {
        self.end_symbol = value;
        self
    }

    /// Sets whether newlines count as ordinary whitespace.
    #[must_use]
    pub fn with_whitespace_newline(mut self, value: bool) -> Self {
        self.whitespace_newline = value;
        self
    }

    /// Sets whether `where` clauses are parsed.
    #[must_use]
    pub fn with_where_enabled(mut self, value: bool) -> Self {
        self.where_enabled = value;
        self
    }

    // ========================================================================
    // Stream delegation
    // ========================================================================
    //
    // Productions use these instead of the raw stream API so that
    // newline significance always follows the current context.

    /// Peeks the kind of the `n`-th significant token ahead.
    pub fn peek(&mut self, n: usize) -> Kind {
        self.stream.peek(n, self.whitespace_newline)
    }

    /// Peeks the `n`-th significant token ahead.
    pub fn peek_token(&mut self, n: usize) -> SyntaxToken {
        self.stream.peek_token(n, self.whitespace_newline)
    }

    /// Consumes the next significant token plus leading trivia.
    pub fn bump(&mut self, flags: SyntaxFlags) -> usize {
        self.stream.bump(flags, self.whitespace_newline)
    }

    /// Consumes the next significant token, recording it as `new_kind`.
    pub fn bump_remap(&mut self, flags: SyntaxFlags, new_kind: Kind) -> usize {
        self.stream.bump_remap(flags, self.whitespace_newline, new_kind)
    }

    /// Consumes the next significant token as an error.
    pub fn bump_error(&mut self, flags: SyntaxFlags, message: &str) -> usize {
        self.stream.bump_error(flags, self.whitespace_newline, message)
    }

    /// Consumes only pending trivia.
    pub fn bump_trivia(&mut self) {
        self.stream.bump_trivia(self.whitespace_newline);
    }

    /// Emits a zero-width span at the current position.
    pub fn bump_invisible(&mut self, kind: Kind, flags: SyntaxFlags) -> usize {
        self.stream.bump_invisible(kind, flags)
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> Mark {
        self.stream.position()
    }

    /// Emits an interior-node span covering everything since `mark`.
    pub fn emit(&mut self, mark: Mark, kind: Kind, flags: SyntaxFlags) {
        self.stream.emit(mark, kind, flags);
    }

    /// Raises a diagnostic on the next token, or on the pending trivia
    /// when `whitespace` is true.
    pub fn emit_diagnostic(&mut self, whitespace: bool, message: &str) {
        self.stream
            .emit_diagnostic(self.whitespace_newline, whitespace, message);
    }

    /// Rewrites an already-emitted span in place.
    pub fn reset_token(&mut self, index: usize, kind: Option<Kind>, flags: Option<SyntaxFlags>) {
        self.stream.reset_token(index, kind, flags);
    }
}
