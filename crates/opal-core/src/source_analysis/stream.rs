// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The parse stream: buffered lookahead over the lexer, plus the span log
//! the parser emits into.
//!
//! [`ParseStream`] sits between the lexer and the recursive descent
//! productions. It plays two roles:
//!
//! - **Token source.** Raw tokens are pulled lazily into a lookahead
//!   buffer; [`ParseStream::peek`] inspects upcoming significant tokens
//!   and [`ParseStream::bump`] consumes one significant token together
//!   with its leading trivia.
//! - **Tree sink.** Every consumed token and every finished production
//!   appends a [`TaggedRange`] to a flat span log. Interior nodes are
//!   emitted *after* their children, covering them by byte range; the
//!   tree builder (see [`crate::tree`]) folds the log into a concrete
//!   tree. Because trivia is logged too, the tree reproduces the source
//!   byte-for-byte.
//!
//! Offsets in the span log are 1-based inclusive; a zero-width span at
//! byte `p` has `first_byte == p` and `last_byte == p - 1`. The lexer's
//! 0-based half-open spans are converted on entry.
//!
//! # Error handling
//!
//! Syntax errors never abort the parse. A production that cannot proceed
//! consumes the offending token with [`ParseStream::bump_error`] (or
//! attaches a [`Diagnostic`] with [`ParseStream::emit_diagnostic`]) and
//! returns as if it had succeeded. The only panic is the progress guard:
//! a production that peeks [`PEEK_LIMIT`] times without consuming
//! anything is a parser bug, reported as "parser stuck".

use std::collections::VecDeque;

use ecow::EcoString;

use super::lexer::Lexer;
use super::token::{Kind, SyntaxFlags, SyntaxHead, SyntaxToken};

/// Peeks allowed without an intervening bump before the stream declares
/// the parser stuck. A structural guard against non-progressing loops in
/// the descent productions, not a tunable.
pub const PEEK_LIMIT: u32 = 100_000;

/// A tagged byte range: the unit of tree emission.
///
/// Offsets are 1-based inclusive, with `first_byte <= last_byte + 1`; a
/// zero-width ("invisible") span has `last_byte == first_byte - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedRange {
    head: SyntaxHead,
    first_byte: u32,
    last_byte: u32,
}

impl TaggedRange {
    /// Creates a new tagged range.
    #[must_use]
    pub const fn new(head: SyntaxHead, first_byte: u32, last_byte: u32) -> Self {
        Self {
            head,
            first_byte,
            last_byte,
        }
    }

    /// Returns the head (kind and flags).
    #[must_use]
    pub const fn head(self) -> SyntaxHead {
        self.head
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(self) -> Kind {
        self.head.kind()
    }

    /// Returns the flags.
    #[must_use]
    pub const fn flags(self) -> SyntaxFlags {
        self.head.flags()
    }

    /// Returns the first byte, 1-based inclusive.
    #[must_use]
    pub const fn first_byte(self) -> u32 {
        self.first_byte
    }

    /// Returns the last byte, 1-based inclusive.
    #[must_use]
    pub const fn last_byte(self) -> u32 {
        self.last_byte
    }

    /// Returns the width in bytes (zero for invisible spans).
    #[must_use]
    pub const fn width(self) -> u32 {
        self.last_byte + 1 - self.first_byte
    }

    /// Returns `true` for a zero-width span.
    #[must_use]
    pub const fn is_zero_width(self) -> bool {
        self.last_byte + 1 == self.first_byte
    }
}

/// A stable position in the stream, used as the start of interior spans.
///
/// Marks survive arbitrary subsequent emissions; a mark taken before a
/// production's children are parsed defines the byte where the
/// production's own node begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark {
    byte: u32,
}

impl Mark {
    /// Returns the byte position of this mark, 1-based.
    #[must_use]
    pub const fn byte(self) -> u32 {
        self.byte
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A syntax error. The parse continues, but the tree contains error
    /// nodes.
    Error,
    /// A warning that should be addressed.
    Warning,
}

/// A diagnostic message attached to a source range.
///
/// Ranges use the span log's 1-based inclusive convention. Diagnostics
/// never interrupt parsing; they are collected on the stream in the
/// order raised, which is also source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message text.
    pub message: EcoString,
    /// First byte of the range, 1-based inclusive.
    pub first_byte: u32,
    /// Last byte of the range, 1-based inclusive. May be `first_byte - 1`
    /// for a zero-width range.
    pub last_byte: u32,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, first_byte: u32, last_byte: u32) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            first_byte,
            last_byte,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, first_byte: u32, last_byte: u32) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            first_byte,
            last_byte,
        }
    }
}

impl From<&Diagnostic> for miette::SourceSpan {
    fn from(diag: &Diagnostic) -> Self {
        let offset = diag.first_byte.saturating_sub(1) as usize;
        let len = (diag.last_byte + 1 - diag.first_byte) as usize;
        (offset, len).into()
    }
}

/// Buffered, lookahead-capable token source and span sink.
///
/// Created per source input, mutated by the parser, consumed by the tree
/// builder.
///
/// # Examples
///
/// ```
/// use opal_core::source_analysis::{Kind, ParseStream, SyntaxFlags};
///
/// let mut stream = ParseStream::new("a + b");
/// assert_eq!(stream.peek(1, false), Kind::Identifier);
/// assert_eq!(stream.peek(2, false), Kind::Plus);
/// stream.bump(SyntaxFlags::EMPTY, false);
/// // The consumed identifier is now in the span log.
/// assert_eq!(stream.spans().len(), 1);
/// ```
#[derive(Debug)]
pub struct ParseStream<'src> {
    /// The lexer this stream draws from.
    lexer: Lexer<'src>,
    /// Tokens buffered ahead of the parser, oldest first.
    lookahead: VecDeque<SyntaxToken>,
    /// The span log: the tree in linearised form.
    spans: Vec<TaggedRange>,
    /// Diagnostics raised so far, in source order.
    diagnostics: Vec<Diagnostic>,
    /// One past the last byte of the most recent non-invisible span;
    /// equivalently, the first byte of the next token to consume.
    next_byte: u32,
    /// Peeks since the last consumption; see [`PEEK_LIMIT`].
    peek_count: u32,
}

impl<'src> ParseStream<'src> {
    /// Creates a stream over the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            spans: Vec::new(),
            diagnostics: Vec::new(),
            next_byte: 1,
            peek_count: 0,
        }
    }

    /// Returns the span log emitted so far.
    #[must_use]
    pub fn spans(&self) -> &[TaggedRange] {
        &self.spans
    }

    /// Returns the diagnostics raised so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the stream, returning the span log and diagnostics.
    #[must_use]
    pub fn finish(self) -> (Vec<TaggedRange>, Vec<Diagnostic>) {
        (self.spans, self.diagnostics)
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    /// Draws raw tokens from the lexer until a non-trivia token is
    /// buffered. Every token in the run carries the aggregated "had
    /// whitespace" / "had newline" bits for the trivia preceding it.
    fn buffer_lookahead(&mut self) {
        let mut had_whitespace = false;
        let mut had_newline = false;
        while let Some(raw) = self.lexer.next() {
            let kind = raw.kind();
            self.lookahead
                .push_back(SyntaxToken::new(raw, had_whitespace, had_newline));
            match kind {
                Kind::Whitespace | Kind::Comment => had_whitespace = true,
                Kind::NewlineWs => {
                    had_whitespace = true;
                    had_newline = true;
                }
                _ => return,
            }
        }
        // The lexer ends with an EndMarker; callers clamp there before
        // asking for more.
        debug_assert!(
            self.lookahead
                .back()
                .is_some_and(|t| t.kind() == Kind::EndMarker),
            "lexer exhausted without an end marker"
        );
    }

    /// Returns the index into the lookahead buffer of the `n`-th
    /// significant token (1-based `n`). `Whitespace` and `Comment` are
    /// always insignificant; `NewlineWs` only when `skip_newlines`.
    /// Lookahead past the end marker clamps to the end marker.
    fn lookahead_index(&mut self, n: usize, skip_newlines: bool) -> usize {
        debug_assert!(n >= 1, "lookahead is 1-based");
        let mut remaining = n;
        let mut i = 0;
        loop {
            if i >= self.lookahead.len() {
                if self
                    .lookahead
                    .back()
                    .is_some_and(|t| t.kind() == Kind::EndMarker)
                {
                    return self.lookahead.len() - 1;
                }
                self.buffer_lookahead();
                continue;
            }
            let tok = self.lookahead[i];
            let significant = match tok.kind() {
                Kind::Whitespace | Kind::Comment => false,
                Kind::NewlineWs => !skip_newlines,
                _ => true,
            };
            if significant {
                remaining -= 1;
                if remaining == 0 || tok.kind() == Kind::EndMarker {
                    return i;
                }
            }
            i += 1;
        }
    }

    /// Records a peek and enforces the progress guard.
    fn note_peek(&mut self) {
        self.peek_count += 1;
        assert!(
            self.peek_count <= PEEK_LIMIT,
            "parser stuck: {} peeks without progress at byte {}",
            self.peek_count,
            self.next_byte
        );
    }

    /// Returns the `n`-th significant token ahead without consuming
    /// anything.
    ///
    /// # Panics
    ///
    /// Panics with "parser stuck" if called [`PEEK_LIMIT`] times without
    /// an intervening bump.
    pub fn peek_token(&mut self, n: usize, skip_newlines: bool) -> SyntaxToken {
        self.note_peek();
        let idx = self.lookahead_index(n, skip_newlines);
        self.lookahead[idx]
    }

    /// Returns the kind of the `n`-th significant token ahead.
    ///
    /// # Panics
    ///
    /// Panics with "parser stuck" if called [`PEEK_LIMIT`] times without
    /// an intervening bump.
    pub fn peek(&mut self, n: usize, skip_newlines: bool) -> Kind {
        self.peek_token(n, skip_newlines).kind()
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    fn bump_impl(
        &mut self,
        flags: SyntaxFlags,
        skip_newlines: bool,
        new_kind: Option<Kind>,
        error: Option<&str>,
    ) -> usize {
        let start_byte = self.next_byte;
        let idx = self.lookahead_index(1, skip_newlines);
        let mut last_index = self.spans.len();
        let mut consumed = false;
        for i in 0..=idx {
            let Some(&tok) = self.lookahead.front() else {
                break;
            };
            if tok.kind() == Kind::EndMarker {
                // The end marker is never consumed into the span log.
                break;
            }
            self.lookahead.pop_front();
            let head = if i == idx {
                let mut f = flags;
                if tok.dotted() {
                    f |= SyntaxFlags::DOTTED;
                }
                if tok.suffix() {
                    f |= SyntaxFlags::SUFFIX;
                }
                if error.is_some() {
                    f |= SyntaxFlags::ERROR;
                }
                let kind = match new_kind {
                    Some(k) if k != Kind::Nothing => k,
                    _ => tok.kind(),
                };
                SyntaxHead::new(kind, f)
            } else {
                SyntaxHead::new(tok.kind(), SyntaxFlags::TRIVIA)
            };
            last_index = self.spans.len();
            self.spans
                .push(TaggedRange::new(head, tok.first_byte(), tok.last_byte()));
            self.next_byte = tok.last_byte() + 1;
            consumed = true;
        }
        if consumed {
            self.peek_count = 0;
        }
        if let Some(message) = error {
            let first = start_byte;
            let last = self.next_byte - 1;
            self.spans.push(TaggedRange::new(
                SyntaxHead::new(Kind::Error, SyntaxFlags::TRIVIA),
                first,
                last,
            ));
            self.diagnostics.push(Diagnostic::error(message, first, last));
        }
        last_index
    }

    /// Consumes the next significant token plus its leading trivia.
    ///
    /// Trivia spans get [`SyntaxFlags::TRIVIA`] and keep their kinds; the
    /// significant token gets the caller's `flags`, with the lexer's
    /// dotted/suffix bits folded in. Returns the span-log index of the
    /// significant token, usable with [`ParseStream::reset_token`].
    pub fn bump(&mut self, flags: SyntaxFlags, skip_newlines: bool) -> usize {
        self.bump_impl(flags, skip_newlines, None, None)
    }

    /// Like [`ParseStream::bump`], but records the significant token
    /// under `new_kind` instead of its lexed kind (unless `new_kind` is
    /// [`Kind::Nothing`]).
    pub fn bump_remap(&mut self, flags: SyntaxFlags, skip_newlines: bool, new_kind: Kind) -> usize {
        self.bump_impl(flags, skip_newlines, Some(new_kind), None)
    }

    /// Like [`ParseStream::bump`], but additionally wraps the consumed
    /// range in a trivia-flagged [`Kind::Error`] span and raises a
    /// matching [`Diagnostic`].
    pub fn bump_error(&mut self, flags: SyntaxFlags, skip_newlines: bool, message: &str) -> usize {
        self.bump_impl(flags, skip_newlines, None, Some(message))
    }

    /// Consumes only the leading trivia before the next significant
    /// token.
    pub fn bump_trivia(&mut self, skip_newlines: bool) {
        let idx = self.lookahead_index(1, skip_newlines);
        for _ in 0..idx {
            let Some(&tok) = self.lookahead.front() else {
                break;
            };
            self.lookahead.pop_front();
            self.spans.push(TaggedRange::new(
                SyntaxHead::new(tok.kind(), SyntaxFlags::TRIVIA),
                tok.first_byte(),
                tok.last_byte(),
            ));
            self.next_byte = tok.last_byte() + 1;
        }
        if idx > 0 {
            self.peek_count = 0;
        }
    }

    /// Emits a zero-width span at the current position, for implicit
    /// tokens such as an elided `*` or a synthesized macro name. Returns
    /// the span-log index, so the span can later be tombstoned with
    /// [`ParseStream::reset_token`] if it proves unnecessary.
    pub fn bump_invisible(&mut self, kind: Kind, flags: SyntaxFlags) -> usize {
        let index = self.spans.len();
        self.spans.push(TaggedRange::new(
            SyntaxHead::new(kind, flags),
            self.next_byte,
            self.next_byte - 1,
        ));
        index
    }

    // ========================================================================
    // Emission
    // ========================================================================

    /// Returns the current position as a [`Mark`].
    #[must_use]
    pub fn position(&self) -> Mark {
        Mark {
            byte: self.next_byte,
        }
    }

    /// Appends an interior-node span covering everything emitted since
    /// `mark`. Interior spans may enclose previously-emitted spans; the
    /// tree builder folds them by byte-range containment.
    pub fn emit(&mut self, mark: Mark, kind: Kind, flags: SyntaxFlags) {
        self.spans.push(TaggedRange::new(
            SyntaxHead::new(kind, flags),
            mark.byte,
            self.next_byte - 1,
        ));
    }

    /// Appends an [`Kind::Error`] interior span covering everything since
    /// `mark`, plus a diagnostic over the same range.
    pub fn emit_error(&mut self, mark: Mark, message: &str) {
        let last = self.next_byte - 1;
        self.spans.push(TaggedRange::new(
            SyntaxHead::new(Kind::Error, SyntaxFlags::EMPTY),
            mark.byte,
            last,
        ));
        self.diagnostics
            .push(Diagnostic::error(message, mark.byte, last));
    }

    /// Raises a diagnostic without consuming or emitting anything.
    ///
    /// The diagnostic covers the next significant token's range, or, when
    /// `whitespace` is true and trivia is pending, the range of that
    /// pending trivia run.
    pub fn emit_diagnostic(&mut self, skip_newlines: bool, whitespace: bool, message: &str) {
        let idx = self.lookahead_index(1, skip_newlines);
        let tok = self.lookahead[idx];
        let (first, last) = if whitespace && tok.first_byte() > self.next_byte {
            (self.next_byte, tok.first_byte() - 1)
        } else {
            (tok.first_byte(), tok.last_byte())
        };
        self.diagnostics.push(Diagnostic::error(message, first, last));
    }

    /// Rewrites the kind and/or flags of an already-emitted span in
    /// place. `index` comes from a previous bump or
    /// [`ParseStream::bump_invisible`].
    ///
    /// The span log is append-only in position but mutable in content: a
    /// token's role is sometimes decided only after more input is seen.
    /// Setting the kind to [`Kind::Tombstone`] retracts an invisible span
    /// without disturbing mark indices.
    pub fn reset_token(&mut self, index: usize, kind: Option<Kind>, flags: Option<SyntaxFlags>) {
        let span = self.spans[index];
        self.spans[index] = TaggedRange::new(
            SyntaxHead::new(kind.unwrap_or(span.kind()), flags.unwrap_or(span.flags())),
            span.first_byte(),
            span.last_byte(),
        );
    }
}
