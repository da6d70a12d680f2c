// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token and node kinds for Opal source analysis.
//!
//! This module defines the shared [`Kind`] enumeration used uniformly for
//! lexer tokens and syntax-tree nodes, the [`SyntaxFlags`] bit-set attached
//! to every emitted span, and the two token types that flow through the
//! parse stream:
//!
//! - [`RawToken`] — what the lexer produces: a kind plus a 0-based
//!   half-open byte range and the lexer's `dotted`/`suffix` bits.
//! - [`SyntaxToken`] — a raw token after admission to the lookahead
//!   buffer: offsets converted to 1-based inclusive, plus aggregated
//!   "had leading whitespace" / "had leading newline" bits.
//!
//! Kinds carry no text. The tree is lossless by byte range, so the source
//! slice for any token is recovered from its offsets; this keeps tokens
//! and spans `Copy`.

use std::fmt;

/// The kind of a token or syntax-tree node.
///
/// One homogeneous enumeration covers terminals (literals, keywords,
/// punctuation, trivia) and non-terminal node kinds (`Toplevel`, `Call`,
/// `Quote`, ...). Some kinds do double duty: an assignment node is tagged
/// with the kind of its operator (`Equals`, `PlusEq`, ...), a `where`
/// clause node is tagged `Where`, and a generator iteration is tagged
/// `In`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    // === Trivia ===
    /// A run of spaces and tabs with no newline.
    Whitespace,
    /// A whitespace run containing at least one newline. Kept distinct
    /// because newlines separate statements and matrix rows outside of
    /// parentheses.
    NewlineWs,
    /// A `#` line comment or `#= =#` block comment.
    Comment,

    // === Names ===
    /// An identifier: `foo`, `my_var!`, `π`.
    Identifier,
    /// A raw identifier: `var"end"`.
    VarIdentifier,
    /// A macro name. Only ever emitted as an invisible token, e.g. the
    /// implicit command macro behind a backtick literal.
    MacroName,

    // === Literals ===
    /// An integer literal: `42`, `1_000`, `0xff`.
    Integer,
    /// A floating-point literal: `3.14`, `2.5e10`, `.5`.
    Float,
    /// A double-quoted string: `"hello"`.
    String,
    /// A character literal: `'a'`, `'\n'`.
    Char,
    /// A backtick command literal: `` `ls -l` ``.
    CmdString,
    /// The `true` literal.
    True,
    /// The `false` literal.
    False,

    // === Keywords ===
    /// `end` — block terminator, or a plain index symbol inside `[ ]`.
    End,
    /// `else`
    Else,
    /// `elseif`
    Elseif,
    /// `catch`
    Catch,
    /// `finally`
    Finally,
    /// `for` — introduces generators inside bracketed forms.
    For,
    /// `in` — iteration specifier inside generators; also the node kind
    /// of the iteration itself.
    In,
    /// `where` — type-variable clause; also the node kind of the clause.
    Where,

    // === Delimiters ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // === Operators and punctuation ===
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:` — quote prefix, range operator, or ternary separator.
    Colon,
    /// `.` — field access; also the node kind of a field access.
    Dot,
    /// `?` — ternary conditional.
    Question,
    /// `=` — assignment; also the node kind of an `=` assignment.
    Equals,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `==`
    EqEq,
    /// `~` — assignment-precedence operator that parses as a call.
    Tilde,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,

    // === Markers ===
    /// An error token from the lexer, or an error node from recovery.
    Error,
    /// An invisible span that turned out to be unnecessary. The tree
    /// builder discards these; they exist so mark indices stay valid.
    Tombstone,
    /// The absence of a kind. Used for placeholder heads.
    Nothing,
    /// End of input. Emitted exactly once by the lexer and never
    /// consumed into the span log.
    EndMarker,

    // === Non-terminal node kinds ===
    /// The root node of a parsed source file.
    Toplevel,
    /// A `;`-separated statement block, e.g. `(a; b)`.
    Block,
    /// A `:`-quoted expression.
    Quote,
    /// A function call, operator application, or range.
    Call,
    /// A conditional; the ternary `p ? a : b` lowers here.
    If,
    /// A tuple: `(a, b)`, `a, b`, or `()`.
    Tuple,
    /// A parenthesized expression.
    Parens,
    /// A vector literal: `[a, b]`.
    Vect,
    /// A single-row matrix: `[a b]`.
    Hcat,
    /// A multi-row matrix: `[a b; c d]`.
    Vcat,
    /// One row of a multi-row matrix.
    Row,
    /// A brace collection: `{a, b}`.
    Braces,
    /// A generator: `x for x in xs`.
    Generator,
    /// A bracketed comprehension: `[x for x in xs]`.
    Comprehension,
    /// A macro invocation, e.g. the implicit command macro.
    MacroCall,
    /// An indexing expression: `a[i]`.
    Ref,
}

impl Kind {
    /// Returns `true` if this kind is trivia (whitespace or comments).
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::NewlineWs | Self::Comment)
    }

    /// Returns `true` if this token is a literal value.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Float
                | Self::String
                | Self::Char
                | Self::CmdString
                | Self::True
                | Self::False
        )
    }

    /// Returns `true` if this kind is a reserved word.
    ///
    /// `true` and `false` are literals, not keywords.
    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::End
                | Self::Else
                | Self::Elseif
                | Self::Catch
                | Self::Finally
                | Self::For
                | Self::In
                | Self::Where
        )
    }

    /// Returns `true` if this kind is an assignment operator.
    ///
    /// `~` sits at assignment precedence but is not syntactic assignment;
    /// it is excluded here.
    #[must_use]
    pub const fn is_assignment_op(self) -> bool {
        matches!(
            self,
            Self::Equals | Self::PlusEq | Self::MinusEq | Self::StarEq | Self::SlashEq
        )
    }

    /// Returns `true` for operator tokens that may carry a prime suffix.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Tilde
                | Self::EqEq
                | Self::Equals
                | Self::PlusEq
                | Self::MinusEq
                | Self::StarEq
                | Self::SlashEq
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Whitespace => "whitespace",
            Self::NewlineWs => "newline",
            Self::Comment => "comment",
            Self::Identifier => "identifier",
            Self::VarIdentifier => "var-identifier",
            Self::MacroName => "macro name",
            Self::Integer => "integer literal",
            Self::Float => "float literal",
            Self::String => "string literal",
            Self::Char => "character literal",
            Self::CmdString => "command literal",
            Self::True => "true",
            Self::False => "false",
            Self::End => "end",
            Self::Else => "else",
            Self::Elseif => "elseif",
            Self::Catch => "catch",
            Self::Finally => "finally",
            Self::For => "for",
            Self::In => "in",
            Self::Where => "where",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Question => "?",
            Self::Equals => "=",
            Self::PlusEq => "+=",
            Self::MinusEq => "-=",
            Self::StarEq => "*=",
            Self::SlashEq => "/=",
            Self::EqEq => "==",
            Self::Tilde => "~",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Error => "error",
            Self::Tombstone => "tombstone",
            Self::Nothing => "nothing",
            Self::EndMarker => "end of input",
            Self::Toplevel => "toplevel",
            Self::Block => "block",
            Self::Quote => "quote",
            Self::Call => "call",
            Self::If => "if",
            Self::Tuple => "tuple",
            Self::Parens => "parens",
            Self::Vect => "vect",
            Self::Hcat => "hcat",
            Self::Vcat => "vcat",
            Self::Row => "row",
            Self::Braces => "braces",
            Self::Generator => "generator",
            Self::Comprehension => "comprehension",
            Self::MacroCall => "macrocall",
            Self::Ref => "ref",
        };
        f.write_str(text)
    }
}

/// Per-span metadata bits.
///
/// Flags travel with every emitted span. The parser sets
/// [`SyntaxFlags::TRIVIA`] on spans that are structurally irrelevant
/// (whitespace, comments, consumed punctuation); the lexer's `dotted` and
/// `suffix` token bits are folded in when a token is bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SyntaxFlags(u16);

impl SyntaxFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);
    /// The span is structurally irrelevant to the tree's meaning.
    pub const TRIVIA: Self = Self(1 << 0);
    /// The token was a `.`-prefixed (broadcast) operator form.
    pub const DOTTED: Self = Self(1 << 1);
    /// The token carried an operator-name suffix.
    pub const SUFFIX: Self = Self(1 << 2);
    /// The token was consumed as part of error recovery.
    pub const ERROR: Self = Self(1 << 3);

    /// Returns `true` if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flags are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for SyntaxFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SyntaxFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The head of a span or tree node: a kind plus its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxHead {
    kind: Kind,
    flags: SyntaxFlags,
}

impl SyntaxHead {
    /// Creates a new head.
    #[must_use]
    pub const fn new(kind: Kind, flags: SyntaxFlags) -> Self {
        Self { kind, flags }
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(self) -> Kind {
        self.kind
    }

    /// Returns the flags.
    #[must_use]
    pub const fn flags(self) -> SyntaxFlags {
        self.flags
    }

    /// Returns `true` if the trivia flag is set.
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        self.flags.contains(SyntaxFlags::TRIVIA)
    }
}

/// A token as produced by the lexer.
///
/// `start` and `end` are 0-based half-open byte offsets, the natural
/// convention for slicing source text; the parse stream converts them to
/// the span log's 1-based inclusive convention on entry. The `dotted`
/// and `suffix` bits record operator spellings the parser folds into
/// span flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    kind: Kind,
    start: u32,
    end: u32,
    dotted: bool,
    suffix: bool,
}

impl RawToken {
    /// Creates a new raw token.
    #[must_use]
    pub const fn new(kind: Kind, start: u32, end: u32, dotted: bool, suffix: bool) -> Self {
        Self {
            kind,
            start,
            end,
            dotted,
            suffix,
        }
    }

    /// Returns the token kind.
    #[must_use]
    pub const fn kind(self) -> Kind {
        self.kind
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns the length of the token in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` for a zero-width token (only the end marker).
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    #[must_use]
    pub const fn byte_range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Returns `true` for a `.`-prefixed operator form.
    #[must_use]
    pub const fn dotted(self) -> bool {
        self.dotted
    }

    /// Returns `true` for an operator with a name suffix.
    #[must_use]
    pub const fn suffix(self) -> bool {
        self.suffix
    }
}

/// A token inside the parse stream's lookahead buffer.
///
/// Offsets are 1-based inclusive. The `had_whitespace` / `had_newline`
/// bits aggregate the run of trivia since the previous non-trivia token;
/// they are computed once when the token is buffered and never
/// recomputed on peeks. Whitespace-sensitive decisions (space-sensitive
/// operator parsing, quote-after-colon checks) read only these two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxToken {
    kind: Kind,
    first_byte: u32,
    last_byte: u32,
    dotted: bool,
    suffix: bool,
    had_whitespace: bool,
    had_newline: bool,
}

impl SyntaxToken {
    /// Converts a raw token, attaching the aggregated trivia bits.
    #[must_use]
    pub const fn new(raw: RawToken, had_whitespace: bool, had_newline: bool) -> Self {
        Self {
            kind: raw.kind,
            first_byte: raw.start + 1,
            last_byte: raw.end,
            dotted: raw.dotted,
            suffix: raw.suffix,
            had_whitespace,
            had_newline,
        }
    }

    /// Returns the token kind.
    #[must_use]
    pub const fn kind(self) -> Kind {
        self.kind
    }

    /// Returns the first byte of the token, 1-based inclusive.
    #[must_use]
    pub const fn first_byte(self) -> u32 {
        self.first_byte
    }

    /// Returns the last byte of the token, 1-based inclusive.
    #[must_use]
    pub const fn last_byte(self) -> u32 {
        self.last_byte
    }

    /// Returns `true` for a `.`-prefixed operator form.
    #[must_use]
    pub const fn dotted(self) -> bool {
        self.dotted
    }

    /// Returns `true` for an operator with a name suffix.
    #[must_use]
    pub const fn suffix(self) -> bool {
        self.suffix
    }

    /// Returns `true` if any trivia preceded this token.
    #[must_use]
    pub const fn had_whitespace(self) -> bool {
        self.had_whitespace
    }

    /// Returns `true` if a newline preceded this token.
    #[must_use]
    pub const fn had_newline(self) -> bool {
        self.had_newline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        assert!(Kind::Whitespace.is_trivia());
        assert!(Kind::NewlineWs.is_trivia());
        assert!(Kind::Comment.is_trivia());
        assert!(!Kind::Identifier.is_trivia());

        assert!(Kind::Integer.is_literal());
        assert!(Kind::CmdString.is_literal());
        assert!(Kind::True.is_literal());
        assert!(!Kind::Identifier.is_literal());

        assert!(Kind::End.is_keyword());
        assert!(Kind::Where.is_keyword());
        assert!(!Kind::True.is_keyword());

        assert!(Kind::Equals.is_assignment_op());
        assert!(Kind::PlusEq.is_assignment_op());
        assert!(!Kind::Tilde.is_assignment_op());
        assert!(!Kind::EqEq.is_assignment_op());
    }

    #[test]
    fn kind_display() {
        assert_eq!(Kind::Equals.to_string(), "=");
        assert_eq!(Kind::RBracket.to_string(), "]");
        assert_eq!(Kind::End.to_string(), "end");
        assert_eq!(Kind::EndMarker.to_string(), "end of input");
        assert_eq!(Kind::Vect.to_string(), "vect");
    }

    #[test]
    fn flags_ops() {
        let f = SyntaxFlags::TRIVIA | SyntaxFlags::DOTTED;
        assert!(f.contains(SyntaxFlags::TRIVIA));
        assert!(f.contains(SyntaxFlags::DOTTED));
        assert!(!f.contains(SyntaxFlags::SUFFIX));
        assert!(SyntaxFlags::EMPTY.is_empty());
        assert!(!f.is_empty());

        let mut g = SyntaxFlags::EMPTY;
        g |= SyntaxFlags::ERROR;
        assert!(g.contains(SyntaxFlags::ERROR));
    }

    #[test]
    fn syntax_head() {
        let head = SyntaxHead::new(Kind::Comment, SyntaxFlags::TRIVIA);
        assert_eq!(head.kind(), Kind::Comment);
        assert!(head.is_trivia());

        let head = SyntaxHead::new(Kind::Identifier, SyntaxFlags::EMPTY);
        assert!(!head.is_trivia());
    }

    #[test]
    fn raw_token_offsets() {
        let raw = RawToken::new(Kind::Identifier, 2, 5, false, false);
        assert_eq!(raw.start(), 2);
        assert_eq!(raw.end(), 5);
        assert_eq!(raw.len(), 3);
        assert!(!raw.is_empty());
        assert_eq!(raw.byte_range(), 2..5);
    }

    #[test]
    fn syntax_token_offset_conversion() {
        // Lexer offsets [0, 3) become bytes 1..=3.
        let raw = RawToken::new(Kind::Identifier, 0, 3, false, false);
        let tok = SyntaxToken::new(raw, true, false);
        assert_eq!(tok.first_byte(), 1);
        assert_eq!(tok.last_byte(), 3);
        assert!(tok.had_whitespace());
        assert!(!tok.had_newline());
    }

    #[test]
    fn syntax_token_zero_width() {
        // A zero-width end marker at offset 5 becomes 6..=5.
        let raw = RawToken::new(Kind::EndMarker, 5, 5, false, false);
        let tok = SyntaxToken::new(raw, false, false);
        assert!(raw.is_empty());
        assert_eq!(tok.first_byte(), 6);
        assert_eq!(tok.last_byte(), 5);
    }
}
