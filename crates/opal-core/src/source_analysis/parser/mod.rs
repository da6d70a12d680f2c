// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Opal source code.
//!
//! The parser drives a [`ParseStream`] and produces a lossless
//! [`GreenNode`] tree plus diagnostics. It is designed for IDE use with
//! comprehensive error recovery.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** — parsing MUST always produce a
//!   tree covering every input byte
//! - **Multiple errors** — report all errors, don't stop at the first
//! - **Precise spans** — every diagnostic points to an exact source
//!   range
//! - **Local recovery** — a production that cannot proceed records a
//!   diagnostic (usually consuming the offending token into an error
//!   span) and returns as if it had succeeded
//!
//! Grammatical context travels through [`ParseState`] flags rather than
//! parser-global state; see [`crate::source_analysis::state`]. The
//! expression grammar lives in [`expressions`].
//!
//! # Usage
//!
//! ```
//! use opal_core::source_analysis::parse;
//!
//! let (tree, diagnostics) = parse("x = [1, 2]");
//! assert!(diagnostics.is_empty());
//! assert_eq!(tree.render("x = [1, 2]"), "x = [1, 2]");
//! ```

mod expressions;


use crate::source_analysis::state::{LanguageVersion, ParseState};
use crate::source_analysis::stream::{Diagnostic, ParseStream};
use crate::source_analysis::token::{Kind, SyntaxFlags};
use crate::tree::{GreenNode, build_tree};

use expressions::parse_eq;

/// Parses source text into a lossless tree and diagnostics.
///
/// The tree covers every byte of `source`; check the diagnostics to see
/// whether the input was well-formed.
///
/// # Examples
///
/// ```
/// use opal_core::source_analysis::parse;
///
/// let (tree, diagnostics) = parse("a = b + 1");
/// assert!(diagnostics.is_empty());
/// assert_eq!(tree.render("a = b + 1"), "a = b + 1");
/// ```
#[must_use]
pub fn parse(source: &str) -> (GreenNode, Vec<Diagnostic>) {
    parse_at_version(source, LanguageVersion::CURRENT)
}

/// Like [`parse`], targeting a specific language version.
#[must_use]
pub fn parse_at_version(
    source: &str,
    version: LanguageVersion,
) -> (GreenNode, Vec<Diagnostic>) {
    let mut stream = ParseStream::new(source);
    let mut ps = ParseState::new(&mut stream, version);
    parse_statements(&mut ps);
    drop(ps);
    let (spans, diagnostics) = stream.finish();
    let tree = build_tree(&spans, Some(Kind::Toplevel))
        .expect("a wrap kind makes tree construction total");
    (tree, diagnostics)
}

/// Top level: a run of statements separated by `;` and newlines, wrapped
/// in a [`Kind::Toplevel`] node.
pub(crate) fn parse_statements(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_nary(
        ps,
        parse_eq,
        |k| matches!(k, Kind::Semicolon | Kind::NewlineWs),
        |_, k| k == Kind::EndMarker,
    );
    // Flush trailing trivia so the tree covers the whole input.
    ps.derived().with_whitespace_newline(true).bump_trivia();
    ps.emit(mark, Kind::Toplevel, SyntaxFlags::EMPTY);
}

/// Shared combinator for separated runs: parses items with `item`,
/// consuming separators as trivia, until the terminator. Anything that
/// is neither separator nor terminator after an item is consumed as an
/// error, which keeps the parse moving on malformed input. Returns the
/// number of items parsed; the caller emits the covering node.
pub(crate) fn parse_nary(
    ps: &mut ParseState<'_, '_>,
    item: fn(&mut ParseState<'_, '_>),
    is_separator: fn(Kind) -> bool,
    is_terminator: fn(&ParseState<'_, '_>, Kind) -> bool,
) -> usize {
    let mut count = 0;
    loop {
        let k = ps.peek(1);
        if is_terminator(ps, k) {
            break;
        }
        if is_separator(k) {
            ps.bump(SyntaxFlags::TRIVIA);
            continue;
        }
        item(ps);
        count += 1;
        let k = ps.peek(1);
        if !is_separator(k) && !is_terminator(ps, k) {
            ps.bump_error(SyntaxFlags::EMPTY, "extra tokens after end of expression");
        }
    }
    count
}

/// The canonical terminator predicate: true for tokens that end a
/// bounded expression list. `end` closes only when it is not being
/// parsed as an index symbol.
pub(crate) fn is_closing_token(ps: &ParseState<'_, '_>, kind: Kind) -> bool {
    match kind {
        Kind::Else
        | Kind::Elseif
        | Kind::Catch
        | Kind::Finally
        | Kind::Comma
        | Kind::RParen
        | Kind::RBracket
        | Kind::RBrace
        | Kind::Semicolon
        | Kind::EndMarker => true,
        Kind::End => !ps.end_symbol,
        _ => false,
    }
}

/// Consumes an expected closing token as trivia, or records a
/// diagnostic without consuming so the enclosing production can recover.
pub(crate) fn expect_closing(ps: &mut ParseState<'_, '_>, closer: Kind) {
    if ps.peek(1) == closer {
        ps.bump(SyntaxFlags::TRIVIA);
    } else {
        ps.emit_diagnostic(false, &format!("expected `{closer}`"));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Parses expecting no errors; asserts the lossless round-trip.
    pub(crate) fn parse_ok(source: &str) -> GreenNode {
        let (tree, diagnostics) = parse(source);
        assert!(
            diagnostics.is_empty(),
            "expected no errors for {source:?}, got: {diagnostics:?}"
        );
        assert_eq!(tree.render(source), source, "lossless render of {source:?}");
        tree
    }

    /// Parses expecting at least one error; asserts the tree still
    /// covers the input.
    pub(crate) fn parse_err(source: &str) -> (GreenNode, Vec<Diagnostic>) {
        let (tree, diagnostics) = parse(source);
        assert!(
            !diagnostics.is_empty(),
            "expected errors for {source:?}, got none"
        );
        assert_eq!(tree.render(source), source, "lossless render of {source:?}");
        (tree, diagnostics)
    }

    /// Parses cleanly and returns the S-expression form.
    pub(crate) fn sexpr(source: &str) -> String {
        parse_ok(source).to_sexpr(source)
    }

    #[test]
    fn empty_input() {
        let tree = parse_ok("");
        assert_eq!(tree.kind(), Kind::Toplevel);
        assert_eq!(tree.width(), 0);
    }

    #[test]
    fn trivia_only_input() {
        let tree = parse_ok("  # just a comment\n");
        assert_eq!(tree.kind(), Kind::Toplevel);
        assert!(tree.children().iter().all(GreenNode::is_trivia));
    }

    #[test]
    fn bare_colon_is_an_atom() {
        let tree = parse_ok(":");
        let children: Vec<_> = tree.children().iter().filter(|c| !c.is_trivia()).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), Kind::Colon);
        assert!(children[0].is_leaf());
    }

    #[test]
    fn quote_of_identifier() {
        let tree = parse_ok(":foo");
        assert_eq!(tree.to_sexpr(":foo"), "(toplevel (quote foo))");
        // The quote node's children are the `:` leaf and the identifier.
        let quote = &tree.children()[0];
        assert_eq!(quote.kind(), Kind::Quote);
        assert_eq!(quote.children().len(), 2);
        assert_eq!(quote.children()[0].kind(), Kind::Colon);
        assert_eq!(quote.children()[1].kind(), Kind::Identifier);
    }

    #[test]
    fn whitespace_after_quote_colon_is_an_error() {
        let (tree, diagnostics) = parse_err(": foo");
        assert_eq!(
            diagnostics[0].message,
            "whitespace not allowed after ':' used for quoting"
        );
        // The diagnostic points at the offending whitespace.
        assert_eq!((diagnostics[0].first_byte, diagnostics[0].last_byte), (2, 2));
        assert_eq!(tree.width() as usize, ": foo".len());
    }

    #[test]
    fn unexpected_equals() {
        let (tree, diagnostics) = parse_err("=");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unexpected `=`");
        assert_eq!((diagnostics[0].first_byte, diagnostics[0].last_byte), (1, 1));
        // An error node covers the byte, and it stays visible in the
        // debug form even though recovery flags it as trivia.
        assert_eq!(tree.to_sexpr("="), "(toplevel (error))");
    }

    #[test]
    fn assignment_right_associates() {
        let src = "a = b = c";
        let tree = parse_ok(src);
        assert_eq!(tree.to_sexpr(src), "(toplevel (= a (= b c)))");
        // The operator tokens are trivia children of the assignment
        // nodes; whitespace leaves sit beside them.
        let outer = &tree.children()[0];
        assert_eq!(outer.kind(), Kind::Equals);
        let eq_tokens: Vec<_> = outer
            .children()
            .iter()
            .filter(|c| c.kind() == Kind::Equals && c.is_leaf())
            .collect();
        assert_eq!(eq_tokens.len(), 1);
        assert!(eq_tokens[0].is_trivia());
        let ws: Vec<_> = outer
            .children()
            .iter()
            .filter(|c| c.kind() == Kind::Whitespace)
            .collect();
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn tilde_is_a_call_not_an_assignment() {
        let src = "a ~ b";
        let tree = parse_ok(src);
        assert_eq!(tree.to_sexpr(src), "(toplevel (call a ~ b))");
        let call = &tree.children()[0];
        assert_eq!(call.kind(), Kind::Call);
        // The operator is a real (non-trivia) child.
        let tilde = call
            .children()
            .iter()
            .find(|c| c.kind() == Kind::Tilde)
            .expect("tilde child");
        assert!(!tilde.is_trivia());
    }

    #[test]
    fn empty_bracketed_form() {
        let tree = parse_ok("[]");
        let vect = &tree.children()[0];
        assert_eq!(vect.kind(), Kind::Vect);
        assert_eq!(vect.children().len(), 2);
        for bracket in vect.children() {
            assert!(bracket.is_trivia());
            assert!(bracket.is_leaf());
            assert!(bracket.flags().contains(SyntaxFlags::TRIVIA));
        }
    }

    #[test]
    fn statements_separated_by_newlines_and_semicolons() {
        assert_eq!(sexpr("a\nb"), "(toplevel a b)");
        assert_eq!(sexpr("a; b"), "(toplevel a b)");
        assert_eq!(sexpr("a; b\nc"), "(toplevel a b c)");
        assert_eq!(sexpr("a;"), "(toplevel a)");
        assert_eq!(sexpr("\n\na\n\n"), "(toplevel a)");
    }

    #[test]
    fn trailing_trivia_is_preserved() {
        parse_ok("a  # comment");
        parse_ok("a \n");
        parse_ok("x = 1   ");
    }

    #[test]
    fn extra_tokens_are_recovered() {
        let (tree, diagnostics) = parse_err("a b");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message == "extra tokens after end of expression")
        );
        assert_eq!(tree.render("a b"), "a b");
    }

    #[test]
    fn mismatched_closer_is_recovered() {
        let (tree, diagnostics) = parse_err(")");
        assert_eq!(diagnostics[0].message, "unexpected `)`");
        assert_eq!(tree.render(")"), ")");
    }

    #[test]
    fn diagnostics_are_in_source_order() {
        let (_, diagnostics) = parse_err("= ; =");
        assert!(diagnostics.len() >= 2);
        let mut last = 0;
        for d in &diagnostics {
            assert!(d.first_byte >= last);
            last = d.first_byte;
        }
    }

    #[test]
    fn version_parametrized_parse() {
        let (tree, diagnostics) = parse_at_version("a + b", LanguageVersion::new(1, 1));
        assert!(diagnostics.is_empty());
        assert_eq!(tree.render("a + b"), "a + b");
    }

    #[test]
    fn span_log_emission_order() {
        // For spans i < j: either i starts no later than j, or j is an
        // interior span enclosing i.
        for source in ["a = b = c", "[a b; c d]", "f(x, 1:2)", ": foo", "2x"] {
            let mut stream = ParseStream::new(source);
            let mut ps = ParseState::new(&mut stream, LanguageVersion::CURRENT);
            parse_statements(&mut ps);
            drop(ps);
            let (spans, _) = stream.finish();
            for i in 0..spans.len() {
                for j in (i + 1)..spans.len() {
                    let earlier = &spans[i];
                    let later = &spans[j];
                    let ordered = earlier.first_byte() <= later.first_byte();
                    let encloses = later.first_byte() <= earlier.first_byte()
                        && later.last_byte() >= earlier.last_byte();
                    assert!(
                        ordered || encloses,
                        "span order violated in {source:?}: {earlier:?} then {later:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn line_continuations_after_operators() {
        assert_eq!(sexpr("x =\n 1"), "(toplevel (= x 1))");
        assert_eq!(sexpr("a +\n b"), "(toplevel (call a + b))");
        assert_eq!(sexpr("a,\nb"), "(toplevel (tuple a b))");
        assert_eq!(sexpr("a ?\n b :\n c"), "(toplevel (if a b c))");
        assert_eq!(sexpr("a where\n T"), "(toplevel (where a T))");
    }

    #[test]
    fn deeply_nested_input_terminates() {
        let source = format!("{}x{}", "(".repeat(64), ")".repeat(64));
        let (tree, diagnostics) = parse(&source);
        assert!(diagnostics.is_empty());
        assert_eq!(tree.render(&source), source);
    }

    #[test]
    fn pathological_input_terminates_with_errors() {
        // Unbalanced closers, stray operators, malformed tokens: the
        // parser must terminate and stay lossless.
        for source in ["]]]", "a ) b", "= = =", "[;;]", "(((", "? :", "~"] {
            let (tree, _diagnostics) = parse(source);
            assert_eq!(tree.render(source), source, "lossless for {source:?}");
        }
    }
}
