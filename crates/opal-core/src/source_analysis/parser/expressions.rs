// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression productions for the Opal parser.
//!
//! One production per precedence level, descending from assignment to
//! atoms:
//!
//! ```text
//! parse_eq            assignment (right-assoc); `~` parses as a call
//! parse_comma         unparenthesized tuples `a, b`
//! parse_cond          ternary `p ? a : b`
//! parse_range         `a:b` and `a:b:c` under range_colon_enabled
//! parse_expr          additive `+ -`
//! parse_term          multiplicative `* /`
//! parse_unary         prefix `+ -`
//! parse_juxtapose     implicit multiplication `2x`
//! parse_where         `a where T` under where_enabled
//! parse_call          call/index/field suffixes `f(x)` `a[i]` `a.b`
//! parse_atom          literals, names, quoting, bracketed forms
//! ```
//!
//! Every production consumes tokens through the [`ParseState`] wrappers
//! and emits its node *after* its children, covering them by byte range.
//! Context changes (space sensitivity inside `[ ]`, `end` as an index
//! symbol, newline significance) travel through derived states; a
//! production never mutates its caller's context.

use super::{expect_closing, is_closing_token};
use crate::source_analysis::state::ParseState;
use crate::source_analysis::stream::Mark;
use crate::source_analysis::token::{Kind, SyntaxFlags};

/// Parses one expression at full (assignment) precedence.
pub(crate) fn parse_eq(ps: &mut ParseState<'_, '_>) {
    parse_assignment(ps, parse_comma);
}

/// Like [`parse_eq`] but without unparenthesized tuples; used for the
/// elements of argument lists and bracketed collections, where commas
/// separate rather than aggregate.
pub(crate) fn parse_eq_star(ps: &mut ParseState<'_, '_>) {
    parse_assignment(ps, parse_cond);
}

/// Consumes a line break after an infix operator or separator, where
/// the expression plainly continues on the next line. Inert inside
/// parentheses (newlines are already whitespace there) and in
/// space-sensitive contexts (a newline is a matrix row separator).
fn eat_line_continuation(ps: &mut ParseState<'_, '_>) {
    if !ps.whitespace_newline && !ps.space_sensitive && ps.peek(1) == Kind::NewlineWs {
        ps.derived().with_whitespace_newline(true).bump_trivia();
    }
}

/// Assignment. Right-associative: `a = b = c` is `a = (b = c)`.
///
/// The operator token is folded into the node as trivia, since the node
/// kind already records which operator it was. The exception is `~`,
/// which sits at assignment precedence but is an ordinary call, so the
/// operator stays a real child.
fn parse_assignment(ps: &mut ParseState<'_, '_>, down: fn(&mut ParseState<'_, '_>)) {
    let mark = ps.position();
    down(ps);
    let k = ps.peek(1);
    if k == Kind::Tilde {
        ps.bump(SyntaxFlags::EMPTY);
        eat_line_continuation(ps);
        parse_assignment(ps, down);
        ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
    } else if k.is_assignment_op() {
        ps.bump(SyntaxFlags::TRIVIA);
        eat_line_continuation(ps);
        parse_assignment(ps, down);
        ps.emit(mark, k, SyntaxFlags::EMPTY);
    }
}

/// Unparenthesized tuples: `a, b = c` assigns to a tuple. A trailing
/// comma is allowed before a closing token, the run may continue on the
/// next line, and `for` ends it when a generator may follow.
fn parse_comma(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_cond(ps);
    let mut is_tuple = false;
    while ps.peek(1) == Kind::Comma {
        is_tuple = true;
        ps.bump(SyntaxFlags::TRIVIA);
        eat_line_continuation(ps);
        let k = ps.peek(1);
        if is_closing_token(ps, k) || (ps.for_generator && k == Kind::For) {
            break;
        }
        parse_cond(ps);
    }
    if is_tuple {
        ps.emit(mark, Kind::Tuple, SyntaxFlags::EMPTY);
    }
}

/// Ternary conditional. The middle operand is parsed with ranges
/// disabled so its terminating `:` is unambiguous.
fn parse_cond(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_range(ps);
    if ps.peek(1) != Kind::Question {
        return;
    }
    ps.bump(SyntaxFlags::TRIVIA); // `?`
    eat_line_continuation(ps);
    {
        let mut inner = ps.derived().with_range_colon_enabled(false);
        parse_cond(&mut inner);
    }
    if ps.peek(1) == Kind::Colon {
        ps.bump(SyntaxFlags::TRIVIA);
        eat_line_continuation(ps);
        parse_cond(ps); // right-associative
    } else {
        ps.emit_diagnostic(false, "expected `:` in `?` expression");
    }
    ps.emit(mark, Kind::If, SyntaxFlags::EMPTY);
}

/// Ranges: `a:b` and `a:b:c` form a single n-ary call on `:`. Only
/// active under `range_colon_enabled`; the ternary middle and quote
/// contexts turn it off.
fn parse_range(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_expr(ps);
    if !ps.range_colon_enabled {
        return;
    }
    let mut has_colon = false;
    while ps.peek(1) == Kind::Colon {
        has_colon = true;
        ps.bump(SyntaxFlags::EMPTY); // the range operator is a real child
        parse_expr(ps);
    }
    if has_colon {
        ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
    }
}

/// Left-folded binary operator chain over `ops`.
///
/// In space-sensitive mode an operator with leading whitespace whose
/// operand has none ends the chain: inside a matrix row, `a -b` is two
/// elements while `a - b` and `a-b` are subtractions.
fn parse_binary_ops(ps: &mut ParseState<'_, '_>, down: fn(&mut ParseState<'_, '_>), ops: &[Kind]) {
    let mark = ps.position();
    down(ps);
    loop {
        let t = ps.peek_token(1);
        if !ops.contains(&t.kind()) {
            break;
        }
        if ps.space_sensitive && t.had_whitespace() && !ps.peek_token(2).had_whitespace() {
            break;
        }
        ps.bump(SyntaxFlags::EMPTY);
        eat_line_continuation(ps);
        down(ps);
        ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
    }
}

/// Additive expressions.
fn parse_expr(ps: &mut ParseState<'_, '_>) {
    parse_binary_ops(ps, parse_term, &[Kind::Plus, Kind::Minus]);
}

/// Multiplicative expressions.
fn parse_term(ps: &mut ParseState<'_, '_>) {
    parse_binary_ops(ps, parse_unary, &[Kind::Star, Kind::Slash]);
}

/// Prefix `+` and `-`.
fn parse_unary(ps: &mut ParseState<'_, '_>) {
    if matches!(ps.peek(1), Kind::Plus | Kind::Minus) {
        let mark = ps.position();
        ps.bump(SyntaxFlags::EMPTY);
        parse_unary(ps);
        ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
        return;
    }
    parse_juxtapose(ps);
}

/// Implicit multiplication: a numeric literal directly followed by an
/// identifier or parenthesized expression, as in `2x` or `3(a + b)`.
/// The elided `*` becomes an invisible token.
fn parse_juxtapose(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    let lead = ps.peek(1);
    parse_where(ps);
    if matches!(lead, Kind::Integer | Kind::Float) {
        let t = ps.peek_token(1);
        if matches!(
            t.kind(),
            Kind::Identifier | Kind::VarIdentifier | Kind::LParen
        ) && !t.had_whitespace()
        {
            ps.bump_invisible(Kind::Star, SyntaxFlags::EMPTY);
            parse_where(ps);
            ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
        }
    }
}

/// `where` clauses, when the context allows them. The keyword is folded
/// into the node as trivia.
fn parse_where(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_call(ps);
    while ps.where_enabled && ps.peek(1) == Kind::Where {
        ps.bump(SyntaxFlags::TRIVIA);
        eat_line_continuation(ps);
        parse_call(ps);
        ps.emit(mark, Kind::Where, SyntaxFlags::EMPTY);
    }
}

/// Atoms whose suffixes may form calls, index expressions, or field
/// accesses.
const fn is_call_prefix(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Identifier | Kind::VarIdentifier | Kind::LParen | Kind::Colon
    )
}

/// Call, index, and field suffixes: `f(x)`, `a[i]`, `a.b`, chained
/// left-to-right. A suffix must follow its receiver without whitespace;
/// `f (x)` is not a call. Inside index brackets `end` becomes a plain
/// symbol.
fn parse_call(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    let lead = ps.peek(1);
    parse_atom(ps, true);
    if !is_call_prefix(lead) {
        return;
    }
    loop {
        let t = ps.peek_token(1);
        if t.had_whitespace() {
            break;
        }
        match t.kind() {
            Kind::LParen => {
                ps.bump(SyntaxFlags::TRIVIA);
                parse_call_arglist(ps, Kind::RParen, false);
                ps.emit(mark, Kind::Call, SyntaxFlags::EMPTY);
            }
            Kind::LBracket => {
                ps.bump(SyntaxFlags::TRIVIA);
                parse_call_arglist(ps, Kind::RBracket, true);
                ps.emit(mark, Kind::Ref, SyntaxFlags::EMPTY);
            }
            Kind::Dot => {
                if !matches!(ps.peek(2), Kind::Identifier | Kind::VarIdentifier) {
                    break;
                }
                ps.bump(SyntaxFlags::TRIVIA);
                ps.bump(SyntaxFlags::EMPTY);
                ps.emit(mark, Kind::Dot, SyntaxFlags::EMPTY);
            }
            _ => break,
        }
    }
}

/// The contents of `f( ... )` or `a[ ... ]` up to and including the
/// closer. Newlines become plain whitespace, generators are allowed, and
/// for index brackets `end` is a plain symbol.
fn parse_call_arglist(ps: &mut ParseState<'_, '_>, closer: Kind, end_symbol: bool) {
    let mut inner = ps
        .derived()
        .with_whitespace_newline(true)
        .with_space_sensitive(false)
        .with_range_colon_enabled(true)
        .with_where_enabled(true)
        .with_for_generator(true)
        .with_end_symbol(end_symbol);
    if inner.peek(1) == closer {
        inner.bump(SyntaxFlags::TRIVIA);
        return;
    }
    let gmark = inner.position();
    parse_eq_star(&mut inner);
    let next = inner.peek(1);
    if next == Kind::For && inner.for_generator {
        parse_generator_rest(&mut inner, gmark);
    } else {
        while inner.peek(1) == Kind::Comma {
            inner.bump(SyntaxFlags::TRIVIA);
            if inner.peek(1) == closer {
                break;
            }
            parse_eq_star(&mut inner);
        }
    }
    expect_closing(&mut inner, closer);
}

/// The tail of a generator after its element expression: the `for`
/// keyword and the iteration. `mark` covers the element.
fn parse_generator_rest(ps: &mut ParseState<'_, '_>, mark: Mark) {
    ps.bump(SyntaxFlags::TRIVIA); // `for`
    parse_iteration(ps);
    ps.emit(mark, Kind::Generator, SyntaxFlags::EMPTY);
}

/// One iteration specification, `x in xs` (or `x = xs`), emitted as an
/// `In` node with the keyword as trivia.
fn parse_iteration(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    parse_range(ps);
    if matches!(ps.peek(1), Kind::In | Kind::Equals) {
        ps.bump(SyntaxFlags::TRIVIA);
        eat_line_continuation(ps);
        parse_cond(ps);
    } else {
        ps.emit_diagnostic(false, "expected `in` in generator");
    }
    ps.emit(mark, Kind::In, SyntaxFlags::EMPTY);
}

/// Parenthesized forms: `()` empty tuple, `(a)` grouping, `(a, b)`
/// tuple, `(a; b)` statement block, `(a for x in xs)` generator.
fn parse_paren(ps: &mut ParseState<'_, '_>) {
    let mark = ps.position();
    ps.bump(SyntaxFlags::TRIVIA); // `(`
    let mut inner = ps
        .derived()
        .with_whitespace_newline(true)
        .with_range_colon_enabled(true)
        .with_space_sensitive(false)
        .with_where_enabled(true)
        .with_for_generator(true)
        .with_end_symbol(false);
    if inner.peek(1) == Kind::RParen {
        inner.bump(SyntaxFlags::TRIVIA);
        inner.emit(mark, Kind::Tuple, SyntaxFlags::EMPTY);
        return;
    }
    let gmark = inner.position();
    parse_eq_star(&mut inner);
    match inner.peek(1) {
        Kind::RParen => {
            inner.bump(SyntaxFlags::TRIVIA);
            inner.emit(mark, Kind::Parens, SyntaxFlags::EMPTY);
        }
        Kind::Comma => {
            while inner.peek(1) == Kind::Comma {
                inner.bump(SyntaxFlags::TRIVIA);
                if inner.peek(1) == Kind::RParen {
                    break;
                }
                parse_eq_star(&mut inner);
            }
            expect_closing(&mut inner, Kind::RParen);
            inner.emit(mark, Kind::Tuple, SyntaxFlags::EMPTY);
        }
        Kind::Semicolon => {
            while inner.peek(1) == Kind::Semicolon {
                inner.bump(SyntaxFlags::TRIVIA);
                if inner.peek(1) == Kind::RParen {
                    break;
                }
                parse_eq_star(&mut inner);
            }
            expect_closing(&mut inner, Kind::RParen);
            inner.emit(mark, Kind::Block, SyntaxFlags::EMPTY);
        }
        Kind::For => {
            parse_generator_rest(&mut inner, gmark);
            expect_closing(&mut inner, Kind::RParen);
            inner.emit(mark, Kind::Parens, SyntaxFlags::EMPTY);
        }
        _ => {
            expect_closing(&mut inner, Kind::RParen);
            inner.emit(mark, Kind::Parens, SyntaxFlags::EMPTY);
        }
    }
}

/// Bracketed collections: the contents of `[ ... ]` or `{ ... }`
/// including both delimiters.
///
/// Inside the brackets, ranges and `where` are enabled, whitespace is
/// element-separating (space sensitivity), newlines separate rows, and
/// `for` forms a comprehension. `last_end_symbol` carries the enclosing
/// `end`-as-symbol context so nested brackets inside an index expression
/// keep it.
///
/// Shapes: `[]` and `[a, b]` are vectors (braces for `{ }`), `[a b]` is
/// a single-row matrix, rows separated by `;` or newlines form a
/// multi-row matrix, and `[x for x in xs]` is a comprehension.
pub(crate) fn parse_cat(ps: &mut ParseState<'_, '_>, closer: Kind, last_end_symbol: bool) {
    let mark = ps.position();
    ps.bump(SyntaxFlags::TRIVIA); // `[` or `{`
    let base = if closer == Kind::RBrace {
        Kind::Braces
    } else {
        Kind::Vect
    };
    let mut inner = ps
        .derived()
        .with_range_colon_enabled(true)
        .with_space_sensitive(true)
        .with_where_enabled(true)
        .with_whitespace_newline(false)
        .with_for_generator(true)
        .with_end_symbol(last_end_symbol);

    // Newlines before any element are plain trivia.
    while inner.peek(1) == Kind::NewlineWs {
        inner.bump(SyntaxFlags::TRIVIA);
    }
    if inner.peek(1) == closer {
        inner.bump(SyntaxFlags::TRIVIA);
        inner.emit(mark, base, SyntaxFlags::EMPTY);
        return;
    }

    let first_mark = inner.position();
    parse_eq_star(&mut inner);
    match inner.peek(1) {
        k if k == closer => {
            inner.bump(SyntaxFlags::TRIVIA);
            inner.emit(mark, base, SyntaxFlags::EMPTY);
        }
        Kind::For if inner.for_generator => {
            parse_generator_rest(&mut inner, first_mark);
            expect_closing(&mut inner, closer);
            inner.emit(mark, Kind::Comprehension, SyntaxFlags::EMPTY);
        }
        Kind::Comma => {
            // Once committed to the comma shape, newlines are plain
            // whitespace.
            let mut commas = inner.derived().with_whitespace_newline(true);
            while commas.peek(1) == Kind::Comma {
                commas.bump(SyntaxFlags::TRIVIA);
                if commas.peek(1) == closer {
                    break;
                }
                parse_eq_star(&mut commas);
            }
            expect_closing(&mut commas, closer);
            drop(commas);
            inner.emit(mark, base, SyntaxFlags::EMPTY);
        }
        _ => parse_cat_rows(&mut inner, mark, first_mark, closer, base),
    }
}

/// The matrix shapes of a bracketed collection: whitespace-separated
/// elements within a row, `;` or newlines between rows. The first
/// element has already been parsed, starting at `first_mark`.
fn parse_cat_rows(
    ps: &mut ParseState<'_, '_>,
    mark: Mark,
    first_mark: Mark,
    closer: Kind,
    base: Kind,
) {
    let mut row_mark = first_mark;
    let mut row_len = 1usize;
    let mut saw_row_sep = false;
    loop {
        let k = ps.peek(1);
        if k == closer || k == Kind::EndMarker {
            if saw_row_sep && row_len > 1 {
                ps.emit(row_mark, Kind::Row, SyntaxFlags::EMPTY);
            }
            break;
        }
        if k == Kind::NewlineWs {
            // A newline directly before the closer is plain trivia, not
            // an empty row.
            let mut look = ps.derived().with_whitespace_newline(true);
            if look.peek(1) == closer {
                look.bump_trivia();
                continue;
            }
        }
        if k == Kind::Semicolon || k == Kind::NewlineWs {
            if row_len > 1 {
                ps.emit(row_mark, Kind::Row, SyntaxFlags::EMPTY);
            }
            saw_row_sep = true;
            ps.bump(SyntaxFlags::TRIVIA);
            while matches!(ps.peek(1), Kind::Semicolon | Kind::NewlineWs) {
                ps.bump(SyntaxFlags::TRIVIA);
            }
            row_mark = ps.position();
            row_len = 0;
            continue;
        }
        if k == Kind::Comma {
            ps.bump_error(SyntaxFlags::EMPTY, "unexpected comma in matrix expression");
            continue;
        }
        if is_closing_token(ps, k) {
            ps.bump_error(SyntaxFlags::EMPTY, &format!("unexpected `{k}`"));
            continue;
        }
        parse_eq_star(ps);
        row_len += 1;
    }
    expect_closing(ps, closer);
    let kind = if saw_row_sep {
        Kind::Vcat
    } else if row_len > 1 {
        Kind::Hcat
    } else {
        base
    };
    ps.emit(mark, kind, SyntaxFlags::EMPTY);
}

/// `:` quoting. A `:` before a closing token is a bare colon atom; a
/// `:` followed by whitespace is a recovered error; otherwise the next
/// atom is quoted. Inside the quote, `end` and other reserved words are
/// plain symbols, so the atom is parsed unchecked with `end` unlocked.
fn parse_quote(ps: &mut ParseState<'_, '_>) {
    // Look across newlines: what is quoted is the next real token.
    let mut look = ps.derived().with_whitespace_newline(true);
    let t2 = look.peek_token(2);
    let k2 = t2.kind();
    if is_closing_token(&look, k2) && (!k2.is_keyword() || t2.had_whitespace()) {
        look.bump(SyntaxFlags::EMPTY); // bare `:`
        return;
    }
    let mark = look.position();
    look.bump(SyntaxFlags::TRIVIA); // `:`
    let t = look.peek_token(1);
    if t.had_whitespace() || t.had_newline() {
        look.emit_diagnostic(true, "whitespace not allowed after ':' used for quoting");
    }
    let mut inner = look.derived().with_end_symbol(true);
    parse_atom(&mut inner, false);
    drop(inner);
    look.emit(mark, Kind::Quote, SyntaxFlags::EMPTY);
}

/// Primary expressions.
///
/// With `checked` set, reserved words in identifier position are
/// recovered as errors; quoting parses unchecked so `:end` and `:for`
/// are plain symbols.
pub(crate) fn parse_atom(ps: &mut ParseState<'_, '_>, checked: bool) {
    let t = ps.peek_token(1);
    let kind = t.kind();
    match kind {
        Kind::Colon => parse_quote(ps),
        Kind::Equals => {
            ps.bump_error(SyntaxFlags::TRIVIA, "unexpected `=`");
        }
        Kind::Identifier | Kind::VarIdentifier => {
            ps.bump(SyntaxFlags::EMPTY);
        }
        Kind::LParen => parse_paren(ps),
        Kind::LBracket => {
            let end_symbol = ps.end_symbol;
            parse_cat(ps, Kind::RBracket, end_symbol);
        }
        Kind::LBrace => {
            let end_symbol = ps.end_symbol;
            parse_cat(ps, Kind::RBrace, end_symbol);
        }
        Kind::CmdString => {
            // A command literal is an implicit macro call on the string.
            let mark = ps.position();
            ps.bump_invisible(Kind::MacroName, SyntaxFlags::EMPTY);
            ps.bump(SyntaxFlags::EMPTY);
            ps.emit(mark, Kind::MacroCall, SyntaxFlags::EMPTY);
        }
        k if k.is_literal() => {
            ps.bump(SyntaxFlags::EMPTY);
        }
        Kind::End if ps.end_symbol => {
            // Inside indexing, `end` is an ordinary value.
            ps.bump(SyntaxFlags::EMPTY);
        }
        k if k.is_keyword() && !is_closing_token(ps, k) => {
            if checked {
                ps.bump_error(SyntaxFlags::EMPTY, "invalid identifier");
            } else {
                ps.bump(SyntaxFlags::EMPTY); // quoted reserved word
            }
        }
        k if is_closing_token(ps, k) => {
            // The token belongs to an enclosing production; diagnose
            // without consuming and leave a zero-width error in place of
            // the missing operand.
            if k == Kind::EndMarker {
                ps.emit_diagnostic(false, "unexpected end of input");
            } else {
                ps.emit_diagnostic(false, &format!("unexpected `{k}`"));
            }
            ps.bump_invisible(Kind::Error, SyntaxFlags::EMPTY);
        }
        Kind::Error => {
            ps.bump_error(SyntaxFlags::EMPTY, "invalid token");
        }
        _ => {
            ps.bump_error(SyntaxFlags::EMPTY, "invalid syntax");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok, sexpr};

    #[test]
    fn assignment_operators() {
        assert_eq!(sexpr("x = 1"), "(toplevel (= x 1))");
        assert_eq!(sexpr("x += 1"), "(toplevel (+= x 1))");
        assert_eq!(sexpr("x -= 1"), "(toplevel (-= x 1))");
        assert_eq!(sexpr("x *= 2"), "(toplevel (*= x 2))");
        assert_eq!(sexpr("x /= 2"), "(toplevel (/= x 2))");
    }

    #[test]
    fn tuple_assignment() {
        assert_eq!(sexpr("a, b = c"), "(toplevel (= (tuple a b) c))");
    }

    #[test]
    fn arithmetic_left_associates() {
        assert_eq!(sexpr("a + b + c"), "(toplevel (call (call a + b) + c))");
        assert_eq!(sexpr("a + b * c"), "(toplevel (call a + (call b * c)))");
        assert_eq!(sexpr("a * b / c"), "(toplevel (call (call a * b) / c))");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(sexpr("-x"), "(toplevel (call - x))");
        assert_eq!(sexpr("- -x"), "(toplevel (call - (call - x)))");
        assert_eq!(sexpr("a - -b"), "(toplevel (call a - (call - b)))");
    }

    #[test]
    fn juxtaposed_multiplication() {
        assert_eq!(sexpr("2x"), "(toplevel (call 2 <*> x))");
        assert_eq!(sexpr("3(a + b)"), "(toplevel (call 3 <*> (parens (call a + b))))");
        // Whitespace defeats juxtaposition.
        let (_, diagnostics) = parse_err("2 x");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn ranges() {
        assert_eq!(sexpr("1:10"), "(toplevel (call 1 : 10))");
        assert_eq!(sexpr("1:2:10"), "(toplevel (call 1 : 2 : 10))");
    }

    #[test]
    fn ternary_disables_range_colon() {
        assert_eq!(sexpr("a ? b : c"), "(toplevel (if a b c))");
        // Right-associative.
        assert_eq!(sexpr("a ? b : c ? d : e"), "(toplevel (if a b (if c d e)))");
        // Ranges come back on in the branches.
        assert_eq!(sexpr("a ? b : c:d"), "(toplevel (if a b (call c : d)))");
    }

    #[test]
    fn ternary_missing_colon_recovers() {
        let (tree, diagnostics) = parse_err("a ? b");
        assert_eq!(diagnostics[0].message, "expected `:` in `?` expression");
        assert_eq!(tree.render("a ? b"), "a ? b");
    }

    #[test]
    fn where_clause() {
        assert_eq!(sexpr("a where T"), "(toplevel (where a T))");
        assert_eq!(sexpr("a where T where S"), "(toplevel (where (where a T) S))");
        assert_eq!(sexpr("x = a where T"), "(toplevel (= x (where a T)))");
    }

    #[test]
    fn calls_and_chaining() {
        assert_eq!(sexpr("f()"), "(toplevel (call f))");
        assert_eq!(sexpr("f(x)"), "(toplevel (call f x))");
        assert_eq!(sexpr("f(x, y)"), "(toplevel (call f x y))");
        assert_eq!(sexpr("f(x)(y)"), "(toplevel (call (call f x) y))");
        // Arguments may span newlines.
        assert_eq!(sexpr("f(x,\n  y)"), "(toplevel (call f x y))");
    }

    #[test]
    fn call_requires_adjacency() {
        let (_, diagnostics) = parse_err("f (x)");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn indexing_and_end_symbol() {
        assert_eq!(sexpr("a[i]"), "(toplevel (ref a i))");
        assert_eq!(sexpr("a[end]"), "(toplevel (ref a end))");
        assert_eq!(sexpr("a[end-1]"), "(toplevel (ref a (call end - 1)))");
        assert_eq!(sexpr("a[1:2]"), "(toplevel (ref a (call 1 : 2)))");
        // The symbol context survives nested brackets.
        assert_eq!(sexpr("a[[end]]"), "(toplevel (ref a (vect end)))");
    }

    #[test]
    fn end_is_closing_outside_indexing() {
        let (_, diagnostics) = parse_err("end");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn field_access() {
        assert_eq!(sexpr("a.b"), "(toplevel (. a b))");
        assert_eq!(sexpr("a.b.c"), "(toplevel (. (. a b) c))");
        assert_eq!(sexpr("a.b(x)"), "(toplevel (call (. a b) x))");
    }

    #[test]
    fn paren_forms() {
        assert_eq!(sexpr("()"), "(toplevel (tuple))");
        assert_eq!(sexpr("(a)"), "(toplevel (parens a))");
        assert_eq!(sexpr("(a, b)"), "(toplevel (tuple a b))");
        assert_eq!(sexpr("(a, b,)"), "(toplevel (tuple a b))");
        assert_eq!(sexpr("(a; b)"), "(toplevel (block a b))");
    }

    #[test]
    fn newlines_are_whitespace_inside_parens() {
        assert_eq!(sexpr("(a +\n b)"), "(toplevel (parens (call a + b)))");
        assert_eq!(sexpr("f(\n  x\n)"), "(toplevel (call f x))");
    }

    #[test]
    fn vector_shapes() {
        assert_eq!(sexpr("[]"), "(toplevel (vect))");
        assert_eq!(sexpr("[a]"), "(toplevel (vect a))");
        assert_eq!(sexpr("[a, b]"), "(toplevel (vect a b))");
        assert_eq!(sexpr("[a, b,]"), "(toplevel (vect a b))");
        assert_eq!(sexpr("[\n]"), "(toplevel (vect))");
        assert_eq!(sexpr("[a\n]"), "(toplevel (vect a))");
        assert_eq!(sexpr("[1,\n 2]"), "(toplevel (vect 1 2))");
    }

    #[test]
    fn matrix_shapes() {
        assert_eq!(sexpr("[a b]"), "(toplevel (hcat a b))");
        assert_eq!(sexpr("[a b; c d]"), "(toplevel (vcat (row a b) (row c d)))");
        assert_eq!(sexpr("[a; b]"), "(toplevel (vcat a b))");
        assert_eq!(sexpr("[a b\nc d]"), "(toplevel (vcat (row a b) (row c d)))");
        assert_eq!(sexpr("[a;]"), "(toplevel (vcat a))");
    }

    #[test]
    fn matrix_space_sensitivity() {
        // ` -b` starts a new element; ` - b` and `a-b` do not.
        assert_eq!(sexpr("[a -b]"), "(toplevel (hcat a (call - b)))");
        assert_eq!(sexpr("[a - b]"), "(toplevel (vect (call a - b)))");
        assert_eq!(sexpr("[a-b]"), "(toplevel (vect (call a - b)))");
    }

    #[test]
    fn matrix_rejects_commas_in_rows() {
        let (tree, diagnostics) = parse_err("[a b, c]");
        assert_eq!(diagnostics[0].message, "unexpected comma in matrix expression");
        assert_eq!(tree.render("[a b, c]"), "[a b, c]");
        // The recovered comma shows up as an error node in place.
        assert_eq!(
            tree.to_sexpr("[a b, c]"),
            "(toplevel (hcat a b (error ,) c))"
        );
    }

    #[test]
    fn brace_collections() {
        assert_eq!(sexpr("{}"), "(toplevel (braces))");
        assert_eq!(sexpr("{a, b}"), "(toplevel (braces a b))");
    }

    #[test]
    fn comprehensions_and_generators() {
        assert_eq!(
            sexpr("[x for x in xs]"),
            "(toplevel (comprehension (generator x (in x xs))))"
        );
        assert_eq!(
            sexpr("[x for x = xs]"),
            "(toplevel (comprehension (generator x (in x xs))))"
        );
        assert_eq!(
            sexpr("f(x for x in xs)"),
            "(toplevel (call f (generator x (in x xs))))"
        );
        assert_eq!(
            sexpr("(x for x in xs)"),
            "(toplevel (parens (generator x (in x xs))))"
        );
    }

    #[test]
    fn generator_missing_in_recovers() {
        let (tree, diagnostics) = parse_err("[x for x]");
        assert_eq!(diagnostics[0].message, "expected `in` in generator");
        assert_eq!(tree.render("[x for x]"), "[x for x]");
    }

    #[test]
    fn quote_forms() {
        assert_eq!(sexpr(":foo"), "(toplevel (quote foo))");
        assert_eq!(sexpr(":end"), "(toplevel (quote end))");
        assert_eq!(sexpr(":for"), "(toplevel (quote for))");
        assert_eq!(sexpr(":123"), "(toplevel (quote 123))");
        assert_eq!(sexpr(":(a + b)"), "(toplevel (quote (parens (call a + b))))");
    }

    #[test]
    fn quoted_call() {
        assert_eq!(sexpr(":f(x)"), "(toplevel (call (quote f) x))");
    }

    #[test]
    fn command_literal_is_macro_call() {
        assert_eq!(sexpr("`ls -l`"), "(toplevel (macrocall <macro name> `ls -l`))");
    }

    #[test]
    fn literals() {
        assert_eq!(sexpr("42"), "(toplevel 42)");
        assert_eq!(sexpr("3.14"), "(toplevel 3.14)");
        assert_eq!(sexpr("\"hi\""), "(toplevel \"hi\")");
        assert_eq!(sexpr("'a'"), "(toplevel 'a')");
        assert_eq!(sexpr("true"), "(toplevel true)");
        assert_eq!(sexpr("false"), "(toplevel false)");
        assert_eq!(sexpr("var\"end\""), "(toplevel var\"end\")");
    }

    #[test]
    fn reserved_word_in_identifier_position() {
        let (tree, diagnostics) = parse_err("for");
        assert_eq!(diagnostics[0].message, "invalid identifier");
        assert_eq!(tree.render("for"), "for");
        assert_eq!(tree.to_sexpr("for"), "(toplevel (error for))");
    }

    #[test]
    fn lexer_error_token_is_diagnosed() {
        let (tree, diagnostics) = parse_err("\"unterminated");
        assert_eq!(diagnostics[0].message, "invalid token");
        assert_eq!(tree.render("\"unterminated"), "\"unterminated");
        assert_eq!(
            tree.to_sexpr("\"unterminated"),
            "(toplevel (error \"unterminated))"
        );
    }

    #[test]
    fn unterminated_bracket_recovers() {
        let (tree, diagnostics) = parse_err("[1, 2");
        assert_eq!(diagnostics[0].message, "expected `]`");
        assert_eq!(tree.render("[1, 2"), "[1, 2");
    }

    #[test]
    fn dotted_operator_parses_as_call() {
        let tree = parse_ok("a .+ b");
        assert_eq!(tree.to_sexpr("a .+ b"), "(toplevel (call a .+ b))");
    }
}
