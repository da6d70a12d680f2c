// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic rendering.
//!
//! Turns the [`Diagnostic`]s collected during a parse into terminal
//! text: a coloured severity prefix, the message, and the source line(s)
//! with the offending range underlined.
//!
//! Ranges are normalised before rendering: offsets are clamped to the
//! source and rounded down to code-point boundaries, and a range that is
//! empty or covers only invisible characters (a bare newline) is
//! expanded symmetrically by one code point so the underline always has
//! something to point at.

use std::fmt::Write;
use std::ops::Range;

use colored::{ColoredString, Colorize};

use super::stream::{Diagnostic, Severity};

/// Converts a diagnostic's 1-based inclusive range into a renderable
/// 0-based half-open range: clamped to the source, on char boundaries,
/// and expanded when empty or invisible.
#[must_use]
pub fn normalized_range(diag: &Diagnostic, source: &str) -> Range<usize> {
    let len = source.len();
    let mut start = (diag.first_byte as usize).saturating_sub(1).min(len);
    let mut end = (diag.last_byte as usize).min(len);
    if end < start {
        end = start;
    }
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    if end < start {
        end = start;
    }

    let invisible =
        start == end || source[start..end].chars().all(|c| matches!(c, '\n' | '\r'));
    if invisible {
        if start > 0 {
            start -= 1;
            while !source.is_char_boundary(start) {
                start -= 1;
            }
        }
        if end < len {
            end += 1;
            while end < len && !source.is_char_boundary(end) {
                end += 1;
            }
        }
    }
    start..end
}

fn paint(text: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => text.red().bold(),
        Severity::Warning => text.yellow().bold(),
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    }
}

/// Renders one diagnostic against its source text.
///
/// ```text
/// Error: whitespace not allowed after ':' used for quoting
///    1 │ : foo
///      │  ^
/// ```
#[must_use]
pub fn render_diagnostic(diag: &Diagnostic, source: &str) -> String {
    let range = normalized_range(diag, source);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}",
        paint(severity_label(diag.severity), diag.severity),
        diag.message
    );

    let mut line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let mut line_number = source[..line_start].matches('\n').count() + 1;
    loop {
        let line_end = source[line_start..]
            .find('\n')
            .map_or(source.len(), |i| line_start + i);
        let line = &source[line_start..line_end];
        let _ = writeln!(out, "{line_number:>4} │ {line}");

        let overlap_start = range.start.clamp(line_start, line_end);
        let overlap_end = range.end.clamp(line_start, line_end);
        let pad = source[line_start..overlap_start].chars().count();
        let width = source[overlap_start..overlap_end].chars().count().max(1);
        let _ = writeln!(
            out,
            "     │ {}{}",
            " ".repeat(pad),
            paint(&"^".repeat(width), diag.severity)
        );

        if range.end <= line_end || line_end >= source.len() {
            break;
        }
        line_start = line_end + 1;
        line_number += 1;
    }
    out
}

/// Renders every diagnostic in order, separated by blank lines.
#[must_use]
pub fn render_diagnostics(diagnostics: &[Diagnostic], source: &str) -> String {
    let mut out = String::new();
    for (i, diag) in diagnostics.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&render_diagnostic(diag, source));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn normalized_range_basic() {
        let d = Diagnostic::error("m", 1, 3);
        assert_eq!(normalized_range(&d, "abcdef"), 0..3);
    }

    #[test]
    fn normalized_range_clamps_to_source() {
        let d = Diagnostic::error("m", 4, 99);
        assert_eq!(normalized_range(&d, "abcdef"), 3..6);
    }

    #[test]
    fn empty_range_expands_symmetrically() {
        // Zero-width range between `a` and `b`.
        let d = Diagnostic::error("m", 2, 1);
        assert_eq!(normalized_range(&d, "ab"), 0..2);
    }

    #[test]
    fn empty_range_at_start_expands_forward_only() {
        let d = Diagnostic::error("m", 1, 0);
        assert_eq!(normalized_range(&d, "ab"), 0..1);
    }

    #[test]
    fn newline_range_expands() {
        // The range covers only the newline in `a\nb`.
        let d = Diagnostic::error("m", 2, 2);
        assert_eq!(normalized_range(&d, "a\nb"), 0..3);
    }

    #[test]
    fn end_rounds_down_to_char_boundary() {
        // `α` is two bytes; a range ending inside it rounds down, then
        // expands to cover the whole character.
        let source = "αβ";
        let d = Diagnostic::error("m", 2, 2);
        let range = normalized_range(&d, source);
        assert!(source.is_char_boundary(range.start));
        assert!(source.is_char_boundary(range.end));
        assert_eq!(range, 0..2);
    }

    #[test]
    fn render_single_line() {
        plain();
        let d = Diagnostic::error("unexpected `=`", 5, 5);
        let out = render_diagnostic(&d, "abc\n= x");
        assert!(out.contains("Error: unexpected `=`"));
        assert!(out.contains("   2 │ = x"));
        assert!(out.contains("     │ ^"));
    }

    #[test]
    fn render_caret_alignment() {
        plain();
        let d = Diagnostic::error("boom", 3, 5);
        let out = render_diagnostic(&d, "ab cde f");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "   1 │ ab cde f");
        assert_eq!(lines[2], "     │   ^^^");
    }

    #[test]
    fn render_multi_line_range() {
        plain();
        let d = Diagnostic::error("spans lines", 1, 7);
        let out = render_diagnostic(&d, "abc\ndef");
        assert!(out.contains("   1 │ abc"));
        assert!(out.contains("   2 │ def"));
    }

    #[test]
    fn render_warning_prefix() {
        plain();
        let d = Diagnostic::warning("dubious", 1, 1);
        let out = render_diagnostic(&d, "x");
        assert!(out.contains("Warning: dubious"));
    }

    #[test]
    fn render_parse_diagnostics_end_to_end() {
        plain();
        let source = ": foo";
        let (_, diagnostics) = parse(source);
        let out = render_diagnostics(&diagnostics, source);
        assert!(out.contains("whitespace not allowed after ':' used for quoting"));
        assert!(out.contains(": foo"));
    }

    #[test]
    fn rendered_ranges_stay_on_boundaries() {
        plain();
        let source = "π = [1, 2\nσ";
        let (_, diagnostics) = parse(source);
        for d in &diagnostics {
            let range = normalized_range(d, source);
            assert!(range.start <= range.end);
            assert!(range.end <= source.len());
            assert!(source.is_char_boundary(range.start));
            assert!(source.is_char_boundary(range.end));
        }
    }
}
