// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The concrete syntax tree and the span-log folder that builds it.
//!
//! The parser does not build a tree directly: it appends [`TaggedRange`]s
//! to a flat log, emitting each interior node *after* its children with a
//! byte range that covers them. [`build_tree`] folds that log into a
//! [`GreenNode`] tree with a single stack pass keyed on byte-range
//! containment.
//!
//! Green nodes carry widths, not absolute offsets: a leaf's width is its
//! span, an interior node's width is the sum of its children's. Absolute
//! positions are recovered by summation, which is what
//! [`GreenNode::render`] does to reproduce the source byte-for-byte.

use thiserror::Error;

use crate::source_analysis::{Kind, SyntaxFlags, SyntaxHead, TaggedRange};

/// Errors from [`build_tree`].
///
/// Both cases are internal-invariant failures: a parse driven through
/// [`crate::source_analysis::parse`] always emits a single covering
/// top-level span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The span log folded to more than one root and no wrap kind was
    /// supplied.
    #[error("found multiple nodes at the top level")]
    MultipleRoots,
    /// The span log was empty and no wrap kind was supplied.
    #[error("no spans to build a tree from")]
    EmptyLog,
}

/// A node of the lossless concrete syntax tree.
///
/// Leaves cover a run of source bytes; interior nodes own an ordered
/// list of children. Trivia (whitespace, comments, consumed punctuation)
/// appears as ordinary leaves flagged [`SyntaxFlags::TRIVIA`], so
/// concatenating all leaves reproduces the source exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenNode {
    head: SyntaxHead,
    width: u32,
    children: Vec<GreenNode>,
}

impl GreenNode {
    /// Creates a leaf covering `width` bytes.
    #[must_use]
    pub const fn leaf(head: SyntaxHead, width: u32) -> Self {
        Self {
            head,
            width,
            children: Vec::new(),
        }
    }

    /// Creates an interior node; its width is the sum of its children's.
    #[must_use]
    pub fn interior(head: SyntaxHead, children: Vec<GreenNode>) -> Self {
        let width = children.iter().map(|c| c.width).sum();
        Self {
            head,
            width,
            children,
        }
    }

    /// Returns the head (kind and flags).
    #[must_use]
    pub const fn head(&self) -> SyntaxHead {
        self.head
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.head.kind()
    }

    /// Returns the flags.
    #[must_use]
    pub const fn flags(&self) -> SyntaxFlags {
        self.head.flags()
    }

    /// Returns the width in source bytes.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the children, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[GreenNode] {
        &self.children
    }

    /// Returns `true` for a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if the trivia flag is set.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        self.head.is_trivia()
    }

    /// Reconstructs the covered source text by concatenating leaves.
    ///
    /// For the root of a parse of `source`, the result is `source`
    /// itself; this is the lossless round-trip.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let mut out = String::with_capacity(self.width as usize);
        let mut offset = 0usize;
        self.render_into(source, &mut offset, &mut out);
        out
    }

    fn render_into(&self, source: &str, offset: &mut usize, out: &mut String) {
        if self.is_leaf() {
            let end = *offset + self.width as usize;
            out.push_str(&source[*offset..end]);
            *offset = end;
        } else {
            for child in &self.children {
                child.render_into(source, offset, out);
            }
        }
    }

    /// Formats the tree as an S-expression over the source text, with
    /// trivia omitted. Error nodes are always shown, even though
    /// recovery flags them as trivia, so a failed parse never reads like
    /// a clean one. Zero-width leaves show as `<kind>`. Intended for
    /// tests and debugging.
    #[must_use]
    pub fn to_sexpr(&self, source: &str) -> String {
        let mut out = String::new();
        let mut offset = 0usize;
        self.sexpr_into(source, &mut offset, &mut out);
        out
    }

    fn sexpr_into(&self, source: &str, offset: &mut usize, out: &mut String) {
        use std::fmt::Write;
        if self.is_leaf() {
            let end = *offset + self.width as usize;
            if self.width == 0 {
                let _ = write!(out, "<{}>", self.kind());
            } else {
                out.push_str(&source[*offset..end]);
            }
            *offset = end;
        } else {
            out.push('(');
            let _ = write!(out, "{}", self.kind());
            for child in &self.children {
                if child.is_trivia() && child.kind() != Kind::Error {
                    *offset += child.width as usize;
                } else {
                    out.push(' ');
                    child.sexpr_into(source, offset, out);
                }
            }
            out.push(')');
        }
    }
}

/// Folds a span log into a tree.
///
/// Spans are processed in emission order, skipping [`Kind::Tombstone`].
/// A span that starts after the top of the stack ends is a new leaf; a
/// span that covers the top is an interior node whose children are the
/// covered stack suffix. If more than one node remains at the end they
/// are wrapped under `wrap_toplevel_as` when supplied, otherwise tree
/// construction fails (the span log itself remains valid parse output).
pub fn build_tree(
    spans: &[TaggedRange],
    wrap_toplevel_as: Option<Kind>,
) -> Result<GreenNode, TreeError> {
    let mut stack: Vec<(TaggedRange, GreenNode)> = Vec::new();
    for &span in spans {
        if span.kind() == Kind::Tombstone {
            continue;
        }
        let is_new_leaf = match stack.last() {
            None => true,
            Some((top, _)) => span.first_byte() > top.last_byte(),
        };
        if is_new_leaf {
            stack.push((span, GreenNode::leaf(span.head(), span.width())));
        } else {
            // Interior node: it encloses the stack suffix of spans that
            // start at or after its own first byte.
            let mut j = stack.len();
            while j > 0 && stack[j - 1].0.first_byte() >= span.first_byte() {
                j -= 1;
            }
            let children: Vec<GreenNode> = stack.drain(j..).map(|(_, node)| node).collect();
            let node = GreenNode::interior(span.head(), children);
            debug_assert_eq!(
                node.width(),
                span.width(),
                "interior node width must match its span"
            );
            stack.push((span, node));
        }
    }

    let mut roots: Vec<GreenNode> = stack.into_iter().map(|(_, node)| node).collect();
    match (roots.len(), wrap_toplevel_as) {
        (1, _) => Ok(roots.pop().expect("one root is present")),
        (0, Some(kind)) => Ok(GreenNode::interior(
            SyntaxHead::new(kind, SyntaxFlags::EMPTY),
            Vec::new(),
        )),
        (0, None) => Err(TreeError::EmptyLog),
        (_, Some(kind)) => Ok(GreenNode::interior(
            SyntaxHead::new(kind, SyntaxFlags::EMPTY),
            roots,
        )),
        (_, None) => Err(TreeError::MultipleRoots),
    }
}
