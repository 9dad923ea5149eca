use bitflags::bitflags;

use crate::ast::Node;
use crate::syntax::{SourceText, TextSpan, TokenKind};

bitflags! {
    /// Whether a delimiter run is positioned so that it could open and/or
    /// close an emphasis span.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(super) struct DelimiterFlags: u8 {
        const CAN_OPEN = 1 << 0;
        const CAN_CLOSE = 1 << 1;
    }
}

/// A run of identical delimiter tokens (`*`, `_`, or `~`) collected during
/// inline parsing. Matching consumes characters from the inside edges of
/// the opener and closer: the opener gives up bytes from its right end, the
/// closer from its left, so repeated matches nest correctly (`***a***`
/// becomes emphasis wrapping strong).
#[derive(Clone, Debug)]
pub(super) struct DelimiterRun {
    pub kind: TokenKind,
    pub span: TextSpan,
    pub count: u32,
    pub flags: DelimiterFlags,
}

impl DelimiterRun {
    pub(super) fn new(kind: TokenKind, span: TextSpan, count: u32, flags: DelimiterFlags) -> Self {
        Self {
            kind,
            span,
            count,
            flags,
        }
    }

    pub(super) fn can_open(&self) -> bool {
        self.count > 0 && self.flags.contains(DelimiterFlags::CAN_OPEN)
    }

    pub(super) fn can_close(&self) -> bool {
        self.count > 0 && self.flags.contains(DelimiterFlags::CAN_CLOSE)
    }

    /// Consume `count` delimiter characters from the right end of the run
    /// (the opener side) and return the span they occupied.
    pub(super) fn consume_from_end(&mut self, count: u32) -> TextSpan {
        debug_assert!(count <= self.count);
        let consumed = self.span.end - count as usize..self.span.end;
        self.span.end = consumed.start;
        self.count -= count;
        consumed
    }

    /// Consume `count` delimiter characters from the left end of the run
    /// (the closer side) and return the span they occupied.
    pub(super) fn consume_from_start(&mut self, count: u32) -> TextSpan {
        debug_assert!(count <= self.count);
        let consumed = self.span.start..self.span.start + count as usize;
        self.span.start = consumed.end;
        self.count -= count;
        consumed
    }

    /// The span of the characters that were never matched; these demote to
    /// plain text when the inline run is finalized.
    pub(super) fn remaining_span(&self) -> TextSpan {
        self.span.clone()
    }
}

/// Compute open/close capability from the bytes adjacent to the run: a run
/// can open when it is not followed by whitespace or the end of input, and
/// can close when it is not preceded by whitespace or the start of input.
/// Tilde runs shorter than 2 can never participate in a strikethrough.
pub(super) fn delimiter_flags(
    source: &SourceText,
    span: &TextSpan,
    kind: TokenKind,
    count: u32,
) -> DelimiterFlags {
    if kind == TokenKind::TILDE && count < 2 {
        return DelimiterFlags::empty();
    }
    let mut flags = DelimiterFlags::empty();
    let next = source.byte(span.end);
    if next.is_some_and(|byte| !byte.is_ascii_whitespace()) {
        flags |= DelimiterFlags::CAN_OPEN;
    }
    let prev = span
        .start
        .checked_sub(1)
        .and_then(|index| source.byte(index));
    if prev.is_some_and(|byte| !byte.is_ascii_whitespace()) {
        flags |= DelimiterFlags::CAN_CLOSE;
    }
    flags
}

/// An element of the in-progress inline sequence: a finished node, a span
/// of plain text, or a delimiter run that may yet match.
#[derive(Debug)]
pub(super) enum InlineItem {
    Node(Node),
    Text(TextSpan),
    Delimiter(DelimiterRun),
}

