use crate::ast::{Keyword, List, ListItem, Node, NodeBody, NodeBuilder, NodeKind};
use crate::syntax::TokenKind;

use super::block::{consume_quote_prefix, BlockContext};
use super::inline::{parse_inline_items, resolve_inline, InlineScope};
use super::{finish, Parser};

/// The shape of a list marker line: its leading indentation width and
/// whether the marker is ordered (`1.`) or a bullet (`-`, `+`, `*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct ListMarker {
    pub indent: u32,
    pub ordered: bool,
}

/// Probe for a list marker at the cursor without consuming anything: an
/// optional indent, a bullet or `<digits>.` marker, and a following space.
pub(super) fn peek_list_marker(p: &mut Parser) -> Option<ListMarker> {
    let checkpoint = p.checkpoint();
    let mut indent = 0;
    if p.at(TokenKind::WHITESPACE) {
        indent = indent_width(p.bump().text());
    }
    let kind = p.current();
    let matched = if kind.is_bullet_marker() {
        p.bump();
        p.at(TokenKind::WHITESPACE).then_some(false)
    } else if kind == TokenKind::NUMBER {
        p.bump();
        if p.expect(TokenKind::DOT).is_some() {
            p.at(TokenKind::WHITESPACE).then_some(true)
        } else {
            None
        }
    } else {
        None
    };
    p.rewind(checkpoint);
    matched.map(|ordered| ListMarker { indent, ordered })
}

/// Leading indentation width in effective spaces; tabs stop at 4.
fn indent_width(bytes: &[u8]) -> u32 {
    let mut width = 0u32;
    for byte in bytes {
        match byte {
            b'\t' => width += 4 - (width % 4),
            _ => width += 1,
        }
    }
    width
}

fn same_list(current: &ListMarker, next: &ListMarker) -> bool {
    next.ordered == current.ordered
        && next.indent >= current.indent
        && next.indent < current.indent + 2
}

/// Parse a run of list items at one indentation level. Items may carry
/// nested lists (indented 2+ further, or a tab); the list ends at a blank
/// line followed by a non-list line, at a marker of a different type, or at
/// a shallower indent (which belongs to an outer list).
pub(super) fn parse_list(p: &mut Parser, ctx: BlockContext, marker: ListMarker) -> Node {
    let mut items = Vec::new();
    loop {
        items.push(parse_list_item(p, ctx, marker));

        // Directly-following marker lines continue or end the list; blank
        // lines are skipped speculatively to check what follows them.
        let checkpoint = p.checkpoint();
        skip_blank_lines(p, ctx);
        let offset = p.offset();
        if ctx.quote_depth > 0
            && p.offset_at_line_start(offset)
            && !consume_quote_prefix(p, ctx.quote_depth)
        {
            p.rewind(checkpoint);
            break;
        }
        match peek_list_marker(p) {
            Some(next) if same_list(&marker, &next) => continue,
            _ => {
                p.rewind(checkpoint);
                break;
            }
        }
    }

    let start = items.first().map_or(0, Node::start);
    let end = items.last().map_or(start, Node::end);
    finish(
        NodeBuilder::new(
            NodeBody::List(List {
                ordered: marker.ordered,
            }),
            p.source().clone(),
        )
        .span(start..end)
        .children(items),
    )
}

fn parse_list_item(p: &mut Parser, ctx: BlockContext, marker: ListMarker) -> Node {
    if p.at(TokenKind::WHITESPACE) {
        p.bump();
    }
    let start = p.offset();
    // The marker itself: a bullet, or digits followed by a dot.
    p.bump();
    if p.at(TokenKind::DOT) {
        p.bump();
    }
    let marker_end = match p.expect(TokenKind::WHITESPACE) {
        Some(space) => space.end(),
        None => start,
    };

    let checked = try_checkbox(p);

    let mut inline_items = Vec::new();
    parse_inline_items(p, &mut inline_items, InlineScope::Flow);
    let line_end = p.offset();
    if p.at(TokenKind::LINE_ENDING) {
        p.bump();
    }

    let mut children = resolve_inline(inline_items, p.source().clone());
    let keyword = detect_keyword(&children);

    // Nested lists are indented at least two spaces (or a tab) past the
    // parent marker and attach to the item that precedes them.
    loop {
        let checkpoint = p.checkpoint();
        let offset = p.offset();
        if ctx.quote_depth > 0
            && p.offset_at_line_start(offset)
            && !consume_quote_prefix(p, ctx.quote_depth)
        {
            p.rewind(checkpoint);
            break;
        }
        match peek_list_marker(p) {
            Some(next) if next.indent >= marker.indent + 2 => {
                children.push(parse_list(p, ctx, next));
            }
            _ => {
                p.rewind(checkpoint);
                break;
            }
        }
    }

    let end = children.last().map_or_else(
        || line_end.max(marker_end),
        |last| last.end().max(line_end),
    );
    finish(
        NodeBuilder::new(
            NodeBody::ListItem(ListItem { checked, keyword }),
            p.source().clone(),
        )
        .span(start..end)
        .children(children),
    )
}

/// Recognise a `[ ]` / `[x]` / `[X]` checkbox directly after the marker.
/// The empty form must contain exactly one space, and the closing bracket
/// must be followed by whitespace or the end of the line.
fn try_checkbox(p: &mut Parser) -> Option<bool> {
    if !p.at(TokenKind::LSQUARE) {
        return None;
    }
    let checkpoint = p.checkpoint();
    p.bump();
    let state = if p.at(TokenKind::CHECK) {
        p.bump();
        true
    } else if p.at(TokenKind::WHITESPACE) && p.peek_token().text() == b" " {
        p.bump();
        false
    } else {
        p.rewind(checkpoint);
        return None;
    };
    if p.expect(TokenKind::RSQUARE).is_none() {
        p.rewind(checkpoint);
        return None;
    }
    match p.current() {
        TokenKind::WHITESPACE => {
            p.bump();
        }
        TokenKind::LINE_ENDING | TokenKind::EOF => {}
        _ => {
            p.rewind(checkpoint);
            return None;
        }
    }
    Some(state)
}

/// A keyword bullet opens with `**WHEN**` (or THEN/AND/GIVEN) immediately
/// after the marker and optional checkbox, which resolves to a leading
/// Strong node wrapping exactly the keyword text.
fn detect_keyword(children: &[Node]) -> Keyword {
    let Some(first) = children.first() else {
        return Keyword::None;
    };
    if first.kind() != NodeKind::Strong {
        return Keyword::None;
    }
    let inner = first.children();
    if inner.len() != 1 || inner[0].kind() != NodeKind::Text {
        return Keyword::None;
    }
    Keyword::from_bytes(inner[0].source_view())
}

/// Consume whole blank lines (quote prefixes included when inside one).
/// Returns true if at least one blank line was consumed.
fn skip_blank_lines(p: &mut Parser, ctx: BlockContext) -> bool {
    let mut skipped = false;
    loop {
        let checkpoint = p.checkpoint();
        if ctx.quote_depth > 0 && !consume_quote_prefix(p, ctx.quote_depth) {
            p.rewind(checkpoint);
            break;
        }
        if p.at(TokenKind::WHITESPACE) {
            p.bump();
        }
        if p.at(TokenKind::LINE_ENDING) {
            p.bump();
            skipped = true;
        } else {
            p.rewind(checkpoint);
            break;
        }
    }
    skipped
}
