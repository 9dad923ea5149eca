use crate::ast::{NodeBody, NodeBuilder, Wikilink};
use crate::lexer::LexContext;
use crate::syntax::TokenKind;

use super::block::{lossy_box, trim_ascii_bytes};
use super::delimiter::InlineItem;
use super::inline::push_text_item;
use super::{finish, Parser, Severity};

/// Parse a `[[target|display#anchor]]` wikilink. The body is read straight
/// from the raw bytes between the brackets rather than through the inline
/// machinery: split on the last `|` for the display, then on the last `#`
/// in whichever side retains it for the anchor. Both parts are optional; a
/// target that trims to nothing is an error and the whole run demotes to
/// text.
pub(super) fn try_wikilink(p: &mut Parser, items: &mut Vec<InlineItem>) {
    debug_assert!(p.at(TokenKind::LSQUARE));
    let open = p.peek_token();
    let start = open.start();
    let source = p.source().clone();
    let bytes = source.as_bytes();

    // Find the closing `]]` on this line.
    let mut index = start + 2;
    let close = loop {
        if index + 1 >= bytes.len() {
            break None;
        }
        match bytes[index] {
            b'\r' | b'\n' => break None,
            b']' if bytes[index + 1] == b']' => break Some(index),
            _ => index += 1,
        }
    };
    let Some(close) = close else {
        // No closing brackets: the opening bracket is plain text.
        let token = p.bump();
        push_text_item(items, token.span());
        return;
    };

    let inner = &bytes[start + 2..close];
    let (target_side, display_side) = match inner.iter().rposition(|byte| *byte == b'|') {
        Some(pipe) => (&inner[..pipe], Some(&inner[pipe + 1..])),
        None => (inner, None),
    };

    // `#` binds tighter than `|`: the anchor splits off whichever side
    // still contains one.
    let mut target = target_side;
    let mut display = display_side;
    let mut anchor = None;
    if let Some(display_bytes) = display_side {
        if let Some(hash) = display_bytes.iter().rposition(|byte| *byte == b'#') {
            display = Some(&display_bytes[..hash]);
            anchor = Some(&display_bytes[hash + 1..]);
        } else if let Some(hash) = target_side.iter().rposition(|byte| *byte == b'#') {
            target = &target_side[..hash];
            anchor = Some(&target_side[hash + 1..]);
        }
    } else if let Some(hash) = target_side.iter().rposition(|byte| *byte == b'#') {
        target = &target_side[..hash];
        anchor = Some(&target_side[hash + 1..]);
    }

    let target = trim_ascii_bytes(target);
    if target.is_empty() {
        p.report(start, "wikilink target is empty", Severity::Warning);
        push_text_item(items, start..close + 2);
        p.seek(close + 2, LexContext::Regular);
        return;
    }

    let wikilink = Wikilink {
        target: lossy_box(target),
        display: display.map(|bytes| lossy_box(trim_ascii_bytes(bytes))),
        anchor: anchor.map(|bytes| lossy_box(trim_ascii_bytes(bytes))),
    };
    let node = finish(
        NodeBuilder::new(NodeBody::Wikilink(wikilink), source.clone())
            .span(start..close + 2),
    );
    items.push(InlineItem::Node(node));
    p.seek(close + 2, LexContext::Regular);
}
