use crate::ast::{Link, LinkDef, NodeBody, NodeBuilder};
use crate::lexer::LexContext;
use crate::syntax::{TextPointer, TokenKind};

use super::delimiter::InlineItem;
use super::inline::{parse_inline_items, push_text_item, resolve_inline, InlineScope, SegmentEnd};
use super::{finish, Parser, Severity};

/// Parse an inline link: `[text](url "title")`. The destination is lexed
/// under the link-URL context, where ordinary delimiters lose their meaning
/// and `)` or a newline ends the destination. A link that never closes is
/// reported and its opening bracket demotes to text, so the content after
/// it still parses normally.
pub(super) fn try_link(p: &mut Parser, items: &mut Vec<InlineItem>) {
    let checkpoint = p.checkpoint();
    let open = p.bump(); // LSQUARE

    let mut text_items = Vec::new();
    let closed = matches!(
        parse_inline_items(p, &mut text_items, InlineScope::LinkText),
        SegmentEnd::CloseBracket
    );
    if !closed {
        demote_to_text(p, items, checkpoint, None);
        return;
    }
    p.bump(); // RSQUARE

    if !p.at(TokenKind::LPAREN) {
        demote_to_text(p, items, checkpoint, None);
        return;
    }
    p.bump(); // LPAREN
    p.set_lex_context(LexContext::LinkUrl);
    while p.at(TokenKind::WHITESPACE) {
        p.bump();
    }

    let url_start = p.offset();
    let mut url_end = url_start;
    while p.at(TokenKind::TEXT) {
        url_end = p.bump().end();
    }
    while p.at(TokenKind::WHITESPACE) {
        p.bump();
    }
    let title = match parse_quoted_title(p) {
        TitleOutcome::Title(pointer) => Some(pointer),
        TitleOutcome::None => None,
        TitleOutcome::Invalid => {
            let offset = open.start();
            demote_to_text(p, items, checkpoint, Some(offset));
            return;
        }
    };

    let Some(close) = p.expect(TokenKind::RPAREN) else {
        let offset = open.start();
        demote_to_text(p, items, checkpoint, Some(offset));
        return;
    };

    let url = TextPointer::from_span(p.source().clone(), url_start..url_end);
    let children = resolve_inline(text_items, p.source().clone());
    let node = finish(
        NodeBuilder::new(NodeBody::Link(Link { url, title }), p.source().clone())
            .span(open.start()..close.end())
            .children(children),
    );
    items.push(InlineItem::Node(node));
}

/// Abandon a speculative link parse: rewind, optionally report, and consume
/// the opening bracket as literal text.
fn demote_to_text(
    p: &mut Parser,
    items: &mut Vec<InlineItem>,
    checkpoint: super::ParserCheckpoint,
    report_at: Option<usize>,
) {
    p.rewind(checkpoint);
    if let Some(offset) = report_at {
        p.report(
            offset,
            "malformed link: missing closing parenthesis",
            Severity::Warning,
        );
    }
    let open = p.bump();
    push_text_item(items, open.span());
}

pub(super) enum TitleOutcome {
    None,
    Title(TextPointer),
    Invalid,
}

/// Parse an optional quoted link title in the link-URL context. The title
/// runs from the current token to the last TEXT token before the closing
/// parenthesis and must be wrapped in double quotes.
pub(super) fn parse_quoted_title(p: &mut Parser) -> TitleOutcome {
    if !p.at(TokenKind::TEXT) {
        return TitleOutcome::None;
    }
    let start = p.offset();
    let mut end = start;
    while p.at(TokenKind::TEXT) || p.at(TokenKind::WHITESPACE) {
        let token = p.bump();
        if token.kind() == TokenKind::TEXT {
            end = token.end();
        }
    }
    let source = p.source().clone();
    let bytes = source.slice(start..end);
    if bytes.len() >= 2 && bytes.first() == Some(&b'"') && bytes.last() == Some(&b'"') {
        TitleOutcome::Title(TextPointer::from_span(source.clone(), start + 1..end - 1))
    } else {
        TitleOutcome::Invalid
    }
}

/// Parse a link-reference definition occupying a whole line:
/// `[label]: url "optional title"`. Returns None (with the parser rewound)
/// if the line does not have that shape, in which case it is an ordinary
/// paragraph.
pub(super) fn try_parse_link_definition(p: &mut Parser) -> Option<crate::ast::Node> {
    let checkpoint = p.checkpoint();
    let open = p.bump(); // LSQUARE

    let mut label_len = 0usize;
    loop {
        match p.current() {
            TokenKind::RSQUARE => break,
            TokenKind::LINE_ENDING | TokenKind::EOF | TokenKind::LSQUARE => {
                p.rewind(checkpoint);
                return None;
            }
            _ => {
                p.bump();
                label_len += 1;
            }
        }
    }
    if label_len == 0 {
        p.rewind(checkpoint);
        return None;
    }
    p.bump(); // RSQUARE
    if p.expect(TokenKind::COLON).is_none() {
        p.rewind(checkpoint);
        return None;
    }
    if !p.at(TokenKind::WHITESPACE) {
        p.rewind(checkpoint);
        return None;
    }
    p.set_lex_context(LexContext::LinkUrl);
    p.bump(); // the separating whitespace

    let url_start = p.offset();
    let mut url_end = url_start;
    while p.at(TokenKind::TEXT) {
        url_end = p.bump().end();
    }
    if url_end == url_start {
        p.rewind(checkpoint);
        return None;
    }
    let mut end = url_end;

    while p.at(TokenKind::WHITESPACE) {
        p.bump();
    }
    let title = match parse_quoted_title(p) {
        TitleOutcome::Title(pointer) => {
            end = pointer.end() + 1;
            Some(pointer)
        }
        TitleOutcome::None => None,
        TitleOutcome::Invalid => {
            p.rewind(checkpoint);
            return None;
        }
    };

    // Nothing else may follow on the line.
    if !p.at(TokenKind::LINE_ENDING) && !p.at_eof() {
        p.rewind(checkpoint);
        return None;
    }

    let url = TextPointer::from_span(p.source().clone(), url_start..url_end);
    Some(finish(
        NodeBuilder::new(NodeBody::LinkDef(LinkDef { url, title }), p.source().clone())
            .span(open.start()..end),
    ))
}
