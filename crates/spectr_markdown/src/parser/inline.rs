use crate::ast::{Code, Node, NodeBody, NodeBuilder};
use crate::lexer::LexContext;
use crate::syntax::{SourceText, TextPointer, TextSpan, TokenKind};

use super::block::{consume_quote_prefix, is_block_interrupt, BlockContext};
use super::delimiter::{delimiter_flags, DelimiterRun, InlineItem};
use super::link::try_link;
use super::wikilink::try_wikilink;
use super::{finish, Parser};

/// Where an inline run is being collected. Link text runs additionally stop
/// at an unmatched closing bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum InlineScope {
    Flow,
    LinkText,
}

/// Why an inline segment stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SegmentEnd {
    LineEnd,
    Eof,
    CloseBracket,
}

/// Parse a paragraph: inline content accumulated across lines until a blank
/// line, a line that starts another block, the end of the enclosing quote,
/// or EOF.
pub(super) fn parse_paragraph(p: &mut Parser, ctx: BlockContext) -> Node {
    if p.at(TokenKind::WHITESPACE) {
        p.bump();
    }
    let start = p.offset();
    let mut items: Vec<InlineItem> = Vec::new();

    loop {
        parse_inline_items(p, &mut items, InlineScope::Flow);
        if p.at_eof() {
            break;
        }

        // Decide whether the next line continues this paragraph.
        let continuation = p.checkpoint();
        let newline = p.bump();
        if ctx.quote_depth > 0 && !consume_quote_prefix(p, ctx.quote_depth) {
            p.rewind(continuation);
            break;
        }
        let after_prefix = p.checkpoint();
        if p.at(TokenKind::WHITESPACE) {
            p.bump();
        }
        if p.at(TokenKind::LINE_ENDING) || p.at_eof() {
            p.rewind(continuation);
            break;
        }
        p.rewind(after_prefix);
        if is_block_interrupt(p) {
            p.rewind(continuation);
            break;
        }
        // The line terminator joins the text flow of the paragraph.
        push_text_item(&mut items, newline.span());
    }

    let children = resolve_inline(items, p.source().clone());
    let end = children.last().map_or(start, Node::end);
    finish(
        NodeBuilder::new(NodeBody::Paragraph, p.source().clone())
            .span(start..end)
            .children(children),
    )
}

/// Collect inline items until the end of the line (LINE_ENDING is left
/// unconsumed), EOF, or (in link-text scope) an unmatched `]`.
pub(super) fn parse_inline_items(
    p: &mut Parser,
    items: &mut Vec<InlineItem>,
    scope: InlineScope,
) -> SegmentEnd {
    loop {
        match p.current() {
            TokenKind::EOF => return SegmentEnd::Eof,
            TokenKind::LINE_ENDING => return SegmentEnd::LineEnd,
            TokenKind::STAR | TokenKind::UNDER | TokenKind::TILDE => {
                collect_delimiter_run(p, items);
            }
            TokenKind::BACKTICK => {
                try_code_span(p, items);
            }
            TokenKind::LSQUARE => {
                let token = p.peek_token();
                if p.source().byte(token.end()) == Some(b'[') {
                    try_wikilink(p, items);
                } else {
                    try_link(p, items);
                }
            }
            TokenKind::RSQUARE if scope == InlineScope::LinkText => {
                return SegmentEnd::CloseBracket;
            }
            _ => {
                let token = p.bump();
                push_text_item(items, token.span());
            }
        }
    }
}

/// Resolve delimiter matches and coalesce the remains into nodes. This is
/// the finishing pass every inline run goes through.
pub(super) fn resolve_inline(mut items: Vec<InlineItem>, source: SourceText) -> Vec<Node> {
    resolve_delimiters(&mut items, &source);
    finalize_items(items, &source)
}

/// Append a text span to the item list, merging with a directly adjacent
/// preceding text item so runs of insignificant tokens become one node.
pub(super) fn push_text_item(items: &mut Vec<InlineItem>, span: TextSpan) {
    if span.start == span.end {
        return;
    }
    if let Some(InlineItem::Text(previous)) = items.last_mut() {
        if previous.end == span.start {
            previous.end = span.end;
            return;
        }
    }
    items.push(InlineItem::Text(span));
}

fn collect_delimiter_run(p: &mut Parser, items: &mut Vec<InlineItem>) {
    let kind = p.current();
    let start = p.offset();
    let mut end = start;
    let mut count = 0u32;
    while p.at(kind) {
        end = p.bump().end();
        count += 1;
    }
    let span = start..end;
    let flags = delimiter_flags(p.source(), &span, kind, count);
    items.push(InlineItem::Delimiter(DelimiterRun::new(
        kind, span, count, flags,
    )));
}

/// Speculatively parse an inline code span. The lexer has already committed
/// to the inline-code context when it produced the opening backtick, so the
/// content arrives as verbatim TEXT and LINE_ENDING tokens and any BACKTICK
/// seen afterwards is necessarily the equal-length closing run. If the span
/// never closes, the parser rewinds and the opener demotes to literal text,
/// with the content re-read as ordinary inline syntax.
fn try_code_span(p: &mut Parser, items: &mut Vec<InlineItem>) {
    let checkpoint = p.checkpoint();
    let open_start = p.offset();
    let mut open_len = 0usize;
    while p.at(TokenKind::BACKTICK) {
        p.bump();
        open_len += 1;
    }
    let content_start = p.offset();

    loop {
        match p.current() {
            TokenKind::EOF => {
                // Unclosed: demote the opening run to text and re-lex the
                // content in the regular context.
                p.rewind(checkpoint);
                push_text_item(items, open_start..open_start + open_len);
                p.seek(open_start + open_len, LexContext::Regular);
                return;
            }
            TokenKind::BACKTICK => {
                let content_end = p.offset();
                let mut close_end = content_end;
                while p.at(TokenKind::BACKTICK) {
                    close_end = p.bump().end();
                }
                let content =
                    TextPointer::from_span(p.source().clone(), content_start..content_end);
                let node = finish(
                    NodeBuilder::new(NodeBody::Code(Code { content }), p.source().clone())
                        .span(open_start..close_end),
                );
                items.push(InlineItem::Node(node));
                return;
            }
            _ => {
                p.bump();
            }
        }
    }
}

/// Match delimiter runs into Strong/Emphasis/Strikethrough nodes. Closers
/// are processed left to right; each scans backwards for the nearest
/// compatible opener, consuming up to two characters per match so `**`
/// produces strong and `*` emphasis, repeatedly until either side runs out.
/// Runs (or leftovers) that never match fall through as plain text.
fn resolve_delimiters(items: &mut Vec<InlineItem>, source: &SourceText) {
    let mut closer_index = 0;
    while closer_index < items.len() {
        let kind = match &items[closer_index] {
            InlineItem::Delimiter(run) if run.can_close() => run.kind,
            _ => {
                closer_index += 1;
                continue;
            }
        };

        loop {
            let closer_count = match &items[closer_index] {
                InlineItem::Delimiter(run) => run.count,
                _ => 0,
            };
            if closer_count == 0 {
                break;
            }
            let Some(opener_index) = find_opener(items, closer_index, kind) else {
                break;
            };
            let opener_count = match &items[opener_index] {
                InlineItem::Delimiter(run) => run.count,
                _ => 0,
            };

            let take = if kind == TokenKind::TILDE {
                // Strikethrough requires two tildes on both sides.
                if opener_count >= 2 && closer_count >= 2 {
                    2
                } else {
                    break;
                }
            } else {
                2.min(opener_count.min(closer_count))
            };
            let body = match (kind, take) {
                (TokenKind::TILDE, _) => NodeBody::Strikethrough,
                (_, 2) => NodeBody::Strong,
                _ => NodeBody::Emphasis,
            };

            let open_span = match &mut items[opener_index] {
                InlineItem::Delimiter(run) => run.consume_from_end(take),
                _ => unreachable!("opener index does not point at a delimiter"),
            };
            let close_span = match &mut items[closer_index] {
                InlineItem::Delimiter(run) => run.consume_from_start(take),
                _ => unreachable!("closer index does not point at a delimiter"),
            };

            // Everything between the pair becomes the new node's children;
            // unmatched delimiters inside it demote to text.
            let inner: Vec<InlineItem> = items.drain(opener_index + 1..closer_index).collect();
            let children = finalize_items(inner, source);
            let node = finish(
                NodeBuilder::new(body, source.clone())
                    .span(open_span.start..close_span.end)
                    .children(children),
            );
            items.insert(opener_index + 1, InlineItem::Node(node));
            closer_index = opener_index + 2;
        }

        closer_index += 1;
    }
}

fn find_opener(items: &[InlineItem], closer_index: usize, kind: TokenKind) -> Option<usize> {
    items[..closer_index]
        .iter()
        .rposition(|item| match item {
            InlineItem::Delimiter(run) => {
                run.kind == kind
                    && run.can_open()
                    && (kind != TokenKind::TILDE || run.count >= 2)
            }
            _ => false,
        })
}

/// Convert the worked-over item list into final nodes: leftover delimiter
/// characters become text, and adjacent text spans coalesce into single
/// Text nodes.
fn finalize_items(items: Vec<InlineItem>, source: &SourceText) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut pending: Option<TextSpan> = None;

    let flush = |pending: &mut Option<TextSpan>, nodes: &mut Vec<Node>| {
        if let Some(span) = pending.take() {
            nodes.push(finish(
                NodeBuilder::new(NodeBody::Text, source.clone()).span(span),
            ));
        }
    };

    for item in items {
        let span = match item {
            InlineItem::Node(node) => {
                flush(&mut pending, &mut nodes);
                nodes.push(node);
                continue;
            }
            InlineItem::Text(span) => span,
            InlineItem::Delimiter(run) => run.remaining_span(),
        };
        if span.start == span.end {
            continue;
        }
        match &mut pending {
            Some(previous) if previous.end == span.start => previous.end = span.end,
            _ => {
                flush(&mut pending, &mut nodes);
                pending = Some(span);
            }
        }
    }
    flush(&mut pending, &mut nodes);
    nodes
}
