use crate::ast::{DeltaType, Node, NodeBody, NodeBuilder, Requirement, Scenario, Section};
use crate::lexer::LexContext;
use crate::syntax::{TextPointer, TokenKind};

use super::code_block::parse_code_block;
use super::inline::parse_paragraph;
use super::link::try_parse_link_definition;
use super::list::{parse_list, peek_list_marker};
use super::{finish, Parser};

/// State threaded through block parsing: the heading level that closes the
/// current sequence (0 at the document level, where nothing does) and how
/// many `>` markers prefix every line of the enclosing blockquotes.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct BlockContext {
    pub heading_floor: u8,
    pub quote_depth: u32,
}

impl BlockContext {
    fn with_floor(self, heading_floor: u8) -> Self {
        Self {
            heading_floor,
            ..self
        }
    }

    fn nested_quote(self) -> Self {
        Self {
            heading_floor: 0,
            quote_depth: self.quote_depth + 1,
        }
    }
}

pub(crate) fn parse_document(p: &mut Parser) -> Node {
    let children = parse_blocks(p, BlockContext::default());
    let source = p.source().clone();
    let len = source.len();
    finish(
        NodeBuilder::new(NodeBody::Document, source)
            .span(0..len)
            .children(children),
    )
}

/// Parse a sequence of sibling blocks. Returns when the input ends, when a
/// heading at or above the context's floor appears (the caller owns it), or
/// when a line no longer carries the enclosing quote prefix.
pub(super) fn parse_blocks(p: &mut Parser, ctx: BlockContext) -> Vec<Node> {
    let mut blocks = Vec::new();
    loop {
        if p.at_eof() {
            break;
        }
        let line_checkpoint = p.checkpoint();
        // The prefix of the first line of a nested quote has already been
        // consumed by the enclosing dispatch, so only strip prefixes when
        // actually positioned at a line start.
        let offset = p.offset();
        if ctx.quote_depth > 0
            && p.offset_at_line_start(offset)
            && !consume_quote_prefix(p, ctx.quote_depth)
        {
            p.rewind(line_checkpoint);
            break;
        }

        // Blank lines between blocks are skipped.
        let content_checkpoint = p.checkpoint();
        if p.at(TokenKind::WHITESPACE) {
            p.bump();
        }
        if p.at(TokenKind::LINE_ENDING) {
            p.bump();
            continue;
        }
        if p.at_eof() {
            break;
        }
        p.rewind(content_checkpoint);

        let before = p.offset();
        match p.current() {
            TokenKind::HASH => match try_parse_heading(p, ctx) {
                HeadingOutcome::Heading(node) => blocks.push(node),
                HeadingOutcome::Terminate => {
                    p.rewind(line_checkpoint);
                    break;
                }
                HeadingOutcome::NotHeading => blocks.push(parse_paragraph(p, ctx)),
            },
            TokenKind::RANGLE => match try_parse_blockquote(p, ctx) {
                Some(node) => blocks.push(node),
                None => blocks.push(parse_paragraph(p, ctx)),
            },
            TokenKind::BACKTICK | TokenKind::TILDE if probe_fence(p) => {
                blocks.push(parse_code_block(p));
            }
            TokenKind::LSQUARE if !at_wikilink_start(p) => {
                match try_parse_link_definition(p) {
                    Some(node) => blocks.push(node),
                    None => blocks.push(parse_paragraph(p, ctx)),
                }
            }
            kind if kind.is_bullet_marker()
                || kind == TokenKind::NUMBER
                || kind == TokenKind::WHITESPACE =>
            {
                match peek_list_marker(p) {
                    Some(marker) => blocks.push(parse_list(p, ctx, marker)),
                    None => blocks.push(parse_paragraph(p, ctx)),
                }
            }
            _ => blocks.push(parse_paragraph(p, ctx)),
        }

        // Recovery guard: every path must make progress on malformed input.
        if p.offset() == before && !p.at_eof() {
            p.bump();
        }
    }
    blocks
}

/// Consume the `>` (plus optional following space) prefix of a quoted line,
/// once per enclosing quote level. Returns false when the prefix is not
/// fully present, which ends the quote.
pub(super) fn consume_quote_prefix(p: &mut Parser, depth: u32) -> bool {
    for _ in 0..depth {
        if p.expect(TokenKind::RANGLE).is_none() {
            return false;
        }
        if p.at(TokenKind::WHITESPACE) {
            p.bump();
        }
    }
    true
}

/// Returns true if the upcoming line opens a block that interrupts a
/// paragraph: a heading, a list item, a code fence, or a blockquote.
pub(super) fn is_block_interrupt(p: &mut Parser) -> bool {
    match p.current() {
        TokenKind::HASH => {
            let checkpoint = p.checkpoint();
            let mut level = 0u8;
            while p.at(TokenKind::HASH) && level < 7 {
                p.bump();
                level += 1;
            }
            let is_heading = (1..=6).contains(&level) && p.at(TokenKind::WHITESPACE);
            p.rewind(checkpoint);
            is_heading
        }
        TokenKind::RANGLE => {
            let checkpoint = p.checkpoint();
            p.bump();
            let is_quote = p.at(TokenKind::WHITESPACE) || p.at(TokenKind::LINE_ENDING);
            p.rewind(checkpoint);
            is_quote
        }
        TokenKind::BACKTICK | TokenKind::TILDE => probe_fence(p),
        _ => peek_list_marker(p).is_some(),
    }
}

/// Count the delimiter run at the cursor without consuming it; a run of 3+
/// at line start is a code fence.
fn probe_fence(p: &mut Parser) -> bool {
    let kind = p.current();
    let checkpoint = p.checkpoint();
    let mut count = 0;
    while p.at(kind) {
        p.bump();
        count += 1;
    }
    p.rewind(checkpoint);
    count >= 3
}

fn at_wikilink_start(p: &mut Parser) -> bool {
    let token = p.peek_token();
    p.source().byte(token.end()) == Some(b'[')
}

enum HeadingOutcome {
    NotHeading,
    Terminate,
    Heading(Node),
}

/// Parse an ATX heading and the blocks it contains. A heading of level N
/// owns every following block until a heading of level <= N or the end of
/// the sequence; `### Requirement:` and `#### Scenario:` headers become
/// their respective named nodes, and exact `## <TYPE> Requirements` titles
/// mark delta sections.
fn try_parse_heading(p: &mut Parser, ctx: BlockContext) -> HeadingOutcome {
    let checkpoint = p.checkpoint();
    let start = p.offset();
    let mut level = 0u8;
    while p.at(TokenKind::HASH) && level < 7 {
        p.bump();
        level += 1;
    }
    if !(1..=6).contains(&level) || !p.at(TokenKind::WHITESPACE) {
        p.rewind(checkpoint);
        return HeadingOutcome::NotHeading;
    }
    if level <= ctx.heading_floor {
        p.rewind(checkpoint);
        return HeadingOutcome::Terminate;
    }
    p.bump(); // the separating whitespace

    let title_start = p.offset();
    let mut title_end = title_start;
    while !p.at(TokenKind::LINE_ENDING) && !p.at_eof() {
        title_end = p.bump().end();
    }
    let heading_line_end = title_end;
    if p.at(TokenKind::LINE_ENDING) {
        p.bump();
    }
    // A delimiter run in the title may have shifted the lexer's context;
    // the heading line is over, so force it back.
    p.set_lex_context(LexContext::Regular);

    let title =
        TextPointer::from_span(p.source().clone(), title_start..title_end).trim_ascii();
    let body = classify_heading(level, title);

    let children = parse_blocks(p, ctx.with_floor(level));
    let end = children.last().map_or(heading_line_end, Node::end);
    HeadingOutcome::Heading(finish(
        NodeBuilder::new(body, p.source().clone())
            .span(start..end)
            .children(children),
    ))
}

fn classify_heading(level: u8, title: TextPointer) -> NodeBody {
    let bytes = title.as_bytes();
    if level == 3 {
        if let Some(rest) = bytes.strip_prefix(b"Requirement:") {
            let name = trim_ascii_bytes(rest);
            // A requirement header without a name degrades to a section.
            if !name.is_empty() {
                return NodeBody::Requirement(Requirement {
                    name: lossy_box(name),
                });
            }
        }
    }
    if level == 4 {
        if let Some(rest) = bytes.strip_prefix(b"Scenario:") {
            let name = trim_ascii_bytes(rest);
            if !name.is_empty() {
                return NodeBody::Scenario(Scenario {
                    name: lossy_box(name),
                });
            }
        }
    }
    let delta = if level == 2 {
        match bytes {
            b"ADDED Requirements" => DeltaType::Added,
            b"MODIFIED Requirements" => DeltaType::Modified,
            b"REMOVED Requirements" => DeltaType::Removed,
            b"RENAMED Requirements" => DeltaType::Renamed,
            _ => DeltaType::None,
        }
    } else {
        DeltaType::None
    };
    NodeBody::Section(Section {
        level,
        title,
        delta,
    })
}

pub(super) fn trim_ascii_bytes(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(start, |index| index + 1);
    &bytes[start..end]
}

pub(super) fn lossy_box(bytes: &[u8]) -> Box<str> {
    String::from_utf8_lossy(bytes).into_owned().into_boxed_str()
}

/// Parse a blockquote: `>`-prefixed lines whose stripped content is parsed
/// recursively as blocks. The quote ends at the first line that lacks the
/// prefix (blank lines included).
fn try_parse_blockquote(p: &mut Parser, ctx: BlockContext) -> Option<Node> {
    let checkpoint = p.checkpoint();
    let start = p.offset();
    p.bump(); // RANGLE
    if !p.at(TokenKind::WHITESPACE) && !p.at(TokenKind::LINE_ENDING) {
        p.rewind(checkpoint);
        return None;
    }
    // Consume this line's marker here; the nested loop strips the prefix of
    // every following line itself.
    if p.at(TokenKind::WHITESPACE) {
        p.bump();
    }

    let children = parse_blocks(p, ctx.nested_quote());
    let end = children.last().map_or(start + 1, Node::end);
    Some(finish(
        NodeBuilder::new(NodeBody::Blockquote, p.source().clone())
            .span(start..end)
            .children(children),
    ))
}
