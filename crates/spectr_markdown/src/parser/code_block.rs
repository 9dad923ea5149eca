use crate::ast::{CodeBlock, Node, NodeBody, NodeBuilder};
use crate::syntax::{TextPointer, TokenKind};

use super::{finish, Parser, Severity};

/// Parse a fenced code block. The lexer is already in the fenced-code
/// context (it saw the 3+ run at line start): the opener arrives as
/// individual delimiter tokens, the rest of the opener line is a single
/// TEXT token holding the info string, and every content line is a verbatim
/// TEXT token. The closing fence line also arrives as TEXT; it is
/// recognised here by its shape. An unclosed block is closed at EOF and
/// reported.
pub(super) fn parse_code_block(p: &mut Parser) -> Node {
    let fence_kind = p.current();
    let fence_byte = if fence_kind == TokenKind::BACKTICK {
        b'`'
    } else {
        b'~'
    };
    let start = p.offset();
    let mut open_len = 0usize;
    let mut opener_end = start;
    while p.at(fence_kind) {
        opener_end = p.bump().end();
        open_len += 1;
    }

    // The remainder of the opener line is the info string.
    let language = match p.expect(TokenKind::TEXT) {
        Some(info) => {
            opener_end = info.end();
            info.text_pointer().trim_ascii()
        }
        None => TextPointer::from_span(p.source().clone(), opener_end..opener_end),
    };

    let content_start = match p.expect(TokenKind::LINE_ENDING) {
        Some(newline) => newline.end(),
        None => {
            // EOF directly after the opener line.
            p.report(
                start,
                "unclosed fenced code block at end of input",
                Severity::Error,
            );
            let content =
                TextPointer::from_span(p.source().clone(), opener_end..opener_end);
            return finish(
                NodeBuilder::new(
                    NodeBody::CodeBlock(CodeBlock { language, content }),
                    p.source().clone(),
                )
                .span(start..opener_end),
            );
        }
    };

    let mut content_end = content_start;
    let end;
    loop {
        match p.current() {
            TokenKind::EOF => {
                p.report(
                    start,
                    "unclosed fenced code block at end of input",
                    Severity::Error,
                );
                content_end = p.source().len();
                end = content_end;
                break;
            }
            TokenKind::TEXT => {
                let token = p.peek_token();
                if is_closing_fence(token.text(), fence_byte, open_len) {
                    content_end = token.start();
                    end = token.end();
                    p.bump();
                    break;
                }
                p.bump();
            }
            _ => {
                p.bump();
            }
        }
    }

    let content = TextPointer::from_span(p.source().clone(), content_start..content_end);
    finish(
        NodeBuilder::new(
            NodeBody::CodeBlock(CodeBlock { language, content }),
            p.source().clone(),
        )
        .span(start..end),
    )
}

/// A closing fence is a run of the fence character at least as long as the
/// opener with nothing but whitespace after it. This mirrors the check the
/// lexer used to leave the fenced-code context.
fn is_closing_fence(bytes: &[u8], fence: u8, open_len: usize) -> bool {
    let run = bytes.iter().take_while(|byte| **byte == fence).count();
    run >= open_len
        && bytes[run..]
            .iter()
            .all(|byte| matches!(byte, b' ' | b'\t'))
}
