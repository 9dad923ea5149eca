use serde::Serialize;
use thiserror::Error;

use crate::ast::{Node, NodeBuilder, NodeKind};
use crate::lexer::{LexContext, Lexer, LexerCheckpoint};
use crate::syntax::{SourceText, Token, TokenKind};

use self::block::parse_document;

mod block;
mod code_block;
mod delimiter;
mod inline;
mod link;
mod list;
mod wikilink;

/// The parser stops recording errors after this many, but keeps parsing so
/// the returned tree is always complete.
pub const MAX_PARSE_ERRORS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A recoverable problem found while parsing. Offsets are byte offsets into
/// the source, usable with [`crate::LineIndex`] for (line, column) display.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
    pub severity: Severity,
}

pub struct ParseResult {
    pub root: Node,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Every link-reference definition in the document, in document order.
    /// Definitions sit in the tree at the position they were written; this
    /// is the document-level registry consumers resolve references against.
    pub fn link_defs(&self) -> Vec<Node> {
        self.root
            .descendants()
            .filter(|node| node.kind() == NodeKind::LinkDef)
            .collect()
    }
}

/// Parse a source buffer into a Document tree plus the errors encountered.
/// Parsing never fails: malformed input is recovered locally and reported,
/// and the returned tree is always well-formed.
pub fn parse(source: impl Into<SourceText>) -> ParseResult {
    let source: SourceText = source.into();
    let mut parser = Parser::new(source);
    let root = parse_document(&mut parser);
    ParseResult {
        root,
        errors: parser.errors,
    }
}

#[derive(Debug)]
pub(crate) struct ParserCheckpoint {
    lexer: LexerCheckpoint,
    errors_len: usize,
}

/// The token-stream-driven parser. One token of lookahead is held by the
/// lexer; speculative paths (code spans, links, link definitions) capture a
/// checkpoint and rewind both the lexer and the error list when the
/// speculation fails.
pub(crate) struct Parser {
    lexer: Lexer,
    source: SourceText,
    errors: Vec<ParseError>,
}

impl Parser {
    pub(crate) fn new(source: SourceText) -> Self {
        Self {
            lexer: Lexer::new(source.clone()),
            source,
            errors: Vec::new(),
        }
    }

    pub(crate) fn source(&self) -> &SourceText {
        &self.source
    }

    /// The kind of the next unconsumed token.
    pub(crate) fn current(&mut self) -> TokenKind {
        self.lexer.peek().kind()
    }

    pub(crate) fn peek_token(&mut self) -> Token {
        self.lexer.peek()
    }

    /// Returns true if the next token is of the given kind.
    #[inline]
    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&mut self) -> bool {
        self.at(TokenKind::EOF)
    }

    /// The byte offset the next token starts at.
    pub(crate) fn offset(&mut self) -> usize {
        self.lexer.peek().start()
    }

    /// Consume and return the next token. ERROR tokens are surfaced as parse
    /// errors here so every consumption path reports them exactly once.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.lexer.next();
        if token.kind() == TokenKind::ERROR {
            self.report_lex_error(&token);
        }
        token
    }

    /// Consume the next token if it matches, otherwise leave it and return
    /// None for the caller to handle.
    #[must_use]
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            lexer: self.lexer.checkpoint(),
            errors_len: self.errors.len(),
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: ParserCheckpoint) {
        self.lexer.rewind(checkpoint.lexer);
        self.errors.truncate(checkpoint.errors_len);
    }

    pub(crate) fn set_lex_context(&mut self, context: LexContext) {
        self.lexer.set_context(context);
    }

    /// Jump the lexer to an absolute position. Used after a region has been
    /// consumed directly from the raw bytes (wikilinks).
    pub(crate) fn seek(&mut self, position: usize, context: LexContext) {
        self.lexer.seek(position, context);
    }

    pub(crate) fn report(
        &mut self,
        offset: usize,
        message: impl Into<String>,
        severity: Severity,
    ) {
        if self.errors.len() >= MAX_PARSE_ERRORS {
            return;
        }
        self.errors.push(ParseError {
            offset,
            message: message.into(),
            severity,
        });
    }

    fn report_lex_error(&mut self, token: &Token) {
        let offset = token.start();
        // Speculative parsing can re-consume the same token after a rewind;
        // the error list is small (capped), so a linear dedupe is fine.
        if self.errors.iter().any(|error| error.offset == offset) {
            return;
        }
        let message = token.message().unwrap_or("unexpected character").to_string();
        self.report(offset, message, Severity::Error);
    }

    /// A position is at line start if it is offset 0 or preceded by a line
    /// terminator byte.
    pub(crate) fn offset_at_line_start(&self, offset: usize) -> bool {
        offset == 0
            || matches!(
                self.source.byte(offset.wrapping_sub(1)),
                Some(b'\n') | Some(b'\r')
            )
    }
}

/// Finish a builder whose span and children were established by the parser.
/// The parser only constructs nodes that satisfy the builder's invariants,
/// so a failure here is a bug in the parser itself.
pub(crate) fn finish(builder: NodeBuilder) -> Node {
    builder
        .build()
        .expect("parser constructed a node that failed validation")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_parse_produces_a_document() {
        for source in ["", "\n", "# only a heading", "*", "](", "[[", "```"] {
            let result = parse(source);
            assert_eq!(result.root.kind(), NodeKind::Document);
            assert_eq!(result.root.span(), 0..source.len());
        }
    }

    #[test]
    fn the_document_hash_covers_the_whole_source() {
        let a = parse("# A\n").root;
        let b = parse("# B\n").root;
        assert_ne!(a.hash(), b.hash());
        assert!(!a.deep_equal(&b));
    }

    #[test]
    fn errors_are_values_not_panics() {
        // A pathological soup of unterminated constructs still yields a
        // tree; everything unrecoverable is demoted or reported.
        let result = parse("[a](b `c **d [[e\n### Requirement:\n```\n");
        assert_eq!(result.root.kind(), NodeKind::Document);
        assert!(result.errors.len() <= MAX_PARSE_ERRORS);
    }
}
