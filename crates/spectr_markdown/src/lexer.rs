use memchr::memchr2;
use thiserror::Error;

use crate::byte_lookup::{byte_is_significant, utf8_sequence_length};
use crate::syntax::{SourceText, TextPointer, TextSpan, Token, TokenKind};

const INVALID_UTF8_MESSAGE: &str = "invalid UTF-8 byte sequence";

/// A recoverable failure encountered while tokenizing, extracted from the
/// ERROR tokens of a drained stream.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

/// The context the lexer is currently reading in. The fenced-code and
/// inline-code contexts are entered and exited by the lexer itself when it
/// recognises delimiter runs; the link-URL context is entered by the parser
/// after it has committed to a `](` sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LexContext {
    /// Normal lexing, where all tokens are treated as they are intuitively.
    #[default]
    Regular,
    /// Inside a fenced code block: entire lines are single TEXT tokens with
    /// no semantics inside them, until a closing fence line.
    FencedCode { fence: u8, len: u32 },
    /// Inside an inline code span: content is TEXT and LINE_ENDING only,
    /// until a backtick run of exactly the opening length.
    InlineCode { len: u32 },
    /// Inside a link destination: punctuation loses its meaning, whitespace
    /// still separates the destination from a title, and `)` exits.
    LinkUrl,
}

#[derive(Clone, Debug)]
pub(crate) struct LexerCheckpoint {
    position: usize,
    context: LexContext,
    pending_delims: u32,
    pending_kind: TokenKind,
    peeked: Option<Token>,
}

pub struct Lexer {
    source: SourceText,
    /// Current byte offset into the source.
    position: usize,
    context: LexContext,
    /// Number of delimiter tokens still to be emitted from a counted
    /// backtick or tilde run. The run length is only used to pick a context
    /// transition; the tokens themselves are emitted one per byte.
    pending_delims: u32,
    pending_kind: TokenKind,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(source: impl Into<SourceText>) -> Self {
        Self {
            source: source.into(),
            position: 0,
            context: LexContext::Regular,
            pending_delims: 0,
            pending_kind: TokenKind::TOMBSTONE,
            peeked: None,
        }
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Advance and return the next token. Once the end of the input is
    /// reached, every subsequent call returns the same zero-width EOF.
    pub fn next(&mut self) -> Token {
        match self.peeked.take() {
            Some(token) => token,
            None => self.lex_token(),
        }
    }

    /// Return the next token without consuming it. Repeated peeks yield the
    /// identical token until `next` is called.
    pub fn peek(&mut self) -> Token {
        if let Some(token) = &self.peeked {
            return token.clone();
        }
        let token = self.lex_token();
        self.peeked = Some(token.clone());
        token
    }

    /// Drain the stream through EOF, returning every token alongside the
    /// extracted lex errors.
    pub fn all_with_errors(&mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        loop {
            let token = self.next();
            let is_eof = token.kind() == TokenKind::EOF;
            if let Some(message) = token.message() {
                errors.push(LexError {
                    offset: token.start(),
                    message: message.to_string(),
                });
            }
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, errors)
    }

    /// Switch the lexing context. Any buffered lookahead token is discarded
    /// and the cursor rewound to its start so it will be re-read under the
    /// new context.
    pub(crate) fn set_context(&mut self, context: LexContext) {
        if let Some(token) = self.peeked.take() {
            self.position = token.start();
        }
        self.pending_delims = 0;
        self.context = context;
    }

    /// Move the cursor to an absolute byte position, discarding lookahead.
    /// Used by the parser after consuming a region of the source directly
    /// (wikilinks are parsed from the raw bytes between their brackets).
    pub(crate) fn seek(&mut self, position: usize, context: LexContext) {
        debug_assert!(position <= self.source.len());
        self.peeked = None;
        self.pending_delims = 0;
        self.position = position;
        self.context = context;
    }

    pub(crate) fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            position: self.position,
            context: self.context,
            pending_delims: self.pending_delims,
            pending_kind: self.pending_kind,
            peeked: self.peeked.clone(),
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.position = checkpoint.position;
        self.context = checkpoint.context;
        self.pending_delims = checkpoint.pending_delims;
        self.pending_kind = checkpoint.pending_kind;
        self.peeked = checkpoint.peeked;
    }

    fn lex_token(&mut self) -> Token {
        if self.pending_delims > 0 {
            self.pending_delims -= 1;
            let start = self.position;
            self.position += 1;
            return self.token_from_range(self.pending_kind, start..self.position);
        }

        if self.is_eof() {
            let end = self.source.len();
            return self.token_from_range(TokenKind::EOF, end..end);
        }

        match self.context {
            LexContext::Regular => self.next_regular_token(),
            LexContext::FencedCode { fence, len } => self.next_fenced_code_token(fence, len),
            LexContext::InlineCode { len } => self.next_inline_code_token(len),
            LexContext::LinkUrl => self.next_link_url_token(),
        }
    }

    fn next_regular_token(&mut self) -> Token {
        let start = self.position;
        let kind = match self.current() {
            b'\r' | b'\n' => self.consume_line_ending(),
            b' ' | b'\t' => self.consume_whitespace(),
            b'`' | b'~' => self.consume_delimiter_run(),
            b'x' | b'X' if self.is_checkbox_body() => self.consume_byte(TokenKind::CHECK),
            b'0'..=b'9' => self.consume_number(),
            byte => match TokenKind::from_punct_byte(byte) {
                Some(kind) => self.consume_byte(kind),
                None => return self.consume_text(start, true, &[]),
            },
        };
        self.token_from_range(kind, start..self.position)
    }

    /// Lines inside a fenced code block are single verbatim TEXT tokens. A
    /// line that forms a valid closing fence (same character, at least the
    /// opening count, nothing but whitespace after) is still emitted as
    /// TEXT, but returns the lexer to the regular context.
    fn next_fenced_code_token(&mut self, fence: u8, len: u32) -> Token {
        let start = self.position;
        if matches!(self.current(), b'\r' | b'\n') {
            let kind = self.consume_line_ending();
            return self.token_from_range(kind, start..self.position);
        }

        if self.is_at_line_start() && self.is_closing_fence_line(fence, len) {
            self.consume_to_line_end();
            self.context = LexContext::Regular;
            return self.token_from_range(TokenKind::TEXT, start..self.position);
        }

        self.consume_to_line_end();
        self.token_from_range(TokenKind::TEXT, start..self.position)
    }

    /// Inside an inline code span only TEXT and LINE_ENDING are produced,
    /// except for a backtick run of exactly the opening length, which closes
    /// the span and is emitted as individual BACKTICK tokens.
    fn next_inline_code_token(&mut self, len: u32) -> Token {
        let start = self.position;
        match self.current() {
            b'\r' | b'\n' => {
                let kind = self.consume_line_ending();
                self.token_from_range(kind, start..self.position)
            }
            b'`' => {
                let run = self.count_run(b'`');
                if run == len {
                    self.context = LexContext::Regular;
                    self.begin_delimiter_run(TokenKind::BACKTICK, run)
                } else {
                    // An unequal run is literal content.
                    self.position += run as usize;
                    self.consume_text(start, false, &[b'`'])
                }
            }
            _ => self.consume_text(start, false, &[b'`']),
        }
    }

    fn next_link_url_token(&mut self) -> Token {
        let start = self.position;
        match self.current() {
            b'\r' | b'\n' => {
                let kind = self.consume_line_ending();
                self.context = LexContext::Regular;
                self.token_from_range(kind, start..self.position)
            }
            b' ' | b'\t' => {
                let kind = self.consume_whitespace();
                self.token_from_range(kind, start..self.position)
            }
            b')' => {
                self.position += 1;
                self.context = LexContext::Regular;
                self.token_from_range(TokenKind::RPAREN, start..self.position)
            }
            _ => self.consume_text(start, false, &[b')', b' ', b'\t']),
        }
    }

    /// Consume a single line ending: `\r\n`, `\n`, or a bare `\r`.
    fn consume_line_ending(&mut self) -> TokenKind {
        if self.current() == b'\r' {
            self.position += 1;
            if !self.is_eof() && self.current() == b'\n' {
                self.position += 1;
            }
        } else {
            self.position += 1;
        }
        TokenKind::LINE_ENDING
    }

    /// Consume a contiguous run of spaces and tabs.
    fn consume_whitespace(&mut self) -> TokenKind {
        while !self.is_eof() && matches!(self.current(), b' ' | b'\t') {
            self.position += 1;
        }
        TokenKind::WHITESPACE
    }

    fn consume_number(&mut self) -> TokenKind {
        while !self.is_eof() && self.current().is_ascii_digit() {
            self.position += 1;
        }
        TokenKind::NUMBER
    }

    fn consume_byte(&mut self, kind: TokenKind) -> TokenKind {
        self.position += 1;
        kind
    }

    /// Consume the start of a backtick or tilde run, deciding the context
    /// transition from the run length. The run's tokens are always emitted
    /// one per byte; only the transition depends on the count:
    ///
    ///   - a run of 3+ at line start opens a fenced code block,
    ///   - any other backtick run opens an inline code span,
    ///   - tildes outside fences are ordinary delimiter tokens.
    fn consume_delimiter_run(&mut self) -> TokenKind {
        let fence = self.current();
        let kind = if fence == b'`' {
            TokenKind::BACKTICK
        } else {
            TokenKind::TILDE
        };
        let run = self.count_run(fence);

        if self.is_at_line_start() && run >= 3 {
            self.context = LexContext::FencedCode { fence, len: run };
            self.pending_delims = run - 1;
            self.pending_kind = kind;
        } else if fence == b'`' {
            self.context = LexContext::InlineCode { len: run };
            self.pending_delims = run - 1;
            self.pending_kind = kind;
        }

        self.consume_byte(kind)
    }

    /// Emit the first token of a counted delimiter run, leaving the rest as
    /// pending tokens for subsequent calls.
    fn begin_delimiter_run(&mut self, kind: TokenKind, run: u32) -> Token {
        self.pending_delims = run - 1;
        self.pending_kind = kind;
        let start = self.position;
        self.position += 1;
        self.token_from_range(kind, start..self.position)
    }

    /// Consume literal text from `start` until a stop byte is reached.
    /// Multi-byte UTF-8 sequences are consumed whole; an invalid sequence
    /// produces a single-byte ERROR token and lexing resumes at the next
    /// byte.
    ///
    /// In the regular context every significant punctuation byte stops the
    /// scan; other contexts pass their own reduced stop set.
    fn consume_text(&mut self, start: usize, regular: bool, stops: &[u8]) -> Token {
        let bytes = self.source.as_bytes();
        while self.position < bytes.len() {
            let byte = bytes[self.position];
            let stop = if regular {
                byte_is_significant(byte)
            } else {
                matches!(byte, b'\r' | b'\n') || stops.contains(&byte)
            };
            if stop {
                break;
            }
            if byte < 0x80 {
                self.position += 1;
                continue;
            }
            match utf8_sequence_length(bytes, self.position) {
                Some(len) => self.position += len,
                None => {
                    if self.position == start {
                        // The invalid byte itself becomes the token.
                        self.position += 1;
                        let text = self.pointer_for(start..self.position);
                        return Token::error(text, INVALID_UTF8_MESSAGE);
                    }
                    break;
                }
            }
        }
        self.token_from_range(TokenKind::TEXT, start..self.position)
    }

    /// Consume bytes up to (but not including) the next line terminator.
    fn consume_to_line_end(&mut self) {
        let bytes = self.source.as_bytes();
        match memchr2(b'\r', b'\n', &bytes[self.position..]) {
            Some(offset) => self.position += offset,
            None => self.position = bytes.len(),
        }
    }

    /// Check whether the line beginning at the cursor is a valid closing
    /// fence: a run of the fence character at least as long as the opening
    /// run, followed by nothing but spaces and tabs.
    fn is_closing_fence_line(&self, fence: u8, len: u32) -> bool {
        let bytes = self.source.as_bytes();
        let mut index = self.position;
        let mut run = 0u32;
        while index < bytes.len() && bytes[index] == fence {
            run += 1;
            index += 1;
        }
        if run < len {
            return false;
        }
        while index < bytes.len() && !matches!(bytes[index], b'\r' | b'\n') {
            if !matches!(bytes[index], b' ' | b'\t') {
                return false;
            }
            index += 1;
        }
        true
    }

    fn count_run(&self, byte: u8) -> u32 {
        let bytes = self.source.as_bytes();
        let mut index = self.position;
        while index < bytes.len() && bytes[index] == byte {
            index += 1;
        }
        (index - self.position) as u32
    }

    /// A checkbox body is a lone `x` or `X` directly between square
    /// brackets; anywhere else the letter is ordinary text.
    fn is_checkbox_body(&self) -> bool {
        self.position > 0
            && self.source.byte(self.position - 1) == Some(b'[')
            && self.source.byte(self.position + 1) == Some(b']')
    }

    /// A position is at line start if it is offset 0 or the preceding byte
    /// is a line terminator.
    fn is_at_line_start(&self) -> bool {
        self.position == 0
            || matches!(self.source.byte(self.position - 1), Some(b'\n') | Some(b'\r'))
    }

    fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    fn current(&self) -> u8 {
        self.source.as_bytes()[self.position]
    }

    fn pointer_for(&self, span: TextSpan) -> TextPointer {
        TextPointer::from_span(self.source.clone(), span)
    }

    fn token_from_range(&self, kind: TokenKind, span: TextSpan) -> Token {
        Token::new(kind, self.pointer_for(span))
    }
}
