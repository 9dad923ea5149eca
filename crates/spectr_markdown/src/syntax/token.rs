use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use super::kind::TokenKind;
use super::text::{TextPointer, TextSpan};

#[derive(Clone, Eq, PartialEq)]
struct TokenData {
    kind: TokenKind,
    text: TextPointer,
    /// A short diagnostic, present only when `kind` is ERROR.
    message: Option<Rc<str>>,
}

/// A singular token entity: the kind of the token and its span in the
/// underlying source. The text the token represents is stored as a
/// reference-counted pointer into the original buffer, so tokens can be
/// cheaply cloned and buffered for lookahead without copying.
#[derive(Clone, Eq, PartialEq)]
pub struct Token(Rc<TokenData>);

impl Token {
    pub(crate) fn new(kind: TokenKind, text: TextPointer) -> Self {
        Self(Rc::new(TokenData {
            kind,
            text,
            message: None,
        }))
    }

    pub(crate) fn error(text: TextPointer, message: &str) -> Self {
        Self(Rc::new(TokenData {
            kind: TokenKind::ERROR,
            text,
            message: Some(Rc::from(message)),
        }))
    }

    pub fn kind(&self) -> TokenKind {
        self.0.kind
    }

    /// The starting byte offset of this token in the source.
    pub fn start(&self) -> usize {
        self.0.text.start()
    }

    /// The ending byte offset (exclusive) of this token in the source.
    pub fn end(&self) -> usize {
        self.0.text.end()
    }

    pub fn span(&self) -> TextSpan {
        self.0.text.range()
    }

    pub fn len(&self) -> usize {
        self.0.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.text.is_empty()
    }

    /// The bytes this token spans in the source.
    pub fn text(&self) -> &[u8] {
        self.0.text.as_bytes()
    }

    pub fn text_pointer(&self) -> &TextPointer {
        &self.0.text
    }

    pub fn text_lossy(&self) -> Cow<str> {
        self.0.text.to_str_lossy()
    }

    /// The diagnostic attached to an ERROR token.
    pub fn message(&self) -> Option<&str> {
        self.0.message.as_deref()
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}@{}..{} {:?}",
            self.kind(),
            self.start(),
            self.end(),
            self.text_lossy()
        )?;
        if let Some(message) = self.message() {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}
