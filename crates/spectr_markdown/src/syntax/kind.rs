use serde::Serialize;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TokenKind {
    // The start of the input text, or an emptied token.
    #[default]
    TOMBSTONE = 0,
    EOF, // The end of the input text; zero-width.
    // Structural
    LINE_ENDING, // \n, \r, or \r\n
    WHITESPACE,  // A run of spaces and tabs.
    TEXT,        // Any string of contiguous insignificant bytes.
    ERROR,       // A recoverable lexing failure; carries a message.
    // Punctuation
    HASH,     // #
    STAR,     // *
    UNDER,    // _
    TILDE,    // ~
    BACKTICK, // `
    MINUS,    // -
    PLUS,     // +
    DOT,      // .
    COLON,    // :
    PIPE,     // |
    LSQUARE,  // [
    RSQUARE,  // ]
    LPAREN,   // (
    RPAREN,   // )
    RANGLE,   // >
    // Special
    NUMBER, // A run of ASCII digits.
    CHECK,  // A single `x` or `X` inside checkbox brackets.
}

impl TokenKind {
    /// Returns true for the kinds that can participate in an emphasis,
    /// strikethrough, or code delimiter run.
    pub fn is_inline_delimiter(self) -> bool {
        matches!(self, TokenKind::STAR | TokenKind::UNDER | TokenKind::TILDE)
    }

    /// Returns true for the bullet characters that can open an unordered
    /// list item.
    pub fn is_bullet_marker(self) -> bool {
        matches!(self, TokenKind::MINUS | TokenKind::PLUS | TokenKind::STAR)
    }

    /// Returns the token kind that a single significant punctuation byte
    /// lexes to in the regular context.
    pub fn from_punct_byte(byte: u8) -> Option<TokenKind> {
        Some(match byte {
            b'#' => TokenKind::HASH,
            b'*' => TokenKind::STAR,
            b'_' => TokenKind::UNDER,
            b'~' => TokenKind::TILDE,
            b'`' => TokenKind::BACKTICK,
            b'-' => TokenKind::MINUS,
            b'+' => TokenKind::PLUS,
            b'.' => TokenKind::DOT,
            b':' => TokenKind::COLON,
            b'|' => TokenKind::PIPE,
            b'[' => TokenKind::LSQUARE,
            b']' => TokenKind::RSQUARE,
            b'(' => TokenKind::LPAREN,
            b')' => TokenKind::RPAREN,
            b'>' => TokenKind::RANGLE,
            _ => return None,
        })
    }
}
