/// Byte classification tables for the lexer.
///
/// Significant bytes are the characters that end a TEXT token and become a
/// token of their own (punctuation and vertical/horizontal whitespace). Note
/// that these are only the characters that are significant when they
/// interrupt textual content; a digit or an `x` is only special at the start
/// of a token and is classified by the lexer itself.
const SIGNIFICANT_BYTES: [bool; 256] = build_significant_table(b"\r\n \t#*_~`-+.:|[]()>");

const fn build_significant_table(significant: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < significant.len() {
        table[significant[i] as usize] = true;
        i += 1;
    }
    table
}

#[inline(always)]
pub(crate) fn byte_is_significant(byte: u8) -> bool {
    SIGNIFICANT_BYTES[byte as usize]
}

// Learned from: https://nullprogram.com/blog/2017/10/06/
#[rustfmt::skip]
static UTF8_LENGTH_LOOKUP: [usize; 32] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 3, 3, 4, 0,
];

/// Return the byte length of the UTF-8 code point that starts with `byte`,
/// or 0 if the byte cannot start a sequence.
#[inline(always)]
pub(crate) fn char_length_from_byte(byte: u8) -> usize {
    UTF8_LENGTH_LOOKUP[byte as usize >> 3]
}

/// Validate the UTF-8 sequence starting at `position` and return its byte
/// length. Returns None for invalid leading bytes, truncated sequences, and
/// invalid continuation bytes, in which case the lexer emits a single-byte
/// ERROR token and resumes at the next byte.
pub(crate) fn utf8_sequence_length(bytes: &[u8], position: usize) -> Option<usize> {
    let lead = bytes[position];
    // 0xC0/0xC1 are overlong encodings and 0xF5.. are beyond U+10FFFF.
    if matches!(lead, 0xC0 | 0xC1) || lead >= 0xF5 {
        return None;
    }
    let len = char_length_from_byte(lead);
    if len == 0 {
        return None;
    }
    if position + len > bytes.len() {
        return None;
    }
    for byte in &bytes[position + 1..position + len] {
        if byte & 0xC0 != 0x80 {
            return None;
        }
    }
    Some(len)
}
