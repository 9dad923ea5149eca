use once_cell::sync::OnceCell;

use memchr::memchr2_iter;
use serde::Serialize;

use crate::syntax::SourceText;

/// A resolved position in the source: 1-based line, 0-based byte column
/// within the line, and the absolute byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

/// Bidirectional byte-offset to (line, column) conversion over a source
/// buffer. The line-start table is built lazily on the first query and
/// shared by all subsequent lookups; `\n`, `\r`, and `\r\n` are each a
/// single line terminator.
pub struct LineIndex {
    source: SourceText,
    line_starts: OnceCell<Vec<u32>>,
}

impl LineIndex {
    pub fn new(source: impl Into<SourceText>) -> Self {
        Self {
            source: source.into(),
            line_starts: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Scan the source once, recording the byte offset that begins each
    /// line. The table always contains at least one entry (offset 0).
    fn line_starts(&self) -> &[u32] {
        self.line_starts.get_or_init(|| {
            let bytes = self.source.as_bytes();
            let mut starts = vec![0u32];
            for index in memchr2_iter(b'\r', b'\n', bytes) {
                // The \n of a \r\n pair was already accounted for by the \r.
                if bytes[index] == b'\n' && index > 0 && bytes[index - 1] == b'\r' {
                    continue;
                }
                if bytes[index] == b'\r' && bytes.get(index + 1) == Some(&b'\n') {
                    starts.push(index as u32 + 2);
                } else {
                    starts.push(index as u32 + 1);
                }
            }
            starts
        })
    }

    /// The number of lines in the source. An empty source has one line; a
    /// trailing terminator starts a final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts().len()
    }

    /// Convert a byte offset to a 1-based line and 0-based byte column.
    /// Offsets at or past the end of the source resolve to the position of
    /// EOF on the last line.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let starts = self.line_starts();
        let line_index = starts.partition_point(|start| *start as usize <= offset) - 1;
        let column = offset - starts[line_index] as usize;
        (line_index as u32 + 1, column as u32)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let (line, column) = self.line_col(offset);
        Position {
            line,
            column,
            offset,
        }
    }

    /// The byte offset at which the given 1-based line begins, or None if
    /// the line does not exist.
    pub fn line_start(&self, line: u32) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts()
            .get(line as usize - 1)
            .map(|start| *start as usize)
    }

    /// The byte offset at which the given 1-based line's content ends,
    /// excluding the line terminator.
    pub fn line_end(&self, line: u32) -> Option<usize> {
        let start = self.line_start(line)?;
        let starts = self.line_starts();
        match starts.get(line as usize) {
            Some(next_start) => Some(*next_start as usize - self.terminator_len(*next_start as usize)),
            None => Some(self.source.len()),
        }
        .map(|end| end.max(start))
    }

    /// Convert a 1-based line and 0-based column to a byte offset. Returns
    /// None for a line that does not exist; a column past the end of the
    /// line is clamped to its last addressable byte.
    pub fn offset_at(&self, line: u32, column: u32) -> Option<usize> {
        let start = self.line_start(line)?;
        let starts = self.line_starts();
        // Clamp within the line, keeping positions on the terminator bytes
        // addressable so that every valid offset round-trips.
        let max_column = match starts.get(line as usize) {
            Some(next_start) => (*next_start as usize - 1).saturating_sub(start),
            None => self.source.len() - start,
        };
        Some(start + (column as usize).min(max_column))
    }

    /// The number of bytes of the terminator ending at `next_start`.
    fn terminator_len(&self, next_start: usize) -> usize {
        let bytes = self.source.as_bytes();
        if next_start >= 2 && &bytes[next_start - 2..next_start] == b"\r\n" {
            2
        } else {
            1
        }
    }
}
