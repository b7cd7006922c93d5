//! Offset ↔ line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A line and column position, both 0-indexed. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed byte column within the line.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Precomputed line starts for a piece of text, for cheap offset ↔ line/col
/// conversion. The parser uses this to attach positions to syntax nodes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<ByteOffset>,
}

impl LineIndex {
    /// Builds the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Returns the number of lines in the indexed text.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Offsets past the last line start are attributed to the last line, so
    /// an end-of-text offset always yields a position.
    pub fn line_col(&self, offset: ByteOffset) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32,
            col,
        }
    }

    /// Converts a line/column position back to a byte offset.
    ///
    /// Returns `None` if the line does not exist.
    pub fn offset(&self, pos: LineCol) -> Option<ByteOffset> {
        let start = self.line_starts.get(pos.line as usize)?;
        Some(*start + TextSize::from(pos.col))
    }
}
