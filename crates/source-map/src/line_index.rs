//! Line index for offset ↔ line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A line and column position (0-indexed).
///
/// [`LineIndex::line_col`] counts the column in bytes and
/// [`LineIndex::utf16_line_col`] in UTF-16 code units. Position maps and tool
/// positions use UTF-16 columns, like JavaScript string indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column within the line.
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Interprets `self` as a position relative to `base` and returns the
    /// absolute position.
    ///
    /// Only the first relative line is offset by `base.col`; later lines
    /// start at column 0 of the enclosing text.
    #[inline]
    pub fn relative_to(self, base: LineCol) -> LineCol {
        if self.line == 0 {
            LineCol::new(base.line, base.col + self.col)
        } else {
            LineCol::new(base.line + self.line, self.col)
        }
    }
}

/// Byte offsets of line starts, for O(log n) lookups in both directions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset is past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        Some(LineCol {
            line: line as u32,
            col,
        })
    }

    /// Converts a line/column position to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        Some(line_start + TextSize::from(line_col.col))
    }

    /// Converts a byte offset in `text` to a position with a UTF-16 column.
    ///
    /// Returns `None` if the offset is past the end of the text or inside a
    /// character.
    pub fn utf16_line_col(&self, text: &str, offset: ByteOffset) -> Option<LineCol> {
        let LineCol { line, col } = self.line_col(offset)?;
        let start = usize::from(self.line_starts[line as usize]);
        let prefix = text.get(start..start + col as usize)?;
        Some(LineCol::new(line, prefix.encode_utf16().count() as u32))
    }

    /// Converts a position with a UTF-16 column back to a byte offset in
    /// `text`. Columns past the end of the line clamp to the line end.
    pub fn utf16_offset(&self, text: &str, line_col: LineCol) -> Option<ByteOffset> {
        let line = line_col.line as usize;
        let start = usize::from(*self.line_starts.get(line)?);
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(text.len(), |next| usize::from(*next));

        let mut units = 0;
        for (index, c) in text.get(start..end)?.char_indices() {
            if units >= line_col.col {
                return Some(TextSize::from((start + index) as u32));
            }
            units += c.len_utf16() as u32;
        }
        Some(TextSize::from(end as u32))
    }

    /// Returns the position just past the last byte of the text.
    pub fn end(&self) -> LineCol {
        let last = self.line_starts.len() - 1;
        LineCol::new(
            last as u32,
            u32::from(self.len) - u32::from(self.line_starts[last]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(5)), Some(LineCol::new(0, 5)));
        assert_eq!(index.line_col(TextSize::from(6)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(TextSize::from(12)), Some(LineCol::new(2, 0)));
        assert_eq!(index.line_col(TextSize::from(16)), None);
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "let a;\n\n$m: a = 1;\n";
        let index = LineIndex::new(text);

        for offset in 0..=text.len() {
            let offset = TextSize::from(offset as u32);
            let line_col = index.line_col(offset).unwrap();
            assert_eq!(index.offset(line_col), Some(offset));
        }
    }

    #[test]
    fn test_end_position() {
        assert_eq!(LineIndex::new("").end(), LineCol::new(0, 0));
        assert_eq!(LineIndex::new("ab\ncd").end(), LineCol::new(1, 2));
        assert_eq!(LineIndex::new("ab\n").end(), LineCol::new(1, 0));
    }

    #[test]
    fn test_utf16_columns() {
        let text = "let é = '😀';
x";
        let index = LineIndex::new(text);

        let quote = text.rfind('\'').unwrap();
        assert_eq!(quote, 14);
        assert_eq!(
            index.line_col(TextSize::from(quote as u32)),
            Some(LineCol::new(0, 14))
        );
        assert_eq!(
            index.utf16_line_col(text, TextSize::from(quote as u32)),
            Some(LineCol::new(0, 11))
        );
        assert_eq!(
            index.utf16_offset(text, LineCol::new(0, 11)),
            Some(TextSize::from(quote as u32))
        );
        assert_eq!(index.utf16_line_col(text, TextSize::from(5)), None);
        assert_eq!(
            index.utf16_offset(text, LineCol::new(1, 9)),
            Some(TextSize::from(text.len() as u32))
        );
    }

    #[test]
    fn test_relative_to() {
        let base = LineCol::new(3, 8);
        assert_eq!(LineCol::new(0, 4).relative_to(base), LineCol::new(3, 12));
        assert_eq!(LineCol::new(2, 4).relative_to(base), LineCol::new(5, 4));
    }
}
