//! Text utilities for position conversion.
//!
//! Provides byte offset <-> LSP position conversion with proper UTF-16
//! handling, plus line lookups used by the docstring listing feed.

use tower_lsp::lsp_types::Position;

/// Pre-computed line index for efficient position lookups.
///
/// LSP positions use line/column where column is in UTF-16 code units.
/// This struct pre-computes line start offsets for O(log n) lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    /// Source text (needed for UTF-16 column calculation).
    source: String,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            line_starts,
            source,
        }
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The line containing the given byte offset (0-based).
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    /// Byte range of a line, including its trailing newline if present.
    fn line_span(&self, line: usize) -> (usize, usize) {
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());
        (start, end)
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// Uses binary search for O(log n) line lookup, then scans the line for
    /// the UTF-16 column.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let line = self.line_of_offset(offset);
        let (line_start, line_end) = self.line_span(line);

        let mut col = 0u32;
        let line_slice = &self.source[line_start..line_end];

        for (i, c) in line_slice.char_indices() {
            if line_start + i >= offset {
                break;
            }
            col += c.len_utf16() as u32;
        }

        Position::new(line as u32, col)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns None if the position is out of bounds.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;

        if line >= self.line_starts.len() {
            return None;
        }

        let (line_start, raw_end) = self.line_span(line);
        let line_end = if raw_end > line_start && self.source.as_bytes()[raw_end - 1] == b'\n' {
            raw_end - 1
        } else {
            raw_end
        };

        let line_slice = &self.source[line_start..line_end];

        // Walk UTF-16 code units to find the byte offset
        let mut utf16_col = 0u32;
        for (i, c) in line_slice.char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        // Position is at or past end of line
        Some(line_end.min(self.source.len()))
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &std::ops::Range<usize>) -> tower_lsp::lsp_types::Range {
        let start = self.offset_to_position(span.start);
        let end = self.offset_to_position(span.end);
        tower_lsp::lsp_types::Range::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let idx = LineIndex::new("(defun f ())".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(7), Position::new(0, 7));
        assert_eq!(idx.offset_to_position(12), Position::new(0, 12));
    }

    #[test]
    fn multi_line() {
        let idx = LineIndex::new("(defun f ()\n  \"Doc.\"\n  nil)".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(11), Position::new(0, 11));
        assert_eq!(idx.offset_to_position(12), Position::new(1, 0));
        assert_eq!(idx.offset_to_position(14), Position::new(1, 2));
        assert_eq!(idx.offset_to_position(21), Position::new(2, 0));
    }

    #[test]
    fn line_of_offset() {
        let idx = LineIndex::new("ab\ncd\nef".to_string());
        assert_eq!(idx.line_of_offset(0), 0);
        assert_eq!(idx.line_of_offset(2), 0);
        assert_eq!(idx.line_of_offset(3), 1);
        assert_eq!(idx.line_of_offset(6), 2);
        assert_eq!(idx.line_of_offset(8), 2);
    }

    #[test]
    fn position_to_offset_round_trip() {
        let idx = LineIndex::new("(defvar x 1)\n(defvar y 2)".to_string());
        for offset in [0usize, 5, 12, 13, 20, 25] {
            let pos = idx.offset_to_position(offset);
            assert_eq!(idx.position_to_offset(pos), Some(offset));
        }
    }

    #[test]
    fn utf16_handling() {
        // '😀' is 4 bytes in UTF-8 but 2 code units in UTF-16
        let idx = LineIndex::new("a😀b".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(1), Position::new(0, 1));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 3));
        assert_eq!(idx.position_to_offset(Position::new(0, 3)), Some(5));
    }

    #[test]
    fn out_of_bounds_line() {
        let idx = LineIndex::new("(ignore)".to_string());
        assert_eq!(idx.position_to_offset(Position::new(3, 0)), None);
    }

    #[test]
    fn span_to_range() {
        let idx = LineIndex::new("(a)\n(b c)".to_string());
        let range = idx.span_to_range(&(4..9));
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 5));
    }
}
