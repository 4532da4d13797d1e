//! Source spans and line lookup
//!
//! Every node produced by the parsers carries a byte `Span` into the source
//! text plus the 1-indexed line it starts on. `LineIndex` converts byte
//! offsets back to line/column pairs.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A half-open byte range in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span from a range
    pub fn from_range(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }

    /// Length in bytes
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span covers no bytes
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a range for slicing
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Byte offsets of line starts, for offset → line/column conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for `text`
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// 1-indexed line containing `offset`
    pub fn line(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// 1-indexed line and 0-indexed column of `offset`
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line(offset);
        let col = offset - self.line_starts[line - 1];
        (line, col)
    }

    /// Byte offset at which the 1-indexed `line` starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line.checked_sub(1)?).copied()
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 0));
        assert_eq!(index.line_col(1), (1, 1));
        assert_eq!(index.line_col(3), (2, 0));
        assert_eq!(index.line_col(6), (3, 0));
        assert_eq!(index.line_col(8), (4, 1));
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(4, 6).merge(Span::new(1, 5));
        assert_eq!(merged, Span::new(1, 6));
        assert_eq!(merged.len(), 5);
    }
}
