//! Source location tracking for diagnostics.
//!
//! A [`Span`] records where a token or node starts and how many bytes it
//! covers. Spans never carry a file; diagnostics pair them with a
//! [`FileId`](crate::FileId) when the file matters.

use std::fmt;

/// A region of source text, identified by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span covers no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Extend `self` so it also covers `other`.
    ///
    /// Spans on different lines keep the start of `self`; the length becomes
    /// an approximation since a span only remembers one line.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        if self.line == other.line {
            let start = self.col.min(other.col);
            let end = (self.col + self.len).max(other.col + other.len);
            Span::new(self.line, start, end - start)
        } else if other.line < self.line {
            other.to(self)
        } else {
            Span::new(self.line, self.col, self.len + other.len)
        }
    }

    /// A zero-length span placed just after the end of this one.
    #[inline]
    pub fn end(self) -> Span {
        Span::point(self.line, self.col + self.len)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.line, self.col, self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_empty() {
        assert!(Span::point(4, 2).is_empty());
        assert!(!Span::new(4, 2, 1).is_empty());
    }

    #[test]
    fn display_is_line_and_column() {
        assert_eq!(Span::new(12, 7, 3).to_string(), "12:7");
    }

    #[test]
    fn to_covers_both_on_one_line() {
        let lhs = Span::new(1, 5, 2);
        let rhs = Span::new(1, 12, 4);
        assert_eq!(lhs.to(rhs), Span::new(1, 5, 11));
        assert_eq!(rhs.to(lhs), Span::new(1, 5, 11));
    }

    #[test]
    fn to_orders_lines() {
        let first = Span::new(2, 9, 3);
        let second = Span::new(5, 1, 4);
        let merged = second.to(first);
        assert_eq!(merged.line, 2);
        assert_eq!(merged.col, 9);
        assert_eq!(merged.len, 7);
    }

    #[test]
    fn end_points_past_last_byte() {
        assert_eq!(Span::new(3, 4, 6).end(), Span::point(3, 10));
    }
}
