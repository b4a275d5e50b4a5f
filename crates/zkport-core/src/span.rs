//! Byte spans into source text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open byte range `start..end` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} is past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The covered text. Panics if the span is out of bounds for `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A 1-based line/column location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Locate a byte offset in `text`. Columns count characters, not bytes.
    pub fn locate(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut line = 1;
        let mut line_start = 0;
        for (i, b) in text.as_bytes()[..offset].iter().enumerate() {
            if *b == b'\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let column = text[line_start..offset].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_len() {
        let text = "let x = read();";
        let span = Span::new(8, 14);
        assert_eq!(span.slice(text), "read()");
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
    }

    #[test]
    fn overlap_is_half_open() {
        let a = Span::new(0, 4);
        let b = Span::new(4, 8);
        let c = Span::new(3, 5);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn containment_includes_equal_bounds() {
        let outer = Span::new(2, 10);
        assert!(outer.contains(&Span::new(2, 10)));
        assert!(outer.contains(&Span::new(4, 6)));
        assert!(!outer.contains(&Span::new(1, 6)));
        assert!(!outer.contains(&Span::new(6, 11)));
    }

    #[test]
    fn locate_positions() {
        let text = "fn main() {\n    let x = 1;\n}";
        assert_eq!(Position::locate(text, 0), Position { line: 1, column: 1 });
        assert_eq!(Position::locate(text, 16), Position { line: 2, column: 5 });
        assert_eq!(Position::locate(text, 1000).line, 3);
    }
}
