//! Line/column geometry shared by every stage of the pipeline.
//!
//! Positions are 1-based and ordered lexicographically by `(line, column)`.
//! Columns count characters, not bytes. Ranges are half-open: `end` is one
//! column past the last character covered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// The position of the first character of a document.
    pub const fn start() -> Self {
        Position::new(1, 1)
    }

    /// Position reached after consuming `text` starting at `self`.
    pub fn advanced_by(self, text: &str) -> Self {
        let mut pos = self;
        for c in text.chars() {
            if c == '\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        pos
    }

    /// Same line, `delta` columns over. Never moves before column 1.
    pub fn shifted(self, delta: i64) -> Self {
        let column = (self.column as i64 + delta).max(1) as u32;
        Position::new(self.line, column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// The degenerate `1:1-1:1` range used for empty trunks.
    pub const fn empty() -> Self {
        Range::new(Position::start(), Position::start())
    }

    /// Range covering `text` when it begins at `start`.
    pub fn of_text(start: Position, text: &str) -> Self {
        Range::new(start, start.advanced_by(text))
    }

    /// Whether `pos` lies inside the range. The end is exclusive.
    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Like [`Range::contains`] but also accepts the end position, which is
    /// where an editor cursor sits right after the last character.
    pub fn touches(&self, pos: Position) -> bool {
        pos >= self.start && pos <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &Range) -> Range {
        Range::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Union of a sequence of ranges; `None` if the sequence is empty.
    pub fn cover<I: IntoIterator<Item = Range>>(ranges: I) -> Option<Range> {
        ranges.into_iter().reduce(|acc, r| acc.union(&r))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A range inside a particular document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_line_then_column() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(3, 2) > Position::new(3, 1));
        assert_eq!(Position::new(4, 4), Position::new(4, 4));
    }

    #[test]
    fn advance_over_newlines() {
        let p = Position::start().advanced_by("ab\ncd");
        assert_eq!(p, Position::new(2, 3));
        let p = Position::new(1, 5).advanced_by("\n");
        assert_eq!(p, Position::new(2, 1));
    }

    #[test]
    fn columns_count_characters() {
        let p = Position::start().advanced_by("αβ");
        assert_eq!(p, Position::new(1, 3));
    }

    #[test]
    fn contains_excludes_end() {
        let r = Range::new(Position::new(1, 2), Position::new(1, 4));
        assert!(r.contains(Position::new(1, 2)));
        assert!(r.contains(Position::new(1, 3)));
        assert!(!r.contains(Position::new(1, 4)));
        assert!(r.touches(Position::new(1, 4)));
    }

    #[test]
    fn cover_unions_ranges() {
        let a = Range::new(Position::new(1, 3), Position::new(1, 5));
        let b = Range::new(Position::new(2, 1), Position::new(2, 2));
        assert_eq!(
            Range::cover([a, b]),
            Some(Range::new(Position::new(1, 3), Position::new(2, 2)))
        );
        assert_eq!(Range::cover(Vec::new()), None);
    }

    #[test]
    fn shifted_clamps_at_first_column() {
        assert_eq!(Position::new(2, 1).shifted(-1), Position::new(2, 1));
        assert_eq!(Position::new(2, 3).shifted(1), Position::new(2, 4));
    }
}
