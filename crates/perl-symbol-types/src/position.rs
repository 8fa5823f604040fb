//! Zero-based row/column positions and ranges.
//!
//! These are the internal position representation shared by every
//! component that produces or consumes a [`crate::FunctionReference`]. They
//! are deliberately independent of both `tree_sitter::Point` and
//! `lsp_types::Position` so that this crate has no parser or LSP-library
//! dependency; conversion to either lives at the crate boundary that needs
//! it (`perl-tree` for the former, `perl-position-tracking`'s `lsp-compat`
//! feature for the latter).

use serde::{Deserialize, Serialize};

/// A zero-based `(row, column)` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based row.
    pub row: u32,
    /// Zero-based column.
    pub column: u32,
}

impl Position {
    /// Construct a position from a `(row, column)` pair.
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// A `(start, end)` pair of positions with `start <= end` lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Inclusive start position.
    pub start: Position,
    /// Exclusive end position.
    pub end: Position,
}

impl Range {
    /// Construct a range, panicking in debug builds if `start > end`.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "range start must not come after end");
        Self { start, end }
    }

    /// True if `pos` falls within `[start, end)`.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_order_lexicographically() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 9));
    }

    #[test]
    fn range_contains_is_half_open() {
        let r = Range::new(Position::new(1, 4), Position::new(1, 9));
        assert!(r.contains(Position::new(1, 4)));
        assert!(!r.contains(Position::new(1, 9)));
        assert!(!r.contains(Position::new(1, 3)));
    }
}
