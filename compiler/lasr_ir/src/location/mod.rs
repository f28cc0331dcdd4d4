//! Source locations.
//!
//! A [`Location`] is a line/column range. The analyser copies locations from
//! the syntax tree into symbols and typed nodes without modification.

use std::fmt;

/// Source range, 1-based and inclusive on both ends.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl Location {
    /// Location for synthesized nodes with no source counterpart.
    pub const DUMMY: Location = Location {
        first_line: 0,
        first_column: 0,
        last_line: 0,
        last_column: 0,
    };

    #[inline]
    pub const fn new(first_line: u32, first_column: u32, last_line: u32, last_column: u32) -> Self {
        Location {
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// A single-line range.
    #[inline]
    pub const fn on_line(line: u32, first_column: u32, last_column: u32) -> Self {
        Location::new(line, first_column, line, last_column)
    }

    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.first_line == 0 && self.last_line == 0
    }

    /// Smallest range covering both locations. Dummy locations are absorbed.
    #[must_use]
    pub fn merge(self, other: Location) -> Location {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        let (first_line, first_column) = (self.first_line, self.first_column)
            .min((other.first_line, other.first_column));
        let (last_line, last_column) =
            (self.last_line, self.last_column).max((other.last_line, other.last_column));
        Location {
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// Check whether `other` lies within this range.
    pub fn contains(&self, other: Location) -> bool {
        (self.first_line, self.first_column) <= (other.first_line, other.first_column)
            && (other.last_line, other.last_column) <= (self.last_line, self.last_column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_line == self.last_line {
            write!(
                f,
                "{}:{}-{}",
                self.first_line, self.first_column, self.last_column
            )
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.first_line, self.first_column, self.last_line, self.last_column
            )
        }
    }
}
