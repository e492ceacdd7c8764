//! Cell addressing for streamsheet grids.
//!
//! Rows are 1-based. Columns are signed: non-negative indices address the
//! data region (`0 == A`), negative indices address the per-row pre-row
//! region that holds the reserved guard columns (`IF`, `COMMENT`). The scan
//! always enters a row at its most negative pre-row column.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reserved guard column: a falsy value here short-circuits the whole row.
pub const COL_IF: i32 = -1;
/// Reserved comment column; evaluated but never guards.
pub const COL_COMMENT: i32 = -2;

/// Absolute position of a cell within one sheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub row: u32,
    pub col: i32,
}

impl CellIndex {
    pub fn new(row: u32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn is_pre_row(&self) -> bool {
        self.col < 0
    }

    /// Scan-order comparison: earlier row, or same row with an earlier or
    /// equal column, counts as "not after" the other position. Used by the
    /// processor to classify `goto` targets as backward jumps.
    pub fn is_before_or_at(&self, other: &CellIndex) -> bool {
        self.row < other.row || (self.row == other.row && self.col <= other.col)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.col {
            COL_IF => write!(f, "IF{}", self.row),
            COL_COMMENT => write!(f, "COMMENT{}", self.row),
            c if c < 0 => write!(f, "PRE{}R{}", -c, self.row),
            c => {
                // A, B, …, Z, AA, AB, … for the data region.
                let mut col = c as u32;
                let mut letters = [0u8; 8];
                let mut n = 0;
                loop {
                    letters[n] = b'A' + (col % 26) as u8;
                    n += 1;
                    if col < 26 {
                        break;
                    }
                    col = col / 26 - 1;
                }
                for i in (0..n).rev() {
                    write!(f, "{}", letters[i] as char)?;
                }
                write!(f, "{}", self.row)
            }
        }
    }
}
