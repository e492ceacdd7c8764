use streamsheet_common::CellIndex;

/// Mutable scan position owned by the processor.
///
/// `col == None` means "start of row, column not yet determined" — the next
/// row entry decides whether scanning begins in the pre-row region or at
/// column 0. Invariant: `row` never drops below the sheet's configured
/// minimum row.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub row: u32,
    pub col: Option<i32>,
    /// Set by `continue_at` when a cell redirected the scan.
    pub changed: bool,
    /// True if the last redirect targeted an earlier (or equal) position.
    pub backward: bool,
    /// Trigger flag: the pass reached past the last row (or `done()` forced
    /// it). Consumed at the start of the next `process()` call.
    pub processed: bool,
}

impl Cursor {
    pub fn new(min_row: u32) -> Self {
        Self {
            row: min_row,
            col: None,
            changed: false,
            backward: false,
            processed: false,
        }
    }

    /// Re-entry after a completed pass: back to the minimum row, column
    /// undetermined, all transition flags cleared.
    pub fn reset(&mut self, min_row: u32) {
        self.row = min_row;
        self.col = None;
        self.changed = false;
        self.backward = false;
        self.processed = false;
    }

    /// Current position with an unset column treated as start-of-row.
    pub fn position(&self) -> CellIndex {
        CellIndex::new(self.row, self.col.unwrap_or(0))
    }
}
