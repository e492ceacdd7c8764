use std::rc::Rc;

use streamsheet_common::{CellIndex, CellValue};
use thiserror::Error;

use crate::cell::Cell;
use crate::settings::SheetSettings;
use crate::term::Term;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("row {0} outside configured sheet bounds")]
    RowOutOfBounds(u32),
    #[error("column {0} outside configured sheet bounds")]
    ColOutOfBounds(i32),
}

/// One grid row. The pre-row region is stored left-to-right, so `pre[0]`
/// holds the most negative column and `pre[len-1]` holds column -1.
#[derive(Debug, Default)]
pub struct Row {
    pub(crate) pre: Vec<Option<Cell>>,
    pub(crate) cells: Vec<Option<Cell>>,
}

impl Row {
    /// Column index the scan enters this row at.
    pub fn start_col(&self) -> i32 {
        -(self.pre.len() as i32)
    }

    /// Exclusive upper bound of the column loop.
    pub fn end_col(&self) -> i32 {
        self.cells.len() as i32
    }

    pub fn cell(&self, col: i32) -> Option<&Cell> {
        if col < 0 {
            let idx = (col + self.pre.len() as i32) as usize;
            self.pre.get(idx)?.as_ref()
        } else {
            self.cells.get(col as usize)?.as_ref()
        }
    }

    pub fn cell_mut(&mut self, col: i32) -> Option<&mut Cell> {
        if col < 0 {
            let idx = (col + self.pre.len() as i32) as usize;
            self.pre.get_mut(idx)?.as_mut()
        } else {
            self.cells.get_mut(col as usize)?.as_mut()
        }
    }

    fn slot_mut(&mut self, col: i32, pre_cols: u8) -> &mut Option<Cell> {
        if col < 0 {
            if self.pre.len() < pre_cols as usize {
                self.pre.resize_with(pre_cols as usize, || None);
            }
            let idx = (col + self.pre.len() as i32) as usize;
            &mut self.pre[idx]
        } else {
            if self.cells.len() <= col as usize {
                self.cells.resize_with(col as usize + 1, || None);
            }
            &mut self.cells[col as usize]
        }
    }
}

/// Row-major cell store addressed from `settings.min_row`.
///
/// Rows with no cells still participate in the scan; their column loop bound
/// is zero so they cost O(1) per pass.
pub struct SheetGrid {
    settings: SheetSettings,
    rows: Vec<Row>,
}

impl SheetGrid {
    pub fn new(settings: SheetSettings) -> Self {
        Self {
            settings,
            rows: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    /// Last allocated row, or `min_row - 1` for an empty grid so the scan
    /// terminates immediately.
    pub fn last_row(&self) -> u32 {
        if self.rows.is_empty() {
            self.settings.min_row.saturating_sub(1)
        } else {
            self.settings.min_row + self.rows.len() as u32 - 1
        }
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        let idx = row.checked_sub(self.settings.min_row)? as usize;
        self.rows.get(idx)
    }

    pub fn row_mut(&mut self, row: u32) -> Option<&mut Row> {
        let idx = row.checked_sub(self.settings.min_row)? as usize;
        self.rows.get_mut(idx)
    }

    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.row(index.row)?.cell(index.col)
    }

    pub fn cell_mut(&mut self, index: CellIndex) -> Option<&mut Cell> {
        self.row_mut(index.row)?.cell_mut(index.col)
    }

    pub fn cell_value(&self, index: CellIndex) -> Option<&CellValue> {
        self.cell(index).map(Cell::value)
    }

    /// Insert or replace a cell, growing the row storage as needed.
    /// Returns the previous cell so the caller can dispose its bindings.
    pub fn set_cell(&mut self, index: CellIndex, cell: Cell) -> Result<Option<Cell>, GridError> {
        self.check_bounds(index)?;
        let row = self.ensure_row(index.row);
        let pre_cols = self.settings.pre_cols;
        let slot = self.rows[row].slot_mut(index.col, pre_cols);
        Ok(slot.replace(cell))
    }

    pub fn set_value(&mut self, index: CellIndex, value: CellValue) -> Result<(), GridError> {
        match self.cell_mut(index) {
            Some(cell) => {
                cell.value = value;
                Ok(())
            }
            None => self.set_cell(index, Cell::with_value(value)).map(|_| ()),
        }
    }

    pub fn set_term(&mut self, index: CellIndex, term: Rc<dyn Term>) -> Result<Option<Cell>, GridError> {
        self.set_cell(index, Cell::with_term(term))
    }

    /// Remove a cell; returns it so the caller can dispose its bindings.
    pub fn remove_cell(&mut self, index: CellIndex) -> Option<Cell> {
        let pre_len = self.row(index.row)?.pre.len();
        let row = self.row_mut(index.row)?;
        if index.col < 0 {
            let idx = usize::try_from(index.col + pre_len as i32).ok()?;
            row.pre.get_mut(idx)?.take()
        } else {
            row.cells.get_mut(index.col as usize)?.take()
        }
    }

    fn check_bounds(&self, index: CellIndex) -> Result<(), GridError> {
        if index.row < self.settings.min_row || index.row > self.settings.max_row {
            return Err(GridError::RowOutOfBounds(index.row));
        }
        if index.col < -(self.settings.pre_cols as i32) || index.col >= self.settings.max_col as i32
        {
            return Err(GridError::ColOutOfBounds(index.col));
        }
        Ok(())
    }

    /// Grow the row vector up to `row`; returns its local index.
    fn ensure_row(&mut self, row: u32) -> usize {
        let idx = (row - self.settings.min_row) as usize;
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Row::default);
        }
        idx
    }
}
