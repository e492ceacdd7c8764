use streamsheet_common::CellIndex;

use crate::cursor::Cursor;

/// Scheduler state. Only `Ready`, `Paused` and `Processed` are load-bearing
/// in the public contract; `Processing` is visible during a scan and
/// `Stopped` refuses further scans until `resume()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessorState {
    Ready,
    Processing,
    Paused,
    Processed,
    Stopped,
}

/// Cursor plus state machine of one sheet's scan. The cursor is owned
/// exclusively here; cells reach it only through
/// [`ScanContext::continue_at`](crate::sheet::ScanContext::continue_at).
#[derive(Debug)]
pub struct SheetProcessor {
    pub(crate) cursor: Cursor,
    pub(crate) state: ProcessorState,
    min_row: u32,
}

impl SheetProcessor {
    pub fn new(min_row: u32) -> Self {
        Self {
            cursor: Cursor::new(min_row),
            state: ProcessorState::Ready,
            min_row,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == ProcessorState::Paused
    }

    pub fn is_ready(&self) -> bool {
        self.state == ProcessorState::Ready
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ProcessorState::Stopped
    }

    /// True once the pass reached past the last row (or `done()` forced it).
    pub fn is_processed(&self) -> bool {
        self.cursor.processed
    }

    pub fn pause(&mut self) {
        if self.state != ProcessorState::Stopped {
            self.state = ProcessorState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if matches!(self.state, ProcessorState::Paused | ProcessorState::Stopped) {
            self.state = ProcessorState::Ready;
        }
    }

    /// Force immediate end-of-pass, e.g. when a sheet is externally told to
    /// stop mid-scan.
    pub fn done(&mut self) {
        self.cursor.processed = true;
        if self.state != ProcessorState::Paused {
            self.state = ProcessorState::Processed;
        }
    }

    pub fn stop(&mut self) {
        self.state = ProcessorState::Stopped;
    }

    /// Redirect the cursor from inside a cell evaluation.
    ///
    /// A target on an earlier row is always backward; on the same row an
    /// earlier *or equal* column is backward (a same-position jump ends the
    /// pass rather than risking a synchronous spin). The target row is
    /// clamped to the sheet's minimum row.
    pub(crate) fn continue_at(&mut self, target: CellIndex) {
        let current = self.cursor.position();
        let target = CellIndex::new(target.row.max(self.min_row), target.col);
        self.cursor.changed = true;
        self.cursor.backward = target.is_before_or_at(&current);
        self.cursor.row = target.row;
        self.cursor.col = Some(target.col);
    }
}
