//! The streamsheet aggregate: grid, graph cells, processor, request hub.
//!
//! `process()` is the cycle entry point. It first applies settled async
//! outcomes (resolution protocol), then drives the cursor across the grid —
//! one deterministic pass per invocation, bounded to a single backward jump —
//! and finally evaluates the auxiliary graph-cell collection.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use smallvec::SmallVec;
use streamsheet_common::{CellError, CellIndex, CellValue, COL_IF};

use crate::cell::Cell;
use crate::grid::{GridError, SheetGrid};
use crate::processor::{ProcessorState, SheetProcessor};
use crate::requests::hub::{HubHandle, RequestHub};
use crate::requests::request::{AsyncRequest, CellSlot};
use crate::requests::{HandlerOutcome, RequestId, RequestQueue, RequestState, Settlement, SheetRequests};
use crate::settings::SheetSettings;
use crate::term::Term;

/// Per-sheet counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetStats {
    /// Completed passes.
    pub steps: u64,
    /// Term evaluations across all passes.
    pub evaluated_cells: u64,
}

impl SheetStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Handle returned by [`Streamsheet::add_update_listener`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UpdateListenerId(u64);

type UpdateListener = Rc<dyn Fn(CellIndex, &CellValue)>;

pub struct Streamsheet {
    settings: SheetSettings,
    grid: SheetGrid,
    graph_cells: Vec<Cell>,
    /// Reentrancy guard for the graph-cell pass; update notifications are
    /// suppressed while set.
    graph_evaluating: bool,
    processor: SheetProcessor,
    registry: SheetRequests,
    hub: HubHandle,
    default_queue: RequestQueue,
    update_listeners: Vec<(UpdateListenerId, UpdateListener)>,
    next_update_listener: u64,
    stats: SheetStats,
}

impl Default for Streamsheet {
    fn default() -> Self {
        Self::new(SheetSettings::default())
    }
}

impl Streamsheet {
    pub fn new(settings: SheetSettings) -> Self {
        let registry = SheetRequests::new();
        let hub = RequestHub::new();
        let default_queue = RequestQueue::new(hub.clone(), registry.clone(), -1);
        Self {
            grid: SheetGrid::new(settings.clone()),
            graph_cells: Vec::new(),
            graph_evaluating: false,
            processor: SheetProcessor::new(settings.min_row),
            registry,
            hub,
            default_queue,
            update_listeners: Vec::new(),
            next_update_listener: 0,
            stats: SheetStats::default(),
            settings,
        }
    }

    /* ── accessors ─────────────────────────────────────────────────── */

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    pub fn grid(&self) -> &SheetGrid {
        &self.grid
    }

    pub fn processor(&self) -> &SheetProcessor {
        &self.processor
    }

    pub fn stats(&self) -> SheetStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// The per-sheet request registry handle.
    pub fn requests(&self) -> &SheetRequests {
        &self.registry
    }

    /// The default (unbounded) request queue.
    pub fn queue(&self) -> &RequestQueue {
        &self.default_queue
    }

    /// A new queue sharing this sheet's registry, e.g. a bounded one for
    /// rate-limiting a specific function family. `max_parallel == -1` means
    /// unbounded.
    pub fn create_queue(&self, max_parallel: i32) -> RequestQueue {
        RequestQueue::new(self.hub.clone(), self.registry.clone(), max_parallel)
    }

    /* ── cell access ───────────────────────────────────────────────── */

    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.grid.cell(index)
    }

    pub fn cell_value(&self, index: CellIndex) -> Option<&CellValue> {
        self.grid.cell_value(index)
    }

    pub fn set_cell_term(&mut self, index: CellIndex, term: Rc<dyn Term>) -> Result<(), GridError> {
        let old = self.grid.set_term(index, term)?;
        if let Some(id) = old.and_then(|c| c.request) {
            self.dispose_request(id);
        }
        Ok(())
    }

    /// External value write; keeps any existing term and notifies update
    /// listeners.
    pub fn set_cell_value(&mut self, index: CellIndex, value: CellValue) -> Result<(), GridError> {
        self.grid.set_value(index, value.clone())?;
        self.notify_update(index, &value);
        Ok(())
    }

    /// Remove a cell, aborting any request it still owns.
    pub fn remove_cell(&mut self, index: CellIndex) -> bool {
        match self.grid.remove_cell(index) {
            Some(cell) => {
                if let Some(id) = cell.request {
                    self.dispose_request(id);
                }
                true
            }
            None => false,
        }
    }

    /* ── graph cells ───────────────────────────────────────────────── */

    pub fn add_graph_cell(&mut self, term: Rc<dyn Term>) -> usize {
        self.graph_cells.push(Cell::with_term(term));
        self.graph_cells.len() - 1
    }

    pub fn graph_cell_value(&self, idx: usize) -> Option<&CellValue> {
        self.graph_cells.get(idx).map(Cell::value)
    }

    /* ── update listeners ──────────────────────────────────────────── */

    pub fn add_update_listener<F>(&mut self, f: F) -> UpdateListenerId
    where
        F: Fn(CellIndex, &CellValue) + 'static,
    {
        let id = UpdateListenerId(self.next_update_listener);
        self.next_update_listener += 1;
        self.update_listeners.push((id, Rc::new(f)));
        id
    }

    pub fn remove_update_listener(&mut self, id: UpdateListenerId) -> bool {
        let before = self.update_listeners.len();
        self.update_listeners.retain(|(lid, _)| *lid != id);
        self.update_listeners.len() != before
    }

    fn notify_update(&self, index: CellIndex, value: &CellValue) {
        if self.graph_evaluating {
            return;
        }
        let listeners: SmallVec<[UpdateListener; 2]> = self
            .update_listeners
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for listener in listeners {
            listener(index, value);
        }
    }

    /* ── state machine forwarding ──────────────────────────────────── */

    pub fn pause(&mut self) {
        self.processor.pause();
    }

    pub fn resume(&mut self) {
        self.processor.resume();
    }

    pub fn done(&mut self) {
        self.processor.done();
    }

    pub fn stop(&mut self) {
        self.processor.stop();
    }

    pub fn is_paused(&self) -> bool {
        self.processor.is_paused()
    }

    pub fn is_ready(&self) -> bool {
        self.processor.is_ready()
    }

    pub fn is_processed(&self) -> bool {
        self.processor.is_processed()
    }

    /* ── cycle driving ─────────────────────────────────────────────── */

    /// One full machine cycle. Returns true if the pass completed.
    pub fn step(&mut self) -> bool {
        self.process();
        self.processor.is_processed()
    }

    /// Advance the scan by as much of the grid as possible without
    /// blocking. Settled async outcomes are applied first, so results of
    /// requests issued on earlier cycles become visible here.
    pub fn process(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("process", row = self.processor.cursor.row).entered();

        self.resolve_settled();
        if self.processor.is_stopped() {
            return;
        }
        // A finished pass resets on re-entry; pausing preserves the cursor.
        if !self.processor.is_paused() && self.processor.cursor.processed {
            self.processor.cursor.reset(self.settings.min_row);
            self.processor.state = ProcessorState::Ready;
        }
        if !self.processor.is_paused() {
            self.processor.state = ProcessorState::Processing;
            self.scan();
            if self.processor.cursor.processed {
                self.stats.steps += 1;
            }
            if !self.processor.is_paused() {
                self.processor.state = if self.processor.cursor.processed {
                    ProcessorState::Processed
                } else {
                    ProcessorState::Ready
                };
            }
        }
        self.evaluate_graph_cells();
    }

    fn scan(&mut self) {
        loop {
            if self.processor.cursor.processed || self.processor.is_paused() {
                break;
            }
            let row = self.processor.cursor.row;
            if row > self.grid.last_row() {
                self.processor.cursor.processed = true;
                break;
            }
            self.scan_row(row);

            let paused = self.processor.is_paused();
            let cursor = &mut self.processor.cursor;
            if cursor.changed {
                cursor.changed = false;
                if cursor.backward {
                    cursor.backward = false;
                    // One backward jump per invocation bounds the pass.
                    break;
                }
                // Forward redirect: continue from the target position.
            } else if !cursor.processed && !paused {
                cursor.row += 1;
                cursor.col = None;
            }
        }
    }

    /// Column loop for one row. Breaks on row-guard, redirect, pause or
    /// `done()`; the caller interprets the cursor flags afterwards.
    fn scan_row(&mut self, row: u32) {
        let (start_col, end_col) = match self.grid.row(row) {
            Some(r) => (r.start_col(), r.end_col()),
            // Unallocated row: participates, costs O(1).
            None => return,
        };
        let mut col = self.processor.cursor.col.unwrap_or(start_col);
        while col < end_col {
            if self.processor.cursor.processed || self.processor.is_paused() {
                return;
            }
            self.processor.cursor.col = Some(col);
            let index = CellIndex::new(row, col);
            let defined = self.grid.cell(index).is_some_and(Cell::is_defined);
            if defined {
                self.evaluate_cell(index);
            }
            if col == COL_IF && defined {
                // Row-guard: a falsy IF short-circuits the entire row.
                let falsy = self
                    .grid
                    .cell(index)
                    .is_some_and(|c| !c.value.is_truthy());
                if falsy {
                    return;
                }
            }
            if self.processor.cursor.changed {
                return;
            }
            col += 1;
        }
    }

    fn evaluate_cell(&mut self, index: CellIndex) {
        let Some(term) = self.grid.cell(index).and_then(|c| c.term.clone()) else {
            return;
        };
        let value = {
            let mut cx = ScanContext {
                sheet: &mut *self,
                slot: CellSlot::Sheet(index),
            };
            term.eval(&mut cx)
        };
        self.stats.evaluated_cells += 1;
        if let Some(cell) = self.grid.cell_mut(index) {
            cell.value = value.clone();
        }
        self.notify_update(index, &value);
    }

    /// The auxiliary, order-independent pass: every graph cell, every call,
    /// independent of the main grid's cursor.
    fn evaluate_graph_cells(&mut self) {
        self.graph_evaluating = true;
        for i in 0..self.graph_cells.len() {
            let Some(term) = self.graph_cells[i].term.clone() else {
                continue;
            };
            let value = {
                let mut cx = ScanContext {
                    sheet: &mut *self,
                    slot: CellSlot::Graph(i),
                };
                term.eval(&mut cx)
            };
            self.graph_cells[i].value = value;
        }
        self.graph_evaluating = false;
    }

    /* ── request plumbing ──────────────────────────────────────────── */

    /// Apply the resolution protocol to every settled request. Runs
    /// automatically at the start of `process()`.
    pub fn resolve_settled(&mut self) {
        loop {
            let next = self.hub.borrow_mut().settled.pop_front();
            let Some(id) = next else {
                break;
            };
            self.resolve_one(id);
        }
    }

    fn resolve_one(&mut self, id: RequestId) {
        // Aborted or removed while in flight: a stale result is not an
        // error, it is silently dropped.
        if !self.registry.is_pending(id) {
            self.hub.borrow_mut().requests.remove(&id);
            return;
        }
        let (slot, handler, result, error, outcome) = {
            let mut hub = self.hub.borrow_mut();
            let Some(req) = hub.requests.get_mut(&id) else {
                return;
            };
            (
                req.cell,
                req.handler.take(),
                req.result.clone(),
                req.error.clone(),
                req.outcome,
            )
        };
        let mut outcome = outcome;
        let mut error = error;
        if let Some(mut handler) = handler {
            let mut rcx = ResolveContext {
                sheet: &mut *self,
                slot,
                result: result.clone(),
                error: error.clone(),
            };
            let handled = catch_unwind(AssertUnwindSafe(|| handler(&mut rcx)));
            match handled {
                Ok(HandlerOutcome::Unchanged) => {}
                Ok(HandlerOutcome::ForceResolved) => {
                    outcome = RequestState::Resolved;
                    error = None;
                }
                Ok(HandlerOutcome::ForceRejected) => {
                    outcome = RequestState::Rejected;
                    if error.is_none() {
                        error = Some(CellError::response());
                    }
                }
                Ok(HandlerOutcome::NewError(e)) => {
                    outcome = RequestState::Rejected;
                    error = Some(e);
                }
                // Handler panicked: swallowed here; the registry update
                // below must still run or the request would hang pending.
                Err(_) => {}
            }
            // Handler was taken above and dropped here: it never re-fires.
        }
        if let Some(cell) = self.slot_cell_mut(slot) {
            match &error {
                Some(e) => {
                    cell.error_info = Some(e.clone());
                    cell.value = CellValue::Error(e.clone());
                }
                None => cell.error_info = None,
            }
        }
        {
            let mut hub = self.hub.borrow_mut();
            if let Some(req) = hub.requests.get_mut(&id) {
                req.outcome = outcome;
                req.error = error;
            }
        }
        self.registry.set_state(id, outcome);
    }

    /// Bulk teardown: clears the registry (no per-entry notifications), the
    /// request table and any unapplied settlements.
    pub fn clear_requests(&mut self) {
        self.registry.clear();
        let mut hub = self.hub.borrow_mut();
        hub.requests.clear();
        hub.settled.clear();
    }

    fn dispose_request(&mut self, id: RequestId) {
        self.registry.remove(id);
        self.hub.borrow_mut().requests.remove(&id);
    }

    fn slot_cell(&self, slot: CellSlot) -> Option<&Cell> {
        match slot {
            CellSlot::Sheet(index) => self.grid.cell(index),
            CellSlot::Graph(i) => self.graph_cells.get(i),
        }
    }

    fn slot_cell_mut(&mut self, slot: CellSlot) -> Option<&mut Cell> {
        match slot {
            CellSlot::Sheet(index) => self.grid.cell_mut(index),
            CellSlot::Graph(i) => self.graph_cells.get_mut(i),
        }
    }

    fn write_slot_value(&mut self, slot: CellSlot, value: CellValue) {
        match slot {
            CellSlot::Sheet(index) => {
                let _ = self.grid.set_value(index, value.clone());
                self.notify_update(index, &value);
            }
            CellSlot::Graph(i) => {
                if let Some(cell) = self.graph_cells.get_mut(i) {
                    cell.value = value;
                }
            }
        }
    }
}

/* ───────────────────────── scan context ───────────────────────────── */

/// What a term sees while it evaluates: its own position, the sheet's
/// cells, cursor redirection, and async request issuance.
pub struct ScanContext<'a> {
    sheet: &'a mut Streamsheet,
    slot: CellSlot,
}

impl<'a> ScanContext<'a> {
    /// Position of the evaluating cell; `None` for graph cells.
    pub fn index(&self) -> Option<CellIndex> {
        match self.slot {
            CellSlot::Sheet(index) => Some(index),
            CellSlot::Graph(_) => None,
        }
    }

    pub fn cell_value(&self, index: CellIndex) -> Option<&CellValue> {
        self.sheet.grid.cell_value(index)
    }

    pub fn set_cell_value(&mut self, index: CellIndex, value: CellValue) -> Result<(), GridError> {
        self.sheet.set_cell_value(index, value)
    }

    /// Redirect the scan cursor (`goto`). Ignored for graph cells — the
    /// auxiliary pass has no cursor.
    pub fn continue_at(&mut self, target: CellIndex) {
        if matches!(self.slot, CellSlot::Sheet(_)) {
            self.sheet.processor.continue_at(target);
        }
    }

    /// Suspend the sheet mid-cycle; the cursor keeps its position so
    /// `resume()` + `process()` re-enter at this cell.
    pub fn pause(&mut self) {
        self.sheet.processor.pause();
    }

    pub fn requests(&self) -> &SheetRequests {
        &self.sheet.registry
    }

    /// True while this cell's own request is outstanding — terms typically
    /// return a `#WAITING!` placeholder in that case.
    pub fn pending(&self) -> bool {
        self.sheet
            .slot_cell(self.slot)
            .and_then(|c| c.request)
            .is_some_and(|id| self.sheet.registry.is_pending(id))
    }

    /// Issue an async request on the sheet's default queue. Re-entrant
    /// evaluation while the request is outstanding returns the existing id
    /// without invoking the producer again.
    pub fn request<P>(&mut self, producer: P) -> RequestId
    where
        P: FnOnce(Settlement) + 'static,
    {
        let queue = self.sheet.default_queue.clone();
        self.request_on(&queue, producer)
    }

    /// Issue an async request on a caller-supplied queue.
    pub fn request_on<P>(&mut self, queue: &RequestQueue, producer: P) -> RequestId
    where
        P: FnOnce(Settlement) + 'static,
    {
        let slot = self.slot;
        if let Some(id) = self.sheet.slot_cell(slot).and_then(|c| c.request) {
            if self.sheet.registry.is_pending(id) {
                return id;
            }
            // Settled leftover: dispose the stale binding first.
            self.sheet.dispose_request(id);
            if let Some(cell) = self.sheet.slot_cell_mut(slot) {
                cell.request = None;
            }
        }
        let id = self.sheet.hub.borrow_mut().alloc_id();
        self.sheet
            .hub
            .borrow_mut()
            .requests
            .insert(id, AsyncRequest::new(id, slot, Box::new(producer)));
        self.sheet.registry.register(id);
        if let Some(cell) = self.sheet.slot_cell_mut(slot) {
            cell.request = Some(id);
        }
        self.sheet.registry.set_state(id, RequestState::Pending);
        queue.schedule(id);
        id
    }

    /// Attach the response handler for this cell's request. Invoked at
    /// resolution time; if the request already resolved or rejected, invoked
    /// synchronously right here. A later handler replaces an earlier one
    /// only while no settlement has occurred.
    pub fn response<F>(&mut self, handler: F)
    where
        F: FnMut(&mut ResolveContext<'_>) -> HandlerOutcome + 'static,
    {
        let slot = self.slot;
        let Some(id) = self.sheet.slot_cell(slot).and_then(|c| c.request) else {
            return;
        };
        match self.sheet.registry.state(id) {
            RequestState::Resolved | RequestState::Rejected => {
                let (result, error) = self
                    .sheet
                    .hub
                    .borrow()
                    .requests
                    .get(&id)
                    .map(|r| (r.result.clone(), r.error.clone()))
                    .unwrap_or((None, None));
                let mut handler = handler;
                let mut rcx = ResolveContext {
                    sheet: &mut *self.sheet,
                    slot,
                    result,
                    error,
                };
                let _ = catch_unwind(AssertUnwindSafe(|| handler(&mut rcx)));
            }
            RequestState::Aborted | RequestState::Unknown => {}
            _ => {
                let mut hub = self.sheet.hub.borrow_mut();
                if let Some(req) = hub.requests.get_mut(&id) {
                    if req.outcome.is_terminal() {
                        // Settled but not yet resolved: keep the first
                        // handler.
                        if req.handler.is_none() {
                            req.handler = Some(Box::new(handler));
                        }
                    } else {
                        req.handler = Some(Box::new(handler));
                    }
                }
            }
        }
    }
}

/* ─────────────────────── resolution context ───────────────────────── */

/// What a response handler sees: the originating cell, the producer's
/// result or error, and write access to the sheet.
pub struct ResolveContext<'a> {
    sheet: &'a mut Streamsheet,
    slot: CellSlot,
    result: Option<CellValue>,
    error: Option<CellError>,
}

impl<'a> ResolveContext<'a> {
    /// Position of the originating cell; `None` for graph cells.
    pub fn index(&self) -> Option<CellIndex> {
        match self.slot {
            CellSlot::Sheet(index) => Some(index),
            CellSlot::Graph(_) => None,
        }
    }

    pub fn result(&self) -> Option<&CellValue> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&CellError> {
        self.error.as_ref()
    }

    /// Write the originating cell's value.
    pub fn set_value(&mut self, value: CellValue) {
        self.sheet.write_slot_value(self.slot, value);
    }

    pub fn set_cell_value(&mut self, index: CellIndex, value: CellValue) -> Result<(), GridError> {
        self.sheet.set_cell_value(index, value)
    }

    pub fn cell_value(&self, index: CellIndex) -> Option<&CellValue> {
        self.sheet.grid.cell_value(index)
    }
}
