//! Shared helpers: counting terms, goto terms, and a parking lot for
//! deferred settlements so tests can drive "async" completion explicitly.

use std::cell::RefCell;
use std::rc::Rc;

use streamsheet_common::{CellIndex, CellValue};

use crate::requests::Settlement;
use crate::sheet::{ScanContext, Streamsheet};
use crate::term::Term;

pub fn idx(row: u32, col: i32) -> CellIndex {
    CellIndex::new(row, col)
}

pub fn sheet() -> Streamsheet {
    Streamsheet::default()
}

/// Shared evaluation counter.
#[derive(Clone, Default)]
pub struct Tally(Rc<std::cell::Cell<u64>>);

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

/// Term that counts its evaluations and yields the count.
pub fn counter_term(tally: &Tally) -> Rc<dyn Term> {
    let t = tally.clone();
    Rc::new(move |_cx: &mut ScanContext<'_>| {
        t.bump();
        CellValue::Int(t.get() as i64)
    })
}

/// Term with a fixed value.
pub fn value_term(value: CellValue) -> Rc<dyn Term> {
    Rc::new(move |_cx: &mut ScanContext<'_>| value.clone())
}

/// Term that redirects the cursor on every evaluation.
pub fn goto_term(target: CellIndex) -> Rc<dyn Term> {
    Rc::new(move |cx: &mut ScanContext<'_>| {
        cx.continue_at(target);
        CellValue::Empty
    })
}

/// Term that redirects the cursor only on its first evaluation.
pub fn goto_once_term(target: CellIndex) -> Rc<dyn Term> {
    let jumped = std::cell::Cell::new(false);
    Rc::new(move |cx: &mut ScanContext<'_>| {
        if !jumped.get() {
            jumped.set(true);
            cx.continue_at(target);
        }
        CellValue::Empty
    })
}

/// Records the scan order of evaluated positions.
#[derive(Clone, Default)]
pub struct ScanLog(Rc<RefCell<Vec<CellIndex>>>);

impl ScanLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> Rc<dyn Term> {
        let log = self.0.clone();
        Rc::new(move |cx: &mut ScanContext<'_>| {
            if let Some(index) = cx.index() {
                log.borrow_mut().push(index);
            }
            CellValue::Bool(true)
        })
    }

    pub fn entries(&self) -> Vec<CellIndex> {
        self.0.borrow().clone()
    }
}

/// Parking lot for settlements handed to deferred producers; tests settle
/// them explicitly to simulate I/O finishing between cycles.
#[derive(Clone, Default)]
pub struct SettlementBox(Rc<RefCell<Vec<Settlement>>>);

impl SettlementBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn park(&self, s: Settlement) {
        self.0.borrow_mut().push(s);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Remove and return the oldest parked settlement.
    pub fn take_first(&self) -> Settlement {
        self.0.borrow_mut().remove(0)
    }

    pub fn take_at(&self, i: usize) -> Settlement {
        self.0.borrow_mut().remove(i)
    }
}

/// Term that issues one deferred request (on its first evaluation only) and
/// shows `#WAITING!` while it is outstanding.
pub fn deferred_request_term(parked: &SettlementBox, producer_calls: &Tally) -> Rc<dyn Term> {
    let parked = parked.clone();
    let calls = producer_calls.clone();
    Rc::new(move |cx: &mut ScanContext<'_>| {
        let parked = parked.clone();
        let calls = calls.clone();
        cx.request(move |settlement| {
            calls.bump();
            parked.park(settlement);
        });
        if cx.pending() {
            CellValue::Error(streamsheet_common::CellError::new(
                streamsheet_common::CellErrorKind::Waiting,
            ))
        } else {
            CellValue::Empty
        }
    })
}
