//! Per-sheet request registry: the single source of truth for "is this id
//! still relevant". Both the resolution protocol and the disposal path
//! consult it before applying effects, which is what keeps a stale or
//! cancelled async result from mutating a reused or deleted cell.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::state::{RequestId, RequestState};

/// Handle returned by [`SheetRequests::add_listener`]; pass it back to
/// [`SheetRequests::remove_listener`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct RegistryInner {
    entries: FxHashMap<RequestId, RequestState>,
    listeners: Vec<(ListenerId, Rc<dyn Fn()>)>,
    next_listener: u64,
}

/// Cloneable handle to the per-sheet request map. Shared between the sheet,
/// its queues, and request holders; all mutation happens on the one
/// cooperative thread, so a `RefCell` is the only guard needed.
#[derive(Clone)]
pub struct SheetRequests {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Default for SheetRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetRequests {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                entries: FxHashMap::default(),
                listeners: Vec::new(),
                next_listener: 0,
            })),
        }
    }

    /// Insert or overwrite an entry in `Created` state. Registration alone
    /// never notifies listeners.
    pub fn register(&self, id: RequestId) -> RequestId {
        self.register_with(id, RequestState::Created)
    }

    pub fn register_with(&self, id: RequestId, state: RequestState) -> RequestId {
        self.inner.borrow_mut().entries.insert(id, state);
        id
    }

    /// Update an entry; returns `false` if no entry exists. Listeners are
    /// notified only when the stored state actually changed.
    pub fn set_state(&self, id: RequestId, state: RequestState) -> bool {
        let notify = {
            let mut inner = self.inner.borrow_mut();
            match inner.entries.get_mut(&id) {
                None => return false,
                Some(slot) if *slot == state => false,
                Some(slot) => {
                    *slot = state;
                    true
                }
            }
        };
        if notify {
            self.notify();
        }
        true
    }

    /// `Unknown` for a missing id, never an error.
    pub fn state(&self, id: RequestId) -> RequestState {
        self.inner
            .borrow()
            .entries
            .get(&id)
            .copied()
            .unwrap_or(RequestState::Unknown)
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.state(id) == RequestState::Pending
    }

    /// Delete an entry. A pending request is first transitioned to
    /// `Aborted` (with notification) so callers never silently drop
    /// outstanding work.
    pub fn remove(&self, id: RequestId) -> bool {
        if self.is_pending(id) {
            self.set_state(id, RequestState::Aborted);
        }
        self.inner.borrow_mut().entries.remove(&id).is_some()
    }

    pub fn pending_ids(&self) -> Vec<RequestId> {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, s)| s.is_pending())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Bulk clear for sheet teardown — no per-entry abort notifications.
    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    pub fn add_listener<F: Fn() + 'static>(&self, f: F) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Rc::new(f)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Listeners receive no payload and re-query as needed, so the borrow is
    /// released before any callback runs.
    fn notify(&self) {
        let listeners: SmallVec<[Rc<dyn Fn()>; 4]> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}
