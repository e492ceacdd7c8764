use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::request::AsyncRequest;
use super::state::RequestId;

/// Shared bookkeeping behind the registry: the live request records, the
/// settled-but-unresolved backlog awaiting the sheet's drain, and the id
/// allocator. One hub per sheet, handed by handle to every queue.
pub(crate) struct RequestHub {
    pub requests: FxHashMap<RequestId, AsyncRequest>,
    pub settled: VecDeque<RequestId>,
    next_id: u64,
}

pub(crate) type HubHandle = Rc<RefCell<RequestHub>>;

impl RequestHub {
    pub fn new() -> HubHandle {
        Rc::new(RefCell::new(Self {
            requests: FxHashMap::default(),
            settled: VecDeque::new(),
            next_id: 1,
        }))
    }

    pub fn alloc_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_id);
        self.next_id += 1;
        id
    }
}
