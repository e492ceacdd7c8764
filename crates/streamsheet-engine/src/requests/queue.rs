use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::hub::HubHandle;
use super::registry::SheetRequests;
use super::request::Settlement;
use super::state::RequestId;

/// Concurrency-bounded FIFO scheduler for async requests.
///
/// `max_parallel == -1` means unbounded. Invariant: `running` never exceeds
/// `max_parallel` when bounded, and backlog order is preserved — no
/// reordering, no priority. Cloneable handle; a queue may be shared by many
/// cells to rate-limit one function family.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Rc<RefCell<QueueInner>>,
}

struct QueueInner {
    max_parallel: i32,
    running: usize,
    backlog: VecDeque<RequestId>,
    hub: HubHandle,
    registry: SheetRequests,
}

impl RequestQueue {
    pub(crate) fn new(hub: HubHandle, registry: SheetRequests, max_parallel: i32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueueInner {
                max_parallel,
                running: 0,
                backlog: VecDeque::new(),
                hub,
                registry,
            })),
        }
    }

    pub fn max_parallel(&self) -> i32 {
        self.inner.borrow().max_parallel
    }

    pub fn running(&self) -> usize {
        self.inner.borrow().running
    }

    pub fn backlog_len(&self) -> usize {
        self.inner.borrow().backlog.len()
    }

    /// Run the request now if a slot is free, otherwise append it to the
    /// FIFO backlog.
    pub(crate) fn schedule(&self, id: RequestId) {
        #[cfg(feature = "tracing")]
        tracing::trace!(id = id.as_u64(), "schedule request");
        let has_capacity = {
            let inner = self.inner.borrow();
            inner.max_parallel < 1 || inner.running < inner.max_parallel as usize
        };
        if has_capacity {
            self.run(id);
        } else {
            self.inner.borrow_mut().backlog.push_back(id);
        }
    }

    /// Claim a running slot and invoke the producer. The producer may settle
    /// synchronously, so no borrow is held across the call.
    fn run(&self, id: RequestId) {
        let hub = self.inner.borrow().hub.clone();
        let producer = {
            let mut hub = hub.borrow_mut();
            hub.requests.get_mut(&id).and_then(|req| req.producer.take())
        };
        let Some(producer) = producer else {
            // Disposed before it ever ran; nothing to do.
            return;
        };
        self.inner.borrow_mut().running += 1;
        producer(Settlement::new(hub, self.clone(), id));
    }

    /// Settlement callback: release the running slot and service the
    /// backlog.
    pub(crate) fn settled(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.running = inner.running.saturating_sub(1);
        }
        self.start_next();
    }

    /// Pop the FIFO head. Entries no longer pending were aborted or removed
    /// while queued: drop them from the registry and try the next one
    /// without counting them against concurrency.
    fn start_next(&self) {
        loop {
            let (next, registry, hub) = {
                let mut inner = self.inner.borrow_mut();
                (
                    inner.backlog.pop_front(),
                    inner.registry.clone(),
                    inner.hub.clone(),
                )
            };
            let Some(id) = next else {
                return;
            };
            if registry.is_pending(id) {
                self.run(id);
                return;
            }
            registry.remove(id);
            hub.borrow_mut().requests.remove(&id);
        }
    }
}
