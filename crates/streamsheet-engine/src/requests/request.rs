use streamsheet_common::{CellError, CellIndex, CellValue};

use super::hub::HubHandle;
use super::queue::RequestQueue;
use super::state::{RequestId, RequestState};
use crate::sheet::ResolveContext;

/// The external call wrapped by an [`AsyncRequest`]. It receives a
/// [`Settlement`] handle and may settle it immediately (synchronous
/// producers) or store it and settle later, once real I/O finishes.
pub type Producer = Box<dyn FnOnce(Settlement)>;

/// Response callback attached to a request. Invoked exactly once, at
/// resolution time (or synchronously if attached after settlement).
pub type ResponseHandler = Box<dyn FnMut(&mut ResolveContext<'_>) -> HandlerOutcome>;

/// What a response handler wants done with the producer's outcome.
///
/// Tagged replacement for the source system's sentinel-return protocol:
/// matched explicitly at the resolution step instead of reinterpreting raw
/// return values.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Keep the producer's own outcome.
    Unchanged,
    /// Force success, clearing any error.
    ForceResolved,
    /// Force failure, using the existing error or a generic response error.
    ForceRejected,
    /// Force failure with this error.
    NewError(CellError),
}

/// Where a request's originating evaluation site lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum CellSlot {
    Sheet(CellIndex),
    Graph(usize),
}

/// Bookkeeping record for one outstanding or just-settled request. Owned by
/// the hub; the originating cell only holds the id.
pub(crate) struct AsyncRequest {
    pub id: RequestId,
    pub cell: CellSlot,
    pub producer: Option<Producer>,
    pub handler: Option<ResponseHandler>,
    pub result: Option<CellValue>,
    pub error: Option<CellError>,
    /// Producer outcome before (and terminal state after) resolution.
    pub outcome: RequestState,
}

impl AsyncRequest {
    pub fn new(id: RequestId, cell: CellSlot, producer: Producer) -> Self {
        Self {
            id,
            cell,
            producer: Some(producer),
            handler: None,
            result: None,
            error: None,
            outcome: RequestState::Created,
        }
    }
}

/// Single-use settlement handle handed to a producer.
///
/// Consumed by `resolve`/`reject`, so a request can settle at most once. A
/// handle dropped without settling counts as a rejection — a producer that
/// dies must not leave its request pending forever.
pub struct Settlement {
    link: Option<SettleLink>,
}

struct SettleLink {
    hub: HubHandle,
    queue: RequestQueue,
    id: RequestId,
}

impl Settlement {
    pub(crate) fn new(hub: HubHandle, queue: RequestQueue, id: RequestId) -> Self {
        Self {
            link: Some(SettleLink { hub, queue, id }),
        }
    }

    pub fn id(&self) -> Option<RequestId> {
        self.link.as_ref().map(|l| l.id)
    }

    pub fn resolve(mut self, value: CellValue) {
        if let Some(link) = self.link.take() {
            link.finish(Ok(value));
        }
    }

    pub fn reject(mut self, error: CellError) {
        if let Some(link) = self.link.take() {
            link.finish(Err(error));
        }
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.finish(Err(
                CellError::response().with_message("producer dropped without settling")
            ));
        }
    }
}

impl SettleLink {
    /// Record the outcome and park it for the sheet's drain. A record that
    /// was disposed while the producer ran is skipped entirely — only the
    /// queue's running slot is released.
    fn finish(self, outcome: Result<CellValue, CellError>) {
        {
            let mut hub = self.hub.borrow_mut();
            if let Some(req) = hub.requests.get_mut(&self.id) {
                match outcome {
                    Ok(value) => {
                        req.result = Some(value);
                        req.outcome = RequestState::Resolved;
                    }
                    Err(error) => {
                        req.error = Some(error);
                        req.outcome = RequestState::Rejected;
                    }
                }
                hub.settled.push_back(self.id);
            }
        }
        self.queue.settled();
    }
}
