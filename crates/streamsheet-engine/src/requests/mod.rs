//! Asynchronous request subsystem: lifecycle states, the per-sheet
//! registry, the concurrency-bounded queue, and the settlement plumbing
//! that routes producer outcomes back into the deterministic scan.

pub mod queue;
pub mod registry;
pub mod request;
pub mod state;

pub(crate) mod hub;

pub use queue::RequestQueue;
pub use registry::{ListenerId, SheetRequests};
pub use request::{HandlerOutcome, Producer, ResponseHandler, Settlement};
pub use state::{RequestId, RequestState};
