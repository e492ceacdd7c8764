#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle of one outstanding asynchronous operation.
///
/// A transition out of `Pending` is terminal for that request id — no
/// resurrection. `Unknown` is a sentinel returned for ids not present in the
/// registry; it is never stored.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RequestState {
    Aborted,
    Created,
    Pending,
    Resolved,
    Rejected,
    Unknown,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted | Self::Resolved | Self::Rejected)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Opaque id of one async request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}
