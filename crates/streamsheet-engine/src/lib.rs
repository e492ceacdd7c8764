//! Streamsheet execution engine.
//!
//! A streamsheet is a grid of formula-bearing cells evaluated cycle by
//! cycle. This crate provides the cursor-driven scheduler that decides which
//! cell runs next (including `goto` redirection, IF-column row guards and
//! backward-jump loop suppression), the pause/resume/done state machine, and
//! the async request subsystem that lets a cell issue long-running external
//! calls without blocking the deterministic per-cycle scan.
//!
//! Formula parsing, value coercion, message transports and rendering live
//! with the embedder; cells evaluate through the [`Term`] trait and external
//! calls through producer closures handed a [`Settlement`].

pub mod cell;
pub mod cursor;
pub mod grid;
pub mod processor;
pub mod requests;
pub mod settings;
pub mod sheet;
pub mod term;

#[cfg(test)]
mod tests;

pub use cell::Cell;
pub use cursor::Cursor;
pub use grid::{GridError, Row, SheetGrid};
pub use processor::{ProcessorState, SheetProcessor};
pub use requests::{
    HandlerOutcome, ListenerId, Producer, RequestId, RequestQueue, RequestState, ResponseHandler,
    Settlement, SheetRequests,
};
pub use settings::SheetSettings;
pub use sheet::{ResolveContext, ScanContext, SheetStats, Streamsheet, UpdateListenerId};
pub use term::Term;
