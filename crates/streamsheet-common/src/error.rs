//! Streamsheet error representation shared by the engine and its embedders.
//!
//! - **`CellErrorKind`** : the canonical set of streamsheet error codes
//! - **`ErrorContext`**  : lightweight, sheet-agnostic location info
//! - **`CellError`**     : the struct that glues the two together
//!
//! Errors are in-band values: a failed evaluation or a rejected async call
//! becomes a `CellError` stamped onto a cell, never an exception crossing a
//! component boundary.

use std::{error::Error, fmt};

use crate::CellValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised streamsheet error codes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display` renders
/// them the way a sheet shows them (`#RESPONSE!`, `#WAITING!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CellErrorKind {
    /// Generic failure of an async response with no concrete error attached.
    Response,
    /// A request is still outstanding; the cell shows a placeholder.
    Waiting,
    Na,
    Value,
    Div,
    Ref,
    Name,
    /// A configured resource bound (queue capacity, message limit) was hit.
    Limit,
    /// Catch-all evaluation error.
    Error,
}

impl fmt::Display for CellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Response => "#RESPONSE!",
            Self::Waiting => "#WAITING!",
            Self::Na => "#NA!",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV0!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Limit => "#LIMIT!",
            Self::Error => "#ERR!",
        })
    }
}

/// Generic, lightweight metadata that any error may carry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    pub row: Option<u32>,
    pub col: Option<i32>,
}

/// The single error struct the engine passes around.
///
/// * **kind**    – the mandatory error code
/// * **message** – optional human explanation
/// * **context** – optional row/col of the cell that produced it
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellError {
    pub kind: CellErrorKind,
    pub message: Option<String>,
    pub context: Option<ErrorContext>,
}

impl From<CellErrorKind> for CellError {
    fn from(kind: CellErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl CellError {
    /// Basic constructor (no message, no location).
    pub fn new(kind: CellErrorKind) -> Self {
        kind.into()
    }

    /// Generic "response error" used when an async call fails without a
    /// concrete error of its own.
    pub fn response() -> Self {
        Self::new(CellErrorKind::Response)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach the row/column of the originating cell.
    pub fn with_location(mut self, row: u32, col: i32) -> Self {
        self.context = Some(ErrorContext {
            row: Some(row),
            col: Some(col),
        });
        self
    }

    /// The canonical code string (`#RESPONSE!` etc.) shown in a cell.
    pub fn code(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        if let Some(ref ctx) = self.context {
            if let (Some(r), Some(c)) = (ctx.row, ctx.col) {
                write!(f, " (row {r}, col {c})")?;
            }
        }
        Ok(())
    }
}

impl Error for CellError {}

impl From<CellError> for String {
    fn from(error: CellError) -> Self {
        format!("{error}")
    }
}

impl From<CellError> for CellValue {
    fn from(error: CellError) -> Self {
        CellValue::Error(error)
    }
}

impl PartialEq<str> for CellErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<str> for CellError {
    fn eq(&self, other: &str) -> bool {
        self.kind.to_string() == other
    }
}
