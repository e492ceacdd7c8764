use std::rc::Rc;

use streamsheet_common::{CellError, CellValue};

use crate::requests::RequestId;
use crate::term::Term;

/// One cell of a streamsheet grid.
///
/// Holds the formula term (if any), the value of its last evaluation, the
/// structured error info stamped by a failed async request, and the slot for
/// the cell's live async request. The slot makes re-entrant request
/// deduplication an `Option` check instead of sentinel bookkeeping on the
/// formula context.
pub struct Cell {
    pub(crate) term: Option<Rc<dyn Term>>,
    pub(crate) value: CellValue,
    pub(crate) error_info: Option<CellError>,
    pub(crate) request: Option<RequestId>,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            term: None,
            value: CellValue::Empty,
            error_info: None,
            request: None,
        }
    }

    pub fn with_value(value: CellValue) -> Self {
        Self {
            term: None,
            value,
            error_info: None,
            request: None,
        }
    }

    pub fn with_term(term: Rc<dyn Term>) -> Self {
        Self {
            term: Some(term),
            value: CellValue::Empty,
            error_info: None,
            request: None,
        }
    }

    /// A cell participates in the scan if it carries a term or a value.
    pub fn is_defined(&self) -> bool {
        self.term.is_some() || !matches!(self.value, CellValue::Empty)
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn error_info(&self) -> Option<&CellError> {
        self.error_info.as_ref()
    }

    pub fn term(&self) -> Option<&Rc<dyn Term>> {
        self.term.as_ref()
    }

    /// Id of the cell's live (or just-settled, not yet re-issued) request.
    pub fn request_id(&self) -> Option<RequestId> {
        self.request
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("term", &self.term.is_some())
            .field("value", &self.value)
            .field("error_info", &self.error_info)
            .field("request", &self.request)
            .finish()
    }
}
