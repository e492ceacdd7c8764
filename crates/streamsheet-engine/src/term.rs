use streamsheet_common::CellValue;

use crate::sheet::ScanContext;

/// A formula term as the scanner sees it.
///
/// Parsing and the operator grammar live with the embedder; the engine only
/// needs "evaluate yourself against this scan context". Evaluation may
/// redirect the cursor (`ScanContext::continue_at`), pause the sheet, or
/// issue an async request — those side effects are the whole point of the
/// contract.
pub trait Term {
    fn eval(&self, cx: &mut ScanContext<'_>) -> CellValue;
}

/// Closures are terms. Keeps embedders (and tests) free of adapter types.
impl<F> Term for F
where
    F: Fn(&mut ScanContext<'_>) -> CellValue,
{
    fn eval(&self, cx: &mut ScanContext<'_>) -> CellValue {
        self(cx)
    }
}
