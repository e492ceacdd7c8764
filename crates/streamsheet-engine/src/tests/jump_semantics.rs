use super::common::*;

#[test]
fn backward_jump_halts_the_pass_after_one_touch() {
    // A1 contains goto(A1): one process() call touches A1 exactly once.
    let mut sheet = sheet();
    let touches = Tally::new();
    let t = touches.clone();
    let term = std::rc::Rc::new(move |cx: &mut crate::sheet::ScanContext<'_>| {
        t.bump();
        cx.continue_at(idx(1, 0));
        streamsheet_common::CellValue::Empty
    });
    sheet.set_cell_term(idx(1, 0), term).unwrap();

    sheet.process();

    assert_eq!(touches.get(), 1);
    assert!(!sheet.is_processed());
    assert!(sheet.is_ready());
}

#[test]
fn forward_jump_skips_cells_within_the_same_call() {
    // A1 = goto(C1), B1 = counter: B1 untouched, C1 evaluated, one call.
    let mut sheet = sheet();
    let b1 = Tally::new();
    let c1 = Tally::new();
    sheet.set_cell_term(idx(1, 0), goto_term(idx(1, 2))).unwrap();
    sheet.set_cell_term(idx(1, 1), counter_term(&b1)).unwrap();
    sheet.set_cell_term(idx(1, 2), counter_term(&c1)).unwrap();

    sheet.process();

    assert_eq!(b1.get(), 0);
    assert_eq!(c1.get(), 1);
    assert!(sheet.is_processed());
}

#[test]
fn same_position_jump_counts_as_backward() {
    // Conservative resolution of the no-op jump: it ends the pass.
    let mut sheet = sheet();
    let b1 = Tally::new();
    sheet.set_cell_term(idx(1, 0), goto_term(idx(1, 0))).unwrap();
    sheet.set_cell_term(idx(1, 1), counter_term(&b1)).unwrap();

    sheet.process();

    assert_eq!(b1.get(), 0);
    assert!(!sheet.is_processed());
}

#[test]
fn jump_to_earlier_row_is_backward_regardless_of_column() {
    let mut sheet = sheet();
    let c2 = Tally::new();
    sheet.set_cell_term(idx(2, 0), goto_term(idx(1, 40))).unwrap();
    sheet.set_cell_term(idx(2, 2), counter_term(&c2)).unwrap();

    sheet.process();

    assert_eq!(c2.get(), 0);
    assert!(!sheet.is_processed());
}

#[test]
fn jump_to_later_row_earlier_column_is_forward() {
    let mut sheet = sheet();
    let log = ScanLog::new();
    sheet.set_cell_term(idx(1, 3), goto_once_term(idx(2, 0))).unwrap();
    sheet.set_cell_term(idx(1, 4), log.term()).unwrap();
    sheet.set_cell_term(idx(2, 0), log.term()).unwrap();

    sheet.process();

    assert_eq!(log.entries(), vec![idx(2, 0)]);
    assert!(sheet.is_processed());
}

#[test]
fn pass_resumes_at_backward_target_on_next_call() {
    let mut sheet = sheet();
    let a1 = Tally::new();
    sheet.set_cell_term(idx(1, 0), counter_term(&a1)).unwrap();
    sheet.set_cell_term(idx(2, 0), goto_once_term(idx(1, 0))).unwrap();

    sheet.process();
    // First call: A1 evaluated, B2's jump halted the pass at A1.
    assert_eq!(a1.get(), 1);
    assert!(!sheet.is_processed());

    sheet.process();
    // Second call continues from A1; the jump is spent, so the pass
    // completes and A1 has run exactly once more.
    assert_eq!(a1.get(), 2);
    assert!(sheet.is_processed());
}

#[test]
fn forward_jump_past_last_row_completes_the_pass() {
    let mut sheet = sheet();
    let b1 = Tally::new();
    sheet.set_cell_term(idx(1, 0), goto_term(idx(5, 0))).unwrap();
    sheet.set_cell_term(idx(1, 1), counter_term(&b1)).unwrap();

    sheet.process();

    assert_eq!(b1.get(), 0);
    assert!(sheet.is_processed());
}

#[test]
fn jump_into_pre_row_region_of_same_row_is_backward() {
    let mut sheet = sheet();
    sheet
        .set_cell_term(idx(1, 1), goto_term(idx(1, streamsheet_common::COL_IF)))
        .unwrap();

    sheet.process();

    assert!(!sheet.is_processed());
}
