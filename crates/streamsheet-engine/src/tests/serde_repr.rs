use streamsheet_common::{CellError, CellErrorKind, CellIndex, CellValue};

use crate::requests::RequestState;

#[test]
fn request_state_round_trips_through_json() {
    let json = serde_json::to_string(&RequestState::Pending).unwrap();
    let back: RequestState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, RequestState::Pending);
}

#[test]
fn cell_values_and_errors_round_trip_through_json() {
    let value = CellValue::Error(CellError::new(CellErrorKind::Na).with_message("no data"));
    let json = serde_json::to_string(&value).unwrap();
    let back: CellValue = serde_json::from_str(&json).unwrap();
    assert_eq!(back, value);

    let index = CellIndex::new(3, -1);
    let json = serde_json::to_string(&index).unwrap();
    let back: CellIndex = serde_json::from_str(&json).unwrap();
    assert_eq!(back, index);
}
