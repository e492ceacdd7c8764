use super::common::*;
use crate::requests::state::RequestId;
use crate::requests::{RequestState, SheetRequests};

fn rid(raw: u64) -> RequestId {
    RequestId::new(raw)
}

#[test]
fn missing_ids_read_as_unknown() {
    let reg = SheetRequests::new();
    assert_eq!(reg.state(rid(99)), RequestState::Unknown);
    assert!(!reg.set_state(rid(99), RequestState::Pending));
    assert!(!reg.is_pending(rid(99)));
}

#[test]
fn registration_defaults_to_created_and_never_notifies() {
    let reg = SheetRequests::new();
    let notified = Tally::new();
    let n = notified.clone();
    reg.add_listener(move || n.bump());

    reg.register(rid(1));
    assert_eq!(reg.state(rid(1)), RequestState::Created);
    assert_eq!(notified.get(), 0);
}

#[test]
fn listeners_fire_iff_the_state_changed() {
    let reg = SheetRequests::new();
    let notified = Tally::new();
    let n = notified.clone();
    reg.add_listener(move || n.bump());
    reg.register(rid(1));

    assert!(reg.set_state(rid(1), RequestState::Pending));
    assert_eq!(notified.get(), 1);

    // Same state again: no notification.
    assert!(reg.set_state(rid(1), RequestState::Pending));
    assert_eq!(notified.get(), 1);

    assert!(reg.set_state(rid(1), RequestState::Resolved));
    assert_eq!(notified.get(), 2);
}

#[test]
fn is_pending_matches_exactly_pending() {
    let reg = SheetRequests::new();
    reg.register(rid(1));
    assert!(!reg.is_pending(rid(1)));
    reg.set_state(rid(1), RequestState::Pending);
    assert!(reg.is_pending(rid(1)));
    reg.set_state(rid(1), RequestState::Rejected);
    assert!(!reg.is_pending(rid(1)));
}

#[test]
fn removing_a_pending_entry_aborts_it_observably() {
    let reg = SheetRequests::new();
    let notified = Tally::new();
    let n = notified.clone();
    reg.add_listener(move || n.bump());
    reg.register_with(rid(1), RequestState::Pending);

    assert!(reg.remove(rid(1)));
    // One notification for the Pending -> Aborted transition.
    assert_eq!(notified.get(), 1);
    assert_eq!(reg.state(rid(1)), RequestState::Unknown);
}

#[test]
fn removing_a_settled_entry_is_silent() {
    let reg = SheetRequests::new();
    let notified = Tally::new();
    let n = notified.clone();
    reg.add_listener(move || n.bump());
    reg.register_with(rid(1), RequestState::Resolved);

    assert!(reg.remove(rid(1)));
    assert_eq!(notified.get(), 0);
    assert!(!reg.remove(rid(1)));
}

#[test]
fn pending_ids_lists_only_pending_entries() {
    let reg = SheetRequests::new();
    reg.register_with(rid(1), RequestState::Pending);
    reg.register_with(rid(2), RequestState::Resolved);
    reg.register_with(rid(3), RequestState::Pending);

    let mut pending = reg.pending_ids();
    pending.sort();
    assert_eq!(pending, vec![rid(1), rid(3)]);
}

#[test]
fn bulk_clear_skips_abort_notifications() {
    let reg = SheetRequests::new();
    let notified = Tally::new();
    let n = notified.clone();
    reg.add_listener(move || n.bump());
    reg.register_with(rid(1), RequestState::Pending);
    reg.register_with(rid(2), RequestState::Pending);

    reg.clear();

    assert_eq!(notified.get(), 0);
    assert!(reg.is_empty());
}

#[test]
fn removed_listeners_stop_firing() {
    let reg = SheetRequests::new();
    let first = Tally::new();
    let second = Tally::new();
    let f = first.clone();
    let s = second.clone();
    let first_id = reg.add_listener(move || f.bump());
    reg.add_listener(move || s.bump());
    reg.register_with(rid(1), RequestState::Created);

    reg.set_state(rid(1), RequestState::Pending);
    assert!(reg.remove_listener(first_id));
    reg.set_state(rid(1), RequestState::Resolved);

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 2);
}

#[test]
fn listeners_may_requery_the_registry() {
    // No payload is delivered; listeners re-query. The borrow must be
    // released before callbacks run.
    let reg = SheetRequests::new();
    let observed = std::rc::Rc::new(std::cell::Cell::new(RequestState::Unknown));
    let reg2 = reg.clone();
    let obs = observed.clone();
    reg.add_listener(move || obs.set(reg2.state(rid(1))));
    reg.register(rid(1));

    reg.set_state(rid(1), RequestState::Pending);
    assert_eq!(observed.get(), RequestState::Pending);
}
