//! Viewer updates end-to-end: committed mutations publish a notice,
//! no-ops stay silent, idle subscribers get keep-alives.

mod common;
use common::*;

use std::time::Duration;
use studyhall::core::broadcast::Notice;
use studyhall::models::attendance::CheckOutTarget;

fn next_state_change(
    rx: &std::sync::mpsc::Receiver<Notice>,
    timeout: Duration,
) -> Option<Notice> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let left = deadline.saturating_duration_since(std::time::Instant::now());
        match rx.recv_timeout(left) {
            Ok(Notice::StateChanged) => return Some(Notice::StateChanged),
            Ok(Notice::KeepAlive) => continue,
            Err(_) => return None,
        }
    }
}

#[test]
fn committed_mutations_notify_subscribers() {
    let db = setup_test_db("bcast_mutations");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let rx = engine.subscribe();

    engine.check_in(101, None, None).expect("check in");
    assert_eq!(
        next_state_change(&rx, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );

    engine
        .check_out(CheckOutTarget::Student(101), None)
        .expect("check out");
    assert_eq!(
        next_state_change(&rx, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );

    engine.close();
}

#[test]
fn noop_does_not_notify() {
    let db = setup_test_db("bcast_noop");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    engine.check_in(101, None, None).expect("check in");

    let rx = engine.subscribe();
    engine.check_in(101, None, None).expect("duplicate");

    // Nothing but (possibly) keep-alives on the wire.
    assert_eq!(next_state_change(&rx, Duration::from_millis(300)), None);

    engine.close();
}

#[test]
fn bulk_exit_publishes_one_notice() {
    let db = setup_test_db("bcast_bulk");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");
    add_student(&db, 102, "Ben Sato", "");

    engine.check_in(101, None, None).expect("in");
    engine.check_in(102, None, None).expect("in");

    let rx = engine.subscribe();
    assert_eq!(engine.bulk_exit().expect("bulk"), 2);

    assert_eq!(
        next_state_change(&rx, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );
    // One batch, one notice.
    assert_eq!(next_state_change(&rx, Duration::from_millis(300)), None);

    engine.close();
}

#[test]
fn multiple_viewers_each_get_the_notice() {
    let db = setup_test_db("bcast_fanout");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let rx1 = engine.subscribe();
    let rx2 = engine.subscribe();

    engine.check_in(101, None, None).expect("check in");

    assert_eq!(
        next_state_change(&rx1, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );
    assert_eq!(
        next_state_change(&rx2, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );

    engine.close();
}

#[test]
fn disconnected_viewer_does_not_block_the_rest() {
    let db = setup_test_db("bcast_disconnect");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let dead = engine.subscribe();
    drop(dead);
    let live = engine.subscribe();

    engine.check_in(101, None, None).expect("check in");

    assert_eq!(
        next_state_change(&live, Duration::from_secs(2)),
        Some(Notice::StateChanged)
    );

    engine.close();
}
