//! State machine behavior through the library API: the one-open-log
//! invariant, idempotent duplicates, day rollover and bulk exit.

mod common;
use common::*;

use studyhall::errors::AppError;
use studyhall::models::attendance::{CheckOutTarget, EventKind};

#[test]
fn check_in_then_out_round_trip() {
    let db = setup_test_db("presence_round_trip");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let entered = engine.check_in(101, Some(14), None).expect("check in");
    assert_eq!(entered.kind, EventKind::Entered);
    assert!(entered.log.is_open());
    assert!(student_row(&db, 101).is_present);

    let exited = engine
        .check_out(CheckOutTarget::Student(101), None)
        .expect("check out");
    assert_eq!(exited.kind, EventKind::Exited);
    assert!(exited.log.exit_time.is_some());
    assert!(!student_row(&db, 101).is_present);

    engine.close();
}

#[test]
fn at_most_one_open_log_after_any_sequence() {
    let db = setup_test_db("presence_invariant");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    // Duplicate check-ins, toggles, a stale log from two days ago and
    // another check-in: the open-log count never exceeds one.
    engine
        .check_in(101, None, Some(at(2025, 6, 2, 9, 0)))
        .expect("offline check in");
    engine.check_in(101, None, None).expect("check in");
    engine.check_in(101, None, None).expect("duplicate");
    engine.toggle(101, None).expect("toggle out");
    engine.toggle(101, None).expect("toggle in");

    assert_eq!(open_log_count(&db, 101), 1);
    engine.close();
}

#[test]
fn duplicate_checkout_is_noop_and_exit_set_once() {
    let db = setup_test_db("presence_idempotent_out");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    // Today-dated claims keep the flow deterministic regardless of the
    // wall clock the test runs at.
    let today = engine.clock().today();
    let noon = engine.clock().at_hour(today, 12);

    let entered = engine.check_in(101, None, Some(noon)).expect("check in");
    let exit_claim = noon + chrono::Duration::minutes(70);
    let exited = engine
        .check_out(CheckOutTarget::Log(entered.log.id), Some(exit_claim))
        .expect("first checkout");
    assert_eq!(exited.kind, EventKind::Exited);
    assert_eq!(exited.log.exit_time, Some(exit_claim));

    let again = engine
        .check_out(CheckOutTarget::Log(entered.log.id), None)
        .expect("second checkout");
    assert_eq!(again.kind, EventKind::NoOp);
    assert_eq!(again.log.exit_time, Some(exit_claim));

    engine.close();
}

#[test]
fn earlier_claim_corrects_entry_later_claim_is_noop() {
    let db = setup_test_db("presence_earliest_wins");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let today = engine.clock().today();
    let noon = engine.clock().at_hour(today, 12);

    let entered = engine.check_in(101, None, Some(noon)).expect("check in");
    assert_eq!(entered.kind, EventKind::Entered);

    let earlier = noon - chrono::Duration::minutes(25);
    let corrected = engine.check_in(101, None, Some(earlier)).expect("replay");
    assert_eq!(corrected.kind, EventKind::Corrected);
    assert_eq!(corrected.log.entry_time, earlier);

    let later = noon + chrono::Duration::minutes(5);
    let noop = engine.check_in(101, None, Some(later)).expect("late replay");
    assert_eq!(noop.kind, EventKind::NoOp);
    assert_eq!(noop.log.entry_time, earlier);

    engine.close();
}

#[test]
fn checkout_without_open_log_fails() {
    let db = setup_test_db("presence_no_open_log");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let err = engine
        .check_out(CheckOutTarget::Student(101), None)
        .expect_err("no open log");
    assert!(matches!(err, AppError::NoOpenLog(101)));

    engine.close();
}

#[test]
fn unknown_student_is_rejected() {
    let db = setup_test_db("presence_unknown_student");
    let engine = open_engine(&db);

    let err = engine.check_in(999, None, None).expect_err("unknown");
    assert!(matches!(err, AppError::StudentNotFound(999)));

    engine.close();
}

#[test]
fn past_dated_claim_does_not_raise_presence() {
    let db = setup_test_db("presence_past_claim");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let report = engine
        .check_in(101, None, Some(at(2025, 6, 2, 9, 0)))
        .expect("offline check in");
    assert_eq!(report.kind, EventKind::Entered);

    // Log recorded for audit, but the student is not shown present.
    let student = student_row(&db, 101);
    assert!(!student.is_present);
    assert!(student.current_log_id.is_none());

    engine.close();
}

#[test]
fn forgotten_checkout_swept_at_close_hour() {
    let db = setup_test_db("presence_sweep");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    // Checked in on a past day, never checked out.
    engine
        .check_in(101, None, Some(at(2025, 6, 2, 15, 0)))
        .expect("offline check in");
    assert_eq!(open_log_count(&db, 101), 1);

    let swept = engine.sweep_forgotten().expect("sweep");
    assert_eq!(swept, 1);
    assert_eq!(open_log_count(&db, 101), 0);

    // Exit estimated at 22:00 local of the entry date.
    let conn = rusqlite::Connection::open(&db).expect("open db");
    let exit: String = conn
        .query_row(
            "SELECT exit_time FROM attendance_logs WHERE system_id = 101",
            [],
            |row| row.get(0),
        )
        .expect("exit");
    assert_eq!(exit, studyhall::utils::time::fmt_utc(at(2025, 6, 2, 22, 0)));

    // Sweep again: nothing left, and a fresh check-in works normally.
    assert_eq!(engine.sweep_forgotten().expect("sweep"), 0);
    let report = engine.check_in(101, None, None).expect("check in today");
    assert_eq!(report.kind, EventKind::Entered);

    engine.close();
}

#[test]
fn bulk_exit_closes_everyone_then_noops() {
    let db = setup_test_db("presence_bulk_exit");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");
    add_student(&db, 102, "Ben Sato", "");

    engine.check_in(101, None, None).expect("check in");
    engine.check_in(102, None, None).expect("check in");

    assert_eq!(engine.bulk_exit().expect("bulk"), 2);
    assert!(!student_row(&db, 101).is_present);
    assert!(!student_row(&db, 102).is_present);

    // Second call with no one present: zero affected.
    assert_eq!(engine.bulk_exit().expect("bulk again"), 0);

    engine.close();
}

#[test]
fn toggle_picks_direction_from_state() {
    let db = setup_test_db("presence_toggle");
    let engine = open_engine(&db);
    add_student(&db, 101, "Aiko Tanaka", "");

    let first = engine.toggle(101, None).expect("toggle in");
    assert_eq!(first.kind, EventKind::Entered);

    let second = engine.toggle(101, None).expect("toggle out");
    assert_eq!(second.kind, EventKind::Exited);

    let third = engine.toggle(101, None).expect("toggle in again");
    assert_eq!(third.kind, EventKind::Entered);
    assert_eq!(open_log_count(&db, 101), 1);

    engine.close();
}
