//! End-to-end CLI flows against a temp database.

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{init_db_with_roster, setup_test_db, sh};

#[test]
fn test_init_creates_schema() {
    let db_path = setup_test_db("cli_init");

    sh().args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    // Re-running init is safe.
    sh().args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();
}

#[test]
fn test_student_add_and_list() {
    let db_path = setup_test_db("cli_roster");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "student", "list"])
        .assert()
        .success()
        .stdout(contains("Aiko Tanaka"))
        .stdout(contains("Ben Sato"));

    // Duplicate system id is rejected.
    sh().args([
        "--db", &db_path, "--test", "student", "add", "101", "--name", "Someone Else",
    ])
    .assert()
    .failure()
    .stderr(contains("already registered"));
}

#[test]
fn test_check_in_and_out_flow() {
    let db_path = setup_test_db("cli_in_out");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "101", "--seat", "14"])
        .assert()
        .success()
        .stdout(contains("Aiko Tanaka checked in"));

    // The board shows the open visit.
    sh().args(["--db", &db_path, "--test", "list"])
        .assert()
        .success()
        .stdout(contains("Aiko Tanaka"))
        .stdout(contains("Present now: 1"));

    sh().args(["--db", &db_path, "--test", "out", "101"])
        .assert()
        .success()
        .stdout(contains("Aiko Tanaka checked out"));

    sh().args(["--db", &db_path, "--test", "list"])
        .assert()
        .success()
        .stdout(contains("Present now: 0"));
}

#[test]
fn test_duplicate_checkout_reports_noop() {
    let db_path = setup_test_db("cli_noop_out");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "101"])
        .assert()
        .success();

    sh().args(["--db", &db_path, "--test", "out", "101"])
        .assert()
        .success();

    // Second checkout targets the same (closed) log by id 1.
    sh().args(["--db", &db_path, "--test", "out", "--log", "1"])
        .assert()
        .success()
        .stdout(contains("Nothing to do"));
}

#[test]
fn test_unknown_student_fails() {
    let db_path = setup_test_db("cli_unknown");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "999"])
        .assert()
        .failure()
        .stderr(contains("No student with system id 999"));
}

#[test]
fn test_checkout_without_open_log_fails() {
    let db_path = setup_test_db("cli_no_open");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "out", "101"])
        .assert()
        .failure()
        .stderr(contains("No open attendance log"));
}

#[test]
fn test_toggle_switches_direction() {
    let db_path = setup_test_db("cli_toggle");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "toggle", "101"])
        .assert()
        .success()
        .stdout(contains("checked in"));

    sh().args(["--db", &db_path, "--test", "toggle", "101"])
        .assert()
        .success()
        .stdout(contains("checked out"));
}

#[test]
fn test_exit_all_then_noop() {
    let db_path = setup_test_db("cli_exit_all");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "101"])
        .assert()
        .success();
    sh().args(["--db", &db_path, "--test", "in", "102"])
        .assert()
        .success();

    sh().args(["--db", &db_path, "--test", "exit-all"])
        .assert()
        .success()
        .stdout(contains("Checked out 2 student(s)."));

    sh().args(["--db", &db_path, "--test", "exit-all"])
        .assert()
        .success()
        .stdout(contains("No students to check out."));
}

#[test]
fn test_invalid_claimed_timestamp_rejected() {
    let db_path = setup_test_db("cli_bad_timestamp");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "101", "--at", "yesterday-ish"])
        .assert()
        .failure()
        .stderr(contains("Invalid timestamp"));
}

#[test]
fn test_offline_replay_via_cli() {
    let db_path = setup_test_db("cli_offline_replay");
    init_db_with_roster(&db_path);

    // Past-dated batch: recorded, audit-only, student stays absent.
    sh().args([
        "--db", &db_path, "--test", "in", "101", "--at", "2025-06-02 07:55",
    ])
    .assert()
    .success()
    .stdout(contains("checked in"));

    sh().args([
        "--db", &db_path, "--test", "out", "--log", "1", "--at", "2025-06-02 09:10",
    ])
    .assert()
    .success()
    .stdout(contains("checked out"));

    sh().args(["--db", &db_path, "--test", "list", "--date", "2025-06-02"])
        .assert()
        .success()
        .stdout(contains("07:55"))
        .stdout(contains("09:10"));
}

#[test]
fn test_sweep_reports_when_clean() {
    let db_path = setup_test_db("cli_sweep_clean");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "sweep"])
        .assert()
        .success()
        .stdout(contains("No forgotten logs found."));
}

#[test]
fn test_queue_empty_and_journal() {
    let db_path = setup_test_db("cli_queue_journal");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "queue", "--print"])
        .assert()
        .success()
        .stdout(contains("Notification queue is empty."));

    sh().args(["--db", &db_path, "--test", "log", "--print"])
        .assert()
        .success()
        .stdout(contains("init"))
        .stdout(contains("student"));
}

#[test]
fn test_list_empty_day() {
    let db_path = setup_test_db("cli_list_empty");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "list", "--date", "2025-01-15"])
        .assert()
        .success()
        .stdout(contains("No visits on 2025-01-15.").or(contains("No visits")));
}

#[test]
fn test_list_json_output() {
    let db_path = setup_test_db("cli_list_json");
    init_db_with_roster(&db_path);

    sh().args(["--db", &db_path, "--test", "in", "101"])
        .assert()
        .success();

    sh().args(["--db", &db_path, "--test", "list", "--json"])
        .assert()
        .success()
        .stdout(contains("\"system_id\": 101"))
        .stdout(contains("\"name\": \"Aiko Tanaka\""));
}
