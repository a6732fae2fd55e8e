#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use studyhall::config::Config;
use studyhall::core::engine::Engine;
use studyhall::core::notify::{ConsoleMailer, Mailer};
use studyhall::db::initialize::init_db;
use studyhall::db::pool::DbHandle;
use studyhall::db::students::{self, NewStudent};
use studyhall::utils::date::LocalClock;
use studyhall::utils::time::fmt_utc;

pub fn sh() -> Command {
    cargo_bin_cmd!("studyhall")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_studyhall.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    std::fs::remove_file(&db_path).ok();
    db_path
}

/// Facility clock used across the tests (UTC+9).
pub fn clock() -> LocalClock {
    LocalClock::new(540)
}

/// A UTC instant for a local (date, hour, minute) of the test facility.
pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(y, mo, d).expect("valid date");
    clock().at_hour(date, h) + chrono::Duration::minutes(mi as i64)
}

pub fn test_config(db_path: &str) -> Config {
    Config {
        database: db_path.to_string(),
        keepalive_secs: 60,
        ..Config::default()
    }
}

/// Initialized engine over a fresh database with the given mailer.
pub fn open_engine_with(db_path: &str, mailer: Arc<dyn Mailer>) -> Engine {
    {
        let conn = Connection::open(db_path).expect("open db");
        init_db(&conn).expect("init db");
    }
    let db = DbHandle::open(db_path).expect("open handle");
    Engine::start(db, &test_config(db_path), mailer)
}

pub fn open_engine(db_path: &str) -> Engine {
    open_engine_with(db_path, Arc::new(ConsoleMailer))
}

/// Register a student directly through the library DB API.
pub fn add_student(db_path: &str, system_id: i64, name: &str, email: &str) {
    let conn = Connection::open(db_path).expect("open db");
    students::insert(
        &conn,
        &NewStudent {
            system_id,
            enrollment_year: Some(2024),
            grade: Some(2),
            class_number: Some(1),
            student_number: Some(system_id),
            name,
            guardian_email: email,
        },
    )
    .expect("insert student");
}

/// Seed one completed log without going through the state machine.
pub fn seed_closed_log(
    db_path: &str,
    system_id: i64,
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
) {
    let conn = Connection::open(db_path).expect("open db");
    conn.execute(
        "INSERT INTO attendance_logs (system_id, entry_time, exit_time) VALUES (?1, ?2, ?3)",
        rusqlite::params![system_id, fmt_utc(entry), fmt_utc(exit)],
    )
    .expect("seed log");
}

pub fn open_log_count(db_path: &str, system_id: i64) -> i64 {
    let conn = Connection::open(db_path).expect("open db");
    conn.query_row(
        "SELECT COUNT(*) FROM attendance_logs WHERE system_id = ?1 AND exit_time IS NULL",
        [system_id],
        |row| row.get(0),
    )
    .expect("count")
}

pub fn achievement_count(db_path: &str, system_id: i64, code: &str) -> i64 {
    let conn = Connection::open(db_path).expect("open db");
    conn.query_row(
        "SELECT COUNT(*) FROM achievements_tracker WHERE system_id = ?1 AND code = ?2",
        rusqlite::params![system_id, code],
        |row| row.get(0),
    )
    .expect("count")
}

pub fn student_row(db_path: &str, system_id: i64) -> studyhall::models::student::Student {
    let conn = Connection::open(db_path).expect("open db");
    students::get_by_system_id(&conn, system_id).expect("student")
}

pub fn queue_len(db_path: &str) -> i64 {
    let conn = Connection::open(db_path).expect("open db");
    conn.query_row("SELECT COUNT(*) FROM email_queue", [], |row| row.get(0))
        .expect("count")
}

/// Initialize DB via the CLI and register a small roster
pub fn init_db_with_roster(db_path: &str) {
    sh().args(["--db", db_path, "--test", "init"]).assert().success();

    sh().args([
        "--db", db_path, "--test", "student", "add", "101", "--name", "Aiko Tanaka",
        "--grade", "2", "--class", "1", "--number", "7",
    ])
    .assert()
    .success();

    sh().args([
        "--db", db_path, "--test", "student", "add", "102", "--name", "Ben Sato",
        "--grade", "3", "--class", "2", "--number", "12",
    ])
    .assert()
    .success();
}
