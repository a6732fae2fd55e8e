use crate::errors::{AppError, AppResult};
use crate::models::student::Student;
use crate::utils::date::LocalClock;
use crate::utils::time::fmt_utc;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub fn map_row(row: &Row) -> Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        system_id: row.get("system_id")?,
        enrollment_year: row.get("enrollment_year")?,
        grade: row.get("grade")?,
        class_number: row.get("class_number")?,
        student_number: row.get("student_number")?,
        name: row.get("name")?,
        guardian_email: row.get("guardian_email")?,
        is_present: row.get::<_, i64>("is_present")? == 1,
        current_log_id: row.get("current_log_id")?,
        title: row.get("title")?,
        last_phrase_id: row.get("last_phrase_id")?,
    })
}

pub fn find_by_system_id(conn: &Connection, system_id: i64) -> AppResult<Option<Student>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM students WHERE system_id = ?1")?;
    let student = stmt.query_row([system_id], map_row).optional()?;
    Ok(student)
}

/// Like find_by_system_id but a missing student is an error.
pub fn get_by_system_id(conn: &Connection, system_id: i64) -> AppResult<Student> {
    find_by_system_id(conn, system_id)?.ok_or(AppError::StudentNotFound(system_id))
}

pub struct NewStudent<'a> {
    pub system_id: i64,
    pub enrollment_year: Option<i64>,
    pub grade: Option<i64>,
    pub class_number: Option<i64>,
    pub student_number: Option<i64>,
    pub name: &'a str,
    pub guardian_email: &'a str,
}

pub fn insert(conn: &Connection, ns: &NewStudent) -> AppResult<()> {
    conn.execute(
        "INSERT INTO students
            (system_id, enrollment_year, grade, class_number, student_number, name, guardian_email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ns.system_id,
            ns.enrollment_year,
            ns.grade,
            ns.class_number,
            ns.student_number,
            ns.name,
            ns.guardian_email,
        ],
    )?;
    Ok(())
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM students
         ORDER BY grade, class_number, student_number",
    )?;

    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Raise the presence flag and point at the freshly opened log.
pub fn set_present(conn: &Connection, system_id: i64, log_id: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE students SET is_present = 1, current_log_id = ?1 WHERE system_id = ?2",
        params![log_id, system_id],
    )?;
    Ok(())
}

pub fn clear_present(conn: &Connection, system_id: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE students SET is_present = 0, current_log_id = NULL WHERE system_id = ?1",
        params![system_id],
    )?;
    Ok(())
}

pub fn set_title(conn: &Connection, system_id: i64, title: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE students SET title = ?1 WHERE system_id = ?2",
        params![title, system_id],
    )?;
    Ok(())
}

pub fn set_last_phrase(conn: &Connection, system_id: i64, phrase_id: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE students SET last_phrase_id = ?1 WHERE system_id = ?2",
        params![phrase_id, system_id],
    )?;
    Ok(())
}

/// Lazy day-rollover reset, used by read/list paths: clear the presence
/// flag of every student whose open log belongs to a previous local
/// day, without touching the log itself (the sweep or the next
/// transition closes it). Idempotent. Returns affected students.
pub fn lazy_reset_stale(conn: &Connection, clock: &LocalClock, now: DateTime<Utc>) -> AppResult<usize> {
    let today_start = fmt_utc(clock.day_start(clock.local_date(now)));
    let n = conn.execute(
        "UPDATE students SET is_present = 0, current_log_id = NULL
         WHERE is_present = 1
           AND current_log_id IN (
               SELECT id FROM attendance_logs
               WHERE exit_time IS NULL AND entry_time < ?1
           )",
        params![today_start],
    )?;
    Ok(n)
}
