use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceLog;
use crate::utils::time::{fmt_utc, parse_utc};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub fn map_row(row: &Row) -> Result<AttendanceLog> {
    let entry_str: String = row.get("entry_time")?;
    let exit_str: Option<String> = row.get("exit_time")?;

    let entry_time = parse_utc(&entry_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidTimestamp(entry_str.clone())),
        )
    })?;

    let exit_time = match exit_str {
        Some(s) => Some(parse_utc(&s).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(AppError::InvalidTimestamp(s.clone())),
            )
        })?),
        None => None,
    };

    Ok(AttendanceLog {
        id: row.get("id")?,
        system_id: row.get("system_id")?,
        entry_time,
        exit_time,
        seat_number: row.get("seat_number")?,
    })
}

pub fn insert(
    conn: &Connection,
    system_id: i64,
    entry_time: DateTime<Utc>,
    seat_number: Option<i64>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO attendance_logs (system_id, entry_time, seat_number)
         VALUES (?1, ?2, ?3)",
        params![system_id, fmt_utc(entry_time), seat_number],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find(conn: &Connection, id: i64) -> AppResult<Option<AttendanceLog>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM attendance_logs WHERE id = ?1")?;
    let log = stmt.query_row([id], map_row).optional()?;
    Ok(log)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<AttendanceLog> {
    find(conn, id)?.ok_or(AppError::LogNotFound(id))
}

/// All open logs of one student, oldest first. The invariant keeps this
/// at one row, but the query must not assume it while enforcing it.
pub fn open_logs_for(conn: &Connection, system_id: i64) -> AppResult<Vec<AttendanceLog>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance_logs
         WHERE system_id = ?1 AND exit_time IS NULL
         ORDER BY entry_time ASC",
    )?;

    let rows = stmt.query_map([system_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Every open log in the store, oldest first (bulk exit, sweep).
pub fn open_logs_all(conn: &Connection) -> AppResult<Vec<AttendanceLog>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM attendance_logs
         WHERE exit_time IS NULL
         ORDER BY entry_time ASC",
    )?;

    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn set_entry_time(conn: &Connection, id: i64, entry_time: DateTime<Utc>) -> AppResult<()> {
    conn.execute(
        "UPDATE attendance_logs SET entry_time = ?1 WHERE id = ?2",
        params![fmt_utc(entry_time), id],
    )?;
    Ok(())
}

pub fn set_exit_time(conn: &Connection, id: i64, exit_time: DateTime<Utc>) -> AppResult<()> {
    conn.execute(
        "UPDATE attendance_logs SET exit_time = ?1 WHERE id = ?2",
        params![fmt_utc(exit_time), id],
    )?;
    Ok(())
}

/// Logs whose entry falls in [start, end), entry order (today board).
pub fn logs_between(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<AttendanceLog>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance_logs
         WHERE entry_time >= ?1 AND entry_time < ?2
         ORDER BY entry_time ASC",
    )?;

    let rows = stmt.query_map(params![fmt_utc(start), fmt_utc(end)], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Completed logs with entry in [start, end), across all students
/// (monthly ranking input).
pub fn completed_between(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<AttendanceLog>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance_logs
         WHERE entry_time >= ?1 AND entry_time < ?2 AND exit_time IS NOT NULL
         ORDER BY entry_time ASC",
    )?;

    let rows = stmt.query_map(params![fmt_utc(start), fmt_utc(end)], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Completed logs of one student with entry >= since, excluding one log
/// id (the one being evaluated).
pub fn completed_for_since(
    conn: &Connection,
    system_id: i64,
    since: DateTime<Utc>,
    exclude_id: i64,
) -> AppResult<Vec<AttendanceLog>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance_logs
         WHERE system_id = ?1 AND entry_time >= ?2
           AND exit_time IS NOT NULL AND id != ?3",
    )?;

    let rows = stmt.query_map(params![system_id, fmt_utc(since), exclude_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Entry instants of one student since a given instant.
pub fn entries_for_since(
    conn: &Connection,
    system_id: i64,
    since: DateTime<Utc>,
) -> AppResult<Vec<DateTime<Utc>>> {
    let mut stmt = conn.prepare_cached(
        "SELECT entry_time FROM attendance_logs
         WHERE system_id = ?1 AND entry_time >= ?2",
    )?;

    let rows = stmt.query_map(params![system_id, fmt_utc(since)], |row| {
        row.get::<_, String>(0)
    })?;

    let mut out = Vec::new();
    for r in rows {
        let s = r?;
        if let Some(at) = parse_utc(&s) {
            out.push(at);
        }
    }
    Ok(out)
}

/// Every (system_id, entry_time) in the store. The streak rule needs
/// the full picture of facility-open days; volumes stay small for a
/// single school.
pub fn all_entries(conn: &Connection) -> AppResult<Vec<(i64, DateTime<Utc>)>> {
    let mut stmt = conn.prepare("SELECT system_id, entry_time FROM attendance_logs")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (sid, s) = r?;
        if let Some(at) = parse_utc(&s) {
            out.push((sid, at));
        }
    }
    Ok(out)
}

/// Number of check-ins with entry in [start, end) (first-arrival rule).
pub fn count_entries_between(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached(
        "SELECT COUNT(*) FROM attendance_logs
         WHERE entry_time >= ?1 AND entry_time < ?2",
    )?;
    let n: i64 = stmt.query_row(params![fmt_utc(start), fmt_utc(end)], |row| row.get(0))?;
    Ok(n)
}
