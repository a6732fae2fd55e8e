//! Dedup ledger for achievements.
//!
//! `achieved_at` holds the local civil date (YYYY-MM-DD). Codes scoped
//! to a month are checked against everything recorded since the start
//! of that month; daily codes against the exact date. The lexicographic
//! ordering of the date format makes the range comparisons valid SQL.

use crate::errors::AppResult;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone, Copy)]
pub enum DedupWindow {
    /// Any record on or after this date (monthly codes).
    Since(NaiveDate),
    /// A record on exactly this date (daily codes).
    On(NaiveDate),
    /// Any record at all (codes whose context already carries the
    /// natural window, e.g. a streak length).
    Ever,
}

pub fn has_achieved(
    conn: &Connection,
    system_id: i64,
    code: &str,
    context: Option<&str>,
    window: DedupWindow,
) -> AppResult<bool> {
    let (cmp, date) = match window {
        DedupWindow::Since(d) => (">=", d),
        DedupWindow::On(d) => ("=", d),
        DedupWindow::Ever => (">=", NaiveDate::MIN),
    };
    let date_str = date.format("%Y-%m-%d").to_string();

    let found = match context {
        Some(ctx) => {
            let sql = format!(
                "SELECT 1 FROM achievements_tracker
                 WHERE system_id = ?1 AND code = ?2 AND achieved_at {} ?3 AND context = ?4
                 LIMIT 1",
                cmp
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(params![system_id, code, date_str, ctx], |_| Ok(()))
                .optional()?
                .is_some()
        }
        None => {
            let sql = format!(
                "SELECT 1 FROM achievements_tracker
                 WHERE system_id = ?1 AND code = ?2 AND achieved_at {} ?3
                 LIMIT 1",
                cmp
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(params![system_id, code, date_str], |_| Ok(()))
                .optional()?
                .is_some()
        }
    };

    Ok(found)
}

pub fn record(
    conn: &Connection,
    system_id: i64,
    code: &str,
    context: Option<&str>,
    on: NaiveDate,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO achievements_tracker (system_id, code, achieved_at, context)
         VALUES (?1, ?2, ?3, ?4)",
        params![system_id, code, on.format("%Y-%m-%d").to_string(), context],
    )?;
    Ok(())
}
