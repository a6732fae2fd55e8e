//! Presence state machine.
//!
//! Per student the state is ABSENT or PRESENT, derived from the
//! open-log query rather than the cached `is_present` flag, so the
//! one-open-log invariant survives lazy flag resets and crashes.
//! Duplicate and replayed requests resolve to `NoOp` successes;
//! client-claimed timestamps reconcile with "earliest entry wins,
//! latest exit wins".
//!
//! Every function here expects to run inside the caller's transaction.

use crate::db::{journal, logs, students};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{AttendanceLog, CheckOutTarget, EventKind};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::utils::date::LocalClock;

/// One committed state transition plus the log it touched.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: EventKind,
    pub log: AttendanceLog,
}

/// Day-rollover guard for one student: every open log left over from a
/// previous local day is closed at `close_hour` of its entry date and
/// the presence flag cleared. Idempotent. Returns closed log count.
pub fn close_stale_for(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    system_id: i64,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let today = clock.local_date(now);
    let mut closed = 0;

    for log in logs::open_logs_for(conn, system_id)? {
        let entry_day = clock.local_date(log.entry_time);
        if entry_day < today {
            let exit = clock.at_hour(entry_day, close_hour);
            logs::set_exit_time(conn, log.id, exit)?;
            students::clear_present(conn, log.system_id)?;
            journal::shlog(
                conn,
                "rollover",
                &log.id.to_string(),
                &format!(
                    "Auto-closed forgotten log for student {} at {:02}:00 of {}",
                    log.system_id, close_hour, entry_day
                ),
            )?;
            closed += 1;
        }
    }

    Ok(closed)
}

/// The student's effective open log after the rollover guard ran:
/// the one log with no exit time, or None.
fn effective_open_log(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    system_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Option<AttendanceLog>> {
    close_stale_for(conn, clock, close_hour, system_id, now)?;
    Ok(logs::open_logs_for(conn, system_id)?.into_iter().next())
}

/// Check-in: open a new log, or reconcile against the existing one.
pub fn check_in(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    system_id: i64,
    seat_number: Option<i64>,
    claimed_entry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<Transition> {
    students::get_by_system_id(conn, system_id)?;

    if let Some(mut open) = effective_open_log(conn, clock, close_hour, system_id, now)? {
        // Already present. An earlier claimed entry corrects the record
        // (earliest wins); anything else is a safe duplicate.
        if let Some(claim) = claimed_entry {
            if claim < open.entry_time {
                logs::set_entry_time(conn, open.id, claim)?;
                open.entry_time = claim;
                return Ok(Transition {
                    kind: EventKind::Corrected,
                    log: open,
                });
            }
        }
        return Ok(Transition {
            kind: EventKind::NoOp,
            log: open,
        });
    }

    let entry = claimed_entry.unwrap_or(now);
    let id = logs::insert(conn, system_id, entry, seat_number)?;

    // The presence flag is only raised for a today-dated entry; a
    // claimed past date is still recorded for audit completeness.
    if clock.local_date(entry) == clock.local_date(now) {
        students::set_present(conn, system_id, id)?;
    }

    Ok(Transition {
        kind: EventKind::Entered,
        log: AttendanceLog {
            id,
            system_id,
            entry_time: entry,
            exit_time: None,
            seat_number,
        },
    })
}

/// Check-out by student or by explicit log id.
///
/// The by-student path routes through the rollover guard (a stale
/// presence means effectively ABSENT, hence `NoOpenLog`). The by-log
/// path addresses one row directly: it is the offline-replay and edit
/// path, and may close or correct a past-dated log.
pub fn check_out(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    target: CheckOutTarget,
    claimed_exit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<Transition> {
    let log = match target {
        CheckOutTarget::Student(system_id) => {
            students::get_by_system_id(conn, system_id)?;
            effective_open_log(conn, clock, close_hour, system_id, now)?
                .ok_or(AppError::NoOpenLog(system_id))?
        }
        CheckOutTarget::Log(log_id) => logs::get(conn, log_id)?,
    };

    close_log(conn, log, claimed_exit, now)
}

fn close_log(
    conn: &Connection,
    mut log: AttendanceLog,
    claimed_exit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<Transition> {
    match log.exit_time {
        None => {
            let exit = claimed_exit.unwrap_or(now);
            logs::set_exit_time(conn, log.id, exit)?;
            students::clear_present(conn, log.system_id)?;
            log.exit_time = Some(exit);
            Ok(Transition {
                kind: EventKind::Exited,
                log,
            })
        }
        Some(recorded) => {
            // Duplicate checkout. A strictly later claimed exit updates
            // the record (latest wins); otherwise nothing to do.
            if let Some(claim) = claimed_exit {
                if claim > recorded {
                    logs::set_exit_time(conn, log.id, claim)?;
                    log.exit_time = Some(claim);
                    return Ok(Transition {
                        kind: EventKind::Corrected,
                        log,
                    });
                }
            }
            Ok(Transition {
                kind: EventKind::NoOp,
                log,
            })
        }
    }
}

/// QR flow: direction chosen by the student's effective state.
pub fn toggle(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    system_id: i64,
    claimed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AppResult<Transition> {
    students::get_by_system_id(conn, system_id)?;

    match effective_open_log(conn, clock, close_hour, system_id, now)? {
        Some(open) => close_log(conn, open, claimed, now),
        None => check_in(conn, clock, close_hour, system_id, None, claimed, now),
    }
}

/// Close every today-dated open log in one batch. Stale leftovers are
/// closed with the rollover estimate and not counted. Returns one
/// transition per student actually checked out now.
pub fn bulk_exit(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    now: DateTime<Utc>,
) -> AppResult<Vec<Transition>> {
    let today = clock.local_date(now);
    let mut out = Vec::new();

    for log in logs::open_logs_all(conn)? {
        let entry_day = clock.local_date(log.entry_time);
        if entry_day < today {
            close_stale_for(conn, clock, close_hour, log.system_id, now)?;
            continue;
        }
        out.push(close_log(conn, log, None, now)?);
    }

    Ok(out)
}

/// Startup sweep: close every forgotten open log from previous days at
/// `close_hour` of its entry date. Idempotent; returns affected count.
pub fn sweep_forgotten(
    conn: &Connection,
    clock: &LocalClock,
    close_hour: u32,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let today = clock.local_date(now);
    let mut closed = 0;

    for log in logs::open_logs_all(conn)? {
        let entry_day = clock.local_date(log.entry_time);
        if entry_day < today {
            let exit = clock.at_hour(entry_day, close_hour);
            logs::set_exit_time(conn, log.id, exit)?;
            students::clear_present(conn, log.system_id)?;
            journal::shlog(
                conn,
                "sweep",
                &log.id.to_string(),
                &format!(
                    "Closed forgotten log for student {} ({} {:02}:00)",
                    log.system_id, entry_day, close_hour
                ),
            )?;
            closed += 1;
        }
    }

    Ok(closed)
}
