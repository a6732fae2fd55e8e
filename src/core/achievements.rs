//! Achievement rule engine.
//!
//! Pure function of (event direction, student, committed log, history):
//! at most one achievement per event, rules evaluated in fixed priority
//! order with short-circuit. Each rule fires at most once per its
//! natural window via the dedup ledger. When nothing fires, the
//! student's phrase-deck cursor advances instead so every event still
//! yields a message.
//!
//! All rules evaluate relative to the committed log's own instants, not
//! wall clock time, so offline replays behave deterministically.

use crate::db::achievements::{DedupWindow, has_achieved, record};
use crate::db::{logs, phrases, students};
use crate::errors::AppResult;
use crate::models::achievement::{Achievement, title_rank};
use crate::models::attendance::AttendanceLog;
use crate::models::student::Student;
use crate::utils::date::LocalClock;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use std::collections::BTreeSet;

/// Direction of the event being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// What the engine decided for one event.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub achievement: Option<Achievement>,
    pub student_message: Option<String>,
    pub guardian_message: Option<String>,
    pub title: Option<String>,
}

/// Evaluate the rule chain for a committed event and write any ledger /
/// title / phrase-cursor updates. Runs inside the caller's transaction.
pub fn evaluate(
    conn: &Connection,
    clock: &LocalClock,
    direction: Direction,
    student: &Student,
    log: &AttendanceLog,
) -> AppResult<Evaluation> {
    // First match wins: later rules must not run (they would write
    // their own ledger rows without ever being reported).
    let mut achieved = None;
    match direction {
        Direction::In => {
            let at = log.entry_time;
            achieved = check_monthly_ranking(conn, clock, student, at)?;
            if achieved.is_none() {
                achieved = check_consecutive_days(conn, clock, student, at)?;
            }
            if achieved.is_none() {
                achieved = check_monthly_visits(conn, clock, student, at)?;
            }
            if achieved.is_none() {
                achieved = check_first_arrival(conn, clock, student, at)?;
            }
            if achieved.is_none() {
                achieved = check_weekend_warrior(conn, clock, student, at)?;
            }
        }
        Direction::Out => {
            if let Some(at) = log.exit_time {
                achieved = check_monthly_hours(conn, clock, student, log, at)?;
                if achieved.is_none() {
                    achieved = check_late_finisher(conn, clock, student, at)?;
                }
            }
        }
    }

    if let Some(ach) = achieved {
        // Ranking achievements report the freshly upgraded title;
        // everything else keeps whatever the student already earned.
        let title = ach
            .title()
            .map(|t| t.to_string())
            .or_else(|| student.title.clone());
        return Ok(Evaluation {
            achievement: Some(ach),
            student_message: Some(ach.student_message()),
            guardian_message: Some(ach.guardian_message(&student.name)),
            title,
        });
    }

    // Fallback: rotate the phrase deck.
    let phrase_count = phrases::count(conn)?;
    if phrase_count > 0 {
        let next_id = (student.last_phrase_id % phrase_count) + 1;
        if let Some(phrase) = phrases::find(conn, next_id)? {
            students::set_last_phrase(conn, student.system_id, next_id)?;
            return Ok(Evaluation {
                achievement: None,
                student_message: Some(phrase.render()),
                guardian_message: None,
                title: student.title.clone(),
            });
        }
    }

    Ok(Evaluation {
        title: student.title.clone(),
        ..Evaluation::default()
    })
}

// ---------------------------------------------------------------
// Check-in rules (priority order)
// ---------------------------------------------------------------

/// Top-3 total hours over the previous local month. Guarded by a
/// once-per-month marker so the (relatively) expensive ranking query
/// runs a single time per student per month.
fn check_monthly_ranking(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    let today = clock.local_date(at);
    let month_first = first_of_month(today);

    let marker_ctx = format!("rank_check_{}_{}", today.year(), today.month());
    if has_achieved(
        conn,
        student.system_id,
        "monthly_rank_check",
        Some(&marker_ctx),
        DedupWindow::Since(month_first),
    )? {
        return Ok(None);
    }
    record(
        conn,
        student.system_id,
        "monthly_rank_check",
        Some(&marker_ctx),
        today,
    )?;

    let (prev_first, prev_last) = clock.previous_month(today);
    let (start, end) = clock.day_range(prev_first, prev_last);

    // Sum completed durations per student, take the top 3.
    let mut totals: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();
    for log in logs::completed_between(conn, start, end)? {
        if let Some(secs) = log.duration_secs() {
            *totals.entry(log.system_id).or_insert(0) += secs;
        }
    }
    let mut ranking: Vec<(i64, i64)> = totals.into_iter().collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranking.truncate(3);

    for (i, (sid, _)) in ranking.iter().enumerate() {
        if *sid == student.system_id {
            let rank = (i + 1) as u8;
            let ach = Achievement::MonthlyRank { rank };
            let ctx = format!("rank_{}_{}", prev_first.year(), prev_first.month());
            if !has_achieved(
                conn,
                student.system_id,
                &ach.code(),
                Some(&ctx),
                DedupWindow::Since(month_first),
            )? {
                record(conn, student.system_id, &ach.code(), Some(&ctx), today)?;
                upgrade_title(conn, student, &ach)?;
                return Ok(Some(ach));
            }
        }
    }
    Ok(None)
}

/// A title can only move up, never down.
fn upgrade_title(conn: &Connection, student: &Student, ach: &Achievement) -> AppResult<()> {
    if let Some(new_title) = ach.title() {
        if title_rank(Some(new_title)) > title_rank(student.title.as_deref()) {
            students::set_title(conn, student.system_id, new_title)?;
        }
    }
    Ok(())
}

/// Walk the facility's distinct open days backwards from the most
/// recent, counting while the student was there too; stop at the first
/// gap. A streak length fires once per student, ever.
fn check_consecutive_days(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    let today = clock.local_date(at);

    let mut open_days: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut my_days: BTreeSet<NaiveDate> = BTreeSet::new();
    for (sid, entry) in logs::all_entries(conn)? {
        let day = clock.local_date(entry);
        open_days.insert(day);
        if sid == student.system_id {
            my_days.insert(day);
        }
    }

    if open_days.is_empty() || !my_days.contains(&today) {
        return Ok(None);
    }

    let mut streak: u32 = 0;
    for day in open_days.iter().rev() {
        if my_days.contains(day) {
            streak += 1;
        } else {
            break;
        }
    }

    if streak >= 2 {
        let ctx = format!("days_{}", streak);
        if !has_achieved(
            conn,
            student.system_id,
            "consecutive_days",
            Some(&ctx),
            DedupWindow::Ever,
        )? {
            record(conn, student.system_id, "consecutive_days", Some(&ctx), today)?;
            return Ok(Some(Achievement::ConsecutiveDays { days: streak }));
        }
    }
    Ok(None)
}

/// Distinct local usage days this month: fire exactly on 10, 20, 30.
fn check_monthly_visits(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    let today = clock.local_date(at);
    let month_first = first_of_month(today);
    let month_start = clock.month_start(today);

    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();
    for entry in logs::entries_for_since(conn, student.system_id, month_start)? {
        days.insert(clock.local_date(entry));
    }
    let count = days.len() as u32;

    if matches!(count, 10 | 20 | 30) {
        let ach = Achievement::MonthlyVisits { count };
        let ctx = count.to_string();
        if !has_achieved(
            conn,
            student.system_id,
            &ach.code(),
            Some(&ctx),
            DedupWindow::Since(month_first),
        )? {
            record(conn, student.system_id, &ach.code(), Some(&ctx), today)?;
            return Ok(Some(ach));
        }
    }
    Ok(None)
}

/// Fires when this check-in is the very first one system-wide for the
/// local day. The per-day ledger row keeps a corrected replay of the
/// same log from firing twice.
fn check_first_arrival(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    let today = clock.local_date(at);
    let (start, end) = clock.day_range(today, today);

    if logs::count_entries_between(conn, start, end)? == 1 {
        if !has_achieved(
            conn,
            student.system_id,
            "first_arrival",
            None,
            DedupWindow::On(today),
        )? {
            record(conn, student.system_id, "first_arrival", None, today)?;
            return Ok(Some(Achievement::FirstArrival));
        }
    }
    Ok(None)
}

fn check_weekend_warrior(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    if !clock.is_weekend(at) {
        return Ok(None);
    }
    let today = clock.local_date(at);
    let ctx = today.format("%Y-%m-%d").to_string();
    if !has_achieved(
        conn,
        student.system_id,
        "weekend_warrior",
        Some(&ctx),
        DedupWindow::On(today),
    )? {
        record(conn, student.system_id, "weekend_warrior", Some(&ctx), today)?;
        return Ok(Some(Achievement::WeekendWarrior));
    }
    Ok(None)
}

// ---------------------------------------------------------------
// Check-out rules (priority order)
// ---------------------------------------------------------------

/// Cumulative completed hours this month, before vs. after this log:
/// fire on the first 10-hour boundary crossed that is still unclaimed.
fn check_monthly_hours(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    log: &AttendanceLog,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    let today = clock.local_date(at);
    let month_first = first_of_month(today);
    let month_start = clock.month_start(today);

    let mut prev_secs: i64 = 0;
    for other in logs::completed_for_since(conn, student.system_id, month_start, log.id)? {
        prev_secs += other.duration_secs().unwrap_or(0);
    }
    let current_secs = log.duration_secs().unwrap_or(0);

    let prev_hours = prev_secs as f64 / 3600.0;
    let total_hours = (prev_secs + current_secs) as f64 / 3600.0;

    for boundary in (10..=100).step_by(10) {
        let b = boundary as f64;
        if prev_hours < b && b <= total_hours {
            let ach = Achievement::MonthlyHours { hours: boundary };
            let ctx = boundary.to_string();
            if !has_achieved(
                conn,
                student.system_id,
                &ach.code(),
                Some(&ctx),
                DedupWindow::Since(month_first),
            )? {
                record(conn, student.system_id, &ach.code(), Some(&ctx), today)?;
                return Ok(Some(ach));
            }
        }
    }
    Ok(None)
}

fn check_late_finisher(
    conn: &Connection,
    clock: &LocalClock,
    student: &Student,
    at: DateTime<Utc>,
) -> AppResult<Option<Achievement>> {
    if clock.local_hour(at) < 18 {
        return Ok(None);
    }
    let today = clock.local_date(at);
    let ctx = today.format("%Y-%m-%d").to_string();
    if !has_achieved(
        conn,
        student.system_id,
        "late_finisher",
        Some(&ctx),
        DedupWindow::On(today),
    )? {
        record(conn, student.system_id, "late_finisher", Some(&ctx), today)?;
        return Ok(Some(Achievement::LateFinisher));
    }
    Ok(None)
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}
