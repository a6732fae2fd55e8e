//! Timestamp storage format and claimed-timestamp parsing.

use crate::errors::{AppError, AppResult};
use crate::utils::date::LocalClock;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Storage format for all persisted instants (UTC).
pub const STORE_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_utc(at: DateTime<Utc>) -> String {
    at.format(STORE_FMT).to_string()
}

/// Parse a stored timestamp. Accepts the storage format plus RFC 3339,
/// so databases touched by older builds stay readable.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, STORE_FMT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt: DateTime<FixedOffset>| dt.with_timezone(&Utc))
}

fn local_ts_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}(:\d{2})?$").unwrap()
    })
}

/// Parse a client-supplied ("claimed") timestamp.
///
/// RFC 3339 strings carry their own offset; bare local datetimes
/// (`YYYY-MM-DD HH:MM[:SS]`) are interpreted in the facility timezone.
pub fn parse_claimed(s: &str, clock: &LocalClock) -> AppResult<DateTime<Utc>> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if local_ts_re().is_match(trimmed) {
        let normalized = trimmed.replace('T', " ");
        let with_secs = if normalized.len() == 16 {
            format!("{}:00", normalized)
        } else {
            normalized
        };
        if let Ok(naive) = NaiveDateTime::parse_from_str(&with_secs, STORE_FMT) {
            let date = naive.date();
            let base = clock.day_start(date);
            let offset = naive.time() - chrono::NaiveTime::MIN;
            return Ok(base + offset);
        }
    }

    Err(AppError::InvalidTimestamp(s.to_string()))
}

pub fn parse_optional_claimed(
    input: Option<&String>,
    clock: &LocalClock,
) -> AppResult<Option<DateTime<Utc>>> {
    match input {
        Some(s) => Ok(Some(parse_claimed(s, clock)?)),
        None => Ok(None),
    }
}

/// Format a stay duration in seconds as "3h 05m".
pub fn fmt_duration(secs: i64) -> String {
    let m = secs.max(0) / 60;
    format!("{}h {:02}m", m / 60, m % 60)
}
