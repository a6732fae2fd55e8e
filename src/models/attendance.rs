use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stay in the study room. `exit_time = None` means the student is
/// still inside ("open log"); a closed log is immutable apart from
/// explicit administrative edits.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceLog {
    pub id: i64,
    pub system_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub seat_number: Option<i64>,
}

impl AttendanceLog {
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Completed stay length in seconds; None while the log is open.
    pub fn duration_secs(&self) -> Option<i64> {
        self.exit_time
            .map(|exit| (exit - self.entry_time).num_seconds())
    }
}

/// What a presence transition actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Entered,
    Exited,
    /// A recorded timestamp was corrected (earliest entry wins /
    /// latest exit wins).
    Corrected,
    /// Duplicate or replayed request; nothing changed, still a success.
    NoOp,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Entered => "entered",
            EventKind::Exited => "exited",
            EventKind::Corrected => "corrected",
            EventKind::NoOp => "no-op",
        }
    }

    /// Only real transitions feed the achievement/notification pipeline.
    pub fn is_effective(&self) -> bool {
        !matches!(self, EventKind::NoOp)
    }
}

/// Target selector for check-out: by owning student, or by explicit
/// log id (the offline-reconciliation / edit path).
#[derive(Debug, Clone, Copy)]
pub enum CheckOutTarget {
    Student(i64),
    Log(i64),
}
