pub mod checkin;
pub mod checkout;
pub mod config;
pub mod exit_all;
pub mod init;
pub mod journal;
pub mod list;
pub mod queue;
pub mod student;
pub mod sweep;
pub mod toggle;
pub mod watch;

use crate::core::engine::EventReport;
use crate::models::attendance::EventKind;
use crate::ui::messages::{info, success};
use crate::utils::date::LocalClock;
use crate::utils::time::fmt_duration;

/// Shared outcome printer for in/out/toggle.
pub fn print_report(report: &EventReport, clock: &LocalClock) {
    match report.kind {
        EventKind::Entered => success(format!(
            "{} checked in at {} (log {}).",
            report.student_name,
            clock.format_hm(report.log.entry_time),
            report.log.id
        )),
        EventKind::Exited => {
            let mut line = format!("{} checked out", report.student_name);
            if let Some(exit) = report.log.exit_time {
                line.push_str(&format!(" at {}", clock.format_hm(exit)));
            }
            if let Some(secs) = report.log.duration_secs() {
                line.push_str(&format!(" (stayed {})", fmt_duration(secs)));
            }
            line.push('.');
            success(line);
        }
        EventKind::Corrected => success(format!(
            "Record corrected for {} (log {}).",
            report.student_name, report.log.id
        )),
        EventKind::NoOp => info(format!(
            "Nothing to do for {} (log {}).",
            report.student_name, report.log.id
        )),
    }

    if let Some(msg) = &report.message {
        println!("💬 {}", msg);
    }
    if let Some(title) = &report.title {
        println!("🏅 Title: {}", title);
    }
}
