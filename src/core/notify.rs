//! Guardian notifications.
//!
//! Message composition, a transport trait (the raw SMTP transport is an
//! external collaborator; the core only needs "send succeeds or
//! fails"), a single background worker fed by a bounded channel, and
//! the persistent retry queue. Delivery problems never reach the
//! presence caller: a failed send lands in `email_queue` and waits for
//! the next sweep.

use crate::db::pool::DbHandle;
use crate::db::{journal, queue};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceLog;
use crate::models::student::Student;
use crate::ui::messages::{info, warning};
use crate::utils::date::LocalClock;
use crate::utils::time::{fmt_duration, fmt_utc};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread::JoinHandle;

/// Sending capability. Implementations are expected to bound their own
/// connect/send time; the worker treats any Err as transient.
pub trait Mailer: Send + Sync {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Prints each message to the console. Default for interactive use and
/// for setups without a configured transport.
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, recipient: &str, subject: &str, _body: &str) -> AppResult<()> {
        info(format!("Mail to {}: {}", recipient, subject));
        Ok(())
    }
}

/// Drops each message as a file into a spool directory an external
/// transport picks up. Fails when the directory is missing, which is
/// also how the tests force messages into the retry queue.
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> AppResult<()> {
        if !self.dir.is_dir() {
            return Err(AppError::Delivery(format!(
                "outbox directory not available: {}",
                self.dir.display()
            )));
        }

        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%f");
        let path = self.dir.join(format!("{}.eml", stamp));
        let mut file = fs::File::create(&path)
            .map_err(|e| AppError::Delivery(format!("outbox write failed: {}", e)))?;
        write!(file, "To: {}\nSubject: {}\n\n{}\n", recipient, subject, body)
            .map_err(|e| AppError::Delivery(format!("outbox write failed: {}", e)))?;
        Ok(())
    }
}

/// Build the transport selected in the config file. Unknown values
/// fall back to the console transport.
pub fn mailer_from_config(cfg: &crate::config::Config) -> Arc<dyn Mailer> {
    match cfg.mailer.as_str() {
        "outbox" => Arc::new(OutboxMailer::new(cfg.outbox_dir.clone())),
        _ => Arc::new(ConsoleMailer),
    }
}

/// A composed guardian message ready for delivery.
#[derive(Debug, Clone)]
pub struct GuardianMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Names used in message composition, loaded from the config file.
#[derive(Debug, Clone)]
pub struct Letterhead {
    pub app_name: String,
    pub organization_name: String,
    pub sender_name: String,
}

/// Compose the entry/exit notification for a student's guardian.
/// Returns None when no guardian address is on file.
pub fn compose(
    clock: &LocalClock,
    letterhead: &Letterhead,
    student: &Student,
    log: &AttendanceLog,
    leaving: bool,
    achievement_line: Option<&str>,
) -> Option<GuardianMessage> {
    if student.guardian_email.trim().is_empty() {
        return None;
    }

    let extra = achievement_line.unwrap_or("");

    let (subject, event_line) = if leaving {
        let exit = log.exit_time?;
        let mut line = format!("{} checked out at {}.", student.name, clock.format_hm(exit));
        if let Some(secs) = log.duration_secs() {
            line.push_str(&format!("\nStay duration: {}", fmt_duration(secs)));
        }
        (
            format!("[{}] Check-out notice for {}", letterhead.app_name, student.name),
            line,
        )
    } else {
        (
            format!("[{}] Check-in notice for {}", letterhead.app_name, student.name),
            format!(
                "{} checked in at {}.",
                student.name,
                clock.format_hm(log.entry_time)
            ),
        )
    };

    let body = format!(
        "Dear guardian,\n\nThis is {org}.\n\n{event}\n\n{extra}\n\nBest regards,\n{sender}",
        org = letterhead.organization_name,
        event = event_line,
        extra = extra,
        sender = letterhead.sender_name,
    );

    Some(GuardianMessage {
        recipient: student.guardian_email.clone(),
        subject,
        body,
    })
}

const CHANNEL_CAP: usize = 64;

/// Background delivery worker. One thread, one bounded channel; the
/// request path only ever enqueues. Failed sends are persisted to the
/// retry queue.
pub struct NotificationDispatcher {
    tx: Option<SyncSender<GuardianMessage>>,
    worker: Option<JoinHandle<()>>,
    db: DbHandle,
}

impl NotificationDispatcher {
    pub fn start(db: DbHandle, mailer: Arc<dyn Mailer>) -> Self {
        let (tx, rx): (SyncSender<GuardianMessage>, Receiver<GuardianMessage>) =
            sync_channel(CHANNEL_CAP);

        let worker_db = db.clone();
        let worker = std::thread::spawn(move || {
            for msg in rx {
                if let Err(e) = mailer.send(&msg.recipient, &msg.subject, &msg.body) {
                    warning(format!("Guardian mail not sent, queued for retry: {}", e));
                    if let Err(qe) = persist(&worker_db, &msg) {
                        warning(format!("Failed to persist queued mail: {}", qe));
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
            db,
        }
    }

    /// Hand a message to the worker without blocking the request path.
    /// A full (or gone) channel falls back to the persistent queue so
    /// the at-least-once promise holds either way.
    pub fn dispatch(&self, msg: GuardianMessage) {
        let Some(tx) = self.tx.as_ref() else {
            let _ = persist(&self.db, &msg);
            return;
        };
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) | Err(TrySendError::Disconnected(msg)) => {
                if let Err(e) = persist(&self.db, &msg) {
                    warning(format!("Failed to persist queued mail: {}", e));
                }
            }
        }
    }

    /// Drop the sender and wait for the worker to drain its channel.
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn persist(db: &DbHandle, msg: &GuardianMessage) -> AppResult<()> {
    let conn = db.lock();
    queue::enqueue(
        &conn,
        &msg.recipient,
        &msg.subject,
        &msg.body,
        &fmt_utc(chrono::Utc::now()),
    )?;
    journal::shlog(
        &conn,
        "queue",
        &msg.recipient,
        "Guardian mail persisted to retry queue",
    )?;
    Ok(())
}

/// Retry sweep over the persistent queue: up to `limit` messages in
/// FIFO order, stopping at the first failure (an offline transport is
/// not worth hammering). Delivered rows are deleted. Returns
/// (sent, still_queued).
pub fn retry_pending(
    conn: &rusqlite::Connection,
    mailer: &dyn Mailer,
    limit: i64,
) -> AppResult<(usize, usize)> {
    let batch = queue::oldest(conn, limit)?;
    let mut sent = 0;

    for msg in &batch {
        match mailer.send(&msg.recipient, &msg.subject, &msg.body) {
            Ok(()) => {
                queue::delete(conn, msg.id)?;
                sent += 1;
            }
            Err(e) => {
                warning(format!("Retry stopped at queued mail {}: {}", msg.id, e));
                break;
            }
        }
    }

    let remaining = queue::count(conn)? as usize;
    Ok((sent, remaining))
}
