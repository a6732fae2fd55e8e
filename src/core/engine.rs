//! Engine facade: wires the store, the presence state machine, the
//! achievement engine, the notification dispatcher and the update
//! broadcaster together, in the order the consistency story requires:
//!
//! 1. presence transition, one transaction, committed first;
//! 2. achievement evaluation, own transaction, same connection lock
//!    (serializes per-student rule evaluation), failures swallowed;
//! 3. notification + broadcast, off the lock, fire-and-forget.

use crate::config::Config;
use crate::core::achievements::{self, Direction, Evaluation};
use crate::core::broadcast::{Notice, UpdateBroadcaster};
use crate::core::notify::{self, Letterhead, Mailer, NotificationDispatcher};
use crate::core::presence::{self, Transition};
use crate::db::pool::DbHandle;
use crate::db::{journal, students};
use crate::errors::AppResult;
use crate::models::attendance::{AttendanceLog, CheckOutTarget, EventKind};
use crate::models::student::Student;
use crate::ui::messages::warning;
use crate::utils::date::LocalClock;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Outcome of one presence operation, as returned to the terminal.
#[derive(Debug, Clone)]
pub struct EventReport {
    pub kind: EventKind,
    pub log: AttendanceLog,
    pub student_name: String,
    /// Student-facing message: achievement congratulation or the next
    /// phrase from the deck. None for no-ops.
    pub message: Option<String>,
    pub title: Option<String>,
}

pub struct Engine {
    db: DbHandle,
    clock: LocalClock,
    close_hour: u32,
    retry_batch: i64,
    letterhead: Letterhead,
    mailer: Arc<dyn Mailer>,
    dispatcher: NotificationDispatcher,
    broadcaster: UpdateBroadcaster,
}

impl Engine {
    pub fn open(cfg: &Config) -> AppResult<Self> {
        let db = DbHandle::open(&cfg.database)?;
        Ok(Self::start(db, cfg, notify::mailer_from_config(cfg)))
    }

    /// Wire an engine over an existing handle; tests inject their own
    /// mailer here.
    pub fn start(db: DbHandle, cfg: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let dispatcher = NotificationDispatcher::start(db.clone(), Arc::clone(&mailer));
        let broadcaster = UpdateBroadcaster::start(Duration::from_secs(cfg.keepalive_secs.max(1)));

        Self {
            db,
            clock: LocalClock::new(cfg.utc_offset_minutes),
            close_hour: cfg.auto_close_hour,
            retry_batch: cfg.retry_batch,
            letterhead: Letterhead {
                app_name: cfg.app_name.clone(),
                organization_name: cfg.organization_name.clone(),
                sender_name: cfg.sender_name.clone(),
            },
            mailer,
            dispatcher,
            broadcaster,
        }
    }

    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    // -----------------------------------------------------------
    // Presence operations
    // -----------------------------------------------------------

    pub fn check_in(
        &self,
        system_id: i64,
        seat_number: Option<i64>,
        claimed_entry: Option<DateTime<Utc>>,
    ) -> AppResult<EventReport> {
        let now = self.clock.now();
        let (transition, student, eval) = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let t = presence::check_in(
                &tx,
                &self.clock,
                self.close_hour,
                system_id,
                seat_number,
                claimed_entry,
                now,
            )?;
            tx.commit()?;

            let student = students::get_by_system_id(&conn, system_id)?;
            let eval = self.evaluate_committed(&mut conn, &student, &t);
            (t, student, eval)
        };

        self.pipeline(&student, &transition, &eval);
        Ok(report(transition, &student, eval))
    }

    pub fn check_out(
        &self,
        target: CheckOutTarget,
        claimed_exit: Option<DateTime<Utc>>,
    ) -> AppResult<EventReport> {
        let now = self.clock.now();
        let (transition, student, eval) = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let t = presence::check_out(
                &tx,
                &self.clock,
                self.close_hour,
                target,
                claimed_exit,
                now,
            )?;
            tx.commit()?;

            let student = students::get_by_system_id(&conn, t.log.system_id)?;
            let eval = self.evaluate_committed(&mut conn, &student, &t);
            (t, student, eval)
        };

        self.pipeline(&student, &transition, &eval);
        Ok(report(transition, &student, eval))
    }

    pub fn toggle(
        &self,
        system_id: i64,
        claimed: Option<DateTime<Utc>>,
    ) -> AppResult<EventReport> {
        let now = self.clock.now();
        let (transition, student, eval) = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let t = presence::toggle(&tx, &self.clock, self.close_hour, system_id, claimed, now)?;
            tx.commit()?;

            let student = students::get_by_system_id(&conn, system_id)?;
            let eval = self.evaluate_committed(&mut conn, &student, &t);
            (t, student, eval)
        };

        self.pipeline(&student, &transition, &eval);
        Ok(report(transition, &student, eval))
    }

    /// Close every today-dated open log; returns how many students
    /// were checked out. Running it twice in a row is a no-op.
    pub fn bulk_exit(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let mut batch: Vec<(Student, Transition, Evaluation)> = Vec::new();

        {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let transitions = presence::bulk_exit(&tx, &self.clock, self.close_hour, now)?;
            tx.commit()?;

            for t in transitions {
                let student = students::get_by_system_id(&conn, t.log.system_id)?;
                let eval = self.evaluate_committed(&mut conn, &student, &t);
                batch.push((student, t, eval));
            }
        }

        let count = batch.len();
        for (student, transition, eval) in &batch {
            self.notify_guardian(student, transition, eval);
        }
        if count > 0 {
            self.broadcaster.publish();
        }
        Ok(count)
    }

    /// Startup sweep for forgotten checkouts. Returns closed log count.
    pub fn sweep_forgotten(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let count = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let n = presence::sweep_forgotten(&tx, &self.clock, self.close_hour, now)?;
            tx.commit()?;
            n
        };

        if count > 0 {
            self.broadcaster.publish();
        }
        Ok(count)
    }

    // -----------------------------------------------------------
    // Viewers and the retry queue
    // -----------------------------------------------------------

    pub fn subscribe(&self) -> Receiver<Notice> {
        self.broadcaster.subscribe()
    }

    /// One retry sweep over the persistent queue; (sent, still queued).
    pub fn retry_queue(&self) -> AppResult<(usize, usize)> {
        let conn = self.db.lock();
        notify::retry_pending(&conn, self.mailer.as_ref(), self.retry_batch)
    }

    /// Flush the delivery worker and stop background threads.
    pub fn close(mut self) {
        self.dispatcher.shutdown();
        self.broadcaster.shutdown();
    }

    // -----------------------------------------------------------
    // Internals
    // -----------------------------------------------------------

    /// Post-commit achievement evaluation. Never fails the caller: a
    /// lost achievement is tolerable, a lost check-in is not.
    fn evaluate_committed(
        &self,
        conn: &mut Connection,
        student: &Student,
        t: &Transition,
    ) -> Evaluation {
        if !t.kind.is_effective() {
            return Evaluation {
                title: student.title.clone(),
                ..Evaluation::default()
            };
        }

        let direction = direction_of(&t.log);
        let evaluated = (|| -> AppResult<Evaluation> {
            let tx = conn.transaction()?;
            let eval = achievements::evaluate(&tx, &self.clock, direction, student, &t.log)?;
            tx.commit()?;
            Ok(eval)
        })();

        match evaluated {
            Ok(eval) => eval,
            Err(e) => {
                warning(format!(
                    "Achievement evaluation failed for student {}: {}",
                    student.system_id, e
                ));
                let _ = journal::shlog(
                    conn,
                    "achievement",
                    &student.system_id.to_string(),
                    &format!("Evaluation failed: {}", e),
                );
                Evaluation {
                    title: student.title.clone(),
                    ..Evaluation::default()
                }
            }
        }
    }

    /// Fire-and-forget side effects for one effective transition.
    fn pipeline(&self, student: &Student, t: &Transition, eval: &Evaluation) {
        if !t.kind.is_effective() {
            return;
        }
        self.notify_guardian(student, t, eval);
        self.broadcaster.publish();
    }

    fn notify_guardian(&self, student: &Student, t: &Transition, eval: &Evaluation) {
        if !t.kind.is_effective() {
            return;
        }
        let leaving = matches!(direction_of(&t.log), Direction::Out);
        if let Some(msg) = notify::compose(
            &self.clock,
            &self.letterhead,
            student,
            &t.log,
            leaving,
            eval.guardian_message.as_deref(),
        ) {
            self.dispatcher.dispatch(msg);
        }
    }
}

fn direction_of(log: &AttendanceLog) -> Direction {
    if log.is_open() {
        Direction::In
    } else {
        Direction::Out
    }
}

fn report(t: Transition, student: &Student, eval: Evaluation) -> EventReport {
    EventReport {
        kind: t.kind,
        log: t.log,
        student_name: student.name.clone(),
        message: eval.student_message,
        title: eval.title,
    }
}
