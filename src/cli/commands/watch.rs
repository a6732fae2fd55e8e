use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::broadcast::Notice;
use crate::core::engine::Engine;
use crate::errors::AppResult;
use crate::ui::messages::{info, muted};
use rusqlite::Connection;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

/// Follow state changes. In-process events arrive over the broadcast
/// channel (with keep-alives while idle); mutations from other
/// processes are spotted by polling a cheap signature of the store,
/// which is the "viewer reconciles by re-fetching" model.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Watch { interval } = cmd {
        let engine = Engine::open(cfg)?;
        let rx = engine.subscribe();

        info("Watching for updates (Ctrl-C to stop)…");

        let mut last_sig = {
            let conn = engine.db().lock();
            signature(&conn)?
        };

        let poll = Duration::from_secs((*interval).max(1));

        loop {
            match rx.recv_timeout(poll) {
                Ok(Notice::StateChanged) => info("state changed"),
                Ok(Notice::KeepAlive) => muted("· keep-alive"),
                Err(RecvTimeoutError::Timeout) => {
                    let sig = {
                        let conn = engine.db().lock();
                        signature(&conn)?
                    };
                    if sig != last_sig {
                        last_sig = sig;
                        info(format!("state changed ({} present)", sig.2));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    Ok(())
}

/// (log rows, closed rows, students present): enough to notice any
/// committed mutation without reading full state.
fn signature(conn: &Connection) -> AppResult<(i64, i64, i64)> {
    let (total, closed): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COUNT(exit_time) FROM attendance_logs",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let present: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE is_present = 1",
        [],
        |row| row.get(0),
    )?;
    Ok((total, closed, present))
}
