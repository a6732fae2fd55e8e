use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::notify::{self, mailer_from_config};
use crate::db::pool::DbHandle;
use crate::db::queue;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Inspect the pending guardian-mail queue and/or run one retry sweep.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Queue { print, retry } = cmd {
        let db = DbHandle::open(&cfg.database)?;

        if *print || !*retry {
            let queued = db.with_conn(|conn| queue::list_all(conn))?;
            if queued.is_empty() {
                info("Notification queue is empty.");
            } else {
                println!("📬 Pending guardian mail ({}):", queued.len());
                for msg in &queued {
                    println!(
                        "{:>4}: {} | {} | queued {}",
                        msg.id, msg.recipient, msg.subject, msg.queued_at
                    );
                }
            }
        }

        if *retry {
            let mailer = mailer_from_config(cfg);
            let (sent, remaining) = {
                let conn = db.lock();
                notify::retry_pending(&conn, mailer.as_ref(), cfg.retry_batch)?
            };

            if sent > 0 {
                success(format!("Delivered {} queued message(s).", sent));
            }
            if remaining > 0 {
                warning(format!("{} message(s) still queued.", remaining));
            } else if sent == 0 {
                info("Nothing to retry.");
            }
        }
    }

    Ok(())
}
