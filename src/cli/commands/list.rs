use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbHandle;
use crate::db::{logs, students};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::info;
use crate::utils::date::{LocalClock, parse_date};
use crate::utils::table::{Column, Table};
use chrono::Utc;
use std::collections::HashMap;

/// Presence board: every visit of the day with entry/exit times, plus
/// who is still inside. Read path, so stale presence flags are only
/// lazily reset here, never the logs themselves.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { date, json } = cmd {
        let clock = LocalClock::new(cfg.utc_offset_minutes);
        let db = DbHandle::open(&cfg.database)?;
        let conn = db.lock();

        let now = Utc::now();
        let day = match date {
            Some(s) => parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?,
            None => clock.local_date(now),
        };

        // Lazy rollover reset on the read path.
        students::lazy_reset_stale(&conn, &clock, now)?;

        let (start, end) = clock.day_range(day, day);
        let visits = logs::logs_between(&conn, start, end)?;
        let roster: HashMap<i64, _> = students::list_all(&conn)?
            .into_iter()
            .map(|s| (s.system_id, s))
            .collect();

        if *json {
            let board: Vec<serde_json::Value> = visits
                .iter()
                .map(|log| {
                    let name = roster
                        .get(&log.system_id)
                        .map(|s| s.name.as_str())
                        .unwrap_or("?");
                    serde_json::json!({
                        "log_id": log.id,
                        "system_id": log.system_id,
                        "name": name,
                        "seat": log.seat_number,
                        "entry": clock.format_hm(log.entry_time),
                        "exit": log.exit_time.map(|t| clock.format_hm(t)),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&board)?);
            return Ok(());
        }

        if visits.is_empty() {
            info(format!("No visits on {}.", day));
            return Ok(());
        }

        let mut present = 0;
        let mut table = Table::new(vec![
            Column { header: "Log".to_string(), width: 5 },
            Column { header: "SysID".to_string(), width: 8 },
            Column { header: "Name".to_string(), width: 20 },
            Column { header: "Seat".to_string(), width: 4 },
            Column { header: "In".to_string(), width: 5 },
            Column { header: "Out".to_string(), width: 5 },
        ]);

        for log in &visits {
            let name = roster
                .get(&log.system_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "?".to_string());
            if log.is_open() {
                present += 1;
            }
            table.add_row(vec![
                log.id.to_string(),
                log.system_id.to_string(),
                name,
                log.seat_number
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                clock.format_hm(log.entry_time),
                log.exit_time
                    .map(|t| clock.format_hm(t))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }

        println!("📅 Visits on {}:", day);
        println!();
        print!("{}", table.render());
        println!();
        println!("Present now: {} | Visits today: {}", present, visits.len());
    }

    Ok(())
}
