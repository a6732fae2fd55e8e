use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::presence;
use crate::db::initialize::init_db;
use crate::db::journal::shlog;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::date::LocalClock;
use chrono::Utc;
use rusqlite::Connection;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file
///  - the SQLite database (prod or test mode)
///  - all pending DB migrations
/// and then runs the forgotten-checkout sweep, the same thing a
/// long-lived server does once at process start.
pub fn handle(cli: &Cli) -> AppResult<()> {
    if let Some(custom) = &cli.db {
        Config::init_all(Some(custom.clone()), cli.test)?;
    } else {
        Config::init_all(None, cli.test)?;
    }

    let mut cfg = Config::load();
    if let Some(custom) = &cli.db {
        cfg.database = custom.clone();
    }
    let db_path = cfg.database.clone();

    println!("⚙️  Initializing studyhall…");
    println!("🗄️  Database   : {}", &db_path);

    let conn = Connection::open(&db_path)?;

    init_db(&conn)?;

    println!("✅ Database initialized at {}", &db_path);

    // Process-start duty: reconcile day rollover before the first event.
    let clock = LocalClock::new(cfg.utc_offset_minutes);
    let swept = presence::sweep_forgotten(&conn, &clock, cfg.auto_close_hour, Utc::now())?;
    if swept > 0 {
        info(format!("Closed {} forgotten log(s) from previous days.", swept));
    }

    if let Err(e) = shlog(
        &conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", &db_path),
    ) {
        eprintln!("⚠️ Failed to write internal log: {}", e);
    }

    println!("🎉 studyhall initialization completed!");
    Ok(())
}
