use crate::db::phrases;
use crate::errors::AppResult;
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Check if the `students` table exists.
fn students_table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='students'")?;
    let exists: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

/// Create the core tables with the modern schema.
fn create_core_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            system_id       INTEGER UNIQUE NOT NULL,
            enrollment_year INTEGER,
            grade           INTEGER,
            class_number    INTEGER,
            student_number  INTEGER,
            name            TEXT NOT NULL,
            guardian_email  TEXT NOT NULL DEFAULT '',
            is_present      INTEGER NOT NULL DEFAULT 0,
            current_log_id  INTEGER,
            title           TEXT,
            last_phrase_id  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS attendance_logs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            system_id   INTEGER NOT NULL,
            entry_time  TEXT NOT NULL,
            exit_time   TEXT,
            seat_number INTEGER,
            FOREIGN KEY (system_id) REFERENCES students(system_id)
        );

        CREATE INDEX IF NOT EXISTS idx_logs_system_id ON attendance_logs(system_id);
        CREATE INDEX IF NOT EXISTS idx_logs_entry_time ON attendance_logs(entry_time);

        CREATE TABLE IF NOT EXISTS achievements_tracker (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            system_id   INTEGER NOT NULL,
            code        TEXT NOT NULL,
            achieved_at TEXT NOT NULL,
            context     TEXT,
            FOREIGN KEY (system_id) REFERENCES students(system_id)
        );

        CREATE INDEX IF NOT EXISTS idx_ach_dedup ON achievements_tracker(system_id, code, achieved_at);

        CREATE TABLE IF NOT EXISTS phrases (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL DEFAULT 'cheer',
            text     TEXT NOT NULL,
            author   TEXT,
            lifespan TEXT
        );

        CREATE TABLE IF NOT EXISTS email_queue (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient TEXT NOT NULL,
            subject   TEXT NOT NULL,
            body      TEXT NOT NULL,
            queued_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Has a one-shot migration already been applied? Applied migrations
/// are recorded as `migration_applied` rows in the log table.
fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_migration_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Seed the motivational phrase deck exactly once.
fn migrate_seed_phrase_deck(conn: &Connection) -> AppResult<()> {
    let version = "20250901_0001_seed_phrase_deck";

    if migration_applied(conn, version)? {
        return Ok(()); // already applied
    }

    let inserted = phrases::seed_default(conn)?;
    mark_migration_applied(conn, version, "Seeded default phrase deck")?;

    if inserted > 0 {
        success(format!(
            "Migration applied: {} → seeded {} phrases",
            version, inserted
        ));
    }

    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked from db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    // 1) Ensure log table (migration bookkeeping lives there)
    ensure_log_table(conn)?;

    // 2) Core tables
    let fresh = !students_table_exists(conn)?;
    create_core_tables(conn)?;
    if fresh {
        success("Created core tables (modern schema).");
    }

    // 3) One-shot migrations
    migrate_seed_phrase_deck(conn)?;

    Ok(())
}
