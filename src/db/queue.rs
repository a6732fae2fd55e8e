use crate::errors::AppResult;
use crate::models::queued::QueuedMessage;
use rusqlite::{Connection, Result, Row, params};

fn map_row(row: &Row) -> Result<QueuedMessage> {
    Ok(QueuedMessage {
        id: row.get("id")?,
        recipient: row.get("recipient")?,
        subject: row.get("subject")?,
        body: row.get("body")?,
        queued_at: row.get("queued_at")?,
    })
}

pub fn enqueue(
    conn: &Connection,
    recipient: &str,
    subject: &str,
    body: &str,
    queued_at: &str,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO email_queue (recipient, subject, body, queued_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![recipient, subject, body, queued_at],
    )?;
    Ok(())
}

/// Oldest messages first, at most `limit` rows (one retry batch).
pub fn oldest(conn: &Connection, limit: i64) -> AppResult<Vec<QueuedMessage>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM email_queue ORDER BY id ASC LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<QueuedMessage>> {
    let mut stmt = conn.prepare("SELECT * FROM email_queue ORDER BY id ASC")?;

    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Remove a message after confirmed delivery.
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM email_queue WHERE id = ?1", [id])?;
    Ok(())
}

pub fn count(conn: &Connection) -> AppResult<i64> {
    let n: i64 = conn.query_row("SELECT COUNT(id) FROM email_queue", [], |row| row.get(0))?;
    Ok(n)
}
