use crate::errors::AppResult;
use crate::models::phrase::Phrase;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

fn map_row(row: &Row) -> Result<Phrase> {
    Ok(Phrase {
        id: row.get("id")?,
        category: row.get("category")?,
        text: row.get("text")?,
        author: row.get("author")?,
        lifespan: row.get("lifespan")?,
    })
}

pub fn count(conn: &Connection) -> AppResult<i64> {
    let n: i64 = conn.query_row("SELECT COUNT(id) FROM phrases", [], |row| row.get(0))?;
    Ok(n)
}

pub fn find(conn: &Connection, id: i64) -> AppResult<Option<Phrase>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM phrases WHERE id = ?1")?;
    let phrase = stmt.query_row([id], map_row).optional()?;
    Ok(phrase)
}

/// Built-in deck used when no curated one has been imported. The
/// rotation only needs *some* rows to cycle through.
const DEFAULT_DECK: &[(&str, &str, Option<&str>, Option<&str>)] = &[
    ("cheer", "Nice to see you. One page at a time.", None, None),
    ("cheer", "Welcome back! Pick up right where you left off.", None, None),
    ("cheer", "Small steps every day add up.", None, None),
    ("cheer", "Focus on the next problem, not the whole book.", None, None),
    ("cheer", "A quiet desk is a superpower.", None, None),
    ("cheer", "Done studying? Stretch before you head out.", None, None),
    (
        "quote",
        "Genius is one percent inspiration, ninety-nine percent perspiration.",
        Some("Thomas Edison"),
        Some("(1847 - 1931)"),
    ),
    (
        "quote",
        "It does not matter how slowly you go as long as you do not stop.",
        Some("Confucius"),
        Some("(551 BC - 479 BC)"),
    ),
    (
        "quote",
        "The secret of getting ahead is getting started.",
        Some("Mark Twain"),
        Some("(1835 - 1910)"),
    ),
    (
        "quote",
        "I have not failed. I've just found 10,000 ways that won't work.",
        Some("Thomas Edison"),
        Some("(1847 - 1931)"),
    ),
];

/// Insert the default deck into an empty phrases table.
/// Returns the number of rows inserted (0 when already populated).
pub fn seed_default(conn: &Connection) -> AppResult<usize> {
    if count(conn)? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for (category, text, author, lifespan) in DEFAULT_DECK {
        conn.execute(
            "INSERT INTO phrases (category, text, author, lifespan)
             VALUES (?1, ?2, ?3, ?4)",
            params![category, text, author, lifespan],
        )?;
        inserted += 1;
    }
    Ok(inserted)
}
