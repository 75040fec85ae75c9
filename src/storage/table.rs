//! Statements run against the cache table.
//!
//! Every function takes a plain `&Connection`; callers that need atomicity
//! pass a `Transaction`, which derefs to one.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

/// Raw row as stored: key, value bytes, recency stamp.
pub type Row = (String, Vec<u8>, i64);

pub fn select_value(conn: &Connection, key: &str) -> Result<Option<Vec<u8>>> {
    let value: Option<Vec<u8>> = conn
        .query_row("SELECT value FROM cache WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn select_row(conn: &Connection, key: &str) -> Result<Option<Row>> {
    let row: Option<Row> = conn
        .query_row(
            "SELECT key, value, recency FROM cache WHERE key = ?1",
            [key],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    Ok(row)
}

pub fn exists(conn: &Connection, key: &str) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cache WHERE key = ?1)",
        [key],
        |row| row.get(0),
    )?;
    Ok(found)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Highest recency currently stored, if any entry exists.
pub fn max_recency(conn: &Connection) -> Result<Option<i64>> {
    let max: Option<i64> =
        conn.query_row("SELECT MAX(recency) FROM cache", [], |row| row.get(0))?;
    Ok(max)
}

/// Keys ordered from least to most recently written.
pub fn keys_by_recency(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM cache ORDER BY recency ASC, key ASC")?;
    let keys = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(keys)
}

/// Inserts the entry or replaces value and recency of an existing key.
pub fn upsert(conn: &Connection, key: &str, value: &[u8], recency: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO cache (key, value, recency) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, recency = excluded.recency",
        params![key, value, recency],
    )?;
    Ok(())
}

pub fn delete_key(conn: &Connection, key: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM cache WHERE key = ?1", [key])?)
}

/// Deletes the `limit` entries with the smallest recency.
pub fn delete_oldest(conn: &Connection, limit: usize) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM cache WHERE key IN (
             SELECT key FROM cache ORDER BY recency ASC, key ASC LIMIT ?1
         )",
        [limit as i64],
    )?;
    Ok(removed)
}

/// Deletes every entry whose recency is strictly below `threshold`.
pub fn delete_older_than(conn: &Connection, threshold: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM cache WHERE recency < ?1", [threshold])?)
}

pub fn delete_all(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM cache", [])?)
}
