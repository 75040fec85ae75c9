//! Schema Module
//!
//! Opens store connections and creates the cache table and its recency index.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use crate::config::MEMORY_PATH;
use crate::error::Result;

/// Name of the table holding cache entries.
pub const TABLE_NAME: &str = "cache";

/// Name of the index over the recency column.
pub const INDEX_NAME: &str = "idx_cache_recency";

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS cache (
        key     TEXT    PRIMARY KEY NOT NULL,
        value   BLOB    NOT NULL,
        recency INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cache_recency ON cache (recency);
";

// == Store Target ==
/// Where a connection points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// Durable file on disk
    File(PathBuf),
    /// Private in-memory database, lost when the connection closes
    Memory,
}

impl StoreTarget {
    /// Interprets `:memory:` as an in-memory store and anything else as a file.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == MEMORY_PATH {
            StoreTarget::Memory
        } else {
            StoreTarget::File(path.to_path_buf())
        }
    }
}

// == Open Connection ==
/// Opens one connection to `target`, creating the file and its parent
/// directories if needed.
///
/// File-backed connections use WAL journaling so readers are not blocked by
/// the writer, and every connection waits up to `busy_timeout` on a locked
/// database before reporting an error.
pub fn open_connection(target: &StoreTarget, busy_timeout: Duration) -> Result<Connection> {
    let conn = match target {
        StoreTarget::Memory => Connection::open_in_memory()?,
        StoreTarget::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(path)?;
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!("Opened {} with journal_mode={}", path.display(), mode);
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn
        }
    };
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

// == Init Schema ==
/// Creates the cache table and recency index if they do not exist yet.
///
/// Safe to run on every open of the same file.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
