//! LRU Eviction Module
//!
//! Enforces the capacity bound by deleting the least recently written entries.

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::storage::table;

// == Evict Excess ==
/// Deletes the lowest-recency entries until at most `max_entries` remain.
///
/// Returns the number of entries evicted. Callers run this in the same
/// transaction as the write that may have pushed the count over the bound, so
/// no reader ever sees the store above capacity.
pub fn evict_excess(conn: &Connection, max_entries: usize) -> Result<usize> {
    let count = table::count(conn)?;
    if count <= max_entries {
        return Ok(0);
    }

    let excess = count - max_entries;
    let evicted = table::delete_oldest(conn, excess)?;
    debug!(
        "Evicted {} entries to stay within {} (had {})",
        evicted, max_entries, count
    );
    Ok(evicted)
}
