//! Cache Entry Module
//!
//! Defines the stored entry and how recency stamps are minted.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::Result;
use crate::storage::table;

// == Cache Entry ==
/// Represents a single cache entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The entry's key
    pub key: String,
    /// The encoded value bytes
    pub value: Vec<u8>,
    /// Recency stamp of the last write (Unix microseconds)
    pub recency: i64,
}

impl CacheEntry {
    // == Recorded At ==
    /// Returns the wall-clock time corresponding to the recency stamp.
    ///
    /// Stamps are minted from the clock but bumped past the previous maximum,
    /// so this can run slightly ahead of the real write time under heavy load.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.recency)
    }
}

impl From<table::Row> for CacheEntry {
    fn from((key, value, recency): table::Row) -> Self {
        Self { key, value, recency }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in microseconds.
pub fn current_timestamp_us() -> i64 {
    Utc::now().timestamp_micros()
}

/// Converts a wall-clock instant to a recency threshold.
pub fn recency_at(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

/// Picks the stamp for the next write given the current clock and the
/// highest stamp already stored.
pub fn next_recency(now: i64, stored_max: Option<i64>) -> i64 {
    match stored_max {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}

// == Mint Recency ==
/// Mints a recency stamp strictly greater than every stamp in the store.
///
/// Must run inside the same write transaction as the upsert that uses it.
pub fn mint_recency(conn: &Connection) -> Result<i64> {
    let stored_max = table::max_recency(conn)?;
    Ok(next_recency(current_timestamp_us(), stored_max))
}
