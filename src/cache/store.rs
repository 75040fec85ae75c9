//! Cache Store Module
//!
//! Main cache engine: pooled SQLite connections, write-recency eviction and
//! time-based purge.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::cache::{codec, entry, lru, CacheEntry, CacheStats, StatsRecorder};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::storage::{table, ConnectionPool, StoreTarget};

// == Swap Outcome ==
/// Result of a compare-and-swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome<V> {
    /// Whether the new value was written
    pub swapped: bool,
    /// Value stored under the key just before the call
    pub previous: Option<V>,
}

// == Disk LRU Cache ==
/// Persistent key/value cache bounded to `max_entries` entries.
///
/// When a write pushes the entry count over the bound, the entries written
/// longest ago are evicted in the same transaction. Reads do not refresh an
/// entry's position.
///
/// All methods take `&self`; share one cache across threads with `Arc`.
#[derive(Debug)]
pub struct DiskLruCache {
    /// Pooled store connections
    pool: ConnectionPool,
    /// Activity counters
    stats: StatsRecorder,
    /// Backing file location
    path: PathBuf,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl DiskLruCache {
    // == Constructor ==
    /// Opens (or creates) the cache stored at `path`.
    ///
    /// # Arguments
    /// * `path` - Backing file, or `:memory:` for a throwaway in-memory cache
    /// * `max_entries` - Maximum number of entries the cache can hold
    pub fn open(path: impl AsRef<Path>, max_entries: usize) -> Result<Self> {
        Self::with_config(CacheConfig::new(path, max_entries))
    }

    /// Opens the cache described by `config`.
    ///
    /// Reopening an existing file keeps its entries. If the file holds more
    /// entries than `max_entries`, the excess is evicted by the next write.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let target = StoreTarget::from_path(&config.path);
        let pool = ConnectionPool::open(
            &target,
            config.effective_pool_size(),
            config.busy_timeout,
            config.acquire_timeout,
        )?;

        info!(
            "Opened disk cache at {} (max_entries={}, pool_size={})",
            config.path.display(),
            config.max_entries,
            pool.size()
        );

        Ok(Self {
            pool,
            stats: StatsRecorder::new(),
            path: config.path,
            max_entries: config.max_entries,
        })
    }

    // == Accessors ==
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Get ==
    /// Retrieves a text value by key.
    ///
    /// Returns `Ok(None)` if the key is absent, and a decode error if the
    /// stored bytes are not UTF-8.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_bytes(key)?
            .map(|bytes| codec::decode_text(key, bytes))
            .transpose()
    }

    /// Retrieves the raw bytes stored under `key`.
    pub fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.pool.acquire()?;
        let value = table::select_value(&conn, key)?;
        self.stats.record_lookup(value.is_some());
        trace!(key, hit = value.is_some(), "get");
        Ok(value)
    }

    /// Retrieves a JSON value by key and deserializes it into `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_bytes(key)?
            .map(|bytes| codec::decode_json(key, &bytes))
            .transpose()
    }

    /// Retrieves the full stored entry, including its recency stamp.
    ///
    /// Does not count towards hit/miss statistics.
    pub fn entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.pool.acquire()?;
        Ok(table::select_row(&conn, key)?.map(CacheEntry::from))
    }

    // == Put ==
    /// Stores a text value, replacing any previous value for `key`.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, codec::encode_text(value))
    }

    /// Stores raw bytes, replacing any previous value for `key`.
    pub fn put_bytes(&self, key: &str, value: &[u8]) -> Result<()> {
        self.write(key, value)
    }

    /// Serializes `value` as JSON and stores it under `key`.
    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = codec::encode_json(key, value)?;
        self.write(key, &bytes)
    }

    /// Upserts the entry with a fresh recency and evicts the oldest entries
    /// beyond capacity, all in one immediate transaction.
    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.pool.acquire()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let recency = entry::mint_recency(&tx)?;
        table::upsert(&tx, key, value, recency)?;
        let evicted = lru::evict_excess(&tx, self.max_entries)?;
        tx.commit()?;

        self.stats.record_evictions(evicted);
        trace!(key, recency, evicted, "put");
        Ok(())
    }

    // == Compare And Swap ==
    /// Writes `new` only if the current value equals `expected`.
    ///
    /// `expected = None` means the key must be absent. A successful swap is a
    /// regular write: it gets a fresh recency and may evict older entries.
    pub fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> Result<SwapOutcome<Vec<u8>>> {
        let mut conn = self.pool.acquire()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = table::select_value(&tx, key)?;
        if current.as_deref() != expected {
            trace!(key, "compare_and_swap mismatch");
            return Ok(SwapOutcome {
                swapped: false,
                previous: current,
            });
        }

        let recency = entry::mint_recency(&tx)?;
        table::upsert(&tx, key, new, recency)?;
        let evicted = lru::evict_excess(&tx, self.max_entries)?;
        tx.commit()?;

        self.stats.record_evictions(evicted);
        trace!(key, recency, evicted, "compare_and_swap");
        Ok(SwapOutcome {
            swapped: true,
            previous: current,
        })
    }

    /// Text variant of [`compare_and_swap`](Self::compare_and_swap).
    pub fn compare_and_swap_str(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<SwapOutcome<String>> {
        let outcome = self.compare_and_swap(
            key,
            expected.map(codec::encode_text),
            codec::encode_text(new),
        )?;
        Ok(SwapOutcome {
            swapped: outcome.swapped,
            previous: outcome
                .previous
                .map(|bytes| codec::decode_text(key, bytes))
                .transpose()?,
        })
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if an entry was removed; deleting an absent key is not an
    /// error.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.pool.acquire()?;
        let removed = table::delete_key(&conn, key)? > 0;
        trace!(key, removed, "delete");
        Ok(removed)
    }

    // == Contains ==
    /// Returns true if an entry exists for `key`.
    pub fn contains(&self, key: &str) -> Result<bool> {
        let conn = self.pool.acquire()?;
        table::exists(&conn, key)
    }

    // == Purge ==
    /// Removes every entry whose recency is strictly below `threshold`.
    ///
    /// Recency stamps are Unix microseconds; see [`CacheEntry::recency`].
    /// Returns the number of entries removed.
    pub fn purge(&self, threshold: i64) -> Result<usize> {
        let conn = self.pool.acquire()?;
        let removed = table::delete_older_than(&conn, threshold)?;
        self.stats.record_purged(removed);
        debug!("Purged {} entries with recency < {}", removed, threshold);
        Ok(removed)
    }

    /// Removes every entry last written before `cutoff`.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.purge(entry::recency_at(cutoff))
    }

    // == Clear ==
    /// Removes all entries. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.pool.acquire()?;
        let removed = table::delete_all(&conn)?;
        debug!("Cleared {} entries from {}", removed, self.path.display());
        Ok(removed)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> Result<usize> {
        let conn = self.pool.acquire()?;
        table::count(&conn)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns all keys, least recently written first.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.pool.acquire()?;
        table::keys_by_recency(&conn)
    }

    // == Stats ==
    /// Returns activity counters and the current entry count.
    pub fn stats(&self) -> Result<CacheStats> {
        let total_entries = self.len()?;
        Ok(self.stats.snapshot(total_entries))
    }

    // == Close ==
    /// Releases all pooled connections. Every later operation fails with
    /// [`CacheError::Closed`](crate::CacheError::Closed).
    ///
    /// Calling `close` again has no effect. Operations already running on
    /// other threads keep their connection until they finish.
    pub fn close(&self) {
        if self.pool.close() {
            info!("Closed disk cache at {}", self.path.display());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl Drop for DiskLruCache {
    fn drop(&mut self) {
        self.close();
    }
}
