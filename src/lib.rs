//! Disk LRU - A persistent key/value cache on SQLite
//!
//! Bounded-size, thread-safe cache whose entries survive process restarts.
//! When full, the entries written longest ago are evicted.
//!
//! ```no_run
//! use disk_lru::DiskLruCache;
//!
//! # fn main() -> disk_lru::Result<()> {
//! let cache = DiskLruCache::open("cache/results.db", 1000)?;
//! cache.put("answer", "42")?;
//! assert_eq!(cache.get("answer")?.as_deref(), Some("42"));
//! cache.close();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{CacheEntry, CacheStats, DiskLruCache, SwapOutcome};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
