//! Cache Module
//!
//! Provides the persistent cache with write-recency eviction and purge.

mod codec;
mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub(crate) use stats::StatsRecorder;
pub use store::{DiskLruCache, SwapOutcome};
