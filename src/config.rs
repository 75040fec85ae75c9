//! Configuration Module
//!
//! Handles construction parameters for the disk cache, either built in code or
//! loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Path that selects a private in-memory store instead of a file.
pub const MEMORY_PATH: &str = ":memory:";

/// Cache configuration parameters.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Location of the backing file (or `:memory:`)
    pub path: PathBuf,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Number of pooled store connections
    pub pool_size: usize,
    /// How long a connection waits on a locked store before failing
    pub busy_timeout: Duration,
    /// How long `acquire` waits for a free pooled connection
    pub acquire_timeout: Duration,
}

impl CacheConfig {
    /// Creates a config for `path` holding at most `max_entries` entries,
    /// with default pool settings.
    pub fn new(path: impl AsRef<Path>, max_entries: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries,
            ..Self::default()
        }
    }

    /// Creates a config for a private in-memory store.
    pub fn in_memory(max_entries: usize) -> Self {
        Self::new(MEMORY_PATH, max_entries)
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// Returns true if the config points at an in-memory store.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Pool size actually used: in-memory stores are private to a single
    /// connection, so they always get exactly one.
    pub fn effective_pool_size(&self) -> usize {
        if self.is_in_memory() {
            1
        } else {
            self.pool_size
        }
    }

    /// Rejects configurations the cache cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(CacheError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig("path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DISK_LRU_PATH` - Backing file (default: `disk_lru.db`)
    /// - `DISK_LRU_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DISK_LRU_POOL_SIZE` - Pooled connections (default: 4)
    /// - `DISK_LRU_BUSY_TIMEOUT_MS` - Store lock wait in ms (default: 5000)
    /// - `DISK_LRU_ACQUIRE_TIMEOUT_MS` - Pool wait in ms (default: 30000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: env::var("DISK_LRU_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            max_entries: env::var("DISK_LRU_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            pool_size: env::var("DISK_LRU_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pool_size),
            busy_timeout: env::var("DISK_LRU_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
            acquire_timeout: env::var("DISK_LRU_ACQUIRE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.acquire_timeout),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("disk_lru.db"),
            max_entries: 1000,
            pool_size: 4,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.path, PathBuf::from("disk_lru.db"));
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DISK_LRU_PATH");
        env::remove_var("DISK_LRU_MAX_ENTRIES");
        env::remove_var("DISK_LRU_POOL_SIZE");
        env::remove_var("DISK_LRU_BUSY_TIMEOUT_MS");
        env::remove_var("DISK_LRU_ACQUIRE_TIMEOUT_MS");

        let config = CacheConfig::from_env();
        assert_eq!(config.path, PathBuf::from("disk_lru.db"));
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.pool_size, 4);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new("/tmp/cache.db", 16)
            .with_pool_size(8)
            .with_busy_timeout(Duration::from_millis(250))
            .with_acquire_timeout(Duration::from_secs(1));

        assert_eq!(config.max_entries, 16);
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.effective_pool_size(), 8);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_in_memory_forces_single_connection() {
        let config = CacheConfig::in_memory(4).with_pool_size(8);
        assert!(config.is_in_memory());
        assert_eq!(config.effective_pool_size(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let result = CacheConfig::new("cache.db", 0).validate();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let result = CacheConfig::new("cache.db", 4).with_pool_size(0).validate();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
