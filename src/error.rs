//! Error types for the disk cache
//!
//! Provides unified error handling using thiserror.

use std::string::FromUtf8Error;
use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the disk cache.
///
/// A missing key is never an error: lookups return `Ok(None)` and
/// deletes of absent keys succeed.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation attempted after `close()`
    #[error("Cache is closed")]
    Closed,

    /// Construction parameters rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stored bytes are not valid UTF-8 text
    #[error("Value for key {key:?} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        key: String,
        #[source]
        source: FromUtf8Error,
    },

    /// Stored bytes could not be parsed as structured data
    #[error("Value for key {key:?} is not valid JSON: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Structured value could not be serialized
    #[error("Failed to encode value for key {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// No pooled connection became free in time
    #[error("Timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),

    /// Failure reported by the backing store
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// File system failure while preparing the backing file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Returns true if the stored value exists but could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidUtf8 { .. } | CacheError::InvalidJson { .. }
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
