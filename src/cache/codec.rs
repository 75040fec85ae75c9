//! Value Codec Module
//!
//! Converts between stored bytes and the three value shapes the cache accepts:
//! raw binary, UTF-8 text and JSON-serializable data.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

/// Text is stored as its UTF-8 bytes.
pub fn encode_text(value: &str) -> &[u8] {
    value.as_bytes()
}

/// Decodes stored bytes as UTF-8, reporting the key on failure.
pub fn decode_text(key: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|source| CacheError::InvalidUtf8 {
        key: key.to_string(),
        source,
    })
}

/// Serializes a value to its JSON text form.
pub fn encode_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Parses stored JSON into `T`.
pub fn decode_json<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| CacheError::InvalidJson {
        key: key.to_string(),
        source,
    })
}
