//! Cache backends for storing upstream responses
//!
//! The client only sees the [`CacheStore`] capability: an opaque key-value
//! store with per-entry expiry. Two backends ship with the crate, an
//! in-process [`MemoryCache`] and a disk-backed [`FileCache`] that persists
//! entries as JSON files in an XDG-compliant cache directory.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by cache backends
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing storage failed
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry could not be encoded or decoded
    #[error("cache entry encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The backend only stores text and was handed other bytes
    #[error("cache value is not valid UTF-8")]
    NotUtf8,

    /// Any other backend failure
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// A key-value store with expiry
///
/// Values are opaque bytes; each call is a single request to the backend.
/// A miss is `Ok(None)`. The client treats read errors the same as misses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetches the value stored under `key`, if it exists and hasn't expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl`, replacing any existing entry
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}
