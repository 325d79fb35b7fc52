//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.
//!
//! A missing key is not an error: `Storage::get` returns `Ok(None)` for
//! absent or expired keys. The variants here cover the conditions a caller
//! can meaningfully react to.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Insert-if-absent found a live, unexpired entry
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Update-if-present found no live entry
    #[error("Key does not exist: {0}")]
    NotExists(String),

    /// A new key was rejected because the store is at its size limit
    #[error("Size limit of {limit} items reached")]
    CapacityExceeded { limit: usize },

    /// Operation on an instance after teardown
    #[error("Cache instance has been torn down")]
    TornDown,

    /// A channel operation against a shard owner exceeded its deadline
    #[error("Cache operation timed out: {0}")]
    Timeout(&'static str),

    /// Construction-time configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
