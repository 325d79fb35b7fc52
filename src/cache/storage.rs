//! Storage Contract
//!
//! The uniform operation contract satisfied by every backend and by the
//! sharded façade itself, so callers cannot distinguish a single shard
//! from a sharded deployment.

use async_trait::async_trait;

use crate::cache::{CacheStats, Expiration};
use crate::error::Result;

// == Storage Trait ==
/// One cache instance: a shard, or a top-level cache.
///
/// Lifecycle: construct with a config, serve operations, then `teardown`.
/// After teardown every operation except `stats` fails with
/// [`CacheError::TornDown`](crate::CacheError::TornDown); `stats` stays
/// readable so final counters remain observable.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Retrieves the payload for a key.
    ///
    /// Returns `None` for absent or expired keys. When the store is
    /// configured with `refresh_on_read`, a hit extends the entry's expiry
    /// by the default TTL from now (sliding expiration).
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Inserts or overwrites a value.
    ///
    /// A new key arriving while at the size limit is governed by the
    /// configured [`CapacityPolicy`](crate::CapacityPolicy); overwrites of
    /// existing keys always proceed.
    async fn set(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()>;

    /// Inserts a value only if no live entry exists for the key.
    ///
    /// An unexpired entry yields `CacheError::AlreadyExists`; an expired
    /// one is replaced.
    async fn add(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()>;

    /// Replaces a value only if a live entry exists for the key.
    ///
    /// Absent or expired entries yield `CacheError::NotExists`. Not
    /// subject to the size limit.
    async fn replace(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()>;

    /// Removes a key. Idempotent: deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes all items and adds the removed count to the delete counter.
    async fn purge(&self) -> Result<()>;

    /// Stops the janitor, purges all items, and marks the instance
    /// unusable. Idempotent: a second call is an `Ok` no-op.
    async fn teardown(&self) -> Result<()>;

    /// Returns a snapshot of the store's counters.
    async fn stats(&self) -> Result<CacheStats>;
}
