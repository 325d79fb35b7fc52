//! Shardcache - A sharded in-process cache library
//!
//! Byte-blob values with time-based expiration, horizontally sharded for
//! concurrency scaling. Two interchangeable backends satisfy the same
//! [`Storage`] contract: a read/write-lock-guarded map and a
//! message-passing shard owner. The [`ShardedCache`] façade composes N of
//! either behind a deterministic hash router and exposes the identical
//! contract itself.
//!
//! # Example
//! ```no_run
//! use shardcache::{Backend, Expiration, ShardConfig, ShardedCache, Storage};
//!
//! # async fn run() -> shardcache::Result<()> {
//! let cache = ShardedCache::with_backend(&ShardConfig::default(), Backend::Locked)?;
//! cache.set("greeting", b"hello".to_vec(), Expiration::Default).await?;
//! assert_eq!(cache.get("greeting").await?, Some(b"hello".to_vec()));
//! cache.teardown().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod hash;

pub(crate) mod tasks;

pub use cache::{
    ActorStore, Backend, CacheStats, Expiration, Item, LockedStore, ShardedCache, Storage,
};
pub use config::{CacheConfig, CapacityPolicy, ShardConfig};
pub use error::{CacheError, Result};
pub use hash::{HashAlgorithm, HashRouter};
