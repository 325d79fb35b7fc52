//! Cache Module
//!
//! The sharded cache engine: the stored item envelope, live statistics,
//! the uniform storage contract, the two interchangeable backends, and
//! the sharding façade.

pub(crate) mod item;
pub(crate) mod stats;

mod actor;
mod locked;
mod sharded;
mod storage;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use actor::ActorStore;
pub use item::{Expiration, Item};
pub use locked::LockedStore;
pub use sharded::{Backend, ShardedCache};
pub use stats::CacheStats;
pub use storage::Storage;
