//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::hash::HashAlgorithm;

// == Capacity Policy ==
/// What happens when a new key arrives while the store is at its size limit.
///
/// The limit never applies to overwrites of existing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapacityPolicy {
    /// Reject the insert with `CacheError::CapacityExceeded`
    Reject,
    /// Drop the insert silently (logged at debug level)
    Ignore,
}

// == Cache Config ==
/// Configuration for a single store instance (one shard, or an unsharded cache).
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default time-to-live for entries stored with `Expiration::Default`.
    /// `None` means such entries never expire.
    pub default_ttl: Option<Duration>,
    /// Maximum number of live entries; 0 = unlimited
    pub size_limit: usize,
    /// Sliding expiration: a successful get extends expiry by `default_ttl`
    pub refresh_on_read: bool,
    /// Interval between expiration sweeps; `None` disables the janitor
    pub janitor_interval: Option<Duration>,
    /// Behavior when a new key hits the size limit
    pub capacity_policy: CapacityPolicy,
    /// Queue depth of the actor backend's read and write channels
    pub channel_capacity: usize,
    /// Deadline for each channel operation against an actor shard owner
    pub op_timeout: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_SECS` - Default TTL in seconds, 0 = never expire (default: 300)
    /// - `SIZE_LIMIT` - Maximum live entries, 0 = unlimited (default: 0)
    /// - `REFRESH_ON_READ` - "true" enables sliding expiration (default: false)
    /// - `JANITOR_INTERVAL_SECS` - Sweep interval in seconds, 0 = disabled (default: 30)
    pub fn from_env() -> Self {
        let default_ttl_secs: u64 = env::var("DEFAULT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let janitor_secs: u64 = env::var("JANITOR_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            default_ttl: (default_ttl_secs > 0).then(|| Duration::from_secs(default_ttl_secs)),
            size_limit: env::var("SIZE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            refresh_on_read: env::var("REFRESH_ON_READ")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            janitor_interval: (janitor_secs > 0).then(|| Duration::from_secs(janitor_secs)),
            ..Self::default()
        }
    }

    /// Returns a copy with the given default TTL (`None` = never expire).
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Returns a copy with the given size limit (0 = unlimited).
    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    /// Returns a copy with sliding expiration enabled or disabled.
    pub fn with_refresh_on_read(mut self, refresh: bool) -> Self {
        self.refresh_on_read = refresh;
        self
    }

    /// Returns a copy with the given sweep interval (`None` = no janitor).
    pub fn with_janitor_interval(mut self, interval: Option<Duration>) -> Self {
        self.janitor_interval = interval;
        self
    }

    /// Returns a copy with the given capacity policy.
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(Duration::from_secs(300)),
            size_limit: 0,
            refresh_on_read: false,
            janitor_interval: Some(Duration::from_secs(30)),
            capacity_policy: CapacityPolicy::Reject,
            channel_capacity: 100,
            op_timeout: Duration::from_secs(5),
        }
    }
}

// == Shard Config ==
/// Configuration for a sharded deployment: per-shard settings plus the
/// shard count and the digest used for key routing.
#[derive(Debug, Clone)]
pub struct ShardConfig {
    /// Settings applied to every shard
    pub cache: CacheConfig,
    /// Number of shards; must be > 0
    pub shard_count: usize,
    /// Digest function used by the hash router
    pub hash_algorithm: HashAlgorithm,
}

impl ShardConfig {
    /// Creates a new ShardConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - All `CacheConfig` variables
    /// - `SHARD_COUNT` - Number of shards (default: 8)
    /// - `HASH_ALGORITHM` - One of `fnv1a`, `crc64`, `djb33`, `sum` (default: fnv1a)
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            shard_count: env::var("SHARD_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            hash_algorithm: env::var("HASH_ALGORITHM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(HashAlgorithm::Fnv1a),
        }
    }
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            shard_count: 8,
            hash_algorithm: HashAlgorithm::Fnv1a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.size_limit, 0);
        assert!(!config.refresh_on_read);
        assert_eq!(config.janitor_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.capacity_policy, CapacityPolicy::Reject);
    }

    #[test]
    fn test_shard_config_default() {
        let config = ShardConfig::default();
        assert_eq!(config.shard_count, 8);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Fnv1a);
    }

    #[test]
    fn test_cache_config_builders() {
        let config = CacheConfig::default()
            .with_default_ttl(None)
            .with_size_limit(2)
            .with_refresh_on_read(true)
            .with_janitor_interval(None)
            .with_capacity_policy(CapacityPolicy::Ignore);

        assert_eq!(config.default_ttl, None);
        assert_eq!(config.size_limit, 2);
        assert!(config.refresh_on_read);
        assert_eq!(config.janitor_interval, None);
        assert_eq!(config.capacity_policy, CapacityPolicy::Ignore);
    }

    #[test]
    fn test_cache_config_from_env_defaults() {
        env::remove_var("DEFAULT_TTL_SECS");
        env::remove_var("SIZE_LIMIT");
        env::remove_var("REFRESH_ON_READ");
        env::remove_var("JANITOR_INTERVAL_SECS");

        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.size_limit, 0);
        assert!(!config.refresh_on_read);
        assert_eq!(config.janitor_interval, Some(Duration::from_secs(30)));
    }
}
