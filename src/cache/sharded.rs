//! Sharded Cache Façade
//!
//! Composes N backend instances behind a hash router while exposing the
//! same `Storage` contract as a single shard, so callers cannot tell a
//! sharded deployment from an unsharded one. Keyed operations route to
//! exactly one shard; purge, teardown, and stats fan out to all of them.
//! Operations on distinct shards are fully independent: there is no
//! cross-shard ordering guarantee, and an aggregated stats snapshot is
//! eventually consistent rather than atomically global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::actor::ActorStore;
use crate::cache::locked::LockedStore;
use crate::cache::storage::Storage;
use crate::cache::{CacheStats, Expiration};
use crate::config::{CacheConfig, ShardConfig};
use crate::error::{CacheError, Result};
use crate::hash::HashRouter;

// == Backend Choice ==
/// Which concurrency discipline each shard uses. A deployment decision,
/// not hard-wired into the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// RwLock-guarded map per shard
    Locked,
    /// Single owner task per shard, message-passing only
    Actor,
}

impl Backend {
    fn build(self, config: &CacheConfig) -> Arc<dyn Storage> {
        match self {
            Backend::Locked => Arc::new(LockedStore::new(config)),
            Backend::Actor => Arc::new(ActorStore::new(config)),
        }
    }
}

// == Sharded Cache ==
/// N independent stores behind a deterministic key router.
pub struct ShardedCache {
    shards: Vec<Arc<dyn Storage>>,
    router: HashRouter,
    torn_down: AtomicBool,
}

impl ShardedCache {
    /// Builds a cache whose shards come from a caller-supplied factory.
    ///
    /// Fails fast with `InvalidConfig` if `shard_count` is zero, before
    /// any shard (and any background worker) is constructed.
    pub fn new<F>(config: &ShardConfig, factory: F) -> Result<Self>
    where
        F: Fn(&CacheConfig) -> Arc<dyn Storage>,
    {
        let router = HashRouter::new(config.hash_algorithm, config.shard_count)?;
        let shards = (0..config.shard_count)
            .map(|_| factory(&config.cache))
            .collect();
        info!(
            shard_count = config.shard_count,
            algorithm = ?config.hash_algorithm,
            "sharded cache created"
        );
        Ok(Self {
            shards,
            router,
            torn_down: AtomicBool::new(false),
        })
    }

    /// Builds a cache with every shard using the given backend.
    pub fn with_backend(config: &ShardConfig, backend: Backend) -> Result<Self> {
        Self::new(config, |cache_config| backend.build(cache_config))
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn check_live(&self) -> Result<()> {
        if self.torn_down.load(Ordering::Acquire) {
            Err(CacheError::TornDown)
        } else {
            Ok(())
        }
    }

    fn shard_for(&self, key: &str) -> &Arc<dyn Storage> {
        &self.shards[self.router.route(key)]
    }
}

#[async_trait]
impl Storage for ShardedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_live()?;
        self.shard_for(key).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        self.shard_for(key).set(key, value, expiration).await
    }

    async fn add(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        self.shard_for(key).add(key, value, expiration).await
    }

    async fn replace(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        self.shard_for(key).replace(key, value, expiration).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_live()?;
        self.shard_for(key).delete(key).await
    }

    async fn purge(&self) -> Result<()> {
        self.check_live()?;
        for shard in &self.shards {
            shard.purge().await?;
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for shard in &self.shards {
            shard.teardown().await?;
        }
        info!(shard_count = self.shards.len(), "sharded cache torn down");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let mut total = CacheStats::default();
        for shard in &self.shards {
            total.merge(&shard.stats().await?);
        }
        Ok(total)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashAlgorithm;

    fn test_config(shard_count: usize) -> ShardConfig {
        ShardConfig {
            cache: CacheConfig::default()
                .with_default_ttl(None)
                .with_janitor_interval(None),
            shard_count,
            // djb33 puts "first" and "second" on different shards of two.
            hash_algorithm: HashAlgorithm::Djb33,
        }
    }

    #[tokio::test]
    async fn test_zero_shards_fails_fast() {
        let result = ShardedCache::with_backend(&test_config(0), Backend::Locked);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_keys_route_to_distinct_shards() {
        let cache = ShardedCache::with_backend(&test_config(2), Backend::Locked).unwrap();
        cache.set("first", b"1".to_vec(), Expiration::Default).await.unwrap();
        cache.set("second", b"2".to_vec(), Expiration::Default).await.unwrap();

        let per_shard: Vec<u64> = {
            let mut counts = Vec::new();
            for shard in &cache.shards {
                counts.push(shard.stats().await.unwrap().items_count);
            }
            counts
        };
        assert_eq!(per_shard, vec![1, 1]);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.items_count, 2);
        assert_eq!(stats.set_or_replace_count, 2);
    }

    #[tokio::test]
    async fn test_stats_sum_matches_shards() {
        let cache = ShardedCache::with_backend(&test_config(4), Backend::Locked).unwrap();
        for i in 0..20 {
            cache
                .set(&format!("key-{i}"), vec![i as u8], Expiration::Default)
                .await
                .unwrap();
        }

        let mut shard_total = 0;
        for shard in &cache.shards {
            shard_total += shard.stats().await.unwrap().items_count;
        }
        assert_eq!(cache.stats().await.unwrap().items_count, shard_total);
        assert_eq!(shard_total, 20);
    }

    #[tokio::test]
    async fn test_same_key_same_shard() {
        let cache = ShardedCache::with_backend(&test_config(4), Backend::Locked).unwrap();
        cache.set("stable", b"v1".to_vec(), Expiration::Default).await.unwrap();
        cache.set("stable", b"v2".to_vec(), Expiration::Default).await.unwrap();

        assert_eq!(cache.get("stable").await.unwrap(), Some(b"v2".to_vec()));
        assert_eq!(cache.stats().await.unwrap().items_count, 1);
    }

    #[tokio::test]
    async fn test_purge_fans_out() {
        let cache = ShardedCache::with_backend(&test_config(4), Backend::Actor).unwrap();
        for i in 0..10 {
            cache
                .set(&format!("key-{i}"), b"v".to_vec(), Expiration::Default)
                .await
                .unwrap();
        }

        cache.purge().await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.items_count, 0);
        assert_eq!(stats.delete_count, 10);
    }

    #[tokio::test]
    async fn test_teardown_fans_out_and_rejects() {
        let cache = ShardedCache::with_backend(&test_config(2), Backend::Actor).unwrap();
        cache.set("k", b"v".to_vec(), Expiration::Default).await.unwrap();

        cache.teardown().await.unwrap();
        cache.teardown().await.unwrap(); // idempotent

        assert_eq!(
            cache.set("k", b"v".to_vec(), Expiration::Default).await.unwrap_err(),
            CacheError::TornDown
        );
        assert_eq!(cache.stats().await.unwrap().items_count, 0);
    }

    #[tokio::test]
    async fn test_custom_factory() {
        let config = test_config(3);
        let cache = ShardedCache::new(&config, |cache_config| {
            Arc::new(ActorStore::new(cache_config)) as Arc<dyn Storage>
        })
        .unwrap();

        cache.set("k", b"v".to_vec(), Expiration::Default).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.shard_count(), 3);
    }
}
