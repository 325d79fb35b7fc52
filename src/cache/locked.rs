//! Locked Store Backend
//!
//! One partition guarded by a single read/write lock. Reads take the
//! shared lock and return a payload copy; writes hold the exclusive lock
//! only for the map mutation itself. The sliding-refresh read path is the
//! exception: it must mutate the entry's expiry, so it takes the
//! exclusive lock. This backend is the correctness baseline the actor
//! backend is validated against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::item::{current_timestamp_ms, Item};
use crate::cache::stats::StatsRecorder;
use crate::cache::storage::Storage;
use crate::cache::{CacheStats, Expiration};
use crate::config::{CacheConfig, CapacityPolicy};
use crate::error::{CacheError, Result};
use crate::tasks::janitor::spawn_janitor;

// == Locked Store ==
/// Map-plus-RwLock cache backend.
pub struct LockedStore {
    map: Arc<RwLock<HashMap<String, Item>>>,
    stats: Arc<StatsRecorder>,
    default_ttl: Option<Duration>,
    size_limit: usize,
    refresh_on_read: bool,
    capacity_policy: CapacityPolicy,
    janitor: Mutex<Option<JoinHandle<()>>>,
    torn_down: AtomicBool,
}

impl LockedStore {
    /// Creates a new store and starts its janitor if an interval is
    /// configured. Must be called within a tokio runtime when the
    /// janitor is enabled.
    pub fn new(config: &CacheConfig) -> Self {
        let map = Arc::new(RwLock::new(HashMap::new()));
        let stats = Arc::new(StatsRecorder::new(config.size_limit));

        let janitor = config
            .janitor_interval
            .map(|interval| spawn_janitor(map.clone(), stats.clone(), interval));

        Self {
            map,
            stats,
            default_ttl: config.default_ttl,
            size_limit: config.size_limit,
            refresh_on_read: config.refresh_on_read,
            capacity_policy: config.capacity_policy,
            janitor: Mutex::new(janitor),
            torn_down: AtomicBool::new(false),
        }
    }

    fn check_live(&self) -> Result<()> {
        if self.torn_down.load(Ordering::Acquire) {
            Err(CacheError::TornDown)
        } else {
            Ok(())
        }
    }

    fn at_capacity(&self, live: usize) -> bool {
        self.size_limit > 0 && live >= self.size_limit
    }

    async fn clear_all(&self) {
        let mut map = self.map.write().await;
        let removed = map.len();
        map.clear();
        self.stats.record_deleted(removed as u64);
        self.stats.set_items(0);
    }
}

#[async_trait]
impl Storage for LockedStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_live()?;
        let now = current_timestamp_ms();

        if self.refresh_on_read {
            // Sliding expiration mutates the entry, so the read path
            // needs the exclusive lock.
            let mut map = self.map.write().await;
            match map.get_mut(key) {
                Some(item) if !item.is_expired_at(now) => {
                    item.touch(now, self.default_ttl);
                    self.stats.record_hit();
                    Ok(Some(item.payload.clone()))
                }
                _ => {
                    self.stats.record_miss();
                    Ok(None)
                }
            }
        } else {
            let map = self.map.read().await;
            match map.get(key) {
                Some(item) if !item.is_expired_at(now) => {
                    self.stats.record_hit();
                    Ok(Some(item.payload.clone()))
                }
                _ => {
                    self.stats.record_miss();
                    Ok(None)
                }
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        let mut map = self.map.write().await;

        // The limit only gates brand-new keys; overwrites always proceed.
        if !map.contains_key(key) && self.at_capacity(map.len()) {
            match self.capacity_policy {
                CapacityPolicy::Reject => {
                    return Err(CacheError::CapacityExceeded {
                        limit: self.size_limit,
                    })
                }
                CapacityPolicy::Ignore => {
                    debug!(key, "set dropped: store at size limit");
                    return Ok(());
                }
            }
        }

        map.insert(
            key.to_string(),
            Item::new(value, expiration, self.default_ttl),
        );
        self.stats.record_set();
        self.stats.set_items(map.len());
        Ok(())
    }

    async fn add(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        let now = current_timestamp_ms();
        let mut map = self.map.write().await;

        match map.get(key) {
            Some(item) if !item.is_expired_at(now) => {
                return Err(CacheError::AlreadyExists(key.to_string()))
            }
            Some(_) => {} // expired entry: treated as absent, slot reused
            None => {
                if self.at_capacity(map.len()) {
                    return Err(CacheError::CapacityExceeded {
                        limit: self.size_limit,
                    });
                }
            }
        }

        map.insert(
            key.to_string(),
            Item::new(value, expiration, self.default_ttl),
        );
        self.stats.record_set();
        self.stats.set_items(map.len());
        Ok(())
    }

    async fn replace(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        let now = current_timestamp_ms();
        let mut map = self.map.write().await;

        let live = map.get(key).is_some_and(|item| !item.is_expired_at(now));
        if !live {
            return Err(CacheError::NotExists(key.to_string()));
        }

        map.insert(
            key.to_string(),
            Item::new(value, expiration, self.default_ttl),
        );
        self.stats.record_set();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_live()?;
        let mut map = self.map.write().await;
        if map.remove(key).is_some() {
            self.stats.record_deleted(1);
            self.stats.set_items(map.len());
        }
        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        self.check_live()?;
        self.clear_all().await;
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Stop the janitor before clearing so no sweep races the purge.
        if let Some(handle) = self.janitor.lock().expect("janitor lock poisoned").take() {
            handle.abort();
        }
        self.clear_all().await;
        info!("locked store torn down");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        if self.torn_down.load(Ordering::Acquire) {
            // Final counters stay observable after teardown.
            return Ok(self.stats.snapshot());
        }
        let map = self.map.read().await;
        self.stats.set_items(map.len());
        drop(map);
        Ok(self.stats.snapshot())
    }
}
