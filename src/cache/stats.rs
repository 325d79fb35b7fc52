//! Cache Statistics Module
//!
//! Live counters are held in a `StatsRecorder` of atomics so foreground
//! operations and the background janitor can update them without extra
//! locking; `snapshot()` materializes a plain `CacheStats` on demand.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// A point-in-time snapshot of a store's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of live entries
    pub items_count: u64,
    /// Number of successful retrievals
    pub get_hits: u64,
    /// Number of failed retrievals (absent or expired)
    pub get_misses: u64,
    /// Number of inserts and overwrites
    pub set_or_replace_count: u64,
    /// Number of entries removed by delete or purge
    pub delete_count: u64,
    /// Number of entries reclaimed by the expiration janitor
    pub expired_delete_count: u64,
    /// Configured size limit, 0 = unlimited
    pub size_limit: u64,
}

impl CacheStats {
    /// Folds another snapshot into this one, summing every counter.
    ///
    /// Used by the sharded façade to aggregate per-shard snapshots. The
    /// result is eventually consistent across shards rather than one
    /// atomic global snapshot.
    pub fn merge(&mut self, other: &CacheStats) {
        self.items_count += other.items_count;
        self.get_hits += other.get_hits;
        self.get_misses += other.get_misses;
        self.set_or_replace_count += other.set_or_replace_count;
        self.delete_count += other.delete_count;
        self.expired_delete_count += other.expired_delete_count;
        self.size_limit += other.size_limit;
    }

    /// Calculates the hit rate: hits / (hits + misses), or 0.0 without traffic.
    pub fn hit_rate(&self) -> f64 {
        let total = self.get_hits + self.get_misses;
        if total == 0 {
            0.0
        } else {
            self.get_hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Atomic counters for one store instance.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    items_count: AtomicU64,
    get_hits: AtomicU64,
    get_misses: AtomicU64,
    set_or_replace_count: AtomicU64,
    delete_count: AtomicU64,
    expired_delete_count: AtomicU64,
    size_limit: u64,
}

impl StatsRecorder {
    /// Creates a recorder with all counters at zero.
    pub fn new(size_limit: usize) -> Self {
        Self {
            size_limit: size_limit as u64,
            ..Self::default()
        }
    }

    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.get_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.get_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the set-or-replace counter.
    pub fn record_set(&self) {
        self.set_or_replace_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `n` removed entries to the delete counter.
    pub fn record_deleted(&self, n: u64) {
        self.delete_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Adds `n` reclaimed entries to the expired-delete counter.
    pub fn record_expired(&self, n: u64) {
        self.expired_delete_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Sets the live entry gauge to the current map size.
    pub fn set_items(&self, count: usize) {
        self.items_count.store(count as u64, Ordering::Relaxed);
    }

    /// Materializes a snapshot of all counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            items_count: self.items_count.load(Ordering::Relaxed),
            get_hits: self.get_hits.load(Ordering::Relaxed),
            get_misses: self.get_misses.load(Ordering::Relaxed),
            set_or_replace_count: self.set_or_replace_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            expired_delete_count: self.expired_delete_count.load(Ordering::Relaxed),
            size_limit: self.size_limit,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_starts_at_zero() {
        let stats = StatsRecorder::new(10).snapshot();
        assert_eq!(stats.items_count, 0);
        assert_eq!(stats.get_hits, 0);
        assert_eq!(stats.get_misses, 0);
        assert_eq!(stats.set_or_replace_count, 0);
        assert_eq!(stats.delete_count, 0);
        assert_eq!(stats.expired_delete_count, 0);
        assert_eq!(stats.size_limit, 10);
    }

    #[test]
    fn test_recorder_counters() {
        let recorder = StatsRecorder::new(0);
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();
        recorder.record_set();
        recorder.record_deleted(3);
        recorder.record_expired(2);
        recorder.set_items(7);

        let stats = recorder.snapshot();
        assert_eq!(stats.get_hits, 2);
        assert_eq!(stats.get_misses, 1);
        assert_eq!(stats.set_or_replace_count, 1);
        assert_eq!(stats.delete_count, 3);
        assert_eq!(stats.expired_delete_count, 2);
        assert_eq!(stats.items_count, 7);
    }

    #[test]
    fn test_merge_sums_counters() {
        let a = StatsRecorder::new(5);
        a.record_hit();
        a.set_items(2);
        let b = StatsRecorder::new(5);
        b.record_miss();
        b.set_items(3);

        let mut total = a.snapshot();
        total.merge(&b.snapshot());
        assert_eq!(total.items_count, 5);
        assert_eq!(total.get_hits, 1);
        assert_eq!(total.get_misses, 1);
        assert_eq!(total.size_limit, 10);
    }

    #[test]
    fn test_hit_rate() {
        let recorder = StatsRecorder::new(0);
        assert_eq!(recorder.snapshot().hit_rate(), 0.0);
        recorder.record_hit();
        recorder.record_miss();
        assert_eq!(recorder.snapshot().hit_rate(), 0.5);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = StatsRecorder::new(4).snapshot();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["items_count"], 0);
        assert_eq!(json["size_limit"], 4);
    }
}
