//! Expiration Janitor
//!
//! Background task that periodically reclaims expired entries from a
//! lock-guarded shard map. The actor backend does not use this task; it
//! runs the identical sweep inline in its owner loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::item::{current_timestamp_ms, Item};
use crate::cache::stats::StatsRecorder;

/// Removes every expired entry from `map` as of now.
///
/// Holds the exclusive lock for one full-map scan. Returns the number of
/// entries reclaimed.
pub(crate) async fn sweep_expired(
    map: &RwLock<HashMap<String, Item>>,
    stats: &StatsRecorder,
) -> usize {
    let now = current_timestamp_ms();
    let mut guard = map.write().await;
    let before = guard.len();
    guard.retain(|_, item| !item.is_expired_at(now));
    let removed = before - guard.len();
    stats.record_expired(removed as u64);
    stats.set_items(guard.len());
    removed
}

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The returned handle is aborted by the owning store's `teardown`; the
/// sweep interval is configured independently of the default TTL.
pub(crate) fn spawn_janitor(
    map: Arc<RwLock<HashMap<String, Item>>>,
    stats: Arc<StatsRecorder>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "expiration janitor started");

        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so the initial sweep
        // happens one full interval after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sweep_expired(&map, &stats).await;
            if removed > 0 {
                info!(removed, "janitor reclaimed expired entries");
            } else {
                debug!("janitor tick: no expired entries");
            }
        }
    })
}
