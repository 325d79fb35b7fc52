//! Actor Store Backend
//!
//! A single spawned owner task exclusively owns the shard map; every
//! operation crosses into it as a message. Correctness comes from the
//! owner processing one message at a time, not from locking: the map is
//! never shared. Writes travel a bounded channel fire-and-forget, with
//! backpressure expressed as a blocked send when the queue is full; reads
//! carry a oneshot reply so the owner's response can never block even if
//! the caller abandoned the request. Purge and teardown use a dedicated
//! control channel. Every caller-side channel operation is bounded by a
//! configured deadline.
//!
//! The trade-off against [`LockedStore`](crate::LockedStore) is added
//! per-operation queuing latency and reply-channel allocation pressure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Interval};
use tracing::{debug, info};

use crate::cache::item::{current_timestamp_ms, Item};
use crate::cache::stats::StatsRecorder;
use crate::cache::storage::Storage;
use crate::cache::{CacheStats, Expiration};
use crate::config::{CacheConfig, CapacityPolicy};
use crate::error::{CacheError, Result};

// == Messages ==
enum WriteCmd {
    Set {
        key: String,
        value: Vec<u8>,
        expiration: Expiration,
        ack: Option<oneshot::Sender<Result<()>>>,
    },
    Add {
        key: String,
        value: Vec<u8>,
        expiration: Expiration,
        ack: oneshot::Sender<Result<()>>,
    },
    Replace {
        key: String,
        value: Vec<u8>,
        expiration: Expiration,
        ack: oneshot::Sender<Result<()>>,
    },
    Delete {
        key: String,
    },
}

struct ReadCmd {
    key: String,
    reply: oneshot::Sender<Option<Vec<u8>>>,
}

enum CtrlCmd {
    Purge { ack: oneshot::Sender<()> },
    Teardown { ack: oneshot::Sender<()> },
}

// == Shard Owner ==
/// State owned by the shard's single task. No synchronization on the map:
/// exclusivity is structural.
struct ShardOwner {
    map: HashMap<String, Item>,
    stats: Arc<StatsRecorder>,
    default_ttl: Option<Duration>,
    size_limit: usize,
    refresh_on_read: bool,
    capacity_policy: CapacityPolicy,
}

impl ShardOwner {
    async fn run(
        mut self,
        mut write_rx: mpsc::Receiver<WriteCmd>,
        mut read_rx: mpsc::Receiver<ReadCmd>,
        mut ctrl_rx: mpsc::Receiver<CtrlCmd>,
        janitor_interval: Option<Duration>,
    ) {
        let mut ticker = janitor_interval.map(tokio::time::interval);
        if let Some(t) = ticker.as_mut() {
            // Consume the interval's immediate first tick.
            t.tick().await;
        }

        loop {
            tokio::select! {
                cmd = ctrl_rx.recv() => match cmd {
                    Some(CtrlCmd::Purge { ack }) => {
                        self.purge();
                        let _ = ack.send(());
                    }
                    Some(CtrlCmd::Teardown { ack }) => {
                        self.purge();
                        let _ = ack.send(());
                        break;
                    }
                    None => break,
                },
                cmd = write_rx.recv() => match cmd {
                    Some(cmd) => self.apply_write(cmd),
                    None => break,
                },
                req = read_rx.recv() => match req {
                    Some(req) => self.handle_read(req),
                    None => break,
                },
                // The sweep is just another message in the serial loop,
                // so it cannot race reads or writes.
                _ = maybe_tick(&mut ticker) => self.sweep(),
            }
        }
        debug!("shard owner stopped");
    }

    fn at_capacity(&self) -> bool {
        self.size_limit > 0 && self.map.len() >= self.size_limit
    }

    fn insert(&mut self, key: String, value: Vec<u8>, expiration: Expiration) {
        self.map
            .insert(key, Item::new(value, expiration, self.default_ttl));
        self.stats.record_set();
        self.stats.set_items(self.map.len());
    }

    fn apply_write(&mut self, cmd: WriteCmd) {
        match cmd {
            WriteCmd::Set {
                key,
                value,
                expiration,
                ack,
            } => {
                let result = if !self.map.contains_key(&key) && self.at_capacity() {
                    match self.capacity_policy {
                        CapacityPolicy::Reject => Err(CacheError::CapacityExceeded {
                            limit: self.size_limit,
                        }),
                        CapacityPolicy::Ignore => {
                            debug!(key, "set dropped: shard at size limit");
                            Ok(())
                        }
                    }
                } else {
                    self.insert(key, value, expiration);
                    Ok(())
                };
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
            }
            WriteCmd::Add {
                key,
                value,
                expiration,
                ack,
            } => {
                let now = current_timestamp_ms();
                let live = self
                    .map
                    .get(&key)
                    .is_some_and(|item| !item.is_expired_at(now));
                let result = if live {
                    Err(CacheError::AlreadyExists(key))
                } else if !self.map.contains_key(&key) && self.at_capacity() {
                    Err(CacheError::CapacityExceeded {
                        limit: self.size_limit,
                    })
                } else {
                    // An expired entry's slot is reused.
                    self.insert(key, value, expiration);
                    Ok(())
                };
                let _ = ack.send(result);
            }
            WriteCmd::Replace {
                key,
                value,
                expiration,
                ack,
            } => {
                let now = current_timestamp_ms();
                let live = self
                    .map
                    .get(&key)
                    .is_some_and(|item| !item.is_expired_at(now));
                let result = if live {
                    self.insert(key, value, expiration);
                    Ok(())
                } else {
                    Err(CacheError::NotExists(key))
                };
                let _ = ack.send(result);
            }
            WriteCmd::Delete { key } => {
                if self.map.remove(&key).is_some() {
                    self.stats.record_deleted(1);
                    self.stats.set_items(self.map.len());
                }
            }
        }
    }

    fn handle_read(&mut self, req: ReadCmd) {
        let now = current_timestamp_ms();
        let payload = match self.map.get_mut(&req.key) {
            Some(item) if !item.is_expired_at(now) => {
                if self.refresh_on_read {
                    item.touch(now, self.default_ttl);
                }
                self.stats.record_hit();
                Some(item.payload.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        };
        // A oneshot send never blocks; a dropped receiver just means the
        // caller gave up waiting.
        let _ = req.reply.send(payload);
    }

    fn sweep(&mut self) {
        let now = current_timestamp_ms();
        let before = self.map.len();
        self.map.retain(|_, item| !item.is_expired_at(now));
        let removed = before - self.map.len();
        self.stats.record_expired(removed as u64);
        self.stats.set_items(self.map.len());
        if removed > 0 {
            debug!(removed, "shard owner reclaimed expired entries");
        }
    }

    fn purge(&mut self) {
        self.stats.record_deleted(self.map.len() as u64);
        self.map.clear();
        self.stats.set_items(0);
    }
}

async fn maybe_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

// == Actor Store ==
/// Channel-fronted cache backend with a single owner task per instance.
pub struct ActorStore {
    write_tx: mpsc::Sender<WriteCmd>,
    read_tx: mpsc::Sender<ReadCmd>,
    ctrl_tx: mpsc::Sender<CtrlCmd>,
    stats: Arc<StatsRecorder>,
    capacity_policy: CapacityPolicy,
    op_timeout: Duration,
    torn_down: AtomicBool,
}

impl ActorStore {
    /// Creates a new store and spawns its owner task. Must be called
    /// within a tokio runtime.
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (write_tx, write_rx) = mpsc::channel(capacity);
        let (read_tx, read_rx) = mpsc::channel(capacity);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(1);
        let stats = Arc::new(StatsRecorder::new(config.size_limit));

        let owner = ShardOwner {
            map: HashMap::new(),
            stats: stats.clone(),
            default_ttl: config.default_ttl,
            size_limit: config.size_limit,
            refresh_on_read: config.refresh_on_read,
            capacity_policy: config.capacity_policy,
        };
        tokio::spawn(owner.run(write_rx, read_rx, ctrl_rx, config.janitor_interval));

        Self {
            write_tx,
            read_tx,
            ctrl_tx,
            stats,
            capacity_policy: config.capacity_policy,
            op_timeout: config.op_timeout,
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

    /// Sends a write command under the operation deadline. A full queue is
    /// the designed backpressure; the deadline keeps a stalled owner from
    /// blocking the caller forever.
    async fn send_write(&self, cmd: WriteCmd) -> Result<()> {
        timeout(self.op_timeout, self.write_tx.send(cmd))
            .await
            .map_err(|_| CacheError::Timeout("write queue full"))?
            .map_err(|_| CacheError::TornDown)
    }

    async fn await_ack(&self, ack: oneshot::Receiver<Result<()>>) -> Result<()> {
        timeout(self.op_timeout, ack)
            .await
            .map_err(|_| CacheError::Timeout("waiting for shard owner"))?
            .map_err(|_| CacheError::TornDown)?
    }
}

#[async_trait]
impl Storage for ActorStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_live()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = ReadCmd {
            key: key.to_string(),
            reply: reply_tx,
        };
        timeout(self.op_timeout, self.read_tx.send(cmd))
            .await
            .map_err(|_| CacheError::Timeout("read queue full"))?
            .map_err(|_| CacheError::TornDown)?;
        timeout(self.op_timeout, reply_rx)
            .await
            .map_err(|_| CacheError::Timeout("waiting for read reply"))?
            .map_err(|_| CacheError::TornDown)
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        // Under the silent-drop policy the write is fire-and-forget; only
        // the rejecting policy needs an outcome reported back.
        match self.capacity_policy {
            CapacityPolicy::Ignore => {
                self.send_write(WriteCmd::Set {
                    key: key.to_string(),
                    value,
                    expiration,
                    ack: None,
                })
                .await
            }
            CapacityPolicy::Reject => {
                let (ack_tx, ack_rx) = oneshot::channel();
                self.send_write(WriteCmd::Set {
                    key: key.to_string(),
                    value,
                    expiration,
                    ack: Some(ack_tx),
                })
                .await?;
                self.await_ack(ack_rx).await
            }
        }
    }

    async fn add(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send_write(WriteCmd::Add {
            key: key.to_string(),
            value,
            expiration,
            ack: ack_tx,
        })
        .await?;
        self.await_ack(ack_rx).await
    }

    async fn replace(&self, key: &str, value: Vec<u8>, expiration: Expiration) -> Result<()> {
        self.check_live()?;
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send_write(WriteCmd::Replace {
            key: key.to_string(),
            value,
            expiration,
            ack: ack_tx,
        })
        .await?;
        self.await_ack(ack_rx).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_live()?;
        self.send_write(WriteCmd::Delete {
            key: key.to_string(),
        })
        .await
    }

    async fn purge(&self) -> Result<()> {
        self.check_live()?;
        let (ack_tx, ack_rx) = oneshot::channel();
        timeout(self.op_timeout, self.ctrl_tx.send(CtrlCmd::Purge { ack: ack_tx }))
            .await
            .map_err(|_| CacheError::Timeout("control queue full"))?
            .map_err(|_| CacheError::TornDown)?;
        timeout(self.op_timeout, ack_rx)
            .await
            .map_err(|_| CacheError::Timeout("waiting for purge ack"))?
            .map_err(|_| CacheError::TornDown)
    }

    async fn teardown(&self) -> Result<()> {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        // An owner that already stopped (e.g. dropped mid-shutdown) makes
        // teardown a no-op rather than an error.
        if self
            .ctrl_tx
            .send(CtrlCmd::Teardown { ack: ack_tx })
            .await
            .is_err()
        {
            return Ok(());
        }
        let _ = timeout(self.op_timeout, ack_rx).await;
        info!("actor store torn down");
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        // The owner keeps the items gauge current on every mutation, so a
        // snapshot needs no round trip through the loop.
        Ok(self.stats.snapshot())
    }
}
