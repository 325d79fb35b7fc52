//! Cache Item Module
//!
//! Defines the stored value envelope and the expiration sentinels.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Expiration ==
/// How long a stored value should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the store's configured default TTL
    #[default]
    Default,
    /// Never expire; exempt from janitor reclamation
    Never,
    /// Expire this long after the write
    After(Duration),
}

// == Item ==
/// A single stored value with its absolute expiry.
///
/// An item is exclusively owned by its shard and only mutated on that
/// shard's write path.
#[derive(Debug, Clone)]
pub struct Item {
    /// The stored payload
    pub payload: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = never expires
    pub expires_at: Option<u64>,
}

impl Item {
    /// Creates a new item expiring at the resolved absolute timestamp.
    ///
    /// `default_ttl` is the store default substituted for `Expiration::Default`;
    /// `None` leaves such items unexpiring.
    pub fn new(payload: Vec<u8>, expiration: Expiration, default_ttl: Option<Duration>) -> Self {
        let ttl = match expiration {
            Expiration::Default => default_ttl,
            Expiration::Never => None,
            Expiration::After(d) => Some(d),
        };
        Self {
            payload,
            expires_at: ttl.map(|d| current_timestamp_ms() + d.as_millis() as u64),
        }
    }

    /// Checks whether the item is expired as of `now` (Unix milliseconds).
    ///
    /// Boundary condition: an item is expired once the current time is
    /// greater than or equal to its expiration time. Items without an
    /// expiry never expire.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Extends the expiry to `ttl` past `now` (sliding expiration).
    ///
    /// Items stored without an expiry are left untouched: a read never
    /// arms a timer on a never-expiring item.
    pub fn touch(&mut self, now: u64, ttl: Option<Duration>) {
        if self.expires_at.is_none() {
            return;
        }
        if let Some(ttl) = ttl {
            self.expires_at = Some(now + ttl.as_millis() as u64);
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
