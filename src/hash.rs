//! Hash Router Module
//!
//! Deterministic key-to-shard routing. A 64-bit digest is computed over the
//! key's bytes by one of several interchangeable algorithms, then reduced
//! modulo the shard count. None of the algorithms is seeded, so routing is
//! stable across calls and process restarts for a fixed (algorithm, count)
//! pair. No cryptographic guarantee is made or needed.

use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Digest Algorithms ==
/// Selects the digest function used for key routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HashAlgorithm {
    /// FNV-1a, 64-bit
    Fnv1a,
    /// CRC-64 with the ECMA polynomial
    Crc64,
    /// DJB-style multiply-by-33 XOR hash with a final avalanche step
    Djb33,
    /// Running byte sum with a final avalanche step
    Sum,
}

impl HashAlgorithm {
    /// Computes the 64-bit digest of a key.
    pub fn digest(self, key: &str) -> u64 {
        match self {
            HashAlgorithm::Fnv1a => fnv1a(key.as_bytes()),
            HashAlgorithm::Crc64 => crc64(key.as_bytes()),
            HashAlgorithm::Djb33 => djb33(key.as_bytes()),
            HashAlgorithm::Sum => byte_sum(key.as_bytes()),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fnv" | "fnv1a" => Ok(HashAlgorithm::Fnv1a),
            "crc" | "crc64" => Ok(HashAlgorithm::Crc64),
            "djb33" => Ok(HashAlgorithm::Djb33),
            "sum" => Ok(HashAlgorithm::Sum),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown hash algorithm: {other}"
            ))),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// ECMA-182 polynomial, bit-reflected.
const CRC64_ECMA: u64 = 0xC96C_5795_D787_0F42;

static CRC64_TABLE: Lazy<[u64; 256]> = Lazy::new(|| {
    let mut table = [0u64; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut crc = i as u64;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC64_ECMA
            } else {
                crc >> 1
            };
        }
        *slot = crc;
    }
    table
});

fn crc64(bytes: &[u8]) -> u64 {
    let mut crc = !0u64;
    for &b in bytes {
        crc = CRC64_TABLE[((crc ^ u64::from(b)) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}

fn djb33(bytes: &[u8]) -> u64 {
    let mut d: u64 = 5381;
    for &b in bytes {
        d = d.wrapping_mul(33) ^ u64::from(b);
    }
    d ^ (d >> 16)
}

fn byte_sum(bytes: &[u8]) -> u64 {
    let mut r = bytes.len() as u64;
    for &b in bytes {
        r = r.wrapping_add(u64::from(b >> 2));
    }
    r ^ (r >> 16)
}

// == Hash Router ==
/// Maps a key to a shard index in `[0, shard_count)`.
///
/// Pure and stateless: the same key always lands on the same shard for the
/// lifetime of the store (there is no resharding).
#[derive(Debug, Clone, Copy)]
pub struct HashRouter {
    algorithm: HashAlgorithm,
    shard_count: u64,
}

impl HashRouter {
    /// Creates a router over `shard_count` shards.
    ///
    /// Fails fast with `InvalidConfig` if `shard_count` is zero.
    pub fn new(algorithm: HashAlgorithm, shard_count: usize) -> Result<Self> {
        if shard_count == 0 {
            return Err(CacheError::InvalidConfig(
                "shard_count must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            algorithm,
            shard_count: shard_count as u64,
        })
    }

    /// Returns the shard index for a key.
    pub fn route(&self, key: &str) -> usize {
        (self.algorithm.digest(key) % self.shard_count) as usize
    }

    /// Returns the number of shards this router distributes over.
    pub fn shard_count(&self) -> usize {
        self.shard_count as usize
    }
}
