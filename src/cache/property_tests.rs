//! Property-Based Tests for the Cache Engine
//!
//! Uses proptest to check the storage contract against a plain HashMap
//! model. Stores are configured without expiration so outcomes do not
//! depend on timing; expiry behavior is covered by the unit and
//! integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::cache::locked::LockedStore;
use crate::cache::sharded::ShardedCache;
use crate::cache::storage::Storage;
use crate::cache::Expiration;
use crate::config::{CacheConfig, ShardConfig};
use crate::error::CacheError;
use crate::hash::HashAlgorithm;

fn model_config() -> CacheConfig {
    CacheConfig::default()
        .with_default_ttl(None)
        .with_janitor_interval(None)
}

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    // A small key space so operations collide often
    "[a-f]{1,3}"
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..32)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Vec<u8> },
    Add { key: String, value: Vec<u8> },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Add { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

async fn apply_ops(
    store: &dyn Storage,
    ops: &[CacheOp],
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, Vec<u8>> = HashMap::new();
    let mut expected_hits: u64 = 0;
    let mut expected_misses: u64 = 0;
    let mut expected_sets: u64 = 0;
    let mut expected_deletes: u64 = 0;

    for op in ops {
        match op {
            CacheOp::Set { key, value } => {
                store.set(key, value.clone(), Expiration::Default).await.unwrap();
                model.insert(key.clone(), value.clone());
                expected_sets += 1;
            }
            CacheOp::Add { key, value } => {
                let result = store.add(key, value.clone(), Expiration::Default).await;
                if model.contains_key(key) {
                    prop_assert_eq!(
                        result.unwrap_err(),
                        CacheError::AlreadyExists(key.clone())
                    );
                } else {
                    result.unwrap();
                    model.insert(key.clone(), value.clone());
                    expected_sets += 1;
                }
            }
            CacheOp::Get { key } => {
                let got = store.get(key).await.unwrap();
                prop_assert_eq!(got.as_ref(), model.get(key));
                if model.contains_key(key) {
                    expected_hits += 1;
                } else {
                    expected_misses += 1;
                }
            }
            CacheOp::Delete { key } => {
                store.delete(key).await.unwrap();
                if model.remove(key).is_some() {
                    expected_deletes += 1;
                }
            }
        }
    }

    let stats = store.stats().await.unwrap();
    prop_assert_eq!(stats.items_count as usize, model.len());
    prop_assert_eq!(stats.get_hits, expected_hits);
    prop_assert_eq!(stats.get_misses, expected_misses);
    prop_assert_eq!(stats.set_or_replace_count, expected_sets);
    prop_assert_eq!(stats.delete_count, expected_deletes);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Any operation sequence leaves the store and its counters agreeing
    // with a plain map model.
    #[test]
    fn prop_locked_store_matches_model(ops in proptest::collection::vec(cache_op_strategy(), 1..50)) {
        tokio_test::block_on(async {
            let store = LockedStore::new(&model_config());
            apply_ops(&store, &ops).await
        })?;
    }

    // A sharded deployment is observationally identical to a single
    // store for any keyed operation sequence.
    #[test]
    fn prop_sharded_matches_model(ops in proptest::collection::vec(cache_op_strategy(), 1..50)) {
        tokio_test::block_on(async {
            let config = ShardConfig {
                cache: model_config(),
                shard_count: 4,
                hash_algorithm: HashAlgorithm::Fnv1a,
            };
            let cache = ShardedCache::new(&config, |c| {
                Arc::new(LockedStore::new(c)) as Arc<dyn Storage>
            }).unwrap();
            apply_ops(&cache, &ops).await
        })?;
    }

    // After any operation sequence, purge empties the store and a second
    // purge removes (and counts) nothing further.
    #[test]
    fn prop_purge_is_idempotent(ops in proptest::collection::vec(cache_op_strategy(), 1..30)) {
        tokio_test::block_on(async {
            let store = LockedStore::new(&model_config());
            apply_ops(&store, &ops).await?;

            store.purge().await.unwrap();
            let first = store.stats().await.unwrap();
            prop_assert_eq!(first.items_count, 0);

            store.purge().await.unwrap();
            let second = store.stats().await.unwrap();
            prop_assert_eq!(second.items_count, 0);
            prop_assert_eq!(second.delete_count, first.delete_count);
            Ok(())
        })?;
    }

    // Routing is a pure function of (algorithm, shard count, key).
    #[test]
    fn prop_routing_deterministic(key in key_strategy(), count in 1usize..16) {
        let router = crate::hash::HashRouter::new(HashAlgorithm::Djb33, count).unwrap();
        let first = router.route(&key);
        prop_assert!(first < count);
        for _ in 0..10 {
            prop_assert_eq!(router.route(&key), first);
        }
    }
}
