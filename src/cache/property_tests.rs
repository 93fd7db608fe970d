//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key derivation, TTL tiers and store bookkeeping.

use proptest::prelude::*;
use serde_json::json;

use crate::cache::{derive_key, CacheStore, QueryParams, TtlPolicy};

// == Test Configuration ==
const TEST_MAX_KEYS: usize = 100;
const TEST_TTL: u64 = 300;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_/?=&]{1,64}"
}

fn param_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

fn param_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 %&=]{0,16}"
}

fn path_strategy() -> impl Strategy<Value = String> {
    "(/[a-z0-9]{1,8}){1,3}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<i64>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Parameter insertion order never changes the key.
    #[test]
    fn prop_key_is_order_independent(
        path in path_strategy(),
        pairs in prop::collection::btree_map(param_name_strategy(), param_value_strategy(), 0..8)
    ) {
        let forward: QueryParams = pairs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let backward: QueryParams = pairs.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();

        prop_assert_eq!(derive_key(&path, &forward), derive_key(&path, &backward));
    }

    // An undefined parameter is the same as no parameter.
    #[test]
    fn prop_key_omits_undefined(
        path in path_strategy(),
        pairs in prop::collection::btree_map(param_name_strategy(), param_value_strategy(), 0..8),
        missing in "[A-Z]{1,6}"
    ) {
        let base: QueryParams = pairs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let with_undefined = base.clone().with_opt(missing, None::<String>);

        prop_assert_eq!(derive_key(&path, &base), derive_key(&path, &with_undefined));
    }

    // Every key starts with its path and a single separator.
    #[test]
    fn prop_key_prefix(path in path_strategy(), value in param_value_strategy()) {
        let params = QueryParams::new().with("v", value);
        let key = derive_key(&path, &params);
        let prefix = format!("{}?", path);
        prop_assert!(key.starts_with(&prefix));
    }

    // TTL is always one of the four tiers of the base.
    #[test]
    fn prop_ttl_is_a_tier(
        base in 1u64..10_000,
        pairs in prop::collection::btree_map(
            prop::sample::select(vec!["id", "limit", "q", "include_content", "other"]),
            param_value_strategy(),
            0..5
        )
    ) {
        let policy = TtlPolicy::new(base);
        let params: QueryParams = pairs.iter().map(|(k, v)| (*k, v.clone())).collect();
        let ttl = policy.select_ttl("/items", &params);

        let tiers = [
            (base as f64 * 3.0).round() as u64,
            (base as f64 * 2.0).round() as u64,
            (base as f64 * 1.5).round() as u64,
            base,
        ];
        prop_assert!(tiers.contains(&ttl), "ttl {} not in {:?}", ttl, tiers);
    }

    // Hits and misses reflect the lookups performed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(TEST_MAX_KEYS);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let _ = store.set(key, json!(value), TEST_TTL);
                }
                CacheOp::Get { key } => {
                    match store.get(&key) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.keys, store.len(), "Key count mismatch");
    }

    // The key-count ceiling is never exceeded, and every refusal is for a new key.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), any::<i64>()), 1..200)
    ) {
        let max_keys = 50;
        let mut store = CacheStore::new(max_keys);

        for (key, value) in entries {
            let existed = store.get(&key).is_some();
            let result = store.set(key, json!(value), TEST_TTL);
            if existed {
                prop_assert!(result.is_ok(), "replacing a key must not fail");
            }
            prop_assert!(
                store.len() <= max_keys,
                "Cache size {} exceeds max {}",
                store.len(),
                max_keys
            );
        }
    }

    // A stored value reads back unchanged until replaced.
    #[test]
    fn prop_overwrite_semantics(key in key_strategy(), v1 in any::<i64>(), v2 in any::<i64>()) {
        let mut store = CacheStore::new(TEST_MAX_KEYS);

        store.set(key.clone(), json!(v1), TEST_TTL).unwrap();
        prop_assert_eq!(store.get(&key), Some(json!(v1)));

        store.set(key.clone(), json!(v2), TEST_TTL).unwrap();
        prop_assert_eq!(store.get(&key), Some(json!(v2)));
        prop_assert_eq!(store.len(), 1);
    }
}
