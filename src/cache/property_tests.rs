//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check round-trip, capacity, eviction order, purge and
//! membership behavior against an in-memory store.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

use crate::cache::DiskLruCache;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

fn memory_cache(max_entries: usize) -> DiskLruCache {
    DiskLruCache::open(":memory:", max_entries).unwrap()
}

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}".prop_map(|s| s)
}

/// Generates text values, including non-ASCII characters
fn text_value_strategy() -> impl Strategy<Value = String> {
    "\\PC{0,64}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), text_value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Storing a text value and reading it back returns the same text.
    #[test]
    fn prop_roundtrip_text(key in key_strategy(), value in text_value_strategy()) {
        let cache = memory_cache(TEST_MAX_ENTRIES);

        cache.put(&key, &value).unwrap();

        prop_assert_eq!(cache.get(&key).unwrap(), Some(value), "Round-trip value mismatch");
    }

    // Arbitrary bytes survive unchanged.
    #[test]
    fn prop_roundtrip_bytes(
        key in key_strategy(),
        value in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let cache = memory_cache(TEST_MAX_ENTRIES);

        cache.put_bytes(&key, &value).unwrap();

        prop_assert_eq!(cache.get_bytes(&key).unwrap(), Some(value));
    }

    // Structured values decode to what was encoded.
    #[test]
    fn prop_roundtrip_json(
        key in key_strategy(),
        value in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
    ) {
        let cache = memory_cache(TEST_MAX_ENTRIES);

        cache.put_json(&key, &value).unwrap();

        prop_assert_eq!(cache.get_json::<BTreeMap<String, i64>>(&key).unwrap(), Some(value));
    }

    // After every put the entry count stays within capacity.
    #[test]
    fn prop_capacity_enforcement(
        max_entries in 1usize..8,
        entries in prop::collection::vec((key_strategy(), text_value_strategy()), 1..60)
    ) {
        let cache = memory_cache(max_entries);

        for (key, value) in entries {
            cache.put(&key, &value).unwrap();
            let len = cache.len().unwrap();
            prop_assert!(len <= max_entries, "Cache size {} exceeds max {}", len, max_entries);
        }
    }

    // The survivors are exactly the most recently written distinct keys,
    // no matter how often other keys were read.
    #[test]
    fn prop_survivors_are_latest_writes(
        max_entries in 1usize..6,
        writes in prop::collection::vec(key_strategy(), 1..40),
        reads in prop::collection::vec(key_strategy(), 0..20)
    ) {
        let cache = memory_cache(max_entries);
        let mut order: Vec<String> = Vec::new();

        for (i, key) in writes.iter().enumerate() {
            cache.put(key, "v").unwrap();
            order.retain(|k| k != key);
            order.push(key.clone());
            if let Some(read) = reads.get(i) {
                let _ = cache.get(read).unwrap();
            }
        }

        let expected: Vec<String> = order
            .iter()
            .skip(order.len().saturating_sub(max_entries))
            .cloned()
            .collect();
        prop_assert_eq!(cache.keys().unwrap(), expected);
    }

    // Purge removes exactly the entries below the threshold, and purging
    // again with the same threshold removes nothing.
    #[test]
    fn prop_purge_boundary(
        keys in prop::collection::hash_set(key_strategy(), 1..20),
        cut in any::<prop::sample::Index>()
    ) {
        let cache = memory_cache(TEST_MAX_ENTRIES);
        let keys: Vec<String> = keys.into_iter().collect();
        for key in &keys {
            cache.put(key, "v").unwrap();
        }

        let threshold_key = cut.get(&keys);
        let threshold = cache.entry(threshold_key).unwrap().unwrap().recency;

        let mut expected_removed = 0;
        let mut expected_kept = HashSet::new();
        for key in &keys {
            let recency = cache.entry(key).unwrap().unwrap().recency;
            if recency < threshold {
                expected_removed += 1;
            } else {
                expected_kept.insert(key.clone());
            }
        }

        prop_assert_eq!(cache.purge(threshold).unwrap(), expected_removed);
        prop_assert_eq!(cache.purge(threshold).unwrap(), 0);

        let kept: HashSet<String> = cache.keys().unwrap().into_iter().collect();
        prop_assert_eq!(kept, expected_kept);
    }

    // contains agrees with get after any operation sequence.
    #[test]
    fn prop_membership_consistency(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let cache = memory_cache(8);
        let mut touched = HashSet::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.put(&key, &value).unwrap();
                    touched.insert(key);
                }
                CacheOp::Get { key } => {
                    let _ = cache.get(&key).unwrap();
                    touched.insert(key);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                    touched.insert(key);
                }
            }
        }

        for key in &touched {
            prop_assert_eq!(
                cache.contains(key).unwrap(),
                cache.get(key).unwrap().is_some(),
                "Membership mismatch for {}",
                key
            );
        }
    }

    // Hit and miss counters match the lookups that were made.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let cache = memory_cache(TEST_MAX_ENTRIES);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.put(&key, &value).unwrap();
                }
                CacheOp::Get { key } => match cache.get(&key).unwrap() {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                }
            }
        }

        let stats = cache.stats().unwrap();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, cache.len().unwrap(), "Total entries mismatch");
    }
}
