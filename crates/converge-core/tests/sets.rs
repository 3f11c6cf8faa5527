// converge-core/tests/sets.rs
// ============================================================================
// Module: Object Set Tests
// Description: Tests for set algebra and the inventory payload mapping.
// ============================================================================
//! ## Overview
//! Validates union/difference/equality laws and string-map round-trips.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use converge_core::ObjectId;
use converge_core::ObjectSet;

/// Returns a config-map identity for tests.
fn cm(name: &str) -> ObjectId {
    ObjectId::new("", "ConfigMap", "default", name)
}

// ============================================================================
// SECTION: Set Algebra
// ============================================================================

/// Tests equality ignores insertion order and duplicates.
#[test]
fn test_equality_ignores_order_and_duplicates() {
    let a: ObjectSet = [cm("one"), cm("two"), cm("one")].into_iter().collect();
    let b: ObjectSet = [cm("two"), cm("one")].into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

/// Tests union with itself is idempotent.
#[test]
fn test_union_idempotent() {
    let a: ObjectSet = [cm("one"), cm("two")].into_iter().collect();
    assert_eq!(a.union(&a), a);
}

/// Tests difference with itself is empty.
#[test]
fn test_difference_with_self_is_empty() {
    let a: ObjectSet = [cm("one"), cm("two")].into_iter().collect();
    assert!(a.difference(&a).is_empty());
}

/// Tests difference keeps only members absent from the other set.
#[test]
fn test_difference_members() {
    let prior: ObjectSet = [cm("one"), cm("two")].into_iter().collect();
    let desired: ObjectSet = [cm("one")].into_iter().collect();
    let prune = prior.difference(&desired);
    assert_eq!(prune.len(), 1);
    assert!(prune.contains(&cm("two")));
}

/// Tests membership is observable through contains.
#[test]
fn test_membership() {
    let mut set = ObjectSet::new();
    assert!(set.insert(cm("one")));
    assert!(!set.insert(cm("one")));
    assert!(set.contains(&cm("one")));
    assert!(set.remove(&cm("one")));
    assert!(set.is_empty());
}

// ============================================================================
// SECTION: Payload Mapping
// ============================================================================

/// Tests string-map serialization round-trips exactly.
#[test]
fn test_string_map_round_trip() {
    let set: ObjectSet = [cm("one"), cm("two"), ObjectId::new("", "Namespace", "", "prod")]
        .into_iter()
        .collect();
    let map = set.to_string_map();
    assert_eq!(map.len(), 3);
    assert!(map.values().all(String::is_empty));
    let restored = ObjectSet::from_string_map(&map).unwrap();
    assert_eq!(restored, set);
}

/// Tests a corrupt payload key fails to parse.
#[test]
fn test_string_map_rejects_corrupt_key() {
    let mut map = std::collections::BTreeMap::new();
    map.insert("not-an-id".to_string(), String::new());
    assert!(ObjectSet::from_string_map(&map).is_err());
}

/// Tests sorted output is deterministic.
#[test]
fn test_sorted_vec_is_deterministic() {
    let a: ObjectSet = [cm("b"), cm("a"), cm("c")].into_iter().collect();
    let sorted = a.to_sorted_vec();
    let names: Vec<&str> = sorted.iter().map(|id| id.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}
