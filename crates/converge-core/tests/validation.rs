// converge-core/tests/validation.rs
// ============================================================================
// Module: Validation Tests
// Description: Tests for structural manifest validation and exclusion.
// ============================================================================
//! ## Overview
//! Validates partitioning of the desired set into valid objects and typed
//! failures, including transitive exclusion of dependents.

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

use converge_core::DEPENDS_ON_ANNOTATION;
use converge_core::ObjectId;
use converge_core::ResourceManifest;
use converge_core::ValidationError;
use converge_core::validate_manifests;
use serde_json::json;

/// Builds a config-map manifest.
fn cm(name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "default" },
    }))
}

// ============================================================================
// SECTION: Partitioning
// ============================================================================

/// Tests a fully valid set passes through untouched.
#[test]
fn test_valid_set_passes() {
    let outcome = validate_manifests(&[cm("a"), cm("b")]);
    assert_eq!(outcome.valid.len(), 2);
    assert!(outcome.failures.is_empty());
}

/// Tests a missing name excludes the object.
#[test]
fn test_missing_name_is_excluded() {
    let nameless = ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "namespace": "default" },
    }));
    let outcome = validate_manifests(&[nameless, cm("ok")]);
    assert_eq!(outcome.valid.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(outcome.failures[0].error, ValidationError::Id(_)));
}

/// Tests a namespaced kind without a namespace is excluded.
#[test]
fn test_missing_namespace_is_excluded() {
    let floating = ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": "floating" },
    }));
    let outcome = validate_manifests(&[floating]);
    assert!(outcome.valid.is_empty());
    assert_eq!(outcome.failures.len(), 1);
}

/// Tests duplicate identities are excluded with a typed failure.
#[test]
fn test_duplicates_are_excluded() {
    let outcome = validate_manifests(&[cm("same"), cm("same")]);
    assert_eq!(outcome.valid.len(), 1);
    assert!(matches!(
        outcome.failures[0].error,
        ValidationError::Duplicate(_)
    ));
}

/// Tests dependents of an excluded object are excluded transitively.
#[test]
fn test_dependents_of_invalid_are_excluded() {
    let base_id = ObjectId::new("", "ConfigMap", "default", "base");
    let child = ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": "child",
            "namespace": "default",
            "annotations": { DEPENDS_ON_ANNOTATION: base_id.to_string() },
        },
    }));
    let grandchild = ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": "grandchild",
            "namespace": "default",
            "annotations": {
                DEPENDS_ON_ANNOTATION: "default_child__ConfigMap",
            },
        },
    }));
    // The duplicated identity invalidates the whole chain above it.
    let outcome =
        validate_manifests(&[cm("base"), cm("base"), child, grandchild, cm("ok")]);
    let valid: Vec<String> =
        outcome.valid.iter().map(|m| m.name().to_string()).collect();
    assert_eq!(valid, vec!["ok"]);
    assert_eq!(outcome.failures.len(), 3);
    assert!(matches!(
        outcome.failures[0].error,
        ValidationError::Duplicate(_)
    ));
    assert!(outcome
        .failures
        .iter()
        .skip(1)
        .all(|failure| matches!(failure.error, ValidationError::InvalidDependency { .. })));
}
