// converge-core/tests/graph.rs
// ============================================================================
// Module: Dependency Graph Tests
// Description: Tests for layering, cycles, and fallback ordering.
// ============================================================================
//! ## Overview
//! Validates topological layering, cycle rejection, external references,
//! and the kind-priority fallback order.

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
use converge_core::DependencyGraph;
use converge_core::GraphError;
use converge_core::ObjectId;
use converge_core::ObjectSet;
use converge_core::ResourceManifest;
use converge_core::runtime::kind_priority;
use converge_core::runtime::prune_layers;
use serde_json::json;

/// Builds a config-map manifest with optional dependencies.
fn cm(name: &str, deps: &[&ObjectId]) -> ResourceManifest {
    let deps_value: Vec<String> = deps.iter().map(ToString::to_string).collect();
    let mut manifest = json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "default" },
    });
    if !deps_value.is_empty() {
        manifest["metadata"]["annotations"] =
            json!({ DEPENDS_ON_ANNOTATION: deps_value.join(",") });
    }
    ResourceManifest::new(manifest)
}

/// Returns the config-map identity for a name.
fn cm_id(name: &str) -> ObjectId {
    ObjectId::new("", "ConfigMap", "default", name)
}

// ============================================================================
// SECTION: Layering
// ============================================================================

/// Tests independent objects land in one layer.
#[test]
fn test_independent_objects_share_a_layer() {
    let objects = vec![cm("a", &[]), cm("b", &[])];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    let layers = graph.sort_layers().unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].len(), 2);
}

/// Tests a dependency pushes the dependent into a later layer.
#[test]
fn test_dependency_orders_layers() {
    let b_id = cm_id("b");
    let objects = vec![cm("a", &[&b_id]), cm("b", &[])];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    let layers = graph.sort_layers().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0], vec![cm_id("b")]);
    assert_eq!(layers[1], vec![cm_id("a")]);
}

/// Tests a chain produces one layer per link.
#[test]
fn test_chain_layers() {
    let b_id = cm_id("b");
    let c_id = cm_id("c");
    let objects = vec![cm("a", &[&b_id]), cm("b", &[&c_id]), cm("c", &[])];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    let layers = graph.sort_layers().unwrap();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], vec![cm_id("c")]);
    assert_eq!(layers[2], vec![cm_id("a")]);
}

/// Tests a cycle is rejected with its members listed.
#[test]
fn test_cycle_is_fatal() {
    let a_id = cm_id("a");
    let b_id = cm_id("b");
    let objects = vec![cm("a", &[&b_id]), cm("b", &[&a_id])];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    match graph.sort_layers() {
        Err(GraphError::Cycle(members)) => {
            assert!(members.contains(&cm_id("a")));
            assert!(members.contains(&cm_id("b")));
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

/// Tests a reference outside desired and prior sets is fatal.
#[test]
fn test_unresolved_reference_is_fatal() {
    let ghost = cm_id("ghost");
    let objects = vec![cm("a", &[&ghost])];
    assert!(matches!(
        DependencyGraph::build(&objects, &ObjectSet::new()),
        Err(GraphError::UnresolvedReference { .. })
    ));
}

/// Tests a reference into the prior set records an external dependent.
#[test]
fn test_prior_reference_records_external_dependent() {
    let ghost = cm_id("ghost");
    let prior: ObjectSet = [ghost.clone()].into_iter().collect();
    let objects = vec![cm("a", &[&ghost])];
    let graph = DependencyGraph::build(&objects, &prior).unwrap();
    assert_eq!(graph.external_dependents_of(&ghost), &[cm_id("a")]);
    assert_eq!(graph.sort_layers().unwrap().len(), 1);
}

/// Tests transitive dependents are collected across edges.
#[test]
fn test_transitive_dependents() {
    let b_id = cm_id("b");
    let c_id = cm_id("c");
    let objects = vec![cm("a", &[&b_id]), cm("b", &[&c_id]), cm("c", &[])];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    let mut dependents = graph.transitive_dependents(&cm_id("c"));
    dependents.sort();
    assert_eq!(dependents, vec![cm_id("a"), cm_id("b")]);
}

// ============================================================================
// SECTION: Fallback Ordering
// ============================================================================

/// Tests the kind priority table brackets the workload kinds.
#[test]
fn test_kind_priority_brackets() {
    assert!(kind_priority("Namespace") < kind_priority("ConfigMap"));
    assert!(kind_priority("CustomResourceDefinition") < kind_priority("ServiceAccount"));
    assert!(kind_priority("ConfigMap") < kind_priority("Deployment"));
    assert!(kind_priority("Deployment") < kind_priority("ValidatingWebhookConfiguration"));
}

/// Tests a mixed layer sorts namespaces first and webhooks last.
#[test]
fn test_layer_fallback_order() {
    let objects = vec![
        ResourceManifest::new(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "ValidatingWebhookConfiguration",
            "metadata": { "name": "gate" },
        })),
        cm("settings", &[]),
        ResourceManifest::new(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": "prod" },
        })),
    ];
    let graph = DependencyGraph::build(&objects, &ObjectSet::new()).unwrap();
    let layers = graph.sort_layers().unwrap();
    assert_eq!(layers.len(), 1);
    let kinds: Vec<&str> = layers[0].iter().map(|id| id.kind.as_str()).collect();
    assert_eq!(kinds, vec!["Namespace", "ConfigMap", "ValidatingWebhookConfiguration"]);
}

/// Tests prune layering reverses the priority buckets.
#[test]
fn test_prune_layers_reverse_priority() {
    let candidates: ObjectSet = [
        ObjectId::new("", "Namespace", "", "prod"),
        ObjectId::new("", "ConfigMap", "prod", "settings"),
        ObjectId::new("apps", "Deployment", "prod", "web"),
    ]
    .into_iter()
    .collect();
    let layers = prune_layers(&candidates);
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0][0].kind, "Deployment");
    assert_eq!(layers[1][0].kind, "ConfigMap");
    assert_eq!(layers[2][0].kind, "Namespace");
}
