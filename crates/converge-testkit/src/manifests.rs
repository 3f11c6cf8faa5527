// converge-testkit/src/manifests.rs
// ============================================================================
// Module: Manifest Builders
// Description: Compact builders for test manifests and decorators.
// Purpose: Keep scenario tests readable and free of raw JSON noise.
// Dependencies: converge-core, serde_json
// ============================================================================

//! ## Overview
//! Builders produce minimal but well-formed manifests for the kinds the
//! engine treats specially, plus decorators for the well-known annotations:
//! explicit dependencies, the lifecycle keep directive, ownership stamps,
//! and inventory templates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use converge_core::DEPENDS_ON_ANNOTATION;
use converge_core::INVENTORY_ID_LABEL;
use converge_core::ON_REMOVE_ANNOTATION;
use converge_core::ON_REMOVE_KEEP;
use converge_core::OWNING_INVENTORY_ANNOTATION;
use converge_core::ObjectId;
use converge_core::ResourceManifest;
use serde_json::json;

// ============================================================================
// SECTION: Kind Builders
// ============================================================================

/// Builds a minimal namespaced config map manifest.
#[must_use]
pub fn config_map(namespace: &str, name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": namespace },
        "data": {},
    }))
}

/// Builds a minimal namespace manifest.
#[must_use]
pub fn namespace(name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": name },
    }))
}

/// Builds a minimal pod manifest.
#[must_use]
pub fn pod(namespace: &str, name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "containers": [] },
    }))
}

/// Builds a minimal deployment manifest.
#[must_use]
pub fn deployment(namespace: &str, name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "replicas": 1 },
    }))
}

/// Builds a minimal custom resource definition manifest.
#[must_use]
pub fn custom_resource_definition(name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": { "name": name },
    }))
}

/// Builds a minimal custom resource manifest.
#[must_use]
pub fn custom_resource(group: &str, kind: &str, namespace: &str, name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": format!("{group}/v1"),
        "kind": kind,
        "metadata": { "name": name, "namespace": namespace },
    }))
}

/// Builds an inventory template manifest carrying the inventory-id label.
#[must_use]
pub fn inventory_template(namespace: &str, name: &str, inventory_id: &str) -> ResourceManifest {
    config_map(namespace, name).with_label(INVENTORY_ID_LABEL, inventory_id)
}

// ============================================================================
// SECTION: Decorators
// ============================================================================

/// Returns a copy annotated with explicit dependencies.
#[must_use]
pub fn depends_on(manifest: &ResourceManifest, dependencies: &[ObjectId]) -> ResourceManifest {
    let value = dependencies
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(",");
    manifest.with_annotation(DEPENDS_ON_ANNOTATION, &value)
}

/// Returns a copy carrying the lifecycle keep directive.
#[must_use]
pub fn keep_on_remove(manifest: &ResourceManifest) -> ResourceManifest {
    manifest.with_annotation(ON_REMOVE_ANNOTATION, ON_REMOVE_KEEP)
}

/// Returns a copy stamped as owned by the given inventory.
#[must_use]
pub fn owned_by(manifest: &ResourceManifest, inventory_id: &str) -> ResourceManifest {
    manifest.with_annotation(OWNING_INVENTORY_ANNOTATION, inventory_id)
}
