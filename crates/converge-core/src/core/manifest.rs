// converge-core/src/core/manifest.rs
// ============================================================================
// Module: Converge Resource Manifests
// Description: Opaque manifest documents with typed accessors.
// Purpose: Derive object identity, dependencies, and lifecycle directives.
// Dependencies: crate::core::identifiers, serde_json
// ============================================================================

//! ## Overview
//! Manifests are arbitrary nested documents represented as a
//! [`serde_json::Value`] tree. The engine reads only a handful of paths:
//! `apiVersion`, `kind`, `metadata.name`, `metadata.namespace`,
//! `metadata.uid`, and the well-known Converge labels and annotations.
//! Everything else is opaque and passes through to the actuator untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::ObjectIdError;
use crate::core::identifiers::ObjectUid;

// ============================================================================
// SECTION: Well-Known Keys
// ============================================================================

/// Label carrying the inventory identity on templates and records.
pub const INVENTORY_ID_LABEL: &str = "converge.dev/inventory-id";

/// Annotation listing explicit dependencies as canonical id forms.
pub const DEPENDS_ON_ANNOTATION: &str = "converge.dev/depends-on";

/// Annotation opting an object out of pruning.
pub const ON_REMOVE_ANNOTATION: &str = "converge.dev/on-remove";

/// Lifecycle directive value that retains the object on removal.
pub const ON_REMOVE_KEEP: &str = "keep";

/// Annotation stamping the inventory that actuated an object.
pub const OWNING_INVENTORY_ANNOTATION: &str = "converge.dev/owning-inventory";

/// Annotation carrying the inventory hash on the persisted record.
pub const INVENTORY_HASH_ANNOTATION: &str = "converge.dev/inventory-hash";

// ============================================================================
// SECTION: Resource Manifest
// ============================================================================

/// A desired-state manifest together with its derived identity.
///
/// # Invariants
/// - The engine touches only the ownership annotation; everything else in
///   the wrapped document passes through untouched.
/// - The derived identity is structural on `(group, kind, namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    /// Opaque manifest document.
    value: Value,
}

impl ResourceManifest {
    /// Wraps a manifest document.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }

    /// Returns the wrapped document.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the wrapper and returns the document.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the object kind, or an empty string when absent.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.value.get("kind").and_then(Value::as_str).unwrap_or_default()
    }

    /// Returns the API group parsed from `apiVersion` (empty for core).
    #[must_use]
    pub fn group(&self) -> &str {
        let api_version =
            self.value.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
        match api_version.split_once('/') {
            Some((group, _version)) => group,
            None => "",
        }
    }

    /// Returns `metadata.name`, or an empty string when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    /// Returns `metadata.namespace`, or an empty string when absent.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    /// Returns the server-assigned UID when the document carries one.
    #[must_use]
    pub fn uid(&self) -> Option<ObjectUid> {
        let uid = self.metadata_str("uid");
        if uid.is_empty() { None } else { Some(ObjectUid::new(uid)) }
    }

    /// Returns a label value by key.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata_map_str("labels", key)
    }

    /// Returns an annotation value by key.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata_map_str("annotations", key)
    }

    /// Derives the canonical object identity from the document.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.group(), self.kind(), self.namespace(), self.name())
    }

    /// Returns true when the manifest carries the inventory-id label.
    ///
    /// Such a manifest is an inventory template, not a desired object, and
    /// is filtered out of the apply set.
    #[must_use]
    pub fn is_inventory_template(&self) -> bool {
        self.label(INVENTORY_ID_LABEL).is_some()
    }

    /// Returns the inventory identity carried by an inventory template.
    #[must_use]
    pub fn inventory_id(&self) -> Option<InventoryId> {
        self.label(INVENTORY_ID_LABEL).map(InventoryId::new)
    }

    /// Returns the inventory that actuated this object, when stamped.
    #[must_use]
    pub fn owning_inventory(&self) -> Option<InventoryId> {
        self.annotation(OWNING_INVENTORY_ANNOTATION).map(InventoryId::new)
    }

    /// Returns true when the lifecycle directive retains the object.
    #[must_use]
    pub fn lifecycle_keep(&self) -> bool {
        self.annotation(ON_REMOVE_ANNOTATION)
            .is_some_and(|directive| directive.trim() == ON_REMOVE_KEEP)
    }

    /// Parses the explicit dependency annotation into identities.
    ///
    /// The annotation value is a comma-separated list of canonical
    /// `namespace_name_group_kind` forms. Absent annotation means no
    /// explicit dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidDependsOn`] when an entry is not a
    /// canonical identity form.
    pub fn depends_on(&self) -> Result<Vec<ObjectId>, ManifestError> {
        let Some(raw) = self.annotation(DEPENDS_ON_ANNOTATION) else {
            return Ok(Vec::new());
        };
        let mut deps = Vec::new();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let id = ObjectId::parse(entry).map_err(|source| ManifestError::InvalidDependsOn {
                object: self.object_id().to_string(),
                entry: entry.to_string(),
                source,
            })?;
            deps.push(id);
        }
        Ok(deps)
    }

    /// Returns a copy of the manifest with one annotation set.
    ///
    /// `metadata` and `metadata.annotations` are created when absent. A
    /// non-object document is returned unchanged.
    #[must_use]
    pub fn with_annotation(&self, key: &str, value: &str) -> Self {
        let mut doc = self.value.clone();
        if let Some(root) = doc.as_object_mut() {
            let metadata = root
                .entry("metadata")
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Some(metadata) = metadata.as_object_mut() {
                let annotations = metadata
                    .entry("annotations")
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if let Some(annotations) = annotations.as_object_mut() {
                    annotations.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }
        Self::new(doc)
    }

    /// Returns a copy of the manifest with one label set.
    ///
    /// `metadata` and `metadata.labels` are created when absent. A
    /// non-object document is returned unchanged.
    #[must_use]
    pub fn with_label(&self, key: &str, value: &str) -> Self {
        let mut doc = self.value.clone();
        if let Some(root) = doc.as_object_mut() {
            let metadata = root
                .entry("metadata")
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if let Some(metadata) = metadata.as_object_mut() {
                let labels = metadata
                    .entry("labels")
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if let Some(labels) = labels.as_object_mut() {
                    labels.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }
        Self::new(doc)
    }

    /// Returns a string field from `metadata`.
    fn metadata_str(&self, key: &str) -> &str {
        self.value
            .get("metadata")
            .and_then(|meta| meta.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns a string value from a map under `metadata`.
    fn metadata_map_str(&self, map: &str, key: &str) -> Option<&str> {
        self.value
            .get("metadata")
            .and_then(|meta| meta.get(map))
            .and_then(|values| values.get(key))
            .and_then(Value::as_str)
    }
}

impl From<Value> for ResourceManifest {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Manifest Errors
// ============================================================================

/// Errors raised while reading manifest metadata.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Dependency annotation entry failed to parse.
    #[error("invalid depends-on entry `{entry}` on {object}: {source}")]
    InvalidDependsOn {
        /// Canonical form of the object carrying the annotation.
        object: String,
        /// Offending annotation entry.
        entry: String,
        /// Underlying parse failure.
        source: ObjectIdError,
    },
}
