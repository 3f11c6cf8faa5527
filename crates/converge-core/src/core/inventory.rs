// converge-core/src/core/inventory.rs
// ============================================================================
// Module: Converge Inventory Records
// Description: Persisted inventory identity and document types.
// Purpose: Model the set-of-actuated-objects record and its CAS marker.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The inventory is the persisted record of which objects a Converge run has
//! actuated, keyed by a caller-chosen identity. The in-cluster representation
//! is an opaque document owned by the inventory store; the engine treats it
//! as a load/store value. The payload is the flat canonical-string map
//! produced by [`ObjectSet::to_string_map`], and writes are guarded by a
//! generation marker providing compare-and-set semantics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::inventory_hash;
use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectIdError;
use crate::core::sets::ObjectSet;

// ============================================================================
// SECTION: Inventory Identity
// ============================================================================

/// Strategy used to validate a loaded inventory record's identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryIdStrategy {
    /// The loaded record's id label must equal the supplied id; mismatch is fatal.
    #[default]
    NameMatch,
    /// The record is located by label only; no pinning beyond the lookup.
    Label,
}

/// Caller-supplied identity of an inventory record.
///
/// # Invariants
/// - `(name, namespace)` locate the record; `id` names the owning inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryInfo {
    /// Record name.
    pub name: String,
    /// Record namespace.
    pub namespace: String,
    /// Caller-chosen inventory identity string.
    pub id: InventoryId,
    /// Identity validation strategy.
    #[serde(default)]
    pub strategy: InventoryIdStrategy,
}

impl InventoryInfo {
    /// Creates a new inventory identity with the default strategy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        id: impl Into<InventoryId>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            id: id.into(),
            strategy: InventoryIdStrategy::default(),
        }
    }
}

// ============================================================================
// SECTION: Inventory Document
// ============================================================================

/// Persisted inventory record as held by the pluggable store.
///
/// # Invariants
/// - `payload` keys are canonical object-id string forms.
/// - `hash` is the inventory hash of the payload set.
/// - `generation` increments on every successful store write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    /// Identity of the record.
    pub info: InventoryInfo,
    /// Flat canonical-string payload of tracked objects.
    pub payload: BTreeMap<String, String>,
    /// Inventory-hash annotation value.
    pub hash: String,
    /// Compare-and-set generation marker.
    pub generation: u64,
}

impl InventoryDocument {
    /// Creates a fresh, empty record for the given identity.
    #[must_use]
    pub fn empty(info: InventoryInfo) -> Self {
        Self {
            info,
            payload: BTreeMap::new(),
            hash: inventory_hash(&ObjectSet::new()),
            generation: 0,
        }
    }

    /// Returns the tracked object set.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectIdError`] when a payload key is not a canonical form.
    pub fn objects(&self) -> Result<ObjectSet, ObjectIdError> {
        ObjectSet::from_string_map(&self.payload)
    }

    /// Replaces the tracked set, recomputing payload and hash.
    pub fn set_objects(&mut self, objects: &ObjectSet) {
        self.payload = objects.to_string_map();
        self.hash = inventory_hash(objects);
    }
}
