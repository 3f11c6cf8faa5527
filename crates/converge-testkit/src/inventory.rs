// converge-testkit/src/inventory.rs
// ============================================================================
// Module: Memory Inventory Client
// Description: Generation-checked in-memory inventory persistence.
// Purpose: Provide deterministic compare-and-set storage for tests.
// Dependencies: converge-core, async-trait
// ============================================================================

//! ## Overview
//! Records live in a map keyed by `(namespace, name)`. A store call must
//! present the persisted generation; on match the record is written with the
//! generation advanced, otherwise the call loses the race and returns a
//! conflict, exactly as a real compare-and-set store behaves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use converge_core::InventoryClient;
use converge_core::InventoryDocument;
use converge_core::InventoryError;
use converge_core::InventoryInfo;
use converge_core::ObjectSet;

// ============================================================================
// SECTION: Memory Client
// ============================================================================

/// In-memory [`InventoryClient`] with compare-and-set semantics.
#[derive(Debug, Default, Clone)]
pub struct MemoryInventoryClient {
    /// Records keyed by `(namespace, name)`.
    records: Arc<Mutex<BTreeMap<(String, String), InventoryDocument>>>,
}

impl MemoryInventoryClient {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record directly, bypassing the generation check.
    pub fn seed(&self, document: InventoryDocument) {
        if let Ok(mut records) = self.records.lock() {
            let key =
                (document.info.namespace.clone(), document.info.name.clone());
            records.insert(key, document);
        }
    }

    /// Returns the persisted record for an identity, when present.
    #[must_use]
    pub fn record(&self, info: &InventoryInfo) -> Option<InventoryDocument> {
        self.records
            .lock()
            .ok()
            .and_then(|records| {
                records.get(&(info.namespace.clone(), info.name.clone())).cloned()
            })
    }

    /// Returns the persisted object set for an identity, when present.
    #[must_use]
    pub fn objects(&self, info: &InventoryInfo) -> Option<ObjectSet> {
        self.record(info).and_then(|document| document.objects().ok())
    }
}

#[async_trait]
impl InventoryClient for MemoryInventoryClient {
    async fn load(
        &self,
        info: &InventoryInfo,
    ) -> Result<Option<InventoryDocument>, InventoryError> {
        let records = self
            .records
            .lock()
            .map_err(|_| InventoryError::Store("memory inventory mutex poisoned".to_string()))?;
        Ok(records.get(&(info.namespace.clone(), info.name.clone())).cloned())
    }

    async fn store(&self, document: &InventoryDocument) -> Result<(), InventoryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| InventoryError::Store("memory inventory mutex poisoned".to_string()))?;
        let key = (document.info.namespace.clone(), document.info.name.clone());
        let persisted_generation = records.get(&key).map(|existing| existing.generation);
        let expected = persisted_generation.unwrap_or(0);
        if document.generation != expected {
            return Err(InventoryError::Conflict(format!(
                "generation {} does not match persisted {expected}",
                document.generation
            )));
        }
        let mut written = document.clone();
        written.generation += 1;
        records.insert(key, written);
        Ok(())
    }

    async fn delete(&self, info: &InventoryInfo) -> Result<(), InventoryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| InventoryError::Store("memory inventory mutex poisoned".to_string()))?;
        records.remove(&(info.namespace.clone(), info.name.clone()));
        Ok(())
    }
}
