// converge-core/src/runtime/inventory.rs
// ============================================================================
// Module: Converge Inventory Store
// Description: Load/merge/store/delete logic over the pluggable client.
// Purpose: Keep the persisted record honest across partial failure.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The inventory store owns the persisted record between load and the final
//! write of a run. `merge` computes the prune set and pre-commits the union
//! of prior and desired sets before any actuation, so a crash between
//! prune-start and the final write leaves every possibly-live object
//! recorded. At most one mutation is in flight per inventory per run; a
//! racing run surfaces as a compare-and-set conflict, which is retriable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::errors::InventoryError;
use crate::core::inventory::InventoryDocument;
use crate::core::inventory::InventoryIdStrategy;
use crate::core::inventory::InventoryInfo;
use crate::core::sets::ObjectSet;
use crate::interfaces::InventoryClient;

// ============================================================================
// SECTION: Inventory Session
// ============================================================================

/// Exclusive handle over one inventory record for the duration of a run.
///
/// # Invariants
/// - `prior` is the tracked set as loaded; it never changes within the run.
/// - `document.generation` tracks the last successfully written generation.
#[derive(Debug)]
pub struct InventorySession {
    /// The record being mutated.
    document: InventoryDocument,
    /// Tracked set at load time.
    prior: ObjectSet,
}

impl InventorySession {
    /// Returns the set tracked when the record was loaded.
    #[must_use]
    pub const fn prior(&self) -> &ObjectSet {
        &self.prior
    }

    /// Returns the record identity.
    #[must_use]
    pub const fn info(&self) -> &InventoryInfo {
        &self.document.info
    }
}

// ============================================================================
// SECTION: Inventory Store
// ============================================================================

/// Load/merge/store facade over the pluggable persistence client.
#[derive(Clone)]
pub struct InventoryStore {
    /// Pluggable persistence.
    client: Arc<dyn InventoryClient + Send + Sync>,
}

impl InventoryStore {
    /// Creates a store over the given client.
    #[must_use]
    pub const fn new(client: Arc<dyn InventoryClient + Send + Sync>) -> Self {
        Self { client }
    }

    /// Loads the record for the given identity.
    ///
    /// A missing record is recoverable: a new inventory starts empty. Under
    /// the name-pinned strategy, a loaded record whose id does not match the
    /// supplied id is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] on store failure, id mismatch, or a
    /// corrupt payload.
    pub async fn load(&self, info: &InventoryInfo) -> Result<InventorySession, InventoryError> {
        let Some(document) = self.client.load(info).await? else {
            return Ok(InventorySession {
                document: InventoryDocument::empty(info.clone()),
                prior: ObjectSet::new(),
            });
        };
        if info.strategy == InventoryIdStrategy::NameMatch && document.info.id != info.id {
            return Err(InventoryError::IdMismatch {
                expected: info.id.clone(),
                actual: Some(document.info.id.clone()),
            });
        }
        let prior = document.objects()?;
        Ok(InventorySession { document, prior })
    }

    /// Computes the prune set and pre-commits the union record.
    ///
    /// The prune set is `prior \ desired`. The persisted record becomes
    /// `prior ∪ desired` so that a crash after any resource is created
    /// leaves the object recorded for future pruning. Dry-run passes
    /// through without writing.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the write fails or loses its
    /// compare-and-set race.
    pub async fn merge(
        &self,
        session: &mut InventorySession,
        desired: &ObjectSet,
        dry_run: bool,
    ) -> Result<ObjectSet, InventoryError> {
        let prune_set = session.prior.difference(desired);
        if !dry_run {
            let record = session.prior.union(desired);
            self.write(session, &record).await?;
        }
        Ok(prune_set)
    }

    /// Writes the final, post-run retained set.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the write fails.
    pub async fn store(
        &self,
        session: &mut InventorySession,
        retained: &ObjectSet,
        dry_run: bool,
    ) -> Result<(), InventoryError> {
        if dry_run {
            return Ok(());
        }
        self.write(session, retained).await
    }

    /// Removes the record, or rewrites it when objects remain tracked.
    ///
    /// Destroy runs call this last: when every object was deleted the record
    /// goes away entirely; when some were retained or failed, the record
    /// stays honest by tracking exactly those.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the store fails.
    pub async fn delete(
        &self,
        session: &mut InventorySession,
        retained: &ObjectSet,
        dry_run: bool,
    ) -> Result<(), InventoryError> {
        if dry_run {
            return Ok(());
        }
        if retained.is_empty() {
            return self.client.delete(&session.document.info).await;
        }
        self.write(session, retained).await
    }

    /// Writes the record and advances the local generation on success.
    async fn write(
        &self,
        session: &mut InventorySession,
        objects: &ObjectSet,
    ) -> Result<(), InventoryError> {
        session.document.set_objects(objects);
        self.client.store(&session.document).await?;
        session.document.generation += 1;
        Ok(())
    }
}
