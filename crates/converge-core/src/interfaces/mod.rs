// converge-core/src/interfaces/mod.rs
// ============================================================================
// Module: Converge Interfaces
// Description: Backend-agnostic contracts for actuation, status, and storage.
// Purpose: Define the surfaces the engine consumes without embedding clients.
// Dependencies: crate::core, async-trait, tokio
// ============================================================================

//! ## Overview
//! The engine performs no cluster I/O of its own. Create/patch/delete RPCs go
//! through an [`Actuator`]; live status arrives from a [`StatusWatcher`]; the
//! inventory record persists through an [`InventoryClient`]. Implementations
//! must be deterministic per call and fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::errors::ActuationError;
use crate::core::errors::InventoryError;
use crate::core::events::ApplyOperation;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::ObjectUid;
use crate::core::inventory::InventoryDocument;
use crate::core::inventory::InventoryInfo;
use crate::core::manifest::ResourceManifest;
use crate::core::options::DryRunStrategy;
use crate::core::options::PropagationPolicy;
use crate::core::sets::ObjectSet;
use crate::core::status::StatusEvent;

// ============================================================================
// SECTION: Actuator
// ============================================================================

/// Parameters for one apply RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    /// Use server-side apply.
    pub server_side: bool,
    /// Field manager name for server-side apply.
    pub field_manager: String,
    /// Force ownership conflicts on server-side apply.
    pub force_conflicts: bool,
    /// Dry-run strategy for the RPC.
    pub dry_run: DryRunStrategy,
}

/// Result of one successful apply RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// What the server did with the manifest.
    pub operation: ApplyOperation,
    /// Server-assigned UID of the live object.
    pub uid: ObjectUid,
}

/// Cluster client performing the actual create/patch/delete RPCs.
///
/// The reported operation must be one of {Created, Unchanged, Configured,
/// ServerSideApplied}; failures are errors, not operations.
#[async_trait]
pub trait Actuator {
    /// Applies a manifest idempotently.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError`] when the RPC fails.
    async fn apply(
        &self,
        manifest: &ResourceManifest,
        params: &ApplyParams,
    ) -> Result<ApplyResult, ActuationError>;

    /// Deletes an object with the given propagation policy.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError`] when the RPC fails.
    async fn delete(
        &self,
        id: &ObjectId,
        propagation: PropagationPolicy,
    ) -> Result<(), ActuationError>;

    /// Fetches the live object, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError`] when the RPC fails for any other reason.
    async fn get(&self, id: &ObjectId) -> Result<Option<Value>, ActuationError>;
}

// ============================================================================
// SECTION: Status Watcher
// ============================================================================

/// Configuration handed to a status watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Poll cadence for watchers that poll rather than stream.
    pub poll_interval: Duration,
}

/// Observer of live object status, scoped to a set of identities.
///
/// The returned channel closes when cancellation propagates to the watcher
/// or when the watcher has nothing further to report.
pub trait StatusWatcher {
    /// Starts watching the given identities.
    fn watch(&self, ids: ObjectSet, config: WatchConfig) -> mpsc::Receiver<StatusEvent>;
}

// ============================================================================
// SECTION: Inventory Client
// ============================================================================

/// Pluggable persistence for the inventory record.
///
/// Writes are atomic compare-and-set on the document's generation marker; a
/// lost race surfaces as [`InventoryError::Conflict`], which is retriable by
/// a subsequent run.
#[async_trait]
pub trait InventoryClient {
    /// Loads the record for the given identity, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the store fails.
    async fn load(&self, info: &InventoryInfo) -> Result<Option<InventoryDocument>, InventoryError>;

    /// Writes the record, compare-and-set on its generation marker.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] when the generation does not
    /// match the persisted record, or another variant when the store fails.
    async fn store(&self, document: &InventoryDocument) -> Result<(), InventoryError>;

    /// Removes the record for the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] when the store fails.
    async fn delete(&self, info: &InventoryInfo) -> Result<(), InventoryError>;
}
