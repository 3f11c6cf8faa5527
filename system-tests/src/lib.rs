// system-tests/src/lib.rs
// ============================================================================
// Module: Converge System-Test Harness
// Description: Shared wiring and event helpers for end-to-end scenarios.
// Purpose: Build engines over testkit fakes and fold event streams.
// Dependencies: converge-core, converge-testkit, tokio
// ============================================================================

//! ## Overview
//! The harness assembles an applier or destroyer over the in-memory fakes,
//! runs it to stream close, and offers projections over the collected
//! events so scenario tests read as expected-sequence assertions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use converge_core::Applier;
use converge_core::ApplierOptions;
use converge_core::ApplyOperation;
use converge_core::Destroyer;
use converge_core::DestroyerOptions;
use converge_core::Event;
use converge_core::InventoryDocument;
use converge_core::InventoryInfo;
use converge_core::ObjectId;
use converge_core::ObjectSet;
use converge_core::PruneOperation;
use converge_core::ResourceManifest;
use converge_core::RunError;
use converge_core::StatusWatcher;
use converge_testkit::FakeActuator;
use converge_testkit::MemoryInventoryClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Returns the conventional inventory identity used across scenarios.
#[must_use]
pub fn team_inventory(id: &str) -> InventoryInfo {
    InventoryInfo::new("inventory", "default", id)
}

/// Builds an applier over the given fakes.
///
/// # Panics
///
/// Panics when the builder rejects the wiring; test-only code.
#[must_use]
#[allow(clippy::unwrap_used, reason = "test-only wiring")]
pub fn applier(
    actuator: &FakeActuator,
    watcher: impl StatusWatcher + Send + Sync + 'static,
    inventory: &MemoryInventoryClient,
) -> Applier {
    Applier::builder()
        .actuator(actuator.clone())
        .status_watcher(watcher)
        .inventory_client(inventory.clone())
        .build_applier()
        .unwrap()
}

/// Builds a destroyer over the given fakes.
///
/// # Panics
///
/// Panics when the builder rejects the wiring; test-only code.
#[must_use]
#[allow(clippy::unwrap_used, reason = "test-only wiring")]
pub fn destroyer(
    actuator: &FakeActuator,
    watcher: impl StatusWatcher + Send + Sync + 'static,
    inventory: &MemoryInventoryClient,
) -> Destroyer {
    Destroyer::builder()
        .actuator(actuator.clone())
        .status_watcher(watcher)
        .inventory_client(inventory.clone())
        .build_destroyer()
        .unwrap()
}

/// Seeds a persisted inventory record tracking the given identities.
pub fn seed_inventory(client: &MemoryInventoryClient, info: &InventoryInfo, ids: &[ObjectId]) {
    let mut document = InventoryDocument::empty(info.clone());
    let objects: ObjectSet = ids.iter().cloned().collect();
    document.set_objects(&objects);
    client.seed(document);
}

// ============================================================================
// SECTION: Run Drivers
// ============================================================================

/// Drains an event stream to close.
pub async fn collect(mut rx: mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Runs an apply to completion and returns the full event stream.
pub async fn run_apply(
    engine: &Applier,
    info: InventoryInfo,
    manifests: Vec<ResourceManifest>,
    options: ApplierOptions,
) -> Vec<Event> {
    let rx = engine.run(info, manifests, options, CancellationToken::new());
    collect(rx).await
}

/// Runs a destroy to completion and returns the full event stream.
pub async fn run_destroy(
    engine: &Destroyer,
    info: InventoryInfo,
    options: DestroyerOptions,
) -> Vec<Event> {
    let rx = engine.run(info, options, CancellationToken::new());
    collect(rx).await
}

// ============================================================================
// SECTION: Event Projections
// ============================================================================

/// Projects apply events into `(identity, operation)` pairs, in order.
#[must_use]
pub fn apply_sequence(events: &[Event]) -> Vec<(ObjectId, ApplyOperation)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Apply(apply) => Some((apply.id.clone(), apply.operation)),
            _ => None,
        })
        .collect()
}

/// Projects prune events into `(identity, operation)` pairs, in order.
#[must_use]
pub fn prune_sequence(events: &[Event]) -> Vec<(ObjectId, PruneOperation)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Prune(prune) => Some((prune.id.clone(), prune.operation)),
            _ => None,
        })
        .collect()
}

/// Projects error events into their run errors, in order.
#[must_use]
pub fn error_sequence(events: &[Event]) -> Vec<RunError> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Error(error) => Some(error.error.clone()),
            _ => None,
        })
        .collect()
}

/// Returns the position of the first event touching the identity.
#[must_use]
pub fn first_touch(events: &[Event], id: &ObjectId) -> Option<usize> {
    events.iter().position(|event| match event {
        Event::Apply(apply) => &apply.id == id,
        Event::Prune(prune) => &prune.id == id,
        Event::Delete(delete) => &delete.id == id,
        _ => false,
    })
}
