// system-tests/tests/inventory.rs
// ============================================================================
// Module: Inventory Scenarios
// Description: Record identity, compare-and-set, and monotonicity.
// ============================================================================
//! ## Overview
//! Validates the persisted record across runs: id pinning, lost CAS races,
//! the pre-commit write, and the final-set invariant.

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

use converge_core::ApplierOptions;
use converge_core::Event;
use converge_core::InventoryClient;
use converge_core::InventoryDocument;
use converge_core::InventoryError;
use converge_core::InventoryInfo;
use converge_core::ObjectSet;
use converge_core::RunError;
use converge_core::inventory_hash;
use converge_testkit::FakeActuator;
use converge_testkit::MemoryInventoryClient;
use converge_testkit::ScriptedStatusWatcher;
use converge_testkit::manifests;
use system_tests::applier;
use system_tests::error_sequence;
use system_tests::run_apply;
use system_tests::seed_inventory;
use system_tests::team_inventory;

// ============================================================================
// SECTION: Identity Pinning
// ============================================================================

/// Tests a record owned by a different inventory id is fatal.
#[tokio::test]
async fn test_id_mismatch_is_fatal() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();

    // The persisted record belongs to team-b.
    seed_inventory(&inventory, &team_inventory("team-b"), &[]);

    let engine = applier(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events = run_apply(
        &engine,
        team_inventory("team-a"),
        vec![manifests::config_map("default", "cm")],
        ApplierOptions::default(),
    )
    .await;

    // No init, no actuation; just the terminal inventory error.
    assert!(events.iter().all(|event| !matches!(event, Event::Init(_))));
    let errors = error_sequence(&events);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        RunError::Inventory(InventoryError::IdMismatch { .. })
    ));
    assert!(actuator.actions().is_empty());
}

// ============================================================================
// SECTION: Compare-And-Set
// ============================================================================

/// Tests a write presenting a stale generation loses the race.
#[tokio::test]
async fn test_stale_generation_conflicts() {
    let client = MemoryInventoryClient::new();
    let info = InventoryInfo::new("inventory", "default", "team-a");

    let mut document = InventoryDocument::empty(info);
    client.store(&document).await.unwrap();
    // A second writer with the same stale generation must lose.
    let result = client.store(&document).await;
    assert!(matches!(result, Err(InventoryError::Conflict(_))));
    // Presenting the advanced generation wins again.
    document.generation += 1;
    client.store(&document).await.unwrap();
}

// ============================================================================
// SECTION: Pre-Commit and Final Sets
// ============================================================================

/// Tests the hash annotation tracks the persisted payload.
#[tokio::test]
async fn test_hash_annotation_matches_payload() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let cm = manifests::config_map("default", "cm");
    let engine = applier(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    run_apply(&engine, info.clone(), vec![cm], ApplierOptions::default()).await;

    let record = inventory.record(&info).unwrap();
    let objects = record.objects().unwrap();
    assert_eq!(record.hash, inventory_hash(&objects));
}

/// Tests the final record equals desired plus retained minus pruned.
#[tokio::test]
async fn test_inventory_monotonicity() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let kept = manifests::owned_by(&manifests::config_map("default", "kept"), "team-a");
    let pruned = manifests::owned_by(&manifests::config_map("default", "pruned"), "team-a");
    let retained = manifests::keep_on_remove(&manifests::owned_by(
        &manifests::config_map("default", "retained"),
        "team-a",
    ));
    actuator.seed_live(&kept, "uid-kept");
    actuator.seed_live(&pruned, "uid-pruned");
    actuator.seed_live(&retained, "uid-retained");
    seed_inventory(
        &inventory,
        &info,
        &[kept.object_id(), pruned.object_id(), retained.object_id()],
    );

    let engine = applier(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events = run_apply(
        &engine,
        info.clone(),
        vec![manifests::config_map("default", "kept")],
        ApplierOptions::default(),
    )
    .await;
    assert!(error_sequence(&events).is_empty());

    let persisted = inventory.objects(&info).unwrap();
    let expected: ObjectSet =
        [kept.object_id(), retained.object_id()].into_iter().collect();
    assert_eq!(persisted, expected);
    // No object is both retained and recorded as pruned.
    assert!(!persisted.contains(&pruned.object_id()));
}
