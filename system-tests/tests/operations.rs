// system-tests/tests/operations.rs
// ============================================================================
// Module: Destroy Scenarios
// Description: Full tear-down runs over the in-memory fakes.
// ============================================================================
//! ## Overview
//! Validates that destroy prunes everything the inventory tracks in inverse
//! apply order, removes the record when the tear-down is complete, and keeps
//! the record honest when deletions fail.

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

use converge_core::DeleteOperation;
use converge_core::DestroyerOptions;
use converge_core::DryRunStrategy;
use converge_core::Event;
use converge_core::ObjectId;
use converge_testkit::FakeActuator;
use converge_testkit::MemoryInventoryClient;
use converge_testkit::ScriptedStatusWatcher;
use converge_testkit::manifests;
use system_tests::destroyer;
use system_tests::first_touch;
use system_tests::run_destroy;
use system_tests::seed_inventory;
use system_tests::team_inventory;

/// Projects delete events into `(identity, operation)` pairs, in order.
fn delete_sequence(events: &[Event]) -> Vec<(ObjectId, DeleteOperation)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Delete(delete) => Some((delete.id.clone(), delete.operation)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// SECTION: Destroy
// ============================================================================

/// Tests destroy deletes tracked objects and removes the record.
#[tokio::test]
async fn test_destroy_deletes_everything() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let ns = manifests::owned_by(&manifests::namespace("prod"), "team-a");
    let web = manifests::owned_by(&manifests::deployment("prod", "web"), "team-a");
    actuator.seed_live(&ns, "uid-ns");
    actuator.seed_live(&web, "uid-web");
    seed_inventory(&inventory, &info, &[ns.object_id(), web.object_id()]);

    let engine = destroyer(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events = run_destroy(&engine, info.clone(), DestroyerOptions::default()).await;

    let deletes = delete_sequence(&events);
    assert_eq!(deletes.len(), 2);
    assert!(deletes.iter().all(|(_, op)| *op == DeleteOperation::Deleted));

    // Workloads go before the namespaces that contain them.
    let web_delete = first_touch(&events, &web.object_id()).unwrap();
    let ns_delete = first_touch(&events, &ns.object_id()).unwrap();
    assert!(web_delete < ns_delete);

    assert!(actuator.live(&ns.object_id()).is_none());
    assert!(actuator.live(&web.object_id()).is_none());
    assert!(inventory.record(&info).is_none());
}

/// Tests a failed deletion keeps the record tracking the survivor.
#[tokio::test]
async fn test_destroy_keeps_record_on_failure() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let stubborn = manifests::owned_by(&manifests::config_map("default", "stubborn"), "team-a");
    let easy = manifests::owned_by(&manifests::config_map("default", "easy"), "team-a");
    actuator.seed_live(&stubborn, "uid-1");
    actuator.seed_live(&easy, "uid-2");
    actuator.fail_delete(&stubborn.object_id(), "finalizer stuck");
    seed_inventory(&inventory, &info, &[stubborn.object_id(), easy.object_id()]);

    let engine = destroyer(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events = run_destroy(&engine, info.clone(), DestroyerOptions::default()).await;

    let deletes = delete_sequence(&events);
    assert!(deletes.contains(&(easy.object_id(), DeleteOperation::Deleted)));
    assert!(deletes.contains(&(stubborn.object_id(), DeleteOperation::Failed)));

    let persisted = inventory.objects(&info).unwrap();
    assert!(persisted.contains(&stubborn.object_id()));
    assert!(!persisted.contains(&easy.object_id()));
}

/// Tests destroy dry-run deletes nothing and keeps the record.
#[tokio::test]
async fn test_destroy_dry_run_mutates_nothing() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let cm = manifests::owned_by(&manifests::config_map("default", "cm"), "team-a");
    actuator.seed_live(&cm, "uid-cm");
    seed_inventory(&inventory, &info, &[cm.object_id()]);

    let engine = destroyer(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let options = DestroyerOptions {
        dry_run: DryRunStrategy::Client,
        ..DestroyerOptions::default()
    };
    let events = run_destroy(&engine, info.clone(), options).await;

    let deletes = delete_sequence(&events);
    assert_eq!(deletes, vec![(cm.object_id(), DeleteOperation::Deleted)]);
    assert!(actuator.live(&cm.object_id()).is_some());
    assert!(inventory.record(&info).is_some());
}
