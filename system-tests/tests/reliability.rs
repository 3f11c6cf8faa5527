// system-tests/tests/reliability.rs
// ============================================================================
// Module: Reliability Scenarios
// Description: Failure propagation, dependent skipping, and cancellation.
// ============================================================================
//! ## Overview
//! Validates that per-object failures never abort the queue, that dependents
//! of failed applies are skipped rather than attempted, and that
//! cancellation surfaces a terminal error and closes the stream.

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

use std::time::Duration;

use converge_core::ApplierOptions;
use converge_core::ApplyOperation;
use converge_core::ApplySkipReason;
use converge_core::Event;
use converge_core::PruneOperation;
use converge_core::ResourceStatus;
use converge_core::RunError;
use converge_testkit::FakeActuator;
use converge_testkit::ManualStatusWatcher;
use converge_testkit::MemoryInventoryClient;
use converge_testkit::ScriptedStatusWatcher;
use converge_testkit::manifests;
use converge_testkit::status_update;
use system_tests::applier;
use system_tests::apply_sequence;
use system_tests::collect;
use system_tests::error_sequence;
use system_tests::prune_sequence;
use system_tests::run_apply;
use system_tests::seed_inventory;
use system_tests::team_inventory;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Apply Failures
// ============================================================================

/// Tests a failed apply skips its dependents and the run continues.
#[tokio::test]
async fn test_failed_apply_skips_dependents() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let b = manifests::config_map("default", "b");
    let a = manifests::depends_on(&manifests::config_map("default", "a"), &[b.object_id()]);
    let standalone = manifests::config_map("default", "standalone");
    actuator.fail_apply(&b.object_id(), "server said no");

    // Only the standalone object ever reconciles; the failed object and its
    // dependent leave the wait sets.
    let watcher = ScriptedStatusWatcher::new(vec![status_update(
        &standalone.object_id(),
        ResourceStatus::Current,
    )]);
    let engine = applier(&actuator, watcher, &inventory);
    let events = run_apply(
        &engine,
        info.clone(),
        vec![a.clone(), b.clone(), standalone.clone()],
        ApplierOptions::default(),
    )
    .await;

    let applies = apply_sequence(&events);
    assert!(applies.contains(&(b.object_id(), ApplyOperation::Failed)));
    assert!(applies.contains(&(a.object_id(), ApplyOperation::Skipped)));
    assert!(applies.contains(&(standalone.object_id(), ApplyOperation::Created)));

    let skip = events
        .iter()
        .find_map(|event| match event {
            Event::Apply(apply) if apply.id == a.object_id() => apply.reason.clone(),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        skip,
        ApplySkipReason::DependencyFailed {
            dependency: b.object_id(),
        }
    );

    // The failed and skipped objects stay recorded by the pre-commit write.
    let persisted = inventory.objects(&info).unwrap();
    assert!(persisted.contains(&b.object_id()));
    assert!(persisted.contains(&a.object_id()));
}

/// Tests a failed prune retains the object in the final record.
#[tokio::test]
async fn test_failed_prune_retains_object() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let stale = manifests::owned_by(&manifests::config_map("default", "stale"), "team-a");
    actuator.seed_live(&stale, "uid-stale");
    actuator.fail_delete(&stale.object_id(), "deletion refused");
    seed_inventory(&inventory, &info, &[stale.object_id()]);

    let keep = manifests::config_map("default", "keep");
    let engine = applier(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events =
        run_apply(&engine, info.clone(), vec![keep.clone()], ApplierOptions::default()).await;

    assert_eq!(
        prune_sequence(&events),
        vec![(stale.object_id(), PruneOperation::Failed)]
    );
    let persisted = inventory.objects(&info).unwrap();
    assert!(persisted.contains(&stale.object_id()));
    assert!(persisted.contains(&keep.object_id()));
}

/// Tests a prune candidate already absent counts as pruned.
#[tokio::test]
async fn test_absent_candidate_counts_as_pruned() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let ghost = manifests::config_map("default", "ghost");
    seed_inventory(&inventory, &info, &[ghost.object_id()]);

    let keep = manifests::config_map("default", "keep");
    let engine = applier(&actuator, ScriptedStatusWatcher::new(Vec::new()), &inventory);
    let events =
        run_apply(&engine, info.clone(), vec![keep], ApplierOptions::default()).await;

    assert_eq!(
        prune_sequence(&events),
        vec![(ghost.object_id(), PruneOperation::Pruned)]
    );
    let persisted = inventory.objects(&info).unwrap();
    assert!(!persisted.contains(&ghost.object_id()));
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Tests cancellation during a wait emits a terminal error and closes.
#[tokio::test]
async fn test_cancellation_during_wait() {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let info = team_inventory("team-a");

    let a = manifests::config_map("default", "a");
    let watcher = ManualStatusWatcher::new();
    let engine = applier(&actuator, watcher, &inventory);

    let cancel = CancellationToken::new();
    let options = ApplierOptions {
        // An unbounded wait keeps the runner parked on the status stream.
        reconcile_timeout: Some(Duration::from_secs(3600)),
        ..ApplierOptions::default()
    };
    let rx = engine.run(info, vec![a], options, cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });
    let events = collect(rx).await;
    canceller.await.unwrap();

    let errors = error_sequence(&events);
    assert_eq!(errors.last(), Some(&RunError::Cancelled));
}
