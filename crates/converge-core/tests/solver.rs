// converge-core/tests/solver.rs
// ============================================================================
// Module: Task-Queue Solver Tests
// Description: Tests for the canonical task sequence and wait elision.
// ============================================================================
//! ## Overview
//! Validates queue shapes across single-layer, multi-layer, pruning,
//! dry-run, definition-gating, and destroy configurations.

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
use converge_core::DestroyerOptions;
use converge_core::DryRunStrategy;
use converge_core::ObjectId;
use converge_core::ObjectSet;
use converge_core::ResourceManifest;
use converge_core::Task;
use converge_core::TaskAction;
use converge_core::WaitCondition;
use converge_core::runtime::solve_apply;
use converge_core::runtime::solve_destroy;
use serde_json::json;

/// Builds a config-map manifest.
fn cm(name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "default" },
    }))
}

/// Builds a definition manifest.
fn crd(name: &str) -> ResourceManifest {
    ResourceManifest::new(json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": { "name": name },
    }))
}

/// Returns the action sequence of a queue.
fn actions(tasks: &[Task]) -> Vec<TaskAction> {
    tasks.iter().map(Task::action).collect()
}

// ============================================================================
// SECTION: Apply Queues
// ============================================================================

/// Tests a single independent layer elides the wait.
#[test]
fn test_single_layer_without_timeout_has_no_wait() {
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![cm("a"), cm("b")]],
        Vec::new(),
        &ApplierOptions::default(),
    );
    assert_eq!(
        actions(&tasks),
        vec![TaskAction::InventoryAdd, TaskAction::Apply, TaskAction::InventorySet]
    );
}

/// Tests an explicit reconcile timeout adds the wait on a single layer.
#[test]
fn test_single_layer_with_timeout_waits() {
    let options = ApplierOptions {
        reconcile_timeout: Some(Duration::from_secs(30)),
        ..ApplierOptions::default()
    };
    let tasks = solve_apply(ObjectSet::new(), vec![vec![cm("a")]], Vec::new(), &options);
    assert_eq!(
        actions(&tasks),
        vec![
            TaskAction::InventoryAdd,
            TaskAction::Apply,
            TaskAction::Wait,
            TaskAction::InventorySet,
        ]
    );
}

/// Tests multiple layers interleave waits even without a timeout.
#[test]
fn test_multi_layer_waits_between_layers() {
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![cm("b")], vec![cm("a")]],
        Vec::new(),
        &ApplierOptions::default(),
    );
    assert_eq!(
        actions(&tasks),
        vec![
            TaskAction::InventoryAdd,
            TaskAction::Apply,
            TaskAction::Wait,
            TaskAction::Apply,
            TaskAction::Wait,
            TaskAction::InventorySet,
        ]
    );
}

/// Tests a zero timeout disables waits outright.
#[test]
fn test_zero_timeout_disables_waits() {
    let options = ApplierOptions {
        reconcile_timeout: Some(Duration::ZERO),
        ..ApplierOptions::default()
    };
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![cm("b")], vec![cm("a")]],
        Vec::new(),
        &options,
    );
    assert_eq!(
        actions(&tasks),
        vec![
            TaskAction::InventoryAdd,
            TaskAction::Apply,
            TaskAction::Apply,
            TaskAction::InventorySet,
        ]
    );
}

/// Tests definitions split into their own gated apply task.
#[test]
fn test_definitions_split_and_gate() {
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![crd("widgets.example.com"), cm("a")]],
        Vec::new(),
        &ApplierOptions::default(),
    );
    let sequence = actions(&tasks);
    assert_eq!(
        sequence,
        vec![
            TaskAction::InventoryAdd,
            TaskAction::Apply,
            TaskAction::Wait,
            TaskAction::Apply,
            TaskAction::Wait,
            TaskAction::InventorySet,
        ]
    );
    let Task::Apply(first) = &tasks[1] else {
        panic!("expected apply task");
    };
    assert_eq!(first.objects.len(), 1);
    assert_eq!(first.objects[0].kind(), "CustomResourceDefinition");
    let Task::Wait(gate) = &tasks[2] else {
        panic!("expected wait task");
    };
    assert_eq!(gate.condition, WaitCondition::AllCurrent);
}

/// Tests pruning appends prune tasks without waits by default.
#[test]
fn test_prune_without_timeout_has_no_wait() {
    let prune = vec![vec![ObjectId::new("", "ConfigMap", "default", "old")]];
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![cm("a")]],
        prune,
        &ApplierOptions::default(),
    );
    assert_eq!(
        actions(&tasks),
        vec![
            TaskAction::InventoryAdd,
            TaskAction::Apply,
            TaskAction::Prune,
            TaskAction::InventorySet,
        ]
    );
}

/// Tests a prune timeout adds not-found waits after each prune layer.
#[test]
fn test_prune_timeout_adds_wait() {
    let options = ApplierOptions {
        prune_timeout: Some(Duration::from_secs(20)),
        ..ApplierOptions::default()
    };
    let prune = vec![vec![ObjectId::new("", "ConfigMap", "default", "old")]];
    let tasks = solve_apply(ObjectSet::new(), vec![vec![cm("a")]], prune, &options);
    let waits: Vec<&Task> =
        tasks.iter().filter(|t| t.action() == TaskAction::Wait).collect();
    assert_eq!(waits.len(), 1);
    let Task::Wait(wait) = waits[0] else {
        panic!("expected wait task");
    };
    assert_eq!(wait.condition, WaitCondition::AllNotFound);
}

/// Tests dry-run elides every wait.
#[test]
fn test_dry_run_elides_waits() {
    let options = ApplierOptions {
        dry_run: DryRunStrategy::Client,
        reconcile_timeout: Some(Duration::from_secs(30)),
        prune_timeout: Some(Duration::from_secs(30)),
        ..ApplierOptions::default()
    };
    let prune = vec![vec![ObjectId::new("", "ConfigMap", "default", "old")]];
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![crd("widgets.example.com")], vec![cm("a")]],
        prune,
        &options,
    );
    assert!(tasks.iter().all(|t| t.action() != TaskAction::Wait));
}

/// Tests pruning disabled drops prune tasks.
#[test]
fn test_prune_disabled() {
    let options = ApplierOptions {
        prune: false,
        ..ApplierOptions::default()
    };
    let prune = vec![vec![ObjectId::new("", "ConfigMap", "default", "old")]];
    let tasks = solve_apply(ObjectSet::new(), vec![vec![cm("a")]], prune, &options);
    assert!(tasks.iter().all(|t| t.action() != TaskAction::Prune));
}

/// Tests task names are unique and stable.
#[test]
fn test_task_names_are_stable() {
    let tasks = solve_apply(
        ObjectSet::new(),
        vec![vec![cm("b")], vec![cm("a")]],
        Vec::new(),
        &ApplierOptions::default(),
    );
    let names: Vec<&str> = tasks.iter().map(Task::name).collect();
    assert_eq!(
        names,
        vec!["inventory-add-0", "apply-0", "wait-0", "apply-1", "wait-1", "inventory-set-0"]
    );
}

// ============================================================================
// SECTION: Destroy Queues
// ============================================================================

/// Tests a destroy queue prunes then removes the record.
#[test]
fn test_destroy_queue_shape() {
    let layers = vec![
        vec![ObjectId::new("apps", "Deployment", "prod", "web")],
        vec![ObjectId::new("", "Namespace", "", "prod")],
    ];
    let tasks = solve_destroy(layers, &DestroyerOptions::default());
    assert_eq!(
        actions(&tasks),
        vec![TaskAction::Prune, TaskAction::Prune, TaskAction::DeleteInventory]
    );
}

/// Tests destroy waits appear only with a delete timeout.
#[test]
fn test_destroy_with_timeout_waits() {
    let options = DestroyerOptions {
        delete_timeout: Some(Duration::from_secs(10)),
        ..DestroyerOptions::default()
    };
    let layers = vec![vec![ObjectId::new("", "Namespace", "", "prod")]];
    let tasks = solve_destroy(layers, &options);
    assert_eq!(
        actions(&tasks),
        vec![TaskAction::Prune, TaskAction::Wait, TaskAction::DeleteInventory]
    );
}
