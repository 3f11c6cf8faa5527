// converge-core/src/runtime/solver.rs
// ============================================================================
// Module: Converge Task-Queue Solver
// Description: Builds the ordered task queue from layered plans and options.
// Purpose: Encode the canonical inventory/apply/wait/prune sequence.
// Dependencies: crate::core, crate::runtime::task
// ============================================================================

//! ## Overview
//! The solver turns layered apply and prune plans into a linear task queue:
//! inventory pre-commit, apply layers each optionally followed by a
//! reconcile wait, prune layers in reverse order each optionally followed by
//! a not-found wait, the final inventory rewrite, and (for destroy runs) the
//! record removal. Definitions get special treatment: custom resource
//! definitions are split into their own apply task followed by a wait to
//! `Current`, so custom resources only apply once their definitions are
//! established.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::events::WaitCondition;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::ResourceManifest;
use crate::core::options::ApplierOptions;
use crate::core::options::DestroyerOptions;
use crate::core::sets::ObjectSet;
use crate::runtime::task::ApplyTask;
use crate::runtime::task::DeleteInventoryTask;
use crate::runtime::task::InventoryAddTask;
use crate::runtime::task::InventorySetTask;
use crate::runtime::task::PruneTask;
use crate::runtime::task::Task;
use crate::runtime::task::WaitTask;

// ============================================================================
// SECTION: Name Counters
// ============================================================================

/// Per-kind counters producing stable task names like `apply-0`.
#[derive(Debug, Default)]
struct TaskNames {
    /// Apply task counter.
    apply: usize,
    /// Wait task counter, shared across apply and prune waits.
    wait: usize,
    /// Prune task counter.
    prune: usize,
}

impl TaskNames {
    /// Returns the next apply task name.
    fn next_apply(&mut self) -> String {
        let name = format!("apply-{}", self.apply);
        self.apply += 1;
        name
    }

    /// Returns the next wait task name.
    fn next_wait(&mut self) -> String {
        let name = format!("wait-{}", self.wait);
        self.wait += 1;
        name
    }

    /// Returns the next prune task name.
    fn next_prune(&mut self) -> String {
        let name = format!("prune-{}", self.prune);
        self.prune += 1;
        name
    }
}

// ============================================================================
// SECTION: Apply Queue
// ============================================================================

/// Returns true when the timeout value disables waiting outright.
fn wait_disabled(timeout: Option<Duration>) -> bool {
    timeout == Some(Duration::ZERO)
}

/// Splits one apply layer into definition and non-definition sub-layers.
fn split_definitions(layer: Vec<ResourceManifest>) -> (Vec<ResourceManifest>, Vec<ResourceManifest>) {
    layer.into_iter().partition(|m| m.kind() == "CustomResourceDefinition")
}

/// Builds the task queue for an apply run.
///
/// `record_set` is the pre-commit inventory content (prior ∪ desired);
/// `apply_layers` is the layered apply plan in topological order;
/// `prune_layers` is the reverse-layered prune plan.
#[must_use]
pub fn solve_apply(
    record_set: ObjectSet,
    apply_layers: Vec<Vec<ResourceManifest>>,
    prune_layers: Vec<Vec<ObjectId>>,
    options: &ApplierOptions,
) -> Vec<Task> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut names = TaskNames::default();
    let dry_run = options.dry_run.is_dry_run();

    tasks.push(Task::InventoryAdd(InventoryAddTask {
        name: "inventory-add-0".to_string(),
        objects: record_set,
    }));

    // Definition splitting can grow the number of apply tasks, so the
    // single-layer wait elision is decided against the expanded plan.
    let mut apply_plan: Vec<(Vec<ResourceManifest>, bool)> = Vec::new();
    for layer in apply_layers {
        let (definitions, rest) = split_definitions(layer);
        if !definitions.is_empty() {
            apply_plan.push((definitions, true));
        }
        if !rest.is_empty() {
            apply_plan.push((rest, false));
        }
    }

    let reconcile_waits_enabled = !dry_run
        && !wait_disabled(options.reconcile_timeout)
        && (apply_plan.len() > 1 || options.reconcile_timeout.is_some());

    let plan_len = apply_plan.len();
    for (index, (layer, gates_definitions)) in apply_plan.into_iter().enumerate() {
        let ids: Vec<_> = layer.iter().map(ResourceManifest::object_id).collect();
        tasks.push(Task::Apply(ApplyTask {
            name: names.next_apply(),
            objects: layer,
        }));
        // The definition gate protects whatever applies afterwards; a
        // trailing definition layer has nothing to protect.
        let gate = gates_definitions && index + 1 < plan_len;
        let wait_wanted = reconcile_waits_enabled
            || (gate && !dry_run && !wait_disabled(options.reconcile_timeout));
        if wait_wanted {
            tasks.push(Task::Wait(WaitTask {
                name: names.next_wait(),
                ids,
                condition: WaitCondition::AllCurrent,
                timeout: options.reconcile_timeout,
            }));
        }
    }

    if options.prune {
        let prune_waits_enabled = !dry_run
            && options.prune_timeout.is_some()
            && !wait_disabled(options.prune_timeout);
        for layer in prune_layers {
            if layer.is_empty() {
                continue;
            }
            let ids = layer.clone();
            tasks.push(Task::Prune(PruneTask {
                name: names.next_prune(),
                ids: layer,
                destroy: false,
            }));
            if prune_waits_enabled {
                tasks.push(Task::Wait(WaitTask {
                    name: names.next_wait(),
                    ids,
                    condition: WaitCondition::AllNotFound,
                    timeout: options.prune_timeout,
                }));
            }
        }
    }

    tasks.push(Task::InventorySet(InventorySetTask {
        name: "inventory-set-0".to_string(),
    }));

    tasks
}

// ============================================================================
// SECTION: Destroy Queue
// ============================================================================

/// Builds the task queue for a destroy run.
///
/// Destroy is a degenerate configuration of the same engine: every tracked
/// object is pruned in reverse order and the record itself is removed last.
#[must_use]
pub fn solve_destroy(
    prune_layers: Vec<Vec<ObjectId>>,
    options: &DestroyerOptions,
) -> Vec<Task> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut names = TaskNames::default();
    let dry_run = options.dry_run.is_dry_run();
    let waits_enabled =
        !dry_run && options.delete_timeout.is_some() && !wait_disabled(options.delete_timeout);

    for layer in prune_layers {
        if layer.is_empty() {
            continue;
        }
        let ids = layer.clone();
        tasks.push(Task::Prune(PruneTask {
            name: names.next_prune(),
            ids: layer,
            destroy: true,
        }));
        if waits_enabled {
            tasks.push(Task::Wait(WaitTask {
                name: names.next_wait(),
                ids,
                condition: WaitCondition::AllNotFound,
                timeout: options.delete_timeout,
            }));
        }
    }

    tasks.push(Task::DeleteInventory(DeleteInventoryTask {
        name: "delete-inventory-0".to_string(),
    }));

    tasks
}
