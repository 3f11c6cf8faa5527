// converge-core/src/runtime/task.rs
// ============================================================================
// Module: Converge Tasks
// Description: Closed variant of queue tasks with stable names and actions.
// Purpose: Carry the solved plan into the runner and the Init announcement.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Tasks are a closed variant rather than a trait hierarchy: the set of task
//! kinds is fixed by the engine, and a closed enum keeps conversion to the
//! up-front [`ActionGroup`] plan trivial. The runner drives execution; tasks
//! only describe the work.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::events::ActionGroup;
use crate::core::events::TaskAction;
use crate::core::events::WaitCondition;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::ResourceManifest;
use crate::core::sets::ObjectSet;

// ============================================================================
// SECTION: Task Variants
// ============================================================================

/// Pre-commit the union of prior and desired sets into the inventory record.
#[derive(Debug, Clone)]
pub struct InventoryAddTask {
    /// Stable task name.
    pub name: String,
    /// Objects to record.
    pub objects: ObjectSet,
}

/// Apply one layer of desired manifests, in order.
#[derive(Debug, Clone)]
pub struct ApplyTask {
    /// Stable task name.
    pub name: String,
    /// Manifests to apply, already in deterministic order.
    pub objects: Vec<ResourceManifest>,
}

/// Wait for a set of identities to reach a target condition.
#[derive(Debug, Clone)]
pub struct WaitTask {
    /// Stable task name.
    pub name: String,
    /// Identities being waited for.
    pub ids: Vec<ObjectId>,
    /// Target condition.
    pub condition: WaitCondition,
    /// Deadline; `None` waits until the stream ends or cancellation.
    pub timeout: Option<Duration>,
}

/// Prune one layer of no-longer-desired identities, in order.
#[derive(Debug, Clone)]
pub struct PruneTask {
    /// Stable task name.
    pub name: String,
    /// Identities to evaluate for pruning.
    pub ids: Vec<ObjectId>,
    /// True for destroy runs; emits Delete events instead of Prune.
    pub destroy: bool,
}

/// Rewrite the inventory record to the final retained set.
#[derive(Debug, Clone)]
pub struct InventorySetTask {
    /// Stable task name.
    pub name: String,
}

/// Remove the inventory record entirely; destroy runs only.
#[derive(Debug, Clone)]
pub struct DeleteInventoryTask {
    /// Stable task name.
    pub name: String,
}

// ============================================================================
// SECTION: Task Union
// ============================================================================

/// One unit of ordered work in the queue.
///
/// # Invariants
/// - Task names are unique within a queue.
#[derive(Debug, Clone)]
pub enum Task {
    /// Inventory pre-commit.
    InventoryAdd(InventoryAddTask),
    /// Apply a layer.
    Apply(ApplyTask),
    /// Wait on a layer.
    Wait(WaitTask),
    /// Prune a layer.
    Prune(PruneTask),
    /// Final inventory rewrite.
    InventorySet(InventorySetTask),
    /// Inventory record removal.
    DeleteInventory(DeleteInventoryTask),
}

impl Task {
    /// Returns the stable task name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::InventoryAdd(task) => &task.name,
            Self::Apply(task) => &task.name,
            Self::Wait(task) => &task.name,
            Self::Prune(task) => &task.name,
            Self::InventorySet(task) => &task.name,
            Self::DeleteInventory(task) => &task.name,
        }
    }

    /// Returns the action class.
    #[must_use]
    pub const fn action(&self) -> TaskAction {
        match self {
            Self::InventoryAdd(_) => TaskAction::InventoryAdd,
            Self::Apply(_) => TaskAction::Apply,
            Self::Wait(_) => TaskAction::Wait,
            Self::Prune(_) => TaskAction::Prune,
            Self::InventorySet(_) => TaskAction::InventorySet,
            Self::DeleteInventory(_) => TaskAction::DeleteInventory,
        }
    }

    /// Returns the identities the task operates on.
    #[must_use]
    pub fn identifiers(&self) -> Vec<ObjectId> {
        match self {
            Self::InventoryAdd(task) => task.objects.to_sorted_vec(),
            Self::Apply(task) => {
                task.objects.iter().map(ResourceManifest::object_id).collect()
            }
            Self::Wait(task) => task.ids.clone(),
            Self::Prune(task) => task.ids.clone(),
            Self::InventorySet(_) | Self::DeleteInventory(_) => Vec::new(),
        }
    }

    /// Converts the task to its plan announcement form.
    #[must_use]
    pub fn action_group(&self) -> ActionGroup {
        ActionGroup {
            name: self.name().to_string(),
            action: self.action(),
            identifiers: self.identifiers(),
        }
    }
}

/// Converts a queue into the plan carried by the `Init` event.
#[must_use]
pub fn action_groups(tasks: &[Task]) -> Vec<ActionGroup> {
    tasks.iter().map(Task::action_group).collect()
}
