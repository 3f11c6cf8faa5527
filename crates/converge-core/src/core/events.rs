// converge-core/src/core/events.rs
// ============================================================================
// Module: Converge Event Bus
// Description: Typed union of run progress events emitted to the caller.
// Purpose: Provide per-object progress with stable operations and reasons.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Every run emits a single-producer stream of typed events through one sink.
//! The `Init` event always precedes all task events; all events for task *n*
//! precede any event for task *n + 1*; the stream closes exactly once, after
//! the last task completes or upon abort. Events are the observability
//! surface of the engine: callers fold them into printers, metrics, or the
//! run statistics aggregator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::errors::ActuationError;
use crate::core::errors::RunError;
use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectId;
use crate::core::status::ResourceStatusUpdate;

// ============================================================================
// SECTION: Task Actions
// ============================================================================

/// Action class of a task in the queue.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskAction {
    /// Pre-commit the apply set into the inventory record.
    InventoryAdd,
    /// Apply a layer of desired objects.
    Apply,
    /// Wait for a layer to reach a target condition.
    Wait,
    /// Prune a layer of no-longer-desired objects.
    Prune,
    /// Rewrite the inventory to the final retained set.
    InventorySet,
    /// Remove the inventory record entirely (destroy runs).
    DeleteInventory,
}

impl TaskAction {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InventoryAdd => "inventory-add",
            Self::Apply => "apply",
            Self::Wait => "wait",
            Self::Prune => "prune",
            Self::InventorySet => "inventory-set",
            Self::DeleteInventory => "delete-inventory",
        }
    }
}

/// One entry of the up-front plan carried by the `Init` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGroup {
    /// Stable task name, e.g. `apply-0`.
    pub name: String,
    /// Action class of the task.
    pub action: TaskAction,
    /// Identities the task operates on.
    pub identifiers: Vec<ObjectId>,
}

// ============================================================================
// SECTION: Wait Conditions
// ============================================================================

/// Predicate over a set of object ids evaluated against live status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// Every object in the set reports status `Current`.
    AllCurrent,
    /// Every object in the set is gone from the cluster.
    AllNotFound,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllCurrent => f.write_str("all-current"),
            Self::AllNotFound => f.write_str("all-not-found"),
        }
    }
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Outcome of one apply attempt.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyOperation {
    /// The server created the object.
    Created,
    /// The live object already matched the manifest.
    Unchanged,
    /// The server reconfigured the object via client-side patch.
    Configured,
    /// The server merged the manifest via server-side apply.
    ServerSideApplied,
    /// The apply RPC failed.
    Failed,
    /// The object was not attempted.
    Skipped,
}

impl ApplyOperation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Configured => "configured",
            Self::ServerSideApplied => "server-side-applied",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of one prune attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PruneOperation {
    /// The object was deleted (or was already absent).
    Pruned,
    /// The prune policy retained the object.
    Skipped,
    /// The delete RPC failed.
    Failed,
}

impl PruneOperation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pruned => "pruned",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one delete attempt during a destroy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteOperation {
    /// The object was deleted (or was already absent).
    Deleted,
    /// The prune policy retained the object.
    Skipped,
    /// The delete RPC failed.
    Failed,
}

impl DeleteOperation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Progress of one object within a wait task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitOperation {
    /// The object has not reached the target condition yet.
    Pending,
    /// The object reached the target condition.
    Reconciled,
    /// The deadline fired before the object reached the condition.
    TimedOut,
    /// The object left the wait set (failed or skipped actuation).
    Skipped,
}

impl WaitOperation {
    /// Returns a stable label for the progress state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reconciled => "reconciled",
            Self::TimedOut => "timed-out",
            Self::Skipped => "skipped",
        }
    }
}

// ============================================================================
// SECTION: Skip Reasons
// ============================================================================

/// Why an apply was skipped rather than attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "reason")]
pub enum ApplySkipReason {
    /// The live object is owned by a different inventory.
    OwnedByOtherInventory {
        /// Owning inventory found on the live object, when stamped.
        owner: Option<InventoryId>,
    },
    /// A dependency of this object failed to apply.
    DependencyFailed {
        /// Failed dependency.
        dependency: ObjectId,
    },
    /// A dependency of this object was itself skipped.
    DependencySkipped {
        /// Skipped dependency.
        dependency: ObjectId,
    },
}

impl fmt::Display for ApplySkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnedByOtherInventory { owner: Some(owner) } => {
                write!(f, "object owned by inventory {owner}")
            }
            Self::OwnedByOtherInventory { owner: None } => {
                f.write_str("object exists and is not owned by this inventory")
            }
            Self::DependencyFailed { dependency } => {
                write!(f, "dependency {dependency} failed to apply")
            }
            Self::DependencySkipped { dependency } => {
                write!(f, "dependency {dependency} was skipped")
            }
        }
    }
}

/// Why a prune candidate was retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "reason")]
pub enum PruneSkipReason {
    /// The live object's UID was just applied in this run.
    JustApplied,
    /// The lifecycle directive opts the object out of pruning.
    LifecycleKeep,
    /// The object is not owned by this inventory.
    NotOwned {
        /// Owning inventory found on the live object, when stamped.
        owner: Option<InventoryId>,
    },
    /// The namespace still contains a currently-applied object.
    NamespaceInUse,
    /// A retained object depends on this candidate.
    DependentRetained {
        /// Retained dependent.
        dependent: ObjectId,
    },
}

impl fmt::Display for PruneSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JustApplied => f.write_str("object with this uid was applied in this run"),
            Self::LifecycleKeep => f.write_str("lifecycle directive on-remove: keep"),
            Self::NotOwned { owner: Some(owner) } => {
                write!(f, "object owned by inventory {owner}")
            }
            Self::NotOwned { owner: None } => {
                f.write_str("object is not owned by this inventory")
            }
            Self::NamespaceInUse => f.write_str("namespace in use"),
            Self::DependentRetained { dependent } => {
                write!(f, "retained object {dependent} depends on this object")
            }
        }
    }
}

// ============================================================================
// SECTION: Event Payloads
// ============================================================================

/// Plan announcement; always the first event of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitEvent {
    /// The ordered plan as action groups.
    pub action_groups: Vec<ActionGroup>,
}

/// Apply progress for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyEvent {
    /// Task name the event belongs to.
    pub group: String,
    /// Object identity.
    pub id: ObjectId,
    /// Apply outcome.
    pub operation: ApplyOperation,
    /// Reason when the operation is `Skipped`.
    pub reason: Option<ApplySkipReason>,
    /// Failure when the operation is `Failed`.
    pub error: Option<ActuationError>,
}

/// Wait progress for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEvent {
    /// Task name the event belongs to.
    pub group: String,
    /// Object identity.
    pub id: ObjectId,
    /// Wait progress state.
    pub operation: WaitOperation,
}

/// Prune progress for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneEvent {
    /// Task name the event belongs to.
    pub group: String,
    /// Object identity.
    pub id: ObjectId,
    /// Prune outcome.
    pub operation: PruneOperation,
    /// Reason when the operation is `Skipped`.
    pub reason: Option<PruneSkipReason>,
    /// Failure when the operation is `Failed`.
    pub error: Option<ActuationError>,
}

/// Delete progress for one object during a destroy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEvent {
    /// Task name the event belongs to.
    pub group: String,
    /// Object identity.
    pub id: ObjectId,
    /// Delete outcome.
    pub operation: DeleteOperation,
    /// Reason when the operation is `Skipped`.
    pub reason: Option<PruneSkipReason>,
    /// Failure when the operation is `Failed`.
    pub error: Option<ActuationError>,
}

/// Error delivery; terminal variants close the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// The failure being reported.
    pub error: RunError,
}

// ============================================================================
// SECTION: Event Union
// ============================================================================

/// Union of all events emitted to the caller through one sink.
///
/// # Invariants
/// - `Init` precedes all task events.
/// - Events for task *n* precede any event for task *n + 1*.
/// - The stream closes exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Plan announcement.
    Init(InitEvent),
    /// Apply progress.
    Apply(ApplyEvent),
    /// Wait progress.
    Wait(WaitEvent),
    /// Forwarded per-object status delta.
    Status(ResourceStatusUpdate),
    /// Prune progress.
    Prune(PruneEvent),
    /// Delete progress (destroy runs).
    Delete(DeleteEvent),
    /// Error delivery.
    Error(ErrorEvent),
}
