// converge-core/src/core/errors.rs
// ============================================================================
// Module: Converge Error Taxonomy
// Description: Typed errors carried on the event stream and across interfaces.
// Purpose: Give every failure class a stable, inspectable representation.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Converge distinguishes six failure classes: validation, dependency,
//! actuation, reconciliation timeout, inventory, and cancellation. Actuation
//! and reconciliation errors travel on the event channel with per-object
//! granularity; only validation-exit-early and inventory errors terminate a
//! run. All error types here are comparable so tests can assert on emitted
//! events structurally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::events::WaitCondition;
use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::ObjectIdError;
use crate::core::manifest::ManifestError;
use crate::core::status::ResourceStatus;

// ============================================================================
// SECTION: Actuation Errors
// ============================================================================

/// Per-object create/patch/delete failure reported by the actuator.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuationError {
    /// The object does not exist on the cluster.
    #[error("object not found: {0}")]
    NotFound(ObjectId),
    /// The server rejected the mutation due to a conflict.
    #[error("actuation conflict: {0}")]
    Conflict(String),
    /// The RPC failed.
    #[error("actuation failed: {0}")]
    Failed(String),
}

// ============================================================================
// SECTION: Inventory Errors
// ============================================================================

/// Inventory load/store failure. Fatal to the run.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Loaded record's id label does not match the supplied id.
    #[error("inventory id mismatch (expected {expected}, got {})", inventory_label(.actual))]
    IdMismatch {
        /// Identity supplied by the caller.
        expected: InventoryId,
        /// Identity found on the loaded record.
        actual: Option<InventoryId>,
    },
    /// Compare-and-set write lost a race; retriable by a subsequent run.
    #[error("inventory write conflict: {0}")]
    Conflict(String),
    /// Persisted payload failed to parse back into an object set.
    #[error("inventory record corrupt: {0}")]
    Corrupt(#[from] ObjectIdError),
    /// Underlying store failure.
    #[error("inventory store failure: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Dependency Errors
// ============================================================================

/// Dependency-graph failure. Fatal at solve time.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The depends-on graph contains a cycle.
    #[error("dependency cycle: {}", format_cycle(.0))]
    Cycle(Vec<ObjectId>),
    /// A depends-on entry references an object outside the desired set.
    #[error("unresolved dependency {reference} on {object}")]
    UnresolvedReference {
        /// Object carrying the annotation.
        object: Box<ObjectId>,
        /// Referenced identity that could not be resolved.
        reference: Box<ObjectId>,
    },
    /// Dependency annotation failed to parse.
    #[error(transparent)]
    Annotation(#[from] ManifestError),
}

/// Renders a cycle as `a -> b -> a` for the error message.
fn format_cycle(ids: &[ObjectId]) -> String {
    let mut rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
    if let Some(first) = rendered.first().cloned() {
        rendered.push(first);
    }
    rendered.join(" -> ")
}

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Malformed-input failure for a single desired object.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identity field violates an invariant.
    #[error(transparent)]
    Id(#[from] ObjectIdError),
    /// Manifest metadata failed to parse.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// Two desired objects share the same identity.
    #[error("duplicate object id: {0}")]
    Duplicate(ObjectId),
    /// The object depends on an object that was excluded as invalid.
    #[error("dependency {dependency} of {object} was excluded as invalid")]
    InvalidDependency {
        /// Dependent object.
        object: ObjectId,
        /// Excluded dependency.
        dependency: ObjectId,
    },
}

/// Validation failure paired with the offending object, when derivable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for {}: {error}", object_label(.object))]
pub struct ValidationFailure {
    /// Offending identity; `None` when identity itself is unreadable.
    pub object: Option<ObjectId>,
    /// Underlying failure.
    pub error: ValidationError,
}

/// Renders the offending identity, or a placeholder when unreadable.
fn object_label(object: &Option<ObjectId>) -> String {
    object.as_ref().map_or_else(|| "<unknown object>".to_string(), ToString::to_string)
}

/// Renders an optional inventory identity, or a placeholder when absent.
fn inventory_label(id: &Option<InventoryId>) -> String {
    id.as_ref().map_or_else(|| "<none>".to_string(), ToString::to_string)
}

// ============================================================================
// SECTION: Reconciliation Timeout
// ============================================================================

/// Object still pending when a wait deadline fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingObject {
    /// Pending identity.
    pub id: ObjectId,
    /// Last-known status at the deadline.
    pub status: ResourceStatus,
}

/// Wait condition not met within the deadline. Not fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timed out waiting for {condition} ({} pending)", pending.len())]
pub struct TimeoutError {
    /// Condition that was being waited for.
    pub condition: WaitCondition,
    /// Objects that did not reach the target condition.
    pub pending: Vec<PendingObject>,
}

// ============================================================================
// SECTION: Run Errors
// ============================================================================

/// Union of failures delivered through `Error` events.
///
/// Dependency, inventory, and cancellation errors are terminal. Timeout and
/// watcher errors are informational. Validation errors are informational
/// here; under the exit-early policy the runner aborts after emitting them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// Dependency cycle or unresolved reference.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Inventory load/store failure.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    /// Wait condition not met within its deadline.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    /// Status watcher reported a failure.
    #[error("status watcher failure: {0}")]
    Watcher(String),
    /// The run was cancelled by the caller.
    #[error("run cancelled")]
    Cancelled,
}

impl RunError {
    /// Returns true when the error terminates the run unconditionally.
    ///
    /// Validation errors report false because their terminality depends on
    /// the configured validation policy.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        match self {
            Self::Graph(_) | Self::Inventory(_) | Self::Cancelled => true,
            Self::Validation(_) | Self::Timeout(_) | Self::Watcher(_) => false,
        }
    }
}
