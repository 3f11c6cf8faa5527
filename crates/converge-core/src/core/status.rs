// converge-core/src/core/status.rs
// ============================================================================
// Module: Converge Resource Status
// Description: Observed status values and status-stream events.
// Purpose: Model the live status feedback consumed by wait evaluation.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A status watcher observes live objects and produces a stream of
//! [`StatusEvent`] values. Per-object event order is monotonic; cross-object
//! order is unspecified. Watcher failures are delivered in-band as error
//! events so the runner can surface them without tearing down the stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ObjectId;

// ============================================================================
// SECTION: Resource Status
// ============================================================================

/// Observed reconciliation status of a live object.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceStatus {
    /// Status has not been observed yet.
    #[default]
    Unknown,
    /// The object is progressing toward its desired generation.
    InProgress,
    /// Observed generation matches desired and health signals are green.
    Current,
    /// The object reports a failure condition.
    Failed,
    /// The object is absent from the cluster.
    NotFound,
    /// The object is being deleted.
    Terminating,
}

impl ResourceStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::InProgress => "in-progress",
            Self::Current => "current",
            Self::Failed => "failed",
            Self::NotFound => "not-found",
            Self::Terminating => "terminating",
        }
    }
}

// ============================================================================
// SECTION: Status Events
// ============================================================================

/// One observation delivered by a status watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum StatusEvent {
    /// Per-object status update.
    Resource(ResourceStatusUpdate),
    /// Watcher-level failure delivered in-band.
    Error(WatcherError),
}

/// Status observation for a single object.
///
/// # Invariants
/// - Updates for one object arrive in monotonic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatusUpdate {
    /// Observed object identity.
    pub id: ObjectId,
    /// Observed status.
    pub status: ResourceStatus,
    /// Human-readable detail for the observation.
    pub message: String,
    /// Sub-resources generated by the observed object, when known.
    #[serde(default)]
    pub generated: Vec<ObjectId>,
}

/// Watcher failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherError {
    /// Failure detail.
    pub message: String,
}
