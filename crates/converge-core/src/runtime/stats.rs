// converge-core/src/runtime/stats.rs
// ============================================================================
// Module: Converge Run Statistics
// Description: Event-stream fold producing run counters and a verdict.
// Purpose: Let callers derive overall success/failure from per-object events.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Actuation and reconciliation failures never surface as returned errors;
//! they travel on the event channel. Callers fold the stream through
//! [`RunStats`] and derive the run verdict: any failed apply or prune, any
//! reconcile timeout, or any error event means failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::events::ApplyOperation;
use crate::core::events::DeleteOperation;
use crate::core::events::Event;
use crate::core::events::PruneOperation;
use crate::core::events::WaitOperation;

// ============================================================================
// SECTION: Run Statistics
// ============================================================================

/// Counters accumulated over one run's event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Successful applies (created, unchanged, configured, merged).
    pub applied: usize,
    /// Failed applies.
    pub apply_failed: usize,
    /// Skipped applies.
    pub apply_skipped: usize,
    /// Successful prunes and deletes.
    pub pruned: usize,
    /// Failed prunes and deletes.
    pub prune_failed: usize,
    /// Skipped prunes and deletes.
    pub prune_skipped: usize,
    /// Objects that reached their wait condition.
    pub reconciled: usize,
    /// Objects still pending when a wait deadline fired.
    pub wait_timed_out: usize,
    /// Error events observed.
    pub errors: usize,
}

impl RunStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the counters.
    pub fn process(&mut self, event: &Event) {
        match event {
            Event::Apply(apply) => match apply.operation {
                ApplyOperation::Created
                | ApplyOperation::Unchanged
                | ApplyOperation::Configured
                | ApplyOperation::ServerSideApplied => self.applied += 1,
                ApplyOperation::Failed => self.apply_failed += 1,
                ApplyOperation::Skipped => self.apply_skipped += 1,
            },
            Event::Prune(prune) => match prune.operation {
                PruneOperation::Pruned => self.pruned += 1,
                PruneOperation::Failed => self.prune_failed += 1,
                PruneOperation::Skipped => self.prune_skipped += 1,
            },
            Event::Delete(delete) => match delete.operation {
                DeleteOperation::Deleted => self.pruned += 1,
                DeleteOperation::Failed => self.prune_failed += 1,
                DeleteOperation::Skipped => self.prune_skipped += 1,
            },
            Event::Wait(wait) => match wait.operation {
                WaitOperation::Reconciled => self.reconciled += 1,
                WaitOperation::TimedOut => self.wait_timed_out += 1,
                WaitOperation::Pending | WaitOperation::Skipped => {}
            },
            Event::Error(_) => self.errors += 1,
            Event::Init(_) | Event::Status(_) => {}
        }
    }

    /// Returns true when the counters indicate a failed run.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.apply_failed > 0
            || self.prune_failed > 0
            || self.wait_timed_out > 0
            || self.errors > 0
    }
}
