// converge-core/src/runtime/state.rs
// ============================================================================
// Module: Converge Run State
// Description: Per-run resource state map and wait-condition evaluation.
// Purpose: Fold status observations and apply outcomes into one view.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The runner is the exclusive writer of the [`ResourceStateMap`] for the
//! duration of a run; wait-condition evaluation reads it on the same event
//! loop, so no locking is required. State is created lazily when an object
//! is first seen and destroyed with the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::core::errors::PendingObject;
use crate::core::events::ApplyOperation;
use crate::core::events::WaitCondition;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::ObjectUid;
use crate::core::status::ResourceStatus;
use crate::core::status::ResourceStatusUpdate;

// ============================================================================
// SECTION: Resource State
// ============================================================================

/// Latest known state of one object within the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    /// Latest observed status.
    pub status: ResourceStatus,
    /// Latest apply outcome, when an apply was attempted.
    pub last_apply: Option<ApplyOperation>,
    /// True once an RPC mutated (or would mutate) this object.
    pub actuated: bool,
    /// Server-assigned UID, when known.
    pub uid: Option<ObjectUid>,
}

// ============================================================================
// SECTION: Resource State Map
// ============================================================================

/// Per-run map of object state, exclusively owned by the runner.
#[derive(Debug, Default)]
pub struct ResourceStateMap {
    /// State entries keyed by identity.
    entries: BTreeMap<ObjectId, ResourceState>,
    /// UIDs applied during this run.
    applied_uids: HashSet<ObjectUid>,
}

impl ResourceStateMap {
    /// Creates an empty state map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state entry for an object, if it has been seen.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&ResourceState> {
        self.entries.get(id)
    }

    /// Returns the latest observed status for an object.
    #[must_use]
    pub fn status_of(&self, id: &ObjectId) -> ResourceStatus {
        self.entries.get(id).map_or(ResourceStatus::Unknown, |state| state.status)
    }

    /// Folds one status observation into the map.
    pub fn record_status(&mut self, update: &ResourceStatusUpdate) {
        let entry = self.entries.entry(update.id.clone()).or_default();
        entry.status = update.status;
    }

    /// Records a successful or failed apply outcome.
    pub fn record_apply(
        &mut self,
        id: &ObjectId,
        operation: ApplyOperation,
        uid: Option<ObjectUid>,
    ) {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.last_apply = Some(operation);
        entry.actuated = !matches!(operation, ApplyOperation::Failed | ApplyOperation::Skipped);
        if let Some(uid) = uid {
            self.applied_uids.insert(uid.clone());
            entry.uid = Some(uid);
        }
    }

    /// Records that a delete RPC was issued for an object.
    ///
    /// Deletion is asynchronous on the cluster side; the status stays
    /// whatever the watcher last reported until a `NotFound` arrives.
    pub fn record_pruned(&mut self, id: &ObjectId) {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.actuated = true;
    }

    /// Records that an object was observed absent outside the status stream.
    pub fn record_absent(&mut self, id: &ObjectId) {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.status = ResourceStatus::NotFound;
    }

    /// Returns true when the UID was applied during this run.
    #[must_use]
    pub fn uid_applied(&self, uid: &ObjectUid) -> bool {
        self.applied_uids.contains(uid)
    }

    /// Returns true when an object meets the given wait condition.
    #[must_use]
    pub fn is_met(&self, id: &ObjectId, condition: WaitCondition) -> bool {
        match condition {
            WaitCondition::AllCurrent => self.status_of(id) == ResourceStatus::Current,
            WaitCondition::AllNotFound => self.status_of(id) == ResourceStatus::NotFound,
        }
    }

    /// Returns true when every id meets the condition.
    #[must_use]
    pub fn all_met<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ObjectId>,
        condition: WaitCondition,
    ) -> bool {
        ids.into_iter().all(|id| self.is_met(id, condition))
    }

    /// Returns the ids that do not meet the condition, with last-known status.
    #[must_use]
    pub fn pending<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ObjectId>,
        condition: WaitCondition,
    ) -> Vec<PendingObject> {
        ids.into_iter()
            .filter(|id| !self.is_met(id, condition))
            .map(|id| PendingObject {
                id: id.clone(),
                status: self.status_of(id),
            })
            .collect()
    }
}
