// converge-testkit/src/actuator.rs
// ============================================================================
// Module: Fake Actuator
// Description: Deterministic in-memory actuator for engine tests.
// Purpose: Script per-object outcomes and record every RPC.
// Dependencies: converge-core, async-trait
// ============================================================================

//! ## Overview
//! The fake actuator keeps a live-object store in memory. Applying a missing
//! object creates it with a stable synthetic UID; applying an existing one
//! reports unchanged or configured depending on whether the document
//! changed. Failures are scripted per identity. Every call is recorded so
//! tests can assert on actuation order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use converge_core::ActuationError;
use converge_core::Actuator;
use converge_core::ApplyOperation;
use converge_core::ApplyParams;
use converge_core::ApplyResult;
use converge_core::ObjectId;
use converge_core::ObjectUid;
use converge_core::PropagationPolicy;
use converge_core::ResourceManifest;
use serde_json::Value;

// ============================================================================
// SECTION: Recorded Actions
// ============================================================================

/// One recorded actuation RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorAction {
    /// An apply RPC for the identity.
    Applied(ObjectId),
    /// A delete RPC for the identity.
    Deleted(ObjectId),
}

// ============================================================================
// SECTION: Fake Actuator
// ============================================================================

/// Shared mutable state behind the fake.
#[derive(Debug, Default)]
struct FakeActuatorState {
    /// Live objects keyed by canonical identity form.
    live: BTreeMap<String, ResourceManifest>,
    /// Scripted apply failures keyed by canonical identity form.
    apply_failures: BTreeMap<String, String>,
    /// Scripted delete failures keyed by canonical identity form.
    delete_failures: BTreeMap<String, String>,
    /// Recorded mutating RPCs in call order.
    actions: Vec<ActuatorAction>,
    /// Counter for synthetic UIDs.
    next_uid: u64,
}

/// Deterministic in-memory [`Actuator`] for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct FakeActuator {
    /// Interior state protected by a mutex.
    state: Arc<Mutex<FakeActuatorState>>,
}

impl FakeActuator {
    /// Creates an empty fake actuator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a live object with an explicit UID.
    pub fn seed_live(&self, manifest: &ResourceManifest, uid: &str) {
        let stored = set_uid(manifest, uid);
        if let Ok(mut state) = self.state.lock() {
            state.live.insert(stored.object_id().to_string(), stored);
        }
    }

    /// Scripts an apply failure for the identity.
    pub fn fail_apply(&self, id: &ObjectId, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.apply_failures.insert(id.to_string(), message.to_string());
        }
    }

    /// Scripts a delete failure for the identity.
    pub fn fail_delete(&self, id: &ObjectId, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.delete_failures.insert(id.to_string(), message.to_string());
        }
    }

    /// Returns the recorded mutating RPCs in call order.
    #[must_use]
    pub fn actions(&self) -> Vec<ActuatorAction> {
        self.state.lock().map(|state| state.actions.clone()).unwrap_or_default()
    }

    /// Returns the live object for the identity, when present.
    #[must_use]
    pub fn live(&self, id: &ObjectId) -> Option<ResourceManifest> {
        self.state.lock().ok().and_then(|state| state.live.get(&id.to_string()).cloned())
    }
}

/// Returns a copy of the manifest with `metadata.uid` set.
fn set_uid(manifest: &ResourceManifest, uid: &str) -> ResourceManifest {
    let mut doc = manifest.value().clone();
    if let Some(root) = doc.as_object_mut() {
        let metadata =
            root.entry("metadata").or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Some(metadata) = metadata.as_object_mut() {
            metadata.insert("uid".to_string(), Value::String(uid.to_string()));
        }
    }
    ResourceManifest::new(doc)
}

#[async_trait]
impl Actuator for FakeActuator {
    async fn apply(
        &self,
        manifest: &ResourceManifest,
        params: &ApplyParams,
    ) -> Result<ApplyResult, ActuationError> {
        let id = manifest.object_id();
        let key = id.to_string();
        let mut state = self
            .state
            .lock()
            .map_err(|_| ActuationError::Failed("fake actuator mutex poisoned".to_string()))?;

        if let Some(message) = state.apply_failures.get(&key) {
            return Err(ActuationError::Failed(message.clone()));
        }

        let existing = state.live.get(&key).cloned();
        let (operation, stored) = match existing {
            None => {
                state.next_uid += 1;
                let uid = format!("uid-{}", state.next_uid);
                (ApplyOperation::Created, set_uid(manifest, &uid))
            }
            Some(live) => {
                let operation = if params.server_side {
                    ApplyOperation::ServerSideApplied
                } else if strip_uid(&live) == *manifest {
                    ApplyOperation::Unchanged
                } else {
                    ApplyOperation::Configured
                };
                let uid = live.uid().map_or_else(String::new, |uid| uid.as_str().to_string());
                (operation, set_uid(manifest, &uid))
            }
        };

        let uid = stored.uid().unwrap_or_else(|| ObjectUid::new(""));
        if !params.dry_run.is_dry_run() {
            state.live.insert(key, stored);
            state.actions.push(ActuatorAction::Applied(id));
        }
        Ok(ApplyResult { operation, uid })
    }

    async fn delete(
        &self,
        id: &ObjectId,
        _propagation: PropagationPolicy,
    ) -> Result<(), ActuationError> {
        let key = id.to_string();
        let mut state = self
            .state
            .lock()
            .map_err(|_| ActuationError::Failed("fake actuator mutex poisoned".to_string()))?;
        if let Some(message) = state.delete_failures.get(&key) {
            return Err(ActuationError::Failed(message.clone()));
        }
        state.live.remove(&key);
        state.actions.push(ActuatorAction::Deleted(id.clone()));
        Ok(())
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Value>, ActuationError> {
        let state = self
            .state
            .lock()
            .map_err(|_| ActuationError::Failed("fake actuator mutex poisoned".to_string()))?;
        Ok(state.live.get(&id.to_string()).map(|m| m.value().clone()))
    }
}

/// Returns a copy of the live object without its synthetic UID, for
/// unchanged-comparison against incoming manifests.
fn strip_uid(manifest: &ResourceManifest) -> ResourceManifest {
    let mut doc = manifest.value().clone();
    if let Some(metadata) = doc.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.remove("uid");
    }
    ResourceManifest::new(doc)
}
