// converge-core/src/runtime/runner.rs
// ============================================================================
// Module: Converge Task Runner
// Description: Serial task execution merged with the live status stream.
// Purpose: Drive the queue while folding status, deadlines, and cancellation.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tokio
// ============================================================================

//! ## Overview
//! The runner pulls tasks one at a time; tasks never overlap. Concurrently it
//! owns the outbound event channel and the inbound status stream: every
//! status observation updates the per-run state map (the runner is its
//! exclusive writer), and while a wait task is active each observation
//! re-evaluates the wait condition. Backpressure drops only status deltas;
//! Init, Apply, Wait, Prune, Delete, and Error events always go through.
//!
//! Failure semantics: a failed apply removes the object from the wait set
//! and skips its transitive dependents; a failed prune retains the object;
//! an inventory write failure aborts the queue. Cancellation aborts the
//! current task at its next suspension point and emits a terminal error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::errors::ActuationError;
use crate::core::errors::RunError;
use crate::core::errors::TimeoutError;
use crate::core::events::ApplyEvent;
use crate::core::events::ApplyOperation;
use crate::core::events::ApplySkipReason;
use crate::core::events::DeleteEvent;
use crate::core::events::DeleteOperation;
use crate::core::events::ErrorEvent;
use crate::core::events::Event;
use crate::core::events::PruneEvent;
use crate::core::events::PruneOperation;
use crate::core::events::PruneSkipReason;
use crate::core::events::WaitCondition;
use crate::core::events::WaitEvent;
use crate::core::events::WaitOperation;
use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::OWNING_INVENTORY_ANNOTATION;
use crate::core::manifest::ResourceManifest;
use crate::core::options::DryRunStrategy;
use crate::core::options::InventoryPolicy;
use crate::core::options::PropagationPolicy;
use crate::core::sets::ObjectSet;
use crate::core::status::StatusEvent;
use crate::interfaces::Actuator;
use crate::interfaces::ApplyParams;
use crate::runtime::filters::ApplyDecision;
use crate::runtime::filters::PruneContext;
use crate::runtime::filters::PruneDecision;
use crate::runtime::filters::evaluate_apply;
use crate::runtime::filters::evaluate_prune;
use crate::runtime::graph::DependencyGraph;
use crate::runtime::inventory::InventorySession;
use crate::runtime::inventory::InventoryStore;
use crate::runtime::state::ResourceStateMap;
use crate::runtime::task::ApplyTask;
use crate::runtime::task::PruneTask;
use crate::runtime::task::Task;
use crate::runtime::task::WaitTask;

// ============================================================================
// SECTION: Event Sender
// ============================================================================

/// Outbound event channel with the backpressure policy applied.
#[derive(Clone)]
pub(crate) struct EventSender {
    /// Channel to the caller.
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Wraps an outbound channel.
    pub(crate) const fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Sends a must-deliver event, waiting for channel capacity.
    pub(crate) async fn send(&self, event: Event) {
        let _ = self.tx.send(event).await;
    }

    /// Sends a status delta; dropped when the channel is full.
    pub(crate) fn send_status(&self, event: Event) {
        let _ = self.tx.try_send(event);
    }

    /// Returns true when the caller dropped the receiving side.
    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// SECTION: Runner Configuration
// ============================================================================

/// Distilled per-run configuration shared by apply and destroy.
#[derive(Debug, Clone)]
pub(crate) struct RunnerConfig {
    /// Identity of the running inventory.
    pub inventory_id: InventoryId,
    /// Ownership policy.
    pub inventory_policy: InventoryPolicy,
    /// Apply RPC parameters.
    pub apply_params: ApplyParams,
    /// Dry-run strategy.
    pub dry_run: DryRunStrategy,
    /// Deletion propagation policy.
    pub propagation: PropagationPolicy,
    /// Forward status deltas to the caller.
    pub emit_status_events: bool,
}

/// Control flow after a task: keep pulling tasks or abort the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Pull the next task.
    Continue,
    /// Stop; a terminal condition was already reported.
    Abort,
}

// ============================================================================
// SECTION: Task Runner
// ============================================================================

/// Executes one solved queue against the actuator and inventory store.
pub(crate) struct TaskRunner {
    /// Cluster client.
    actuator: Arc<dyn Actuator + Send + Sync>,
    /// Inventory persistence facade.
    store: InventoryStore,
    /// Per-run configuration.
    config: RunnerConfig,
    /// Outbound events.
    events: EventSender,
    /// Caller-supplied cancellation signal.
    cancel: CancellationToken,
    /// Inbound status stream.
    status_rx: mpsc::Receiver<StatusEvent>,
    /// True once the status stream closed.
    status_closed: bool,
    /// Per-run object state; the runner is the exclusive writer.
    state: ResourceStateMap,
    /// Desired identities for this run.
    desired: ObjectSet,
    /// Desired-set dependency graph.
    graph: DependencyGraph,
    /// Namespaces containing a currently-applied object.
    applied_namespaces: HashSet<String>,
    /// Pending skip reasons for dependents of failed or skipped objects.
    dependent_skips: HashMap<ObjectId, ApplySkipReason>,
    /// Objects skipped by the ownership filter; excluded from the record.
    foreign: ObjectSet,
    /// Prune candidates actually removed.
    pruned: ObjectSet,
    /// Prune candidates retained by policy or failure.
    retained: ObjectSet,
}

impl TaskRunner {
    /// Creates a runner over the run-scoped collaborators.
    #[allow(clippy::too_many_arguments, reason = "run-scoped wiring happens once")]
    pub(crate) fn new(
        actuator: Arc<dyn Actuator + Send + Sync>,
        store: InventoryStore,
        config: RunnerConfig,
        events: EventSender,
        cancel: CancellationToken,
        status_rx: mpsc::Receiver<StatusEvent>,
        desired: ObjectSet,
        graph: DependencyGraph,
    ) -> Self {
        let applied_namespaces =
            desired.iter().map(|id| id.namespace.clone()).filter(|ns| !ns.is_empty()).collect();
        Self {
            actuator,
            store,
            config,
            events,
            cancel,
            status_rx,
            status_closed: false,
            state: ResourceStateMap::new(),
            desired,
            graph,
            applied_namespaces,
            dependent_skips: HashMap::new(),
            foreign: ObjectSet::new(),
            pruned: ObjectSet::new(),
            retained: ObjectSet::new(),
        }
    }

    /// Executes the queue to completion, abort, or cancellation.
    pub(crate) async fn run(mut self, tasks: Vec<Task>, mut session: InventorySession) {
        for task in tasks {
            if self.check_cancelled().await {
                return;
            }
            if self.events.is_closed() {
                return;
            }
            let flow = match task {
                Task::InventoryAdd(_) => self.run_inventory_add(&mut session).await,
                Task::Apply(task) => self.run_apply(&task).await,
                Task::Wait(task) => self.run_wait(&task).await,
                Task::Prune(task) => self.run_prune(&task).await,
                Task::InventorySet(_) => self.run_inventory_set(&mut session).await,
                Task::DeleteInventory(_) => self.run_delete_inventory(&mut session).await,
            };
            if flow == Flow::Abort {
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Inventory tasks
    // ------------------------------------------------------------------

    /// Pre-commits the union record before any actuation.
    async fn run_inventory_add(&mut self, session: &mut InventorySession) -> Flow {
        let dry_run = self.config.dry_run.is_dry_run();
        match self.store.merge(session, &self.desired, dry_run).await {
            Ok(_prune_set) => Flow::Continue,
            Err(error) => {
                self.events
                    .send(Event::Error(ErrorEvent {
                        error: RunError::Inventory(error),
                    }))
                    .await;
                Flow::Abort
            }
        }
    }

    /// Writes the final retained set.
    ///
    /// Everything that was or may still be live stays recorded: the prior
    /// and desired sets minus what was actually pruned, minus objects the
    /// ownership filter refused to claim.
    async fn run_inventory_set(&mut self, session: &mut InventorySession) -> Flow {
        let final_set = session
            .prior()
            .union(&self.desired)
            .difference(&self.pruned)
            .difference(&self.foreign);
        let dry_run = self.config.dry_run.is_dry_run();
        match self.store.store(session, &final_set, dry_run).await {
            Ok(()) => Flow::Continue,
            Err(error) => {
                self.events
                    .send(Event::Error(ErrorEvent {
                        error: RunError::Inventory(error),
                    }))
                    .await;
                Flow::Abort
            }
        }
    }

    /// Removes the record, or keeps it tracking retained objects.
    async fn run_delete_inventory(&mut self, session: &mut InventorySession) -> Flow {
        let survivors = session.prior().difference(&self.pruned);
        let dry_run = self.config.dry_run.is_dry_run();
        match self.store.delete(session, &survivors, dry_run).await {
            Ok(()) => Flow::Continue,
            Err(error) => {
                self.events
                    .send(Event::Error(ErrorEvent {
                        error: RunError::Inventory(error),
                    }))
                    .await;
                Flow::Abort
            }
        }
    }

    // ------------------------------------------------------------------
    // Apply task
    // ------------------------------------------------------------------

    /// Applies one layer of manifests in order.
    async fn run_apply(&mut self, task: &ApplyTask) -> Flow {
        for manifest in &task.objects {
            self.drain_status().await;
            if self.check_cancelled().await {
                return Flow::Abort;
            }
            let id = manifest.object_id();

            if let Some(reason) = self.dependent_skips.get(&id).cloned() {
                self.state.record_apply(&id, ApplyOperation::Skipped, None);
                self.skip_dependents(&id, false);
                self.events
                    .send(Event::Apply(ApplyEvent {
                        group: task.name.clone(),
                        id,
                        operation: ApplyOperation::Skipped,
                        reason: Some(reason),
                        error: None,
                    }))
                    .await;
                continue;
            }

            let live = match self.actuator.get(&id).await {
                Ok(value) => value.map(ResourceManifest::new),
                Err(error) => {
                    self.state.record_apply(&id, ApplyOperation::Failed, None);
                    self.skip_dependents(&id, true);
                    self.events
                        .send(Event::Apply(ApplyEvent {
                            group: task.name.clone(),
                            id,
                            operation: ApplyOperation::Failed,
                            reason: None,
                            error: Some(error),
                        }))
                        .await;
                    continue;
                }
            };

            match evaluate_apply(
                self.config.inventory_policy,
                &self.config.inventory_id,
                live.as_ref(),
            ) {
                ApplyDecision::Skip(reason) => {
                    self.state.record_apply(&id, ApplyOperation::Skipped, None);
                    self.foreign.insert(id.clone());
                    self.skip_dependents(&id, false);
                    self.events
                        .send(Event::Apply(ApplyEvent {
                            group: task.name.clone(),
                            id,
                            operation: ApplyOperation::Skipped,
                            reason: Some(reason),
                            error: None,
                        }))
                        .await;
                }
                ApplyDecision::Proceed => {
                    // Stamp ownership so a later run can tell this object
                    // apart from one actuated by a different inventory.
                    let stamped = manifest.with_annotation(
                        OWNING_INVENTORY_ANNOTATION,
                        self.config.inventory_id.as_str(),
                    );
                    match self.actuator.apply(&stamped, &self.config.apply_params).await {
                        Ok(result) => {
                            self.state.record_apply(&id, result.operation, Some(result.uid));
                            self.events
                                .send(Event::Apply(ApplyEvent {
                                    group: task.name.clone(),
                                    id,
                                    operation: result.operation,
                                    reason: None,
                                    error: None,
                                }))
                                .await;
                        }
                        Err(error) => {
                            self.state.record_apply(&id, ApplyOperation::Failed, None);
                            self.skip_dependents(&id, true);
                            self.events
                                .send(Event::Apply(ApplyEvent {
                                    group: task.name.clone(),
                                    id,
                                    operation: ApplyOperation::Failed,
                                    reason: None,
                                    error: Some(error),
                                }))
                                .await;
                        }
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Marks every transitive dependent of `id` for skipping.
    fn skip_dependents(&mut self, id: &ObjectId, failed: bool) {
        for dependent in self.graph.transitive_dependents(id) {
            let reason = if failed {
                ApplySkipReason::DependencyFailed {
                    dependency: id.clone(),
                }
            } else {
                ApplySkipReason::DependencySkipped {
                    dependency: id.clone(),
                }
            };
            self.dependent_skips.entry(dependent).or_insert(reason);
        }
    }

    // ------------------------------------------------------------------
    // Wait task
    // ------------------------------------------------------------------

    /// Waits until the condition holds for the active set or the deadline fires.
    async fn run_wait(&mut self, task: &WaitTask) -> Flow {
        // Objects that failed or were skipped leave the wait set so the
        // condition cannot block on them.
        let mut active: Vec<ObjectId> = Vec::new();
        for id in &task.ids {
            let excluded = match task.condition {
                WaitCondition::AllCurrent => matches!(
                    self.state.get(id).and_then(|s| s.last_apply),
                    Some(ApplyOperation::Failed | ApplyOperation::Skipped)
                ),
                WaitCondition::AllNotFound => self.retained.contains(id),
            };
            if excluded {
                self.events
                    .send(Event::Wait(WaitEvent {
                        group: task.name.clone(),
                        id: id.clone(),
                        operation: WaitOperation::Skipped,
                    }))
                    .await;
            } else {
                active.push(id.clone());
            }
        }

        let mut met: HashSet<ObjectId> = HashSet::new();
        for id in &active {
            if self.state.is_met(id, task.condition) {
                met.insert(id.clone());
                self.events
                    .send(Event::Wait(WaitEvent {
                        group: task.name.clone(),
                        id: id.clone(),
                        operation: WaitOperation::Reconciled,
                    }))
                    .await;
            } else {
                self.events
                    .send(Event::Wait(WaitEvent {
                        group: task.name.clone(),
                        id: id.clone(),
                        operation: WaitOperation::Pending,
                    }))
                    .await;
            }
        }

        let deadline = task.timeout.map(|timeout| Instant::now() + timeout);
        while met.len() < active.len() {
            if self.status_closed {
                return self.finish_wait_timeout(task, &active, &met).await;
            }
            let signal = tokio::select! {
                () = self.cancel.cancelled() => WaitSignal::Cancelled,
                () = deadline_sleep(deadline) => WaitSignal::Deadline,
                event = self.status_rx.recv() => WaitSignal::Status(event),
            };
            match signal {
                WaitSignal::Cancelled => {
                    self.events
                        .send(Event::Error(ErrorEvent {
                            error: RunError::Cancelled,
                        }))
                        .await;
                    return Flow::Abort;
                }
                WaitSignal::Deadline => {
                    return self.finish_wait_timeout(task, &active, &met).await;
                }
                WaitSignal::Status(Some(event)) => self.ingest(event).await,
                WaitSignal::Status(None) => {
                    self.status_closed = true;
                    continue;
                }
            }
            for id in &active {
                if !met.contains(id) && self.state.is_met(id, task.condition) {
                    met.insert(id.clone());
                    self.events
                        .send(Event::Wait(WaitEvent {
                            group: task.name.clone(),
                            id: id.clone(),
                            operation: WaitOperation::Reconciled,
                        }))
                        .await;
                }
            }
        }
        Flow::Continue
    }

    /// Reports a wait deadline expiry and lets the queue continue.
    async fn finish_wait_timeout(
        &mut self,
        task: &WaitTask,
        active: &[ObjectId],
        met: &HashSet<ObjectId>,
    ) -> Flow {
        let unmet: Vec<ObjectId> =
            active.iter().filter(|id| !met.contains(*id)).cloned().collect();
        for id in &unmet {
            self.events
                .send(Event::Wait(WaitEvent {
                    group: task.name.clone(),
                    id: id.clone(),
                    operation: WaitOperation::TimedOut,
                }))
                .await;
        }
        let pending = self.state.pending(unmet.iter(), task.condition);
        self.events
            .send(Event::Error(ErrorEvent {
                error: RunError::Timeout(TimeoutError {
                    condition: task.condition,
                    pending,
                }),
            }))
            .await;
        Flow::Continue
    }

    // ------------------------------------------------------------------
    // Prune task
    // ------------------------------------------------------------------

    /// Evaluates and prunes one layer of candidates in order.
    async fn run_prune(&mut self, task: &PruneTask) -> Flow {
        for id in &task.ids {
            self.drain_status().await;
            if self.check_cancelled().await {
                return Flow::Abort;
            }

            let live = match self.actuator.get(id).await {
                Ok(Some(value)) => ResourceManifest::new(value),
                Ok(None) => {
                    // Already absent; nothing to delete, nothing to retain.
                    self.state.record_absent(id);
                    self.pruned.insert(id.clone());
                    self.emit_removal(task, id, RemovalOutcome::Removed, None, None).await;
                    continue;
                }
                Err(error) => {
                    self.retained.insert(id.clone());
                    self.emit_removal(task, id, RemovalOutcome::Failed, None, Some(error)).await;
                    continue;
                }
            };

            let decision = {
                let ctx = PruneContext {
                    inventory_id: &self.config.inventory_id,
                    policy: self.config.inventory_policy,
                    state: &self.state,
                    applied_namespaces: &self.applied_namespaces,
                    graph: &self.graph,
                };
                evaluate_prune(id, &live, &ctx)
            };

            match decision {
                PruneDecision::Skip(reason) => {
                    self.retained.insert(id.clone());
                    self.emit_removal(task, id, RemovalOutcome::Skipped, Some(reason), None).await;
                }
                PruneDecision::Prune => {
                    if self.config.dry_run.is_dry_run() {
                        self.pruned.insert(id.clone());
                        self.emit_removal(task, id, RemovalOutcome::Removed, None, None).await;
                        continue;
                    }
                    match self.actuator.delete(id, self.config.propagation).await {
                        Ok(()) => {
                            self.state.record_pruned(id);
                            self.pruned.insert(id.clone());
                            self.emit_removal(task, id, RemovalOutcome::Removed, None, None).await;
                        }
                        Err(error) => {
                            self.retained.insert(id.clone());
                            self.emit_removal(
                                task,
                                id,
                                RemovalOutcome::Failed,
                                None,
                                Some(error),
                            )
                            .await;
                        }
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Emits a prune or delete event depending on the run kind.
    async fn emit_removal(
        &mut self,
        task: &PruneTask,
        id: &ObjectId,
        outcome: RemovalOutcome,
        reason: Option<PruneSkipReason>,
        error: Option<ActuationError>,
    ) {
        let event = if task.destroy {
            Event::Delete(DeleteEvent {
                group: task.name.clone(),
                id: id.clone(),
                operation: match outcome {
                    RemovalOutcome::Removed => DeleteOperation::Deleted,
                    RemovalOutcome::Skipped => DeleteOperation::Skipped,
                    RemovalOutcome::Failed => DeleteOperation::Failed,
                },
                reason,
                error,
            })
        } else {
            Event::Prune(PruneEvent {
                group: task.name.clone(),
                id: id.clone(),
                operation: match outcome {
                    RemovalOutcome::Removed => PruneOperation::Pruned,
                    RemovalOutcome::Skipped => PruneOperation::Skipped,
                    RemovalOutcome::Failed => PruneOperation::Failed,
                },
                reason,
                error,
            })
        };
        self.events.send(event).await;
    }

    // ------------------------------------------------------------------
    // Status ingestion and cancellation
    // ------------------------------------------------------------------

    /// Folds one status observation into run state and forwards the delta.
    async fn ingest(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::Resource(update) => {
                self.state.record_status(&update);
                if self.config.emit_status_events {
                    self.events.send_status(Event::Status(update));
                }
            }
            StatusEvent::Error(error) => {
                self.events
                    .send(Event::Error(ErrorEvent {
                        error: RunError::Watcher(error.message),
                    }))
                    .await;
            }
        }
    }

    /// Drains any queued status observations without blocking.
    async fn drain_status(&mut self) {
        loop {
            match self.status_rx.try_recv() {
                Ok(event) => self.ingest(event).await,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.status_closed = true;
                    break;
                }
            }
        }
    }

    /// Reports cancellation once and signals the caller to stop.
    async fn check_cancelled(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.events
                .send(Event::Error(ErrorEvent {
                    error: RunError::Cancelled,
                }))
                .await;
            return true;
        }
        false
    }
}

/// What woke the wait loop.
#[derive(Debug)]
enum WaitSignal {
    /// The caller cancelled the run.
    Cancelled,
    /// The wait deadline fired.
    Deadline,
    /// A status observation arrived, or the stream closed.
    Status(Option<StatusEvent>),
}

/// Outcome classification shared by prune and delete event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalOutcome {
    /// The object was deleted or already absent.
    Removed,
    /// The policy retained the object.
    Skipped,
    /// The delete RPC failed.
    Failed,
}

/// Sleeps until the deadline, or forever when no deadline is set.
async fn deadline_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
