// converge-core/src/runtime/applier.rs
// ============================================================================
// Module: Converge Applier and Destroyer
// Description: Top-level run entry points over the consumed interfaces.
// Purpose: Wire validation, inventory, solving, and the runner into one run.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tokio
// ============================================================================

//! ## Overview
//! An [`Applier`] drives the cluster toward a desired set: create or update
//! what is present, prune what disappeared, and optionally wait for health.
//! A [`Destroyer`] is the degenerate configuration that prunes everything the
//! inventory tracks and removes the record. Both are built from the three
//! consumed interfaces through a builder that fails on missing components,
//! and both return a bounded event channel that closes exactly once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::errors::RunError;
use crate::core::events::ErrorEvent;
use crate::core::events::Event;
use crate::core::events::InitEvent;
use crate::core::identifiers::ObjectId;
use crate::core::inventory::InventoryInfo;
use crate::core::manifest::ResourceManifest;
use crate::core::options::ApplierOptions;
use crate::core::options::DestroyerOptions;
use crate::core::options::ValidationPolicy;
use crate::core::sets::ObjectSet;
use crate::interfaces::Actuator;
use crate::interfaces::ApplyParams;
use crate::interfaces::InventoryClient;
use crate::interfaces::StatusWatcher;
use crate::interfaces::WatchConfig;
use crate::runtime::graph::DependencyGraph;
use crate::runtime::graph::prune_layers;
use crate::runtime::inventory::InventoryStore;
use crate::runtime::runner::EventSender;
use crate::runtime::runner::RunnerConfig;
use crate::runtime::runner::TaskRunner;
use crate::runtime::solver::solve_apply;
use crate::runtime::solver::solve_destroy;
use crate::runtime::task::action_groups;
use crate::runtime::validate::validate_manifests;
use crate::runtime::watch::BlindStatusWatcher;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Outbound event channel capacity; status deltas drop beyond this.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Errors raised when assembling an applier or destroyer.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// No actuator was provided.
    #[error("actuator is not configured")]
    MissingActuator,
    /// No status watcher was provided.
    #[error("status watcher is not configured")]
    MissingStatusWatcher,
    /// No inventory client was provided.
    #[error("inventory client is not configured")]
    MissingInventoryClient,
}

/// Builder for [`Applier`] and [`Destroyer`].
///
/// # Invariants
/// - `build` succeeds only when all three interfaces are configured.
#[derive(Default)]
pub struct EngineBuilder {
    /// Cluster client performing actuation RPCs.
    actuator: Option<Arc<dyn Actuator + Send + Sync>>,
    /// Live status observer.
    watcher: Option<Arc<dyn StatusWatcher + Send + Sync>>,
    /// Inventory persistence.
    inventory: Option<Arc<dyn InventoryClient + Send + Sync>>,
}

impl EngineBuilder {
    /// Registers the actuator.
    #[must_use]
    pub fn actuator(mut self, actuator: impl Actuator + Send + Sync + 'static) -> Self {
        self.actuator = Some(Arc::new(actuator));
        self
    }

    /// Registers the status watcher.
    #[must_use]
    pub fn status_watcher(mut self, watcher: impl StatusWatcher + Send + Sync + 'static) -> Self {
        self.watcher = Some(Arc::new(watcher));
        self
    }

    /// Registers the inventory client.
    #[must_use]
    pub fn inventory_client(
        mut self,
        inventory: impl InventoryClient + Send + Sync + 'static,
    ) -> Self {
        self.inventory = Some(Arc::new(inventory));
        self
    }

    /// Builds an applier.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError`] when a component is missing.
    pub fn build_applier(self) -> Result<Applier, BuilderError> {
        let components = self.components()?;
        Ok(Applier { components })
    }

    /// Builds a destroyer.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError`] when a component is missing.
    pub fn build_destroyer(self) -> Result<Destroyer, BuilderError> {
        let components = self.components()?;
        Ok(Destroyer { components })
    }

    /// Validates and extracts the configured components.
    fn components(self) -> Result<Components, BuilderError> {
        Ok(Components {
            actuator: self.actuator.ok_or(BuilderError::MissingActuator)?,
            watcher: self.watcher.ok_or(BuilderError::MissingStatusWatcher)?,
            inventory: self.inventory.ok_or(BuilderError::MissingInventoryClient)?,
        })
    }
}

/// Shared interface implementations behind one run.
#[derive(Clone)]
struct Components {
    /// Cluster client.
    actuator: Arc<dyn Actuator + Send + Sync>,
    /// Live status observer.
    watcher: Arc<dyn StatusWatcher + Send + Sync>,
    /// Inventory persistence.
    inventory: Arc<dyn InventoryClient + Send + Sync>,
}

// ============================================================================
// SECTION: Applier
// ============================================================================

/// Declarative apply/prune engine entry point.
pub struct Applier {
    /// Configured interface implementations.
    components: Components,
}

impl Applier {
    /// Returns a builder for the engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Starts an apply run and returns its event stream.
    ///
    /// The call returns immediately; the run executes on a spawned task and
    /// the returned channel closes exactly once, after the last task
    /// completes or upon abort.
    #[must_use]
    pub fn run(
        &self,
        info: InventoryInfo,
        manifests: Vec<ResourceManifest>,
        options: ApplierOptions,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let components = self.components.clone();
        tokio::spawn(async move {
            execute_apply(components, info, manifests, options, cancel, EventSender::new(tx))
                .await;
        });
        rx
    }
}

/// Runs one apply to completion; all failures surface as events.
async fn execute_apply(
    components: Components,
    info: InventoryInfo,
    manifests: Vec<ResourceManifest>,
    options: ApplierOptions,
    cancel: CancellationToken,
    events: EventSender,
) {
    // Inventory templates name the record; they are never applied.
    let manifests: Vec<ResourceManifest> =
        manifests.into_iter().filter(|m| !m.is_inventory_template()).collect();

    let validated = validate_manifests(&manifests);
    for failure in &validated.failures {
        events
            .send(Event::Error(ErrorEvent {
                error: RunError::Validation(failure.clone()),
            }))
            .await;
    }
    if !validated.failures.is_empty() && options.validation_policy == ValidationPolicy::ExitEarly {
        return;
    }
    let objects = validated.valid;

    let store = InventoryStore::new(components.inventory);
    let session = match store.load(&info).await {
        Ok(session) => session,
        Err(error) => {
            events
                .send(Event::Error(ErrorEvent {
                    error: RunError::Inventory(error),
                }))
                .await;
            return;
        }
    };

    let desired: ObjectSet = objects.iter().map(ResourceManifest::object_id).collect();
    let prune_set = session.prior().difference(&desired);

    let graph = match DependencyGraph::build(&objects, session.prior()) {
        Ok(graph) => graph,
        Err(error) => {
            events
                .send(Event::Error(ErrorEvent {
                    error: RunError::Graph(error),
                }))
                .await;
            return;
        }
    };
    let layer_ids = match graph.sort_layers() {
        Ok(layers) => layers,
        Err(error) => {
            events
                .send(Event::Error(ErrorEvent {
                    error: RunError::Graph(error),
                }))
                .await;
            return;
        }
    };

    let mut by_id: HashMap<ObjectId, ResourceManifest> =
        objects.into_iter().map(|m| (m.object_id(), m)).collect();
    let apply_layers: Vec<Vec<ResourceManifest>> = layer_ids
        .into_iter()
        .map(|layer| layer.into_iter().filter_map(|id| by_id.remove(&id)).collect())
        .collect();
    let prune_plan =
        if options.prune { prune_layers(&prune_set) } else { Vec::new() };

    let record_set = session.prior().union(&desired);
    let tasks = solve_apply(record_set, apply_layers, prune_plan, &options);

    events
        .send(Event::Init(InitEvent {
            action_groups: action_groups(&tasks),
        }))
        .await;

    let watch_scope = desired.union(&prune_set);
    let watch_config = WatchConfig {
        poll_interval: options.poll_interval,
    };
    let status_rx = if options.dry_run.is_dry_run() {
        BlindStatusWatcher.watch(watch_scope, watch_config)
    } else {
        components.watcher.watch(watch_scope, watch_config)
    };

    let config = RunnerConfig {
        inventory_id: info.id.clone(),
        inventory_policy: options.inventory_policy,
        apply_params: ApplyParams {
            server_side: options.server_side,
            field_manager: options.field_manager.clone(),
            force_conflicts: options.force_conflicts,
            dry_run: options.dry_run,
        },
        dry_run: options.dry_run,
        propagation: options.prune_propagation,
        emit_status_events: options.emit_status_events,
    };
    let runner = TaskRunner::new(
        components.actuator,
        store,
        config,
        events,
        cancel,
        status_rx,
        desired,
        graph,
    );
    runner.run(tasks, session).await;
}

// ============================================================================
// SECTION: Destroyer
// ============================================================================

/// Full tear-down entry point; prunes everything the inventory tracks.
pub struct Destroyer {
    /// Configured interface implementations.
    components: Components,
}

impl Destroyer {
    /// Returns a builder for the engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Starts a destroy run and returns its event stream.
    #[must_use]
    pub fn run(
        &self,
        info: InventoryInfo,
        options: DestroyerOptions,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let components = self.components.clone();
        tokio::spawn(async move {
            execute_destroy(components, info, options, cancel, EventSender::new(tx)).await;
        });
        rx
    }
}

/// Runs one destroy to completion; all failures surface as events.
async fn execute_destroy(
    components: Components,
    info: InventoryInfo,
    options: DestroyerOptions,
    cancel: CancellationToken,
    events: EventSender,
) {
    let store = InventoryStore::new(components.inventory);
    let session = match store.load(&info).await {
        Ok(session) => session,
        Err(error) => {
            events
                .send(Event::Error(ErrorEvent {
                    error: RunError::Inventory(error),
                }))
                .await;
            return;
        }
    };

    let candidates = session.prior().clone();
    let tasks = solve_destroy(prune_layers(&candidates), &options);

    events
        .send(Event::Init(InitEvent {
            action_groups: action_groups(&tasks),
        }))
        .await;

    let watch_config = WatchConfig {
        poll_interval: options.poll_interval,
    };
    let status_rx = if options.dry_run.is_dry_run() {
        BlindStatusWatcher.watch(candidates.clone(), watch_config)
    } else {
        components.watcher.watch(candidates, watch_config)
    };

    let config = RunnerConfig {
        inventory_id: info.id.clone(),
        inventory_policy: options.inventory_policy,
        apply_params: ApplyParams {
            server_side: false,
            field_manager: "converge".to_string(),
            force_conflicts: false,
            dry_run: options.dry_run,
        },
        dry_run: options.dry_run,
        propagation: options.delete_propagation,
        emit_status_events: options.emit_status_events,
    };
    let runner = TaskRunner::new(
        components.actuator,
        store,
        config,
        events,
        cancel,
        status_rx,
        ObjectSet::new(),
        DependencyGraph::default(),
    );
    runner.run(tasks, session).await;
}
