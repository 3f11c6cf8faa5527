// converge-testkit/src/watcher.rs
// ============================================================================
// Module: Scripted Status Watchers
// Description: Deterministic status-stream fakes for engine tests.
// Purpose: Feed scripted or hand-driven status sequences into the runner.
// Dependencies: converge-core, tokio
// ============================================================================

//! ## Overview
//! Two fakes cover the two test shapes. [`ScriptedStatusWatcher`] preloads a
//! fixed event sequence and closes the stream afterwards; use it for flows
//! that reconcile. [`ManualStatusWatcher`] keeps the stream open and hands
//! the test a feed handle; use it for deadline and cancellation flows where
//! the watcher must stay silent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use converge_core::ObjectId;
use converge_core::ObjectSet;
use converge_core::ResourceStatus;
use converge_core::ResourceStatusUpdate;
use converge_core::StatusEvent;
use converge_core::StatusWatcher;
use converge_core::WatchConfig;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Scripted Watcher
// ============================================================================

/// Watcher that replays a fixed sequence and then closes the stream.
#[derive(Debug, Default, Clone)]
pub struct ScriptedStatusWatcher {
    /// Events handed out on the next `watch` call.
    script: Arc<Mutex<Vec<StatusEvent>>>,
}

impl ScriptedStatusWatcher {
    /// Creates a watcher that will replay the given events once.
    #[must_use]
    pub fn new(events: Vec<StatusEvent>) -> Self {
        Self {
            script: Arc::new(Mutex::new(events)),
        }
    }
}

impl StatusWatcher for ScriptedStatusWatcher {
    fn watch(&self, _ids: ObjectSet, _config: WatchConfig) -> mpsc::Receiver<StatusEvent> {
        let events = self.script.lock().map(|mut script| std::mem::take(&mut *script));
        let events = events.unwrap_or_default();
        let (sender, receiver) = mpsc::channel(events.len().max(1));
        for event in events {
            let _ = sender.try_send(event);
        }
        receiver
    }
}

// ============================================================================
// SECTION: Manual Watcher
// ============================================================================

/// Feed handle for driving a [`ManualStatusWatcher`] from a test.
#[derive(Debug, Clone)]
pub struct StatusFeed {
    /// Sender side of the watch stream.
    sender: Arc<Mutex<Option<mpsc::Sender<StatusEvent>>>>,
}

impl StatusFeed {
    /// Sends one status event into the active watch stream.
    ///
    /// Events sent before `watch` was called are dropped.
    pub async fn send(&self, event: StatusEvent) {
        let sender = self.sender.lock().ok().and_then(|guard| (*guard).clone());
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }

    /// Closes the stream, as a real watcher does on cancellation.
    pub fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}

/// Watcher whose stream stays open until the test closes the feed.
#[derive(Debug, Default, Clone)]
pub struct ManualStatusWatcher {
    /// Shared sender slot filled by `watch`.
    sender: Arc<Mutex<Option<mpsc::Sender<StatusEvent>>>>,
}

impl ManualStatusWatcher {
    /// Creates an idle manual watcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the feed handle driving the stream.
    #[must_use]
    pub fn feed(&self) -> StatusFeed {
        StatusFeed {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl StatusWatcher for ManualStatusWatcher {
    fn watch(&self, _ids: ObjectSet, _config: WatchConfig) -> mpsc::Receiver<StatusEvent> {
        let (sender, receiver) = mpsc::channel(64);
        if let Ok(mut guard) = self.sender.lock() {
            *guard = Some(sender);
        }
        receiver
    }
}

// ============================================================================
// SECTION: Event Helpers
// ============================================================================

/// Builds a per-object status update event.
#[must_use]
pub fn status_update(id: &ObjectId, status: ResourceStatus) -> StatusEvent {
    StatusEvent::Resource(ResourceStatusUpdate {
        id: id.clone(),
        status,
        message: status.as_str().to_string(),
        generated: Vec::new(),
    })
}
