// converge-core/src/runtime/watch.rs
// ============================================================================
// Module: Converge Blind Watcher
// Description: No-op status watcher for dry-run configurations.
// Purpose: Elide watching when the run performs no real actuation.
// Dependencies: crate::core, crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! Dry-run configurations skip every wait task, so watching live status
//! would only burn RPCs. The blind watcher satisfies the interface with a
//! channel that closes immediately.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::core::sets::ObjectSet;
use crate::core::status::StatusEvent;
use crate::interfaces::StatusWatcher;
use crate::interfaces::WatchConfig;

// ============================================================================
// SECTION: Blind Watcher
// ============================================================================

/// Status watcher that reports nothing and closes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlindStatusWatcher;

impl StatusWatcher for BlindStatusWatcher {
    fn watch(&self, _ids: ObjectSet, _config: WatchConfig) -> mpsc::Receiver<StatusEvent> {
        let (sender, receiver) = mpsc::channel(1);
        drop(sender);
        receiver
    }
}
