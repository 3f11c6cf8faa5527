// converge-core/src/core/options.rs
// ============================================================================
// Module: Converge Run Options
// Description: Apply and destroy configuration with enumerated policies.
// Purpose: Provide serializable options with safe defaults.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Options configure a single run. All fields have defaults so a caller can
//! start from [`ApplierOptions::default`] and override selectively; the
//! structs round-trip through serde for configuration files. Timeouts are
//! optional durations: `None` means "not requested" and a zero duration
//! disables the wait outright.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Policy Enums
// ============================================================================

/// Dry-run strategy for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DryRunStrategy {
    /// Actuate normally.
    #[default]
    None,
    /// Evaluate locally; no RPCs mutate the cluster.
    Client,
    /// Send mutations with the server-side dry-run flag.
    Server,
}

impl DryRunStrategy {
    /// Returns true when the strategy suppresses real mutation.
    #[must_use]
    pub const fn is_dry_run(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Deletion propagation policy passed to the actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationPolicy {
    /// Delete dependents before the owner.
    Foreground,
    /// Delete the owner and let the garbage collector reap dependents.
    #[default]
    Background,
    /// Orphan dependents.
    Orphan,
}

impl PropagationPolicy {
    /// Returns a stable label for the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Orphan => "orphan",
        }
    }
}

/// Ownership policy for adopting and pruning objects across inventories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryPolicy {
    /// Only objects owned by this inventory may be mutated.
    #[default]
    Strict,
    /// Unowned objects may be adopted; foreign-owned objects may not.
    AdoptIfNoInventory,
    /// Any object may be adopted or pruned.
    AdoptAll,
}

/// Behavior when desired objects fail validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Abort before any actuation.
    #[default]
    ExitEarly,
    /// Exclude invalid objects (and their dependents) from the queue.
    SkipInvalid,
}

// ============================================================================
// SECTION: Applier Options
// ============================================================================

/// Default status poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApplierOptions {
    /// Use server-side apply instead of client-side patching.
    pub server_side: bool,
    /// Field manager name sent with server-side applies.
    pub field_manager: String,
    /// Force ownership conflicts on server-side apply.
    pub force_conflicts: bool,
    /// Per-wait timeout after each apply layer.
    pub reconcile_timeout: Option<Duration>,
    /// Status poll cadence handed to the watcher.
    pub poll_interval: Duration,
    /// Forward per-object status deltas to the caller.
    pub emit_status_events: bool,
    /// Enable post-apply pruning.
    pub prune: bool,
    /// Dry-run strategy.
    pub dry_run: DryRunStrategy,
    /// Deletion propagation policy for pruning.
    pub prune_propagation: PropagationPolicy,
    /// Per-wait timeout after each prune layer.
    pub prune_timeout: Option<Duration>,
    /// Ownership policy.
    pub inventory_policy: InventoryPolicy,
    /// Validation failure policy.
    pub validation_policy: ValidationPolicy,
}

impl Default for ApplierOptions {
    fn default() -> Self {
        Self {
            server_side: false,
            field_manager: "converge".to_string(),
            force_conflicts: false,
            reconcile_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            emit_status_events: false,
            prune: true,
            dry_run: DryRunStrategy::None,
            prune_propagation: PropagationPolicy::default(),
            prune_timeout: None,
            inventory_policy: InventoryPolicy::default(),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Destroyer Options
// ============================================================================

/// Configuration for a destroy run. Destroy always prunes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DestroyerOptions {
    /// Per-wait timeout after each delete layer.
    pub delete_timeout: Option<Duration>,
    /// Deletion propagation policy.
    pub delete_propagation: PropagationPolicy,
    /// Status poll cadence handed to the watcher.
    pub poll_interval: Duration,
    /// Forward per-object status deltas to the caller.
    pub emit_status_events: bool,
    /// Dry-run strategy.
    pub dry_run: DryRunStrategy,
    /// Ownership policy.
    pub inventory_policy: InventoryPolicy,
}

impl Default for DestroyerOptions {
    fn default() -> Self {
        Self {
            delete_timeout: None,
            delete_propagation: PropagationPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            emit_status_events: false,
            dry_run: DryRunStrategy::None,
            inventory_policy: InventoryPolicy::default(),
        }
    }
}
