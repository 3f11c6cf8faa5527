// converge-core/src/runtime/filters.rs
// ============================================================================
// Module: Converge Actuation Filters
// Description: Apply adoption filter and the ordered prune policy engine.
// Purpose: Decide proceed/skip per object before any mutating RPC.
// Dependencies: crate::core, crate::runtime
// ============================================================================

//! ## Overview
//! Filters are ordered predicates producing typed decisions with reasons,
//! never errors: a skip is a normal outcome that the runner reports and
//! accounts for. The apply side guards adoption across inventories; the
//! prune side runs the fixed policy chain over each candidate:
//! just-applied UID, lifecycle directive, ownership, namespace retention,
//! and retained dependents, in that order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use crate::core::events::ApplySkipReason;
use crate::core::events::PruneSkipReason;
use crate::core::identifiers::InventoryId;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::ResourceManifest;
use crate::core::options::InventoryPolicy;
use crate::runtime::graph::DependencyGraph;
use crate::runtime::state::ResourceStateMap;

// ============================================================================
// SECTION: Apply Filter
// ============================================================================

/// Outcome of the apply-side filter chain for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyDecision {
    /// Apply the object.
    Proceed,
    /// Do not apply; report the reason.
    Skip(ApplySkipReason),
}

/// Decides whether a live object may be adopted and applied.
///
/// `live` is the current cluster object, when one exists. An object owned
/// by a different inventory is never adopted under the strict policy; an
/// unowned object is adoptable unless the policy is strict.
#[must_use]
pub fn evaluate_apply(
    policy: InventoryPolicy,
    inventory_id: &InventoryId,
    live: Option<&ResourceManifest>,
) -> ApplyDecision {
    let Some(live) = live else {
        // Nothing to adopt; creation is always permitted.
        return ApplyDecision::Proceed;
    };
    let owner = live.owning_inventory();
    let owned_by_us = owner.as_ref() == Some(inventory_id);
    if owned_by_us {
        return ApplyDecision::Proceed;
    }
    match policy {
        InventoryPolicy::Strict => {
            ApplyDecision::Skip(ApplySkipReason::OwnedByOtherInventory { owner })
        }
        InventoryPolicy::AdoptIfNoInventory => {
            if owner.is_none() {
                ApplyDecision::Proceed
            } else {
                ApplyDecision::Skip(ApplySkipReason::OwnedByOtherInventory { owner })
            }
        }
        InventoryPolicy::AdoptAll => ApplyDecision::Proceed,
    }
}

// ============================================================================
// SECTION: Prune Policy Engine
// ============================================================================

/// Outcome of the prune policy chain for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneDecision {
    /// Delete the object with the configured propagation policy.
    Prune,
    /// Retain the object; report the reason.
    Skip(PruneSkipReason),
}

/// Inputs shared by every candidate evaluation within one run.
#[derive(Debug)]
pub struct PruneContext<'a> {
    /// Identity of the running inventory.
    pub inventory_id: &'a InventoryId,
    /// Ownership policy for cross-inventory pruning.
    pub policy: InventoryPolicy,
    /// Per-run state; provides the current-apply UID set.
    pub state: &'a ResourceStateMap,
    /// Namespaces containing at least one currently-applied object.
    pub applied_namespaces: &'a HashSet<String>,
    /// Desired-set graph; provides dependents of prune candidates.
    pub graph: &'a DependencyGraph,
}

/// Evaluates the ordered prune policy chain for one candidate.
///
/// `live` is the current cluster object; callers handle the already-absent
/// case before evaluation.
#[must_use]
pub fn evaluate_prune(
    id: &ObjectId,
    live: &ResourceManifest,
    ctx: &PruneContext<'_>,
) -> PruneDecision {
    if let Some(uid) = live.uid() {
        if ctx.state.uid_applied(&uid) {
            return PruneDecision::Skip(PruneSkipReason::JustApplied);
        }
    }

    if live.lifecycle_keep() {
        return PruneDecision::Skip(PruneSkipReason::LifecycleKeep);
    }

    let owner = live.owning_inventory();
    let owned_by_us = owner.as_ref() == Some(ctx.inventory_id);
    if !owned_by_us && ctx.policy != InventoryPolicy::AdoptAll {
        return PruneDecision::Skip(PruneSkipReason::NotOwned { owner });
    }

    if id.kind == "Namespace" && ctx.applied_namespaces.contains(&id.name) {
        return PruneDecision::Skip(PruneSkipReason::NamespaceInUse);
    }

    if let Some(dependent) = ctx.graph.external_dependents_of(id).first() {
        return PruneDecision::Skip(PruneSkipReason::DependentRetained {
            dependent: dependent.clone(),
        });
    }

    PruneDecision::Prune
}
