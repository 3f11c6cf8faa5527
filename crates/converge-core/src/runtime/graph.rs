// converge-core/src/runtime/graph.rs
// ============================================================================
// Module: Converge Dependency Graph
// Description: Explicit depends-on graph, layering, and fallback ordering.
// Purpose: Order apply and prune work so dependencies actuate first.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The graph is built over the desired set from `depends-on` annotations and
//! uses indices into an id array rather than pointer cycles. Layering is
//! Kahn's algorithm: every object's dependencies reside strictly in earlier
//! layers, and a leftover after exhaustion is a cycle, which is fatal.
//! References may also resolve against the prior inventory set; such edges do
//! not participate in layering but feed the prune dependency filter.
//!
//! When no annotation orders two objects, a fixed kind-priority table places
//! namespaces, definitions, and RBAC first and controller workloads and
//! admission webhooks last, with ties broken by namespace then name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::core::errors::GraphError;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::ResourceManifest;
use crate::core::sets::ObjectSet;

// ============================================================================
// SECTION: Kind Priority
// ============================================================================

/// Returns the fallback apply priority for a kind; lower applies earlier.
#[must_use]
pub fn kind_priority(kind: &str) -> u8 {
    match kind {
        "Namespace" => 0,
        "CustomResourceDefinition" => 1,
        "ClusterRole" | "ClusterRoleBinding" | "Role" | "RoleBinding" | "ServiceAccount" => 2,
        "PersistentVolume" | "PriorityClass" | "StorageClass" => 3,
        "ConfigMap" | "PersistentVolumeClaim" | "Secret" | "Service" => 4,
        "CronJob" | "DaemonSet" | "Deployment" | "Job" | "ReplicaSet" | "StatefulSet" => 6,
        "APIService" | "MutatingWebhookConfiguration" | "ValidatingWebhookConfiguration" => 7,
        _ => 5,
    }
}

/// Sorts identities into deterministic apply order.
///
/// Order is kind priority, then namespace, then name, then the remaining
/// identity fields as a final disambiguator.
pub fn sort_for_apply(ids: &mut [ObjectId]) {
    ids.sort_by(|a, b| {
        kind_priority(&a.kind)
            .cmp(&kind_priority(&b.kind))
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.kind.cmp(&b.kind))
    });
}

/// Groups prune candidates into reverse-priority layers.
///
/// Prune candidates carry no manifests, so explicit dependency edges are
/// unavailable; the kind-priority table in reverse approximates the inverse
/// apply order (workloads before namespaces). Each non-empty priority bucket
/// becomes one layer, ordered within by namespace then name.
#[must_use]
pub fn prune_layers(candidates: &ObjectSet) -> Vec<Vec<ObjectId>> {
    let mut buckets: BTreeMap<u8, Vec<ObjectId>> = BTreeMap::new();
    for id in candidates {
        buckets.entry(kind_priority(&id.kind)).or_default().push(id.clone());
    }
    buckets
        .into_iter()
        .rev()
        .map(|(_, mut ids)| {
            ids.sort_by(|a, b| {
                a.namespace
                    .cmp(&b.namespace)
                    .then_with(|| a.name.cmp(&b.name))
                    .then_with(|| a.group.cmp(&b.group))
                    .then_with(|| a.kind.cmp(&b.kind))
            });
            ids
        })
        .collect()
}

// ============================================================================
// SECTION: Dependency Graph
// ============================================================================

/// Dependency graph over the desired set.
///
/// # Invariants
/// - Vertices are indices into `ids`; no pointer cycles.
/// - `dependencies[i]` and `dependents[i]` are consistent reverse views.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Identity array; vertex *i* is `ids[i]`.
    ids: Vec<ObjectId>,
    /// Vertex lookup by identity.
    index: HashMap<ObjectId, usize>,
    /// Edges from an object to the objects it depends on.
    dependencies: Vec<Vec<usize>>,
    /// Reverse edges from an object to its dependents.
    dependents: Vec<Vec<usize>>,
    /// Dependents (desired ids) of identities outside the desired set.
    external_dependents: HashMap<ObjectId, Vec<ObjectId>>,
}

impl DependencyGraph {
    /// Builds the graph from desired manifests.
    ///
    /// References resolve against the desired set first and the prior
    /// inventory set second; anything else is an unresolved reference.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on malformed annotations or unresolved
    /// references.
    pub fn build(
        objects: &[ResourceManifest],
        prior: &ObjectSet,
    ) -> Result<Self, GraphError> {
        let ids: Vec<ObjectId> = objects.iter().map(ResourceManifest::object_id).collect();
        let index: HashMap<ObjectId, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
        let mut external_dependents: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();

        for (from, manifest) in objects.iter().enumerate() {
            for reference in manifest.depends_on()? {
                if let Some(&to) = index.get(&reference) {
                    dependencies[from].push(to);
                    dependents[to].push(from);
                } else if prior.contains(&reference) {
                    external_dependents
                        .entry(reference)
                        .or_default()
                        .push(ids[from].clone());
                } else {
                    return Err(GraphError::UnresolvedReference {
                        object: Box::new(ids[from].clone()),
                        reference: Box::new(reference),
                    });
                }
            }
        }

        Ok(Self {
            ids,
            index,
            dependencies,
            dependents,
            external_dependents,
        })
    }

    /// Returns true when the graph has no explicit edges.
    #[must_use]
    pub fn is_edgeless(&self) -> bool {
        self.dependencies.iter().all(Vec::is_empty)
    }

    /// Produces topological layers in apply order.
    ///
    /// Objects within a layer have no dependency on each other, and every
    /// object's dependencies reside strictly in earlier layers. Layers are
    /// internally ordered by the fallback comparator.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] when the graph contains a cycle.
    pub fn sort_layers(&self) -> Result<Vec<Vec<ObjectId>>, GraphError> {
        let mut remaining: Vec<usize> =
            self.dependencies.iter().map(Vec::len).collect();
        let mut placed = vec![false; self.ids.len()];
        let mut layers: Vec<Vec<ObjectId>> = Vec::new();
        let mut placed_count = 0;

        while placed_count < self.ids.len() {
            let mut layer: Vec<usize> = (0..self.ids.len())
                .filter(|&i| !placed[i] && remaining[i] == 0)
                .collect();
            if layer.is_empty() {
                return Err(GraphError::Cycle(self.find_cycle(&placed)));
            }
            layer.sort_unstable();
            for &i in &layer {
                placed[i] = true;
                placed_count += 1;
                for &dependent in &self.dependents[i] {
                    remaining[dependent] -= 1;
                }
            }
            let mut ids: Vec<ObjectId> = layer.into_iter().map(|i| self.ids[i].clone()).collect();
            sort_for_apply(&mut ids);
            layers.push(ids);
        }

        Ok(layers)
    }

    /// Returns the transitive dependents of an object, in no particular order.
    #[must_use]
    pub fn transitive_dependents(&self, id: &ObjectId) -> Vec<ObjectId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = vec![false; self.ids.len()];
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(vertex) = stack.pop() {
            for &dependent in &self.dependents[vertex] {
                if !seen[dependent] {
                    seen[dependent] = true;
                    stack.push(dependent);
                    out.push(self.ids[dependent].clone());
                }
            }
        }
        out
    }

    /// Returns the desired-set dependents of an identity outside the set.
    #[must_use]
    pub fn external_dependents_of(&self, id: &ObjectId) -> &[ObjectId] {
        self.external_dependents.get(id).map_or(&[], Vec::as_slice)
    }

    /// Walks dependency edges among unplaced vertices to surface a cycle.
    fn find_cycle(&self, placed: &[bool]) -> Vec<ObjectId> {
        let Some(start) = (0..self.ids.len()).find(|&i| !placed[i]) else {
            return Vec::new();
        };
        let mut path = vec![start];
        let mut on_path = vec![false; self.ids.len()];
        on_path[start] = true;
        let mut current = start;
        loop {
            let Some(&next) = self.dependencies[current]
                .iter()
                .find(|&&dep| !placed[dep])
            else {
                // Dead end cannot happen on an unplaced vertex; bail with
                // the partial path rather than loop forever.
                return path.iter().map(|&i| self.ids[i].clone()).collect();
            };
            if on_path[next] {
                let cycle_start = path.iter().position(|&i| i == next).unwrap_or(0);
                return path[cycle_start..].iter().map(|&i| self.ids[i].clone()).collect();
            }
            on_path[next] = true;
            path.push(next);
            current = next;
        }
    }
}
