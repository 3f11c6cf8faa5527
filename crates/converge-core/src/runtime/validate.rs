// converge-core/src/runtime/validate.rs
// ============================================================================
// Module: Converge Input Validation
// Description: Structural validation of desired manifests before solving.
// Purpose: Reject or exclude malformed objects per the validation policy.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Validation runs before any actuation. Under the exit-early policy the
//! first batch of failures aborts the run; under skip-invalid the failures
//! are reported and the offending objects, together with any objects that
//! depend on them, are excluded from the queue.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use crate::core::errors::ValidationError;
use crate::core::errors::ValidationFailure;
use crate::core::identifiers::ObjectId;
use crate::core::manifest::ResourceManifest;

// ============================================================================
// SECTION: Validation Outcome
// ============================================================================

/// Result of validating the desired set.
#[derive(Debug, Default)]
pub struct ValidatedSet {
    /// Objects that passed validation, in input order.
    pub valid: Vec<ResourceManifest>,
    /// Failures for excluded objects.
    pub failures: Vec<ValidationFailure>,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates the desired set and partitions it into valid objects and
/// failures.
///
/// Checks per object: identity invariants (non-empty kind and name, DNS
/// name, namespace presence matching scope), parseable dependency
/// annotation, and uniqueness of identities across the set. Objects whose
/// dependencies were excluded are excluded transitively.
#[must_use]
pub fn validate_manifests(objects: &[ResourceManifest]) -> ValidatedSet {
    let mut outcome = ValidatedSet::default();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut excluded: HashSet<ObjectId> = HashSet::new();
    let mut kept: Vec<ResourceManifest> = Vec::new();

    for manifest in objects {
        let id = manifest.object_id();
        if let Err(error) = id.validate() {
            excluded.insert(id.clone());
            outcome.failures.push(ValidationFailure {
                object: Some(id),
                error: ValidationError::Id(error),
            });
            continue;
        }
        if !seen.insert(id.clone()) {
            excluded.insert(id.clone());
            outcome.failures.push(ValidationFailure {
                object: Some(id.clone()),
                error: ValidationError::Duplicate(id),
            });
            continue;
        }
        if let Err(error) = manifest.depends_on() {
            excluded.insert(id.clone());
            outcome.failures.push(ValidationFailure {
                object: Some(id),
                error: ValidationError::Manifest(error),
            });
            continue;
        }
        kept.push(manifest.clone());
    }

    // A dependency excluded above invalidates its dependents transitively.
    loop {
        let mut newly_excluded: Vec<(ObjectId, ObjectId)> = Vec::new();
        for manifest in &kept {
            let id = manifest.object_id();
            if excluded.contains(&id) {
                continue;
            }
            if let Ok(deps) = manifest.depends_on() {
                if let Some(dependency) =
                    deps.into_iter().find(|dependency| excluded.contains(dependency))
                {
                    newly_excluded.push((id, dependency));
                }
            }
        }
        if newly_excluded.is_empty() {
            break;
        }
        for (id, dependency) in newly_excluded {
            excluded.insert(id.clone());
            outcome.failures.push(ValidationFailure {
                object: Some(id.clone()),
                error: ValidationError::InvalidDependency {
                    object: id,
                    dependency,
                },
            });
        }
    }

    outcome.valid =
        kept.into_iter().filter(|m| !excluded.contains(&m.object_id())).collect();
    outcome
}
