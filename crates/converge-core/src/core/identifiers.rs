// converge-core/src/core/identifiers.rs
// ============================================================================
// Module: Converge Object Identifiers
// Description: Canonical object identity and opaque identifier newtypes.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the canonical identity of a managed cluster object and
//! the opaque identifier newtypes used throughout Converge. An [`ObjectId`] is
//! the tuple `(group, kind, namespace, name)`; the API version is intentionally
//! excluded because the control plane treats different versions of the same
//! kind as the same resource. The string form `namespace_name_group_kind` is
//! unique and round-trips through [`ObjectId::parse`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Cluster-Scoped Kinds
// ============================================================================

/// Kinds that are cluster-scoped and therefore carry no namespace.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "StorageClass",
    "ValidatingWebhookConfiguration",
];

/// Returns true when the kind is cluster-scoped.
///
/// Kinds outside the fixed table default to namespaced, matching the
/// behavior of a control plane without a live mapper.
#[must_use]
pub fn is_cluster_scoped(kind: &str) -> bool {
    CLUSTER_SCOPED_KINDS.contains(&kind)
}

// ============================================================================
// SECTION: Object Identity
// ============================================================================

/// Canonical identity of a managed object: `(group, kind, namespace, name)`.
///
/// # Invariants
/// - `name` is a non-empty DNS-subdomain-compatible string.
/// - `group` may be empty for the core group.
/// - `namespace` is empty iff the kind is cluster-scoped.
/// - Equality is structural on all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    /// API group; empty for the core group.
    pub group: String,
    /// Object kind.
    pub kind: String,
    /// Namespace; empty for cluster-scoped kinds.
    pub namespace: String,
    /// Object name.
    pub name: String,
}

impl ObjectId {
    /// Creates a new object identity, trimming surrounding whitespace.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into().trim().to_string(),
            kind: kind.into().trim().to_string(),
            namespace: namespace.into().trim().to_string(),
            name: name.into().trim().to_string(),
        }
    }

    /// Parses an identity from its canonical `namespace_name_group_kind` form.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectIdError::Malformed`] when the input does not contain
    /// exactly four `_`-separated fields.
    pub fn parse(value: &str) -> Result<Self, ObjectIdError> {
        let mut parts = value.split('_');
        let (Some(namespace), Some(name), Some(group), Some(kind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ObjectIdError::Malformed(value.to_string()));
        };
        let id = Self::new(group, kind, namespace, name);
        id.validate()?;
        Ok(id)
    }

    /// Validates the structural invariants of the identity.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectIdError`] when a field violates an invariant.
    pub fn validate(&self) -> Result<(), ObjectIdError> {
        if self.kind.is_empty() {
            return Err(ObjectIdError::EmptyKind);
        }
        if self.name.is_empty() {
            return Err(ObjectIdError::EmptyName);
        }
        if !is_dns_subdomain(&self.name) {
            return Err(ObjectIdError::InvalidName(self.name.clone()));
        }
        if is_cluster_scoped(&self.kind) {
            if !self.namespace.is_empty() {
                return Err(ObjectIdError::UnexpectedNamespace {
                    kind: self.kind.clone(),
                    name: self.name.clone(),
                });
            }
        } else if self.namespace.is_empty() {
            return Err(ObjectIdError::MissingNamespace {
                kind: self.kind.clone(),
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.namespace, self.name, self.group, self.kind)
    }
}

// ============================================================================
// SECTION: Identity Errors
// ============================================================================

/// Errors raised when constructing or validating an [`ObjectId`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    /// Canonical string form did not contain four fields.
    #[error("malformed object id string: {0}")]
    Malformed(String),
    /// Kind field is empty.
    #[error("object kind must not be empty")]
    EmptyKind,
    /// Name field is empty.
    #[error("object name must not be empty")]
    EmptyName,
    /// Name is not DNS-subdomain-compatible.
    #[error("object name is not a valid dns subdomain: {0}")]
    InvalidName(String),
    /// Namespaced kind is missing a namespace.
    #[error("namespace required for namespaced kind {kind} (name {name})")]
    MissingNamespace {
        /// Offending kind.
        kind: String,
        /// Offending object name.
        name: String,
    },
    /// Cluster-scoped kind carries a namespace.
    #[error("namespace not allowed for cluster-scoped kind {kind} (name {name})")]
    UnexpectedNamespace {
        /// Offending kind.
        kind: String,
        /// Offending object name.
        name: String,
    },
}

/// Returns true when the value is a valid DNS subdomain label sequence.
fn is_dns_subdomain(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

// ============================================================================
// SECTION: Opaque Identifiers
// ============================================================================

/// Caller-chosen inventory identity string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryId(String);

impl InventoryId {
    /// Creates a new inventory identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InventoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for InventoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InventoryId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Server-assigned unique identifier for a live object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectUid(String);

impl ObjectUid {
    /// Creates a new object UID.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ObjectUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObjectUid {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
