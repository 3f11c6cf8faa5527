// converge-core/src/core/sets.rs
// ============================================================================
// Module: Converge Object Set Algebra
// Description: Unordered object-id collections with set operations.
// Purpose: Provide union/difference/equality and the inventory payload mapping.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! An [`ObjectSet`] is an unordered collection of [`ObjectId`] values with
//! O(1) membership. Insertion order is not observable; equality ignores order
//! and duplicates. The flat string-map form is the payload stored inside the
//! inventory document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ObjectId;
use crate::core::identifiers::ObjectIdError;

// ============================================================================
// SECTION: Object Set
// ============================================================================

/// Unordered set of object identities.
///
/// # Invariants
/// - Membership is O(1); duplicates collapse on insertion.
/// - Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectSet {
    /// Backing hash set of identities.
    ids: HashSet<ObjectId>,
}

impl ObjectSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of identities in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Inserts an identity, returning true when it was not already present.
    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.ids.insert(id)
    }

    /// Removes an identity, returning true when it was present.
    pub fn remove(&mut self, id: &ObjectId) -> bool {
        self.ids.remove(id)
    }

    /// Returns true when the identity is a member of the set.
    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    /// Returns the union of this set and another.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut ids = self.ids.clone();
        ids.extend(other.ids.iter().cloned());
        Self { ids }
    }

    /// Returns the members of this set that are absent from the other.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            ids: self.ids.difference(&other.ids).cloned().collect(),
        }
    }

    /// Returns the members present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            ids: self.ids.intersection(&other.ids).cloned().collect(),
        }
    }

    /// Iterates over the members in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectId> {
        self.ids.iter()
    }

    /// Returns the members sorted by their structural order.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Serializes the set into the flat canonical-string payload mapping.
    ///
    /// Keys are canonical string forms; values are empty strings. The map is
    /// ordered so the persisted payload is deterministic.
    #[must_use]
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.ids.iter().map(|id| (id.to_string(), String::new())).collect()
    }

    /// Restores a set from the flat canonical-string payload mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectIdError`] when a key is not a canonical identity form.
    pub fn from_string_map(map: &BTreeMap<String, String>) -> Result<Self, ObjectIdError> {
        let mut set = Self::new();
        for key in map.keys() {
            set.insert(ObjectId::parse(key)?);
        }
        Ok(set)
    }
}

impl FromIterator<ObjectId> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ObjectSet {
    type Item = ObjectId;
    type IntoIter = std::collections::hash_set::IntoIter<ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectSet {
    type Item = &'a ObjectId;
    type IntoIter = std::collections::hash_set::Iter<'a, ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl Extend<ObjectId> for ObjectSet {
    fn extend<I: IntoIterator<Item = ObjectId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}
