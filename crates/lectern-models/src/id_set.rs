//! Set-valued document fields.
//!
//! [`IdSet`] is the in-memory form of the `uuid[]` columns that hold a
//! roster or an enrollment list. `insert` and `remove` report whether the
//! set changed, which is what the consistency layer branches on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdSet<T: Ord>(BTreeSet<T>);

impl<T: Ord> Default for IdSet<T> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<T: Ord + Copy> IdSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` was not already present.
    pub fn insert(&mut self, id: T) -> bool {
        self.0.insert(id)
    }

    /// Returns `true` if `id` was present.
    pub fn remove(&mut self, id: &T) -> bool {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &T) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Ids present here but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a IdSet<T>) -> impl Iterator<Item = T> + 'a {
        self.0.difference(&other.0).copied()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.iter().copied().collect()
    }
}

impl<T: Ord> FromIterator<T> for IdSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Ord> IntoIterator for IdSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
