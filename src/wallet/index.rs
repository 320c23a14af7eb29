//! Dense set with O(1) membership and removal
//!
//! Backs both the signer registry and the pending-transaction index: a
//! dense array of items plus a reverse position map. Removal swaps the
//! last item into the freed slot and truncates, so no removal order
//! degrades performance. Remaining items keep no particular order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A dense array of unique items with an O(1) reverse-lookup position map.
///
/// The position map is not serialized; call [`IndexedSet::rebuild`] after
/// deserialization to restore it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: serde::Serialize",
    deserialize = "T: serde::de::DeserializeOwned"
))]
pub struct IndexedSet<T>
where
    T: Copy + Eq + Hash,
{
    items: Vec<T>,
    // Skipped fields would otherwise pull a `T: Default` bound into the
    // derived impls, which item types like `Address` do not provide.
    #[serde(skip)]
    positions: HashMap<T, usize>,
}

impl<T> IndexedSet<T>
where
    T: Copy + Eq + Hash,
{
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Insert an item; returns false if it was already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.positions.contains_key(&item) {
            return false;
        }
        self.positions.insert(item, self.items.len());
        self.items.push(item);
        true
    }

    /// Remove an item by swapping the last item into its slot.
    /// Returns false if the item was not present.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(pos) = self.positions.remove(item) else {
            return false;
        };
        let last = self.items.len() - 1;
        if pos != last {
            let moved = self.items[last];
            self.items[pos] = moved;
            self.positions.insert(moved, pos);
        }
        self.items.truncate(last);
        true
    }

    /// O(1) membership test
    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Position of an item in the dense array, if present
    pub fn position(&self, item: &T) -> Option<usize> {
        self.positions.get(item).copied()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The dense array of items (unspecified order after removals)
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate over items
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Rebuild the position map from the dense array (after deserialization)
    pub fn rebuild(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (*item, i))
            .collect();
    }
}

impl<T> Default for IndexedSet<T>
where
    T: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for IndexedSet<T>
where
    T: Copy + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
