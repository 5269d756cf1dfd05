//! Id-keyed record lists
//!
//! Every list slice in the store is an [`EntityList`]. The four transitions
//! it offers are total: none of them fail, and an id that is not present
//! turns an update into a no-op.

use serde::{Deserialize, Serialize};

/// A record with a stable string id and a patch type
pub trait Entity: Clone {
    type Patch: Patch<Self>;

    fn id(&self) -> &str;
}

/// A partial update that can be shallow-merged into `T`
pub trait Patch<T> {
    fn apply(self, target: &mut T);
}

/// Ordered list of records, unique by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list.
    ///
    /// Later duplicates of an id replace earlier ones in place, so the list
    /// stays unique even if the server sends the same record twice.
    pub fn set(&mut self, items: Vec<T>) {
        self.items.clear();
        for item in items {
            self.add(item);
        }
    }

    /// Insert or replace by id. Replacement keeps the original position.
    pub fn add(&mut self, item: T) {
        match self.position(item.id()) {
            Some(pos) => self.items[pos] = item,
            None => self.items.push(item),
        }
    }

    /// Merge `patch` into the record with `id`. Returns whether it was found.
    pub fn update(&mut self, id: &str, patch: T::Patch) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                patch.apply(item);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<T: Entity> FromIterator<T> for EntityList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.set(iter.into_iter().collect());
        list
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
