//! Sections
//!
//! A [`Section`] is one keyed, ordered group of elements, shown as a group of
//! rows by a list view. Sections are plain data: mutating one never notifies
//! anyone. Observable mutation goes through
//! [`ReactiveCollection`](super::ReactiveCollection), which edits its sections
//! with these methods and then publishes.

use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::identity::Identify;
use crate::error::{CollectionError, Result};

/// Opaque identity token of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(String);

impl SectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SectionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A keyed, ordered group of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section<T> {
    key: SectionKey,
    items: Vec<T>,
}

impl<T> Section<T> {
    /// Create a section with initial elements.
    pub fn new(key: impl Into<SectionKey>, items: Vec<T>) -> Self {
        Self {
            key: key.into(),
            items,
        }
    }

    /// Create an empty section.
    pub fn empty(key: impl Into<SectionKey>) -> Self {
        Self::new(key, Vec::new())
    }

    /// Same key, different elements.
    pub fn with_items<U>(&self, items: Vec<U>) -> Section<U> {
        Section {
            key: self.key.clone(),
            items,
        }
    }

    pub fn key(&self) -> &SectionKey {
        &self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert one element before `index`. `index == len` appends.
    pub fn insert(&mut self, element: T, index: usize) -> Result<()> {
        self.check_insert(index)?;
        self.items.insert(index, element);
        Ok(())
    }

    /// Insert elements before `index`, keeping their order.
    pub fn insert_all(&mut self, elements: Vec<T>, index: usize) -> Result<()> {
        self.check_insert(index)?;
        self.items.splice(index..index, elements);
        Ok(())
    }

    pub fn push(&mut self, element: T) {
        self.items.push(element);
    }

    pub fn extend(&mut self, elements: impl IntoIterator<Item = T>) {
        self.items.extend(elements);
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(CollectionError::row_out_of_range(None, index, self.items.len()));
        }
        Ok(self.items.remove(index))
    }

    /// Remove every listed index. Indices past the end are ignored.
    pub fn remove_indices(&mut self, indices: &[usize]) {
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let mut position = 0;
        self.items.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Stable sort; elements comparing equal keep their relative order.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.items.sort_by(compare);
    }

    pub(crate) fn replace(&mut self, index: usize, element: T) -> Result<T> {
        match self.items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, element)),
            None => Err(CollectionError::row_out_of_range(None, index, self.items.len())),
        }
    }

    pub(crate) fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    fn check_insert(&self, index: usize) -> Result<()> {
        if index > self.items.len() {
            return Err(CollectionError::row_out_of_range(None, index, self.items.len()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search and transforms
    // ------------------------------------------------------------------

    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    pub fn rposition(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().rposition(predicate)
    }

    pub fn map<U>(&self, transform: impl FnMut(&T) -> U) -> Vec<U> {
        self.items.iter().map(transform).collect()
    }

    pub fn filter_map<U>(&self, transform: impl FnMut(&T) -> Option<U>) -> Vec<U> {
        self.items.iter().filter_map(transform).collect()
    }
}

impl<T: PartialEq> Section<T> {
    pub fn first_index_of(&self, element: &T) -> Option<usize> {
        self.position(|item| item == element)
    }

    pub fn last_index_of(&self, element: &T) -> Option<usize> {
        self.rposition(|item| item == element)
    }
}

impl<T: Identify> Section<T> {
    /// Position of the first element with the given identity.
    pub fn index_of_identity(&self, id: &T::Id) -> Option<usize> {
        self.position(|item| item.identity() == *id)
    }
}

/// Fail-fast access, like slice indexing.
impl<T> Index<usize> for Section<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a Section<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
