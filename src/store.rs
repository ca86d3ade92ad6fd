//! In-memory value table.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::value::Value;

/// Mapping from key to [`Value`] plus the modified flag.
///
/// Every mutation marks the store as modified; [`Store::mark_saved`] clears the
/// flag once the contents reached disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    entries: HashMap<String, Value>,
    modified: bool,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: HashMap<String, Value>) -> Self {
        Self {
            entries,
            modified: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.modified = true;
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.modified = true;
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.modified = true;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Replace the contents with a freshly decoded store.
    ///
    /// Adopting loaded data does not count as a modification.
    pub(crate) fn adopt(&mut self, loaded: Store) {
        self.entries = loaded.entries;
        self.modified = false;
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Store {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
