//! Read-only override values sourced from the process environment.
//!
//! A designated property holds a comma-separated list of property names. Each
//! listed property that is present becomes an override, stored as its raw
//! string value. Overrides shadow persisted values on reads but are never
//! saved and never show up in key listings.

use std::collections::HashMap;

use crate::logging::debug;
use crate::value::Value;

/// Accessor for named string properties.
pub trait PropertySource: Send + Sync {
    fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    fn property(&self, name: &str) -> Option<String>;
}

/// Reads properties from environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl PropertySource for EnvProperties {
    fn property(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Properties held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    values: HashMap<String, String>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapProperties {
    fn property(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// The override table.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<String, Value>,
}

impl Overrides {
    /// Build the table from `source`, reading the list of names from
    /// `list_property`. Returns an empty table when the list is absent.
    pub fn from_source(source: &dyn PropertySource, list_property: &str) -> Self {
        let Some(list) = source.property(list_property) else {
            debug!(property = list_property, "no settings override list");
            return Self::default();
        };

        let values: HashMap<String, Value> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                let value = source.property(name)?;
                debug!(key = name, value = %value, "settings override");
                Some((name.to_string(), Value::String(value)))
            })
            .collect();

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        // Skip hashing on the common empty path.
        if self.values.is_empty() {
            return None;
        }
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
