// Copyright 2025 Cowboy AI, LLC.

//! Scope bindings
//!
//! A [`Scope`] supplies concrete values for the named dependencies an
//! operation class declares. Values are stored as [`Value`]s, so anything
//! from a plain id to an `Arc<dyn Repository>` can be bound.

use std::any::Any;

use indexmap::IndexMap;

use crate::value::Value;

/// Named dependency values bound to an operation instance
#[derive(Debug, Clone, Default)]
pub struct Scope {
    values: IndexMap<String, Value>,
}

impl Scope {
    /// Empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a dependency
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Bind any thread-safe value without an explicit `Value::new`
    pub fn with_any<T: Any + Send + Sync>(self, name: impl Into<String>, value: T) -> Self {
        self.with(name, Value::new(value))
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bindings in insertion order
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a Scope {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl From<IndexMap<String, Value>> for Scope {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
