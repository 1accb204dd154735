// Copyright 2025 Cowboy AI, LLC.

//! Per-invocation state threaded through directives
//!
//! A [`State`] is built once per call from the operation's bound context plus
//! the caller's input, stored under [`INPUT_KEY`]. Steps merge new entries
//! into it key-wise: entries a step does not mention are always preserved.
//! The designated result key names the entry read out as the operation's
//! final value.

use std::any::Any;

use indexmap::IndexMap;

use crate::value::Value;

/// Key holding the raw input of an invocation
pub const INPUT_KEY: &str = "input";

/// Default result key for operation classes that do not override it
pub const DEFAULT_RESULT_KEY: &str = "value";

/// Ordered key-value context with a designated result key
#[derive(Debug, Clone)]
pub struct State {
    entries: IndexMap<String, Value>,
    result_key: String,
}

impl State {
    /// Create an empty state reading its result from `result_key`
    pub fn new(result_key: impl Into<String>) -> Self {
        Self {
            entries: IndexMap::new(),
            result_key: result_key.into(),
        }
    }

    /// Build the initial state of an invocation: context ∪ {input}
    pub fn from_context<'a, I>(context: I, input: Value, result_key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut state = Self::new(result_key);
        state.update(context.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        state.set(INPUT_KEY, input);
        state
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up an entry and borrow it as `T`
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(Value::downcast_ref::<T>)
    }

    /// Whether an entry exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Merge a single entry, overwriting any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Merge many entries; later keys win on conflict
    pub fn update<K, I>(&mut self, partial: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (key, value) in partial {
            self.entries.insert(key.into(), value);
        }
        self
    }

    /// Consuming variant of [`State::update`]
    pub fn merged<K, I>(mut self, partial: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.update(partial);
        self
    }

    /// Value stored under the result key
    pub fn result(&self) -> Option<&Value> {
        self.entries.get(&self.result_key)
    }

    /// Key the result is read from
    pub fn result_key(&self) -> &str {
        &self.result_key
    }

    /// Raw input of the invocation
    pub fn input(&self) -> Option<&Value> {
        self.get(INPUT_KEY)
    }

    /// Snapshot of all entries
    pub fn as_map(&self) -> IndexMap<String, Value> {
        self.entries.clone()
    }

    /// Entry names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the state holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both states hold the very same values under the same keys
    pub fn same_as(&self, other: &State) -> bool {
        self.result_key == other.result_key
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k).is_some_and(|o| o.ptr_eq(v)))
    }
}
