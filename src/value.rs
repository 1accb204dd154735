// Copyright 2025 Cowboy AI, LLC.

//! Dynamic values threaded through operation state
//!
//! Every entry of a [`State`](crate::State), every bound scope dependency and
//! every step return travels as a [`Value`]: a cheaply clonable, type-erased
//! handle around any `Send + Sync` payload. Typed access goes through
//! [`Value::downcast_ref`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased, shareable value
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap any thread-safe value
    ///
    /// Wrapping a `Value` returns the same handle instead of nesting it.
    ///
    /// ```rust
    /// use cim_operation::Value;
    ///
    /// let answer = Value::new(42_i64);
    /// assert_eq!(answer.downcast_ref::<i64>(), Some(&42));
    ///
    /// let again = Value::new(answer.clone());
    /// assert!(again.ptr_eq(&answer));
    /// ```
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(existing) = any.downcast_ref::<Value>() {
            return existing.clone();
        }
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Share an already reference-counted value without re-allocating
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The unit value, standing in for "nothing here"
    pub fn nil() -> Self {
        Self::new(())
    }

    /// Wrap a JSON document
    pub fn json(value: serde_json::Value) -> Self {
        Self::new(value)
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the payload as `T`
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Check the payload type
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the payload as JSON, if it is JSON
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        self.downcast_ref::<serde_json::Value>()
    }

    /// Type name recorded when the value was wrapped
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this is the unit value
    pub fn is_nil(&self) -> bool {
        self.is::<()>()
    }

    /// Truthiness used by guard conditions
    ///
    /// Nil, `false`, JSON `null`, JSON `false` and an empty `Option<Value>`
    /// are falsy. Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        if self.is_nil() {
            return false;
        }
        if let Some(flag) = self.downcast_ref::<bool>() {
            return *flag;
        }
        if let Some(json) = self.as_json() {
            return !matches!(json, serde_json::Value::Null | serde_json::Value::Bool(false));
        }
        if let Some(option) = self.downcast_ref::<Option<Value>>() {
            return option.is_some();
        }
        true
    }

    /// Whether both handles point at the very same stored payload
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "nil");
        }
        if let Some(v) = self.downcast_ref::<String>() {
            return write!(f, "{v:?}");
        }
        if let Some(v) = self.downcast_ref::<&'static str>() {
            return write!(f, "{v:?}");
        }
        if let Some(v) = self.downcast_ref::<i64>() {
            return write!(f, "{v}");
        }
        if let Some(v) = self.downcast_ref::<i32>() {
            return write!(f, "{v}");
        }
        if let Some(v) = self.downcast_ref::<bool>() {
            return write!(f, "{v}");
        }
        if let Some(v) = self.as_json() {
            return write!(f, "{v}");
        }
        write!(f, "Value<{}>", self.type_name)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::json(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}
