// Copyright 2025 Cowboy AI, LLC.

//! Step targets and their resolution
//!
//! A directive names what to run as a [`Callable`]:
//! - [`Callable::Method`]: a named method of the operation class (its own,
//!   inherited, or contributed by a plugin)
//! - [`Callable::Closure`]: an inline function receiving the operation
//!   instance, so it can reach the injected scope dependencies
//! - [`Callable::Invocable`]: any other value that already knows how to run
//!   against a state
//!
//! All three are resolved once, when the class is built, into a
//! [`ResolvedCallable`] with the uniform signature
//! `(operation, state, args) -> Outcome<Value>`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{OperationError, OperationResult};
use crate::operation::Operation;
use crate::outcome::Outcome;
use crate::state::State;
use crate::value::Value;

/// Uniform function shape every callable resolves to
pub type StepFn = Arc<dyn Fn(&Operation, &State, &[Value]) -> Outcome<Value> + Send + Sync>;

/// The "continue" capability handed to a sequence wrapper
///
/// Invoking it runs the nested block from a copy of the current run and
/// returns the nested chain's final outcome.
pub type Continue<'a> = dyn FnMut() -> Outcome<State> + 'a;

/// Anything that can run against a state without the operation instance
pub trait Invocable: Send + Sync {
    /// Run with the current state and directive arguments
    fn invoke(&self, state: &State, args: &[Value]) -> Outcome<Value>;
}

/// Target of a directive
#[derive(Clone)]
pub enum Callable {
    /// Named method dispatched on the operation instance
    Method(String),
    /// Inline function bound to the operation instance
    Closure(StepFn),
    /// Already invocable value, used as-is
    Invocable(Arc<dyn Invocable>),
}

impl Callable {
    /// Reference a method by name
    pub fn method(name: impl Into<String>) -> Self {
        Callable::Method(name.into())
    }

    /// Inline function with access to the operation instance
    ///
    /// ```rust
    /// use cim_operation::{Callable, Value};
    ///
    /// let answer = Callable::closure(|_op, _state, _args| Value::new(42_i64).into());
    /// assert_eq!(format!("{answer:?}"), "Callable::Closure");
    /// ```
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&Operation, &State, &[Value]) -> Outcome<Value> + Send + Sync + 'static,
    {
        Callable::Closure(Arc::new(f))
    }

    /// Boolean condition for `guard` and `unless`
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Operation, &State) -> bool + Send + Sync + 'static,
    {
        Callable::closure(move |op, state, _| Outcome::success(Value::new(f(op, state))))
    }

    /// Full-state mapper for `map`
    pub fn state_map<F>(f: F) -> Self
    where
        F: Fn(&Operation, &State) -> Outcome<State> + Send + Sync + 'static,
    {
        Callable::closure(move |op, state, _| f(op, state).map(Value::new))
    }

    /// Use an invocable value as-is
    pub fn invocable(target: impl Invocable + 'static) -> Self {
        Callable::Invocable(Arc::new(target))
    }

    pub(crate) fn resolve(
        &self,
        operation: &str,
        methods: &IndexMap<String, StepFn>,
    ) -> OperationResult<ResolvedCallable> {
        match self {
            Callable::Method(name) => methods
                .get(name)
                .map(|func| ResolvedCallable {
                    label: name.clone(),
                    func: func.clone(),
                })
                .ok_or_else(|| OperationError::UnknownMethod {
                    operation: operation.to_string(),
                    method: name.clone(),
                }),
            Callable::Closure(func) => Ok(ResolvedCallable {
                label: "closure".to_string(),
                func: func.clone(),
            }),
            Callable::Invocable(target) => {
                let target = target.clone();
                Ok(ResolvedCallable {
                    label: "invocable".to_string(),
                    func: Arc::new(move |_, state, args| target.invoke(state, args)),
                })
            }
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Method(name) => write!(f, "Callable::Method({name})"),
            Callable::Closure(_) => write!(f, "Callable::Closure"),
            Callable::Invocable(_) => write!(f, "Callable::Invocable"),
        }
    }
}

impl From<&str> for Callable {
    fn from(name: &str) -> Self {
        Callable::method(name)
    }
}

impl From<String> for Callable {
    fn from(name: String) -> Self {
        Callable::Method(name)
    }
}

/// A callable after resolution against an operation class
#[derive(Clone)]
pub struct ResolvedCallable {
    label: String,
    func: StepFn,
}

impl ResolvedCallable {
    /// Wrap a function directly, e.g. from a plugin primitive
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Operation, &State, &[Value]) -> Outcome<Value> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(f),
        }
    }

    /// Invoke against an operation instance and state
    pub fn call(&self, operation: &Operation, state: &State, args: &[Value]) -> Outcome<Value> {
        (self.func)(operation, state, args)
    }

    /// Name used in logs
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for ResolvedCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCallable")
            .field("label", &self.label)
            .finish()
    }
}

/// Function driving a `sequence`: receives the continue capability and the
/// current state, and decides whether (and how often) to run the block
pub type WrapperFn = Arc<dyn Fn(&Operation, &mut Continue<'_>, &State) + Send + Sync>;

/// Sequence wrapper around a nested block
#[derive(Clone)]
pub struct Wrapper(WrapperFn);

impl Wrapper {
    /// Create a wrapper from a function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Operation, &mut Continue<'_>, &State) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the wrapper
    pub fn call(&self, operation: &Operation, next: &mut Continue<'_>, state: &State) {
        (self.0)(operation, next, state)
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrapper")
    }
}
