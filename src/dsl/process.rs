// Copyright 2025 Cowboy AI, LLC.

//! Declarative process descriptions
//!
//! A [`Process`] is the ordered list of [`Directive`]s an operation class
//! runs. It is plain data until the class is built, at which point every
//! callable is resolved and every plugin directive looked up.

use crate::callable::{Callable, Wrapper};
use crate::value::Value;

/// One uncompiled step of a process
#[derive(Debug, Clone)]
pub enum Directive {
    /// Run for side effect only; a failure stops the chain
    Step {
        /// What to run
        callable: Callable,
        /// Extra arguments passed after the state
        args: Vec<Value>,
    },
    /// Run and merge the return value under `to` (the result key if `None`)
    Set {
        /// What to run
        callable: Callable,
        /// Extra arguments passed after the state
        args: Vec<Value>,
        /// Target key
        to: Option<String>,
    },
    /// Run and take the returned state wholesale
    Map {
        /// What to run; must return a `State`
        callable: Callable,
    },
    /// Hand a continue capability for `block` to a wrapper
    Sequence {
        /// Wrapper deciding whether to continue into the block
        wrapper: Wrapper,
        /// Nested directives
        block: Process,
    },
    /// Run `block` only when the condition holds
    Guard {
        /// Condition evaluated against the current state
        condition: Callable,
        /// Nested directives
        block: Process,
    },
    /// Run `block` only when the condition does not hold
    Unless {
        /// Condition evaluated against the current state
        condition: Callable,
        /// Nested directives
        block: Process,
    },
    /// A primitive contributed by a plugin
    Custom {
        /// Primitive name
        name: String,
        /// Arguments handed to the primitive
        args: Vec<Value>,
        /// Nested directives, empty for flat primitives
        block: Process,
    },
}

impl Directive {
    /// Short name used in logs
    pub fn kind(&self) -> &str {
        match self {
            Directive::Step { .. } => "step",
            Directive::Set { .. } => "set",
            Directive::Map { .. } => "map",
            Directive::Sequence { .. } => "sequence",
            Directive::Guard { .. } => "guard",
            Directive::Unless { .. } => "unless",
            Directive::Custom { name, .. } => name.as_str(),
        }
    }
}

/// Ordered directive list built with a fluent API
///
/// ```rust
/// use cim_operation::{Callable, Process, Value};
///
/// let process = Process::new()
///     .set("get_value")
///     .guard(
///         Callable::predicate(|_, state| state.get_as::<i64>("result_value") == Some(&0)),
///         |block| {
///             block
///                 .set_to(Callable::closure(|_, _, _| Value::new(99_i64).into()), "aux_value")
///                 .set(Callable::closure(|_, _, _| Value::from("UPDATED").into()))
///         },
///     )
///     .step("notify");
///
/// assert_eq!(process.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Process {
    directives: Vec<Directive>,
}

impl Process {
    /// Empty process
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw directive
    pub fn push(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// `step(callable)`
    pub fn step(self, callable: impl Into<Callable>) -> Self {
        self.step_with(callable, Vec::new())
    }

    /// `step(callable, *args)`
    pub fn step_with(self, callable: impl Into<Callable>, args: Vec<Value>) -> Self {
        self.push(Directive::Step {
            callable: callable.into(),
            args,
        })
    }

    /// `set(callable)`, writing the result key
    pub fn set(self, callable: impl Into<Callable>) -> Self {
        self.set_with(callable, Vec::new(), None)
    }

    /// `set(callable, to: key)`
    pub fn set_to(self, callable: impl Into<Callable>, to: impl Into<String>) -> Self {
        self.set_with(callable, Vec::new(), Some(to.into()))
    }

    /// `set(callable, *args, to: key)`
    pub fn set_with(
        self,
        callable: impl Into<Callable>,
        args: Vec<Value>,
        to: Option<String>,
    ) -> Self {
        self.push(Directive::Set {
            callable: callable.into(),
            args,
            to,
        })
    }

    /// `map(callable)`
    ///
    /// The callable must succeed with a [`State`](crate::State); anything
    /// else panics when the directive runs. Build mappers with
    /// [`Callable::state_map`] so the return type is checked at compile time.
    pub fn map(self, callable: impl Into<Callable>) -> Self {
        self.push(Directive::Map {
            callable: callable.into(),
        })
    }

    /// `sequence(wrapper) { block }`
    pub fn sequence<F>(self, wrapper: Wrapper, block: F) -> Self
    where
        F: FnOnce(Process) -> Process,
    {
        self.push(Directive::Sequence {
            wrapper,
            block: block(Process::new()),
        })
    }

    /// `guard(condition) { block }`
    pub fn guard<F>(self, condition: impl Into<Callable>, block: F) -> Self
    where
        F: FnOnce(Process) -> Process,
    {
        self.push(Directive::Guard {
            condition: condition.into(),
            block: block(Process::new()),
        })
    }

    /// `unless(condition) { block }`
    pub fn unless<F>(self, condition: impl Into<Callable>, block: F) -> Self
    where
        F: FnOnce(Process) -> Process,
    {
        self.push(Directive::Unless {
            condition: condition.into(),
            block: block(Process::new()),
        })
    }

    /// Plugin primitive without a block
    pub fn directive(self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.push(Directive::Custom {
            name: name.into(),
            args,
            block: Process::new(),
        })
    }

    /// Plugin primitive wrapping a block
    pub fn directive_block<F>(self, name: impl Into<String>, args: Vec<Value>, block: F) -> Self
    where
        F: FnOnce(Process) -> Process,
    {
        self.push(Directive::Custom {
            name: name.into(),
            args,
            block: block(Process::new()),
        })
    }

    /// Directives in order
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Number of top-level directives
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether the process has no directives
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
