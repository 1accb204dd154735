// Copyright 2025 Cowboy AI, LLC.

//! Operations
//!
//! An [`Operation`] is an instance of an [`OperationClass`] with its scope
//! dependencies bound. Calling it builds a [`State`] from the bound context
//! plus the input, runs the class's compiled process through a [`DslRun`],
//! and reads the value stored under the result key.
//!
//! ```text
//! scope ──► instantiate ──► call(input)
//!                              │
//!                 State(context ∪ {input})
//!                              │
//!              step / set / map / sequence / guard
//!                              │
//!              Success(state[result_key]) | Failure(error)
//! ```

mod class;
mod scope;

pub use class::{OperationBuilder, OperationClass};
pub use scope::Scope;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::dsl::DslRun;
use crate::errors::{Details, Error, OperationError, OperationResult, NOT_FOUND};
use crate::outcome::Outcome;
use crate::state::State;
use crate::value::Value;

/// An operation class bound to concrete scope values
#[derive(Clone)]
pub struct Operation {
    class: Arc<OperationClass>,
    context: Scope,
}

impl Operation {
    pub(crate) fn new(class: Arc<OperationClass>, context: Scope) -> Self {
        Self { class, context }
    }

    /// Class name
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// The class this instance was created from
    pub fn class(&self) -> &Arc<OperationClass> {
        &self.class
    }

    /// Bound scope values
    pub fn context(&self) -> &Scope {
        &self.context
    }

    /// Bound scope value by name
    pub fn scope_value(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    /// Bound scope value by name, borrowed as `T`
    pub fn scope<T: Any>(&self, name: &str) -> Option<&T> {
        self.context.get(name).and_then(Value::downcast_ref::<T>)
    }

    /// Run the process against `input`
    ///
    /// A result key nothing wrote to yields `Success(Value::nil())`.
    pub fn call(&self, input: impl Into<Value>) -> Outcome<Value> {
        let invocation = Uuid::new_v4();
        debug!(
            operation = %self.name(),
            invocation = %invocation,
            "Invoking operation"
        );

        let state = State::from_context(&self.context, input.into(), self.class.result_key());
        let mut run = DslRun::new(self, Outcome::Success(state));
        run.run_block(self.class.block());

        let outcome = run
            .into_outcome()
            .map(|state| state.result().cloned().unwrap_or_else(Value::nil));

        match &outcome {
            Outcome::Success(_) => debug!(
                operation = %self.name(),
                invocation = %invocation,
                "Operation succeeded"
            ),
            Outcome::Failure(error) => debug!(
                operation = %self.name(),
                invocation = %invocation,
                kind = %error.kind,
                "Operation failed"
            ),
        }
        outcome
    }

    /// Dispatch to a named method of this instance's class
    pub fn invoke(
        &self,
        method: &str,
        state: &State,
        args: &[Value],
    ) -> OperationResult<Outcome<Value>> {
        let func = self
            .class
            .method(method)
            .ok_or_else(|| OperationError::UnknownMethod {
                operation: self.name().to_string(),
                method: method.to_string(),
            })?;
        Ok(func(self, state, args))
    }

    /// Failure of the given kind with a humanized message
    pub fn error<T>(&self, kind: &str) -> Outcome<T> {
        Outcome::Failure(Error::new(kind))
    }

    /// Failure with an explicit message and/or details
    pub fn error_with<T>(
        &self,
        kind: &str,
        message: Option<&str>,
        details: Option<Details>,
    ) -> Outcome<T> {
        let mut error = Error::new(kind);
        if let Some(message) = message {
            error = error.with_message(message);
        }
        if let Some(details) = details {
            error = error.with_details(details);
        }
        Outcome::Failure(error)
    }

    /// Lift a value into a success
    pub fn wrap<T>(&self, value: T) -> Outcome<T> {
        Outcome::Success(value)
    }

    /// Success when present, `not_found` failure otherwise
    pub fn wrap_if_present(&self, value: Option<Value>) -> Outcome<Value> {
        self.wrap_if_present_as(value, NOT_FOUND, None)
    }

    /// Success when present, failure of `kind` otherwise
    ///
    /// A present nil value counts as absent.
    pub fn wrap_if_present_as(
        &self,
        value: Option<Value>,
        kind: &str,
        message: Option<&str>,
    ) -> Outcome<Value> {
        match value {
            Some(value) if !value.is_nil() => Outcome::Success(value),
            _ => self.error_with(kind, message, None),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("class", &self.class.name())
            .field("context", &self.context.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}
