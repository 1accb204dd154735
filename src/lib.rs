// Copyright 2025 Cowboy AI, LLC.

//! # CIM Operation
//!
//! Composable business operations built from small steps threaded through a
//! success/failure chain.
//!
//! - **Outcome**: `Success(value)` or `Failure(error)` with `then`/`tee`
//! - **State**: keyed map seeded with the input and the bound scope values
//! - **Process DSL**: `step`, `set`, `map`, `sequence`, `guard` (and `unless`)
//! - **Operation classes**: declared scope, result key, named methods and a
//!   process compiled once at build time
//! - **Plugins**: class declarations, instance helpers and new directives,
//!   registered per class, idempotently and independent of order
//!
//! ## Example
//!
//! ```rust
//! use cim_operation::{Callable, Error, OperationBuilder, Outcome, Process, Scope, Value};
//!
//! let class = OperationBuilder::new("Double")
//!     .method("double", |_, state, _| {
//!         match state.input().and_then(|v| v.downcast_ref::<i64>()) {
//!             Some(n) => Value::new(n * 2).into(),
//!             None => Outcome::failure(Error::validation(Default::default())),
//!         }
//!     })
//!     .process(
//!         Process::new()
//!             .guard(Callable::predicate(|_, state| state.input().is_some()), |b| b.set("double")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let outcome = class.call(Scope::new(), 21_i64).unwrap();
//! assert_eq!(outcome.value().downcast_ref::<i64>(), Some(&42));
//! ```

#![warn(missing_docs)]

mod callable;
mod errors;
mod outcome;
mod plugin;
mod responder;
mod state;
mod value;

pub mod dsl;
pub mod operation;
pub mod plugins;

pub use callable::{Callable, Continue, Invocable, ResolvedCallable, StepFn, Wrapper, WrapperFn};
pub use errors::{
    Details, Error, OperationError, OperationResult, FORBIDDEN, NOT_FOUND, VALIDATION,
};
pub use outcome::Outcome;
pub use plugin::{register_plugin, Capabilities, DeclarationFn, Plugin, Registry};
pub use responder::Responder;
pub use state::{State, DEFAULT_RESULT_KEY, INPUT_KEY};
pub use value::Value;

pub use dsl::{Block, Directive, DslPrimitive, DslRun, Process};
pub use operation::{Operation, OperationBuilder, OperationClass, Scope};
