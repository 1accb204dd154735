// Copyright 2025 Cowboy AI, LLC.

//! Step composition DSL
//!
//! - [`Process`]: the declarative, uncompiled directive list
//! - [`Block`]: a compiled directive list bound to one operation class
//! - [`DslRun`]: the engine threading one `Outcome<State>` through a block
//! - [`DslPrimitive`]: the seam plugins use to add directives

pub mod block;
pub mod process;
pub mod run;

pub use block::Block;
pub use process::{Directive, Process};
pub use run::{DslPrimitive, DslRun};
