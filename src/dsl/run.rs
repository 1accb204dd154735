// Copyright 2025 Cowboy AI, LLC.

//! The step engine
//!
//! A [`DslRun`] wraps exactly one `Outcome<State>` and the operation instance
//! that started it. Each primitive advances that outcome through the
//! [`Outcome`] combinators, so once a failure appears no later callable in
//! the same chain runs.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::callable::{Continue, ResolvedCallable, Wrapper};
use crate::dsl::block::Block;
use crate::errors::OperationResult;
use crate::operation::Operation;
use crate::outcome::Outcome;
use crate::state::State;
use crate::value::Value;

/// A directive contributed by a plugin
///
/// Primitives receive the live run and drive it through its public
/// primitives (`step`, `set`, `map`, `sequence`, `guard`, `run_block`).
pub trait DslPrimitive: Send + Sync {
    /// Advance `run` using the directive arguments and nested block
    fn execute(&self, run: &mut DslRun<'_>, args: &[Value], block: &Block);

    /// Check the class settings this primitive relies on, at build time
    fn verify(&self, _name: &str, _settings: &IndexMap<String, Value>) -> OperationResult<()> {
        Ok(())
    }
}

/// One pass of a process over an operation instance
#[derive(Debug, Clone)]
pub struct DslRun<'op> {
    operation: &'op Operation,
    outcome: Outcome<State>,
}

impl<'op> DslRun<'op> {
    /// Start a run from an initial outcome
    pub fn new(operation: &'op Operation, outcome: Outcome<State>) -> Self {
        Self { operation, outcome }
    }

    /// The operation instance driving this run
    pub fn operation(&self) -> &'op Operation {
        self.operation
    }

    /// Current outcome
    pub fn outcome(&self) -> &Outcome<State> {
        &self.outcome
    }

    /// Finish the run
    pub fn into_outcome(self) -> Outcome<State> {
        self.outcome
    }

    /// Run every directive of `block` in order
    pub fn run_block(&mut self, block: &Block) {
        for (index, directive) in block.iter().enumerate() {
            if let Outcome::Failure(error) = &self.outcome {
                debug!(
                    operation = %self.operation.name(),
                    kind = %error.kind,
                    skipped = block.len() - index,
                    "Chain short-circuited"
                );
                return;
            }
            trace!(
                operation = %self.operation.name(),
                directive = %directive.kind(),
                target = %directive.target(),
                "Running directive"
            );
            directive.execute(self);
        }
    }

    /// `step`: run for effect; keep the state unless the callable fails
    pub fn step(&mut self, callable: &ResolvedCallable, args: &[Value]) {
        let operation = self.operation;
        self.advance(|outcome| outcome.tee(|state| callable.call(operation, state, args)));
    }

    /// `set`: run and merge the returned value under `to`
    pub fn set(&mut self, callable: &ResolvedCallable, args: &[Value], to: &str) {
        let operation = self.operation;
        self.advance(|outcome| {
            outcome.then(|mut state| {
                callable.call(operation, &state, args).map(|value| {
                    state.set(to, value);
                    state
                })
            })
        });
    }

    /// `map`: run and take the returned state as the new chain state
    ///
    /// # Panics
    ///
    /// Panics when the callable succeeds with something other than a
    /// [`State`]; build mappers with [`Callable::state_map`](crate::Callable::state_map).
    pub fn map(&mut self, callable: &ResolvedCallable) {
        let operation = self.operation;
        self.advance(|outcome| {
            outcome.then(|state| {
                callable.call(operation, &state, &[]).map(|value| {
                    value.downcast_ref::<State>().cloned().unwrap_or_else(|| {
                        panic!(
                            "map target `{}` returned {} instead of a State",
                            callable.label(),
                            value.type_name()
                        )
                    })
                })
            })
        });
    }

    /// `sequence`: hand the continue capability for `block` to `wrapper`
    ///
    /// If the wrapper never continues, the state is left as it was. If it
    /// does, the nested chain's final outcome replaces this chain's outcome,
    /// failure included.
    pub fn sequence(&mut self, wrapper: &Wrapper, block: &Block) {
        self.nest(block, |operation, next, state| wrapper.call(operation, next, state));
    }

    /// `guard`: run `block` only when `condition` is truthy
    pub fn guard(&mut self, condition: &ResolvedCallable, block: &Block) {
        self.branch(condition, true, block);
    }

    /// `unless`: run `block` only when `condition` is falsy
    pub fn unless(&mut self, condition: &ResolvedCallable, block: &Block) {
        self.branch(condition, false, block);
    }

    pub(crate) fn branch(&mut self, condition: &ResolvedCallable, expected: bool, block: &Block) {
        let Outcome::Success(state) = &self.outcome else {
            return;
        };
        let holds = match condition.call(self.operation, state, &[]) {
            Outcome::Success(flag) => flag.is_truthy(),
            Outcome::Failure(error) => {
                self.outcome = Outcome::Failure(error);
                return;
            }
        };
        if holds == expected {
            self.nest(block, |_, next, _| {
                let _ = next();
            });
        } else {
            trace!(
                operation = %self.operation.name(),
                condition = %condition.label(),
                "Condition not met, block skipped"
            );
        }
    }

    fn nest<F>(&mut self, block: &Block, wrapper: F)
    where
        F: FnOnce(&'op Operation, &mut Continue<'_>, &State),
    {
        let Outcome::Success(state) = &self.outcome else {
            return;
        };
        let origin = self.clone();
        let mut nested: Option<Outcome<State>> = None;
        {
            let mut next = || {
                let mut run = origin.clone();
                run.run_block(block);
                nested = Some(run.outcome.clone());
                run.outcome
            };
            wrapper(self.operation, &mut next, state);
        }
        if let Some(outcome) = nested {
            self.outcome = outcome;
        }
    }

    fn advance<F>(&mut self, f: F)
    where
        F: FnOnce(Outcome<State>) -> Outcome<State>,
    {
        let current = std::mem::replace(&mut self.outcome, Outcome::Success(State::new(String::new())));
        self.outcome = f(current);
    }
}
