// Copyright 2025 Cowboy AI, LLC.

//! Pattern matching on outcomes
//!
//! A [`Responder`] collects a success branch, kind-specific failure branches
//! and a catch-all failure branch, then runs exactly the one that matches an
//! outcome. A failure branch registered for the error's kind wins over the
//! catch-all.

use indexmap::IndexMap;

use crate::errors::Error;
use crate::outcome::Outcome;
use crate::value::Value;

type Branch<'a, A, R> = Box<dyn FnOnce(A) -> R + 'a>;

/// Success/failure branches for an outcome
pub struct Responder<'a, R, T = Value> {
    success: Option<Branch<'a, T, R>>,
    failures: IndexMap<String, Branch<'a, Error, R>>,
    failure: Option<Branch<'a, Error, R>>,
}

impl<'a, R, T> Responder<'a, R, T> {
    /// Responder with no branches
    pub fn new() -> Self {
        Self {
            success: None,
            failures: IndexMap::new(),
            failure: None,
        }
    }

    /// Branch run on success
    pub fn success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(T) -> R + 'a,
    {
        self.success = Some(Box::new(f));
        self
    }

    /// Branch run on any failure without a kind-specific branch
    pub fn failure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Error) -> R + 'a,
    {
        self.failure = Some(Box::new(f));
        self
    }

    /// Branch run on a failure of `kind`
    pub fn failure_of<F>(mut self, kind: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(Error) -> R + 'a,
    {
        self.failures.insert(kind.into(), Box::new(f));
        self
    }

    /// Run the matching branch, if one was given
    ///
    /// ```rust
    /// use cim_operation::{Error, Outcome, Responder};
    ///
    /// let status = Responder::new()
    ///     .success(|_: i32| 200)
    ///     .failure_of("not_found", |_| 404)
    ///     .failure(|_| 422)
    ///     .respond(Outcome::failure(Error::not_found()));
    ///
    /// assert_eq!(status, Some(404));
    /// ```
    pub fn respond(mut self, outcome: Outcome<T>) -> Option<R> {
        match outcome {
            Outcome::Success(value) => self.success.map(|branch| branch(value)),
            Outcome::Failure(error) => self
                .failures
                .shift_remove(&error.kind)
                .or(self.failure)
                .map(|branch| branch(error)),
        }
    }
}

impl<R, T> Default for Responder<'_, R, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_success_branch_receives_value() {
        let seen = RefCell::new(Vec::new());
        let result = Responder::new()
            .success(|v: Value| seen.borrow_mut().push(*v.downcast_ref::<i64>().unwrap()))
            .failure(|_| panic!("failure branch must not run"))
            .respond(Outcome::success(Value::new(5_i64)));

        assert_eq!(result, Some(()));
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn test_generic_failure_is_fallback() {
        let result = Responder::<_, Value>::new()
            .failure_of("forbidden", |_| "forbidden")
            .failure(|e| if e.is_kind("validation") { "invalid" } else { "other" })
            .respond(Outcome::failure(Error::new("validation")));

        assert_eq!(result, Some("invalid"));
    }

    #[test]
    fn test_missing_branch_yields_none() {
        let result: Option<u16> = Responder::<_, Value>::new()
            .success(|_| 200)
            .respond(Outcome::failure(Error::forbidden()));

        assert_eq!(result, None);
    }
}
