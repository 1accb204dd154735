// Copyright 2025 Cowboy AI, LLC.

//! Outcome as MONAD - the railway every operation runs on
//!
//! An [`Outcome`] is either `Success(value)` or `Failure(error)`. Once a
//! failure appears, every combinator short-circuits and hands the very same
//! failure back, so a chain of steps stops at the first business failure.
//!
//! # Laws
//!
//! 1. Left Identity: `success(a).then(f) ≡ f(a)`
//! 2. Left Zero: `failure(e).then(f) ≡ failure(e)`, `f` never runs
//! 3. Tee: `success(a).tee(f) ≡ success(a)` unless `f` itself fails

use crate::errors::Error;

/// Success/Failure outcome of a step or an operation
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an Outcome may be a Failure that must be handled"]
pub enum Outcome<T, E = Error> {
    /// The computation produced a value
    Success(T),
    /// The computation stopped with an error
    Failure(E),
}

impl<T> Outcome<T, Error> {
    /// Lift a value into the railway
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Start the failure track with a business error
    pub fn failure(error: Error) -> Self {
        Outcome::Failure(error)
    }
}

impl<T, E> Outcome<T, E> {
    /// bind: continue with `f` on success, flattening its outcome
    ///
    /// ```rust
    /// use cim_operation::{Error, Outcome};
    ///
    /// let doubled = Outcome::success(21).then(|x| Outcome::success(x * 2));
    /// assert_eq!(doubled, Outcome::Success(42));
    ///
    /// let stopped = Outcome::<i32>::failure(Error::not_found())
    ///     .then(|_| -> Outcome<i32> { unreachable!() });
    /// assert!(stopped.is_failure());
    /// ```
    pub fn then<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Outcome<U, E>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Functor map: wrap a plain return of `f` as success
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        self.then(|value| Outcome::Success(f(value)))
    }

    /// Run `f` for its effect and keep the current value
    ///
    /// A success returned by `f` is discarded; a failure returned by `f`
    /// replaces the current outcome.
    pub fn tee<U, F>(self, f: F) -> Outcome<T, E>
    where
        F: FnOnce(&T) -> Outcome<U, E>,
    {
        match self {
            Outcome::Success(value) => match f(&value) {
                Outcome::Success(_) => Outcome::Success(value),
                Outcome::Failure(error) => Outcome::Failure(error),
            },
            failure => failure,
        }
    }

    /// Observe the success value without affecting the chain
    pub fn inspect<F>(self, f: F) -> Outcome<T, E>
    where
        F: FnOnce(&T),
    {
        if let Outcome::Success(value) = &self {
            f(value);
        }
        self
    }

    /// Transform the error on the failure track
    pub fn map_failure<G, F>(self, f: F) -> Outcome<T, G>
    where
        F: FnOnce(E) -> G,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(error) => Outcome::Failure(f(error)),
        }
    }

    /// Whether this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether this is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Borrow both sides
    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Success value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Failure error, if any
    pub fn err(self) -> Option<E> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Convert into a standard `Result` for `?` propagation
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

impl<T, E: std::fmt::Debug> Outcome<T, E> {
    /// Extract the success value
    ///
    /// # Panics
    ///
    /// Panics on a failure. Callers must branch on the variant first.
    #[track_caller]
    pub fn value(self) -> T {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failure(error) => panic!("value called on a failure: {error:?}"),
        }
    }
}

impl<T: std::fmt::Debug, E> Outcome<T, E> {
    /// Extract the failure error
    ///
    /// # Panics
    ///
    /// Panics on a success. Callers must branch on the variant first.
    #[track_caller]
    pub fn error(self) -> E {
        match self {
            Outcome::Success(value) => panic!("error called on a success: {value:?}"),
            Outcome::Failure(error) => error,
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_result()
    }
}

impl From<crate::Value> for Outcome<crate::Value, Error> {
    fn from(value: crate::Value) -> Self {
        Outcome::Success(value)
    }
}
