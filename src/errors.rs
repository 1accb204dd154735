// Copyright 2025 Cowboy AI, LLC.

//! Error types for operations
//!
//! Two families live here:
//! - [`Error`]: an expected business failure carried by
//!   [`Outcome::Failure`](crate::Outcome::Failure). Its `kind` is the primary
//!   dispatch key for presentation code downstream.
//! - [`OperationError`]: a defect in how an operation class was defined or
//!   instantiated (missing scope value, unknown step name, plugin clash).

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-field messages attached to a failure
pub type Details = IndexMap<String, Vec<String>>;

/// Kind used for input that failed validation
pub const VALIDATION: &str = "validation";
/// Kind used when a required record is absent
pub const NOT_FOUND: &str = "not_found";
/// Kind used when the caller may not perform the operation
pub const FORBIDDEN: &str = "forbidden";

/// A business failure: what went wrong, for whom, and where
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, JsonSchema)]
#[error("{message}")]
pub struct Error {
    /// Open-ended failure kind, e.g. `validation` or `not_found`
    pub kind: String,
    /// Human readable message
    pub message: String,
    /// Field to messages mapping
    #[serde(default)]
    pub details: Details,
}

impl Error {
    /// Create an error whose message is the humanized kind
    ///
    /// ```rust
    /// use cim_operation::Error;
    ///
    /// let err = Error::new("not_found");
    /// assert_eq!(err.message, "Not found");
    /// assert!(err.details.is_empty());
    /// ```
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let message = humanize(&kind);
        Self {
            kind,
            message,
            details: Details::new(),
        }
    }

    /// Replace the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the details
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Append one message for a field
    pub fn with_detail(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.details
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Validation failure with per-field messages
    pub fn validation(details: Details) -> Self {
        Self::new(VALIDATION).with_details(details)
    }

    /// Missing record failure
    pub fn not_found() -> Self {
        Self::new(NOT_FOUND)
    }

    /// Authorization failure
    pub fn forbidden() -> Self {
        Self::new(FORBIDDEN)
    }

    /// Check the kind
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

fn humanize(kind: &str) -> String {
    let spaced = kind.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Errors raised while defining or instantiating operations
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Scope dependencies declared by the class but not supplied
    #[error("Missing scope for {operation}: {}", .names.join(", "))]
    MissingScope {
        /// Operation class name
        operation: String,
        /// Names that were not bound
        names: Vec<String>,
    },

    /// A step referenced a method the class does not define
    #[error("Unknown method `{method}` referenced by {operation}")]
    UnknownMethod {
        /// Operation class name
        operation: String,
        /// Referenced name
        method: String,
    },

    /// A process used a DSL primitive no registered plugin provides
    #[error("Unknown directive `{directive}` in {operation}")]
    UnknownDirective {
        /// Operation class name
        operation: String,
        /// Directive name
        directive: String,
    },

    /// A class-level declaration no registered plugin provides
    #[error("Unknown declaration `{declaration}` on {operation}")]
    UnknownDeclaration {
        /// Operation class name
        operation: String,
        /// Declaration name
        declaration: String,
    },

    /// Two capability sets contribute the same name
    #[error("Capability `{name}` from plugin {plugin} conflicts with {existing}")]
    CapabilityConflict {
        /// Conflicting name
        name: String,
        /// Plugin being registered
        plugin: String,
        /// Owner of the existing entry
        existing: String,
    },

    /// A declaration received arguments it cannot use
    #[error("Invalid declaration `{declaration}`: {reason}")]
    InvalidDeclaration {
        /// Declaration name
        declaration: String,
        /// What was wrong
        reason: String,
    },

    /// A plugin setup hook failed
    #[error("Plugin {plugin} setup failed: {source}")]
    PluginSetup {
        /// Plugin name
        plugin: String,
        /// Underlying failure
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for operation definition
pub type OperationResult<T> = Result<T, OperationError>;

impl OperationError {
    /// Check if this is a missing scope error
    pub fn is_missing_scope(&self) -> bool {
        matches!(self, OperationError::MissingScope { .. })
    }

    /// Check if this is an unresolved name, method or directive
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            OperationError::UnknownMethod { .. }
                | OperationError::UnknownDirective { .. }
                | OperationError::UnknownDeclaration { .. }
        )
    }
}
