// Copyright 2025 Cowboy AI, LLC.

//! Input validation plugin
//!
//! Register with an optional first argument naming the state key the
//! validated parameters are written to (`"params"` by default). The
//! `contract` declaration attaches a [`Contract`]; the `validate` directive
//! checks the JSON input against it and fails with kind `validation`,
//! carrying per-field messages, when it does not hold.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::callable::ResolvedCallable;
use crate::dsl::{Block, DslPrimitive, DslRun};
use crate::errors::{Details, Error, OperationError, OperationResult};
use crate::operation::{Operation, OperationBuilder};
use crate::outcome::Outcome;
use crate::plugin::{Capabilities, Plugin};
use crate::state::State;
use crate::value::Value;

/// Class setting holding the declared contract
pub const CONTRACT_SETTING: &str = "validation.contract";
/// Class setting holding the key validated params are written to
pub const PARAMS_KEY_SETTING: &str = "validation.params_key";
/// Default key for validated params
pub const DEFAULT_PARAMS_KEY: &str = "params";

/// Rules an input document must satisfy
pub trait Contract: Send + Sync {
    /// Validate `input`, returning the accepted params or per-field errors
    fn validate(&self, input: &serde_json::Value) -> Result<serde_json::Value, Details>;
}

/// Shared handle to a contract, as stored in class settings
pub type ContractRef = Arc<dyn Contract>;

/// Wrap a contract as the argument of the `contract` declaration
pub fn contract(contract: impl Contract + 'static) -> Value {
    let contract: ContractRef = Arc::new(contract);
    Value::new(contract)
}

/// Contract requiring a set of top-level fields to be present and non-null
///
/// Only the listed fields are kept in the accepted params.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RequiredFields {
    /// Field names that must be present
    pub fields: Vec<String>,
}

impl RequiredFields {
    /// Require `fields`
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Contract for RequiredFields {
    fn validate(&self, input: &serde_json::Value) -> Result<serde_json::Value, Details> {
        let mut accepted = serde_json::Map::new();
        let mut details = Details::new();
        for field in &self.fields {
            match input.get(field) {
                Some(value) if !value.is_null() => {
                    accepted.insert(field.clone(), value.clone());
                }
                _ => details
                    .entry(field.clone())
                    .or_default()
                    .push("is missing".to_string()),
            }
        }
        if details.is_empty() {
            Ok(serde_json::Value::Object(accepted))
        } else {
            Err(details)
        }
    }
}

/// The validation plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct Validation;

impl Plugin for Validation {
    fn name(&self) -> &str {
        "validation"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .declaration("contract", declare_contract)
            .primitive("validate", Validate)
    }

    fn apply(&self, builder: &mut OperationBuilder, args: &[Value]) -> anyhow::Result<()> {
        let key = match args.first() {
            None => DEFAULT_PARAMS_KEY.to_string(),
            Some(value) => value
                .downcast_ref::<String>()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("params key must be a string, got {}", value.type_name()))?,
        };
        builder.insert_setting(PARAMS_KEY_SETTING, key);
        Ok(())
    }
}

fn declare_contract(builder: &mut OperationBuilder, args: &[Value]) -> OperationResult<()> {
    let contract = args
        .first()
        .filter(|contract| contract.is::<ContractRef>())
        .ok_or_else(|| OperationError::InvalidDeclaration {
            declaration: "contract".to_string(),
            reason: "expected a contract built with `contract(..)`".to_string(),
        })?;
    builder.insert_setting(CONTRACT_SETTING, contract.clone());
    Ok(())
}

fn check(operation: &Operation, state: &State) -> Outcome<Value> {
    let Some(contract) = operation
        .class()
        .setting(CONTRACT_SETTING)
        .and_then(Value::downcast_ref::<ContractRef>)
    else {
        return Outcome::failure(Error::new("validation").with_message("No contract declared"));
    };
    let Some(input) = state.input().and_then(Value::as_json) else {
        return Outcome::failure(Error::validation(Details::from([(
            "input".to_string(),
            vec!["must be a JSON document".to_string()],
        )])));
    };

    match contract.validate(input) {
        Ok(params) => Outcome::success(Value::json(params)),
        Err(details) => {
            debug!(
                operation = %operation.name(),
                fields = ?details.keys().collect::<Vec<_>>(),
                "Input rejected by contract"
            );
            Outcome::failure(Error::validation(details))
        }
    }
}

struct Validate;

impl DslPrimitive for Validate {
    fn execute(&self, run: &mut DslRun<'_>, _args: &[Value], _block: &Block) {
        let key = run
            .operation()
            .class()
            .setting(PARAMS_KEY_SETTING)
            .and_then(Value::downcast_ref::<String>)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PARAMS_KEY.to_string());
        run.set(&ResolvedCallable::new("validate", |op, state, _| check(op, state)), &[], &key);
    }

    fn verify(&self, name: &str, settings: &IndexMap<String, Value>) -> OperationResult<()> {
        if settings.contains_key(CONTRACT_SETTING) {
            Ok(())
        } else {
            Err(OperationError::InvalidDeclaration {
                declaration: name.to_string(),
                reason: "`contract` must be declared before `validate` is used".to_string(),
            })
        }
    }
}
