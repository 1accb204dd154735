// Copyright 2025 Cowboy AI, LLC.

//! Record lookup plugin
//!
//! The `model` declaration names a [`Repository`] scope dependency and how
//! to search it; the `fetch_model` directive looks the record up and stores
//! it in the state, failing with `not_found` when there is none.
//!
//! ```rust
//! use cim_operation::plugins::records::Records;
//! use cim_operation::{OperationBuilder, Process, Value};
//! use serde_json::json;
//!
//! let class = OperationBuilder::new("ShowUser")
//!     .plugin(Records, Vec::new())
//!     .unwrap()
//!     .declare("model", vec![Value::json(json!({ "scope": "users", "key": "user" }))])
//!     .unwrap()
//!     .process(Process::new().directive("fetch_model", Vec::new()))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(class.scope_names().collect::<Vec<_>>(), vec!["users"]);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::trace;

use crate::callable::ResolvedCallable;
use crate::dsl::{Block, DslPrimitive, DslRun};
use crate::errors::{Error, OperationError, OperationResult, NOT_FOUND};
use crate::operation::{Operation, OperationBuilder};
use crate::outcome::Outcome;
use crate::plugin::{Capabilities, Plugin};
use crate::state::{State, INPUT_KEY};
use crate::value::Value;

/// Class setting holding the parsed [`ModelConfig`]
pub const MODEL_SETTING: &str = "records.model";

/// Lookup of records by a search value
#[cfg_attr(test, mockall::automock)]
pub trait Repository: Send + Sync {
    /// Record matching `search`, if any
    fn fetch(&self, search: &Value) -> Option<Value>;
}

/// How `fetch_model` finds its record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelConfig {
    /// Scope dependency holding an `Arc<dyn Repository>`
    pub scope: String,
    /// Field of the source document used as the search value
    #[serde(default = "ModelConfig::default_search_by")]
    pub search_by: String,
    /// State key the record is stored under
    #[serde(default = "ModelConfig::default_key")]
    pub key: String,
    /// State key holding the source document
    #[serde(default = "ModelConfig::default_from")]
    pub from: String,
    /// Message used for the `not_found` failure
    #[serde(default)]
    pub not_found_message: Option<String>,
}

impl ModelConfig {
    fn default_search_by() -> String {
        "id".to_string()
    }

    fn default_key() -> String {
        "model".to_string()
    }

    fn default_from() -> String {
        INPUT_KEY.to_string()
    }
}

/// The record lookup plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct Records;

impl Plugin for Records {
    fn name(&self) -> &str {
        "records"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .declaration("model", declare_model)
            .primitive("fetch_model", FetchModel)
    }
}

fn declare_model(builder: &mut OperationBuilder, args: &[Value]) -> OperationResult<()> {
    let invalid = |reason: String| OperationError::InvalidDeclaration {
        declaration: "model".to_string(),
        reason,
    };
    let json = args
        .first()
        .and_then(Value::as_json)
        .ok_or_else(|| invalid("expected a JSON model configuration".to_string()))?;
    let config: ModelConfig =
        serde_json::from_value(json.clone()).map_err(|err| invalid(err.to_string()))?;

    builder.add_scope([config.scope.clone()]);
    builder.insert_setting(MODEL_SETTING, Value::new(config));
    Ok(())
}

/// # Panics
///
/// Panics when the model scope is bound to something other than an
/// `Arc<dyn Repository>`.
fn fetch(operation: &Operation, state: &State, config: &ModelConfig) -> Outcome<Value> {
    let repository = operation
        .scope::<Arc<dyn Repository>>(&config.scope)
        .unwrap_or_else(|| {
            panic!(
                "scope `{}` of {} is bound to {} instead of an Arc<dyn Repository>",
                config.scope,
                operation.name(),
                operation.scope_value(&config.scope).map_or("nothing", Value::type_name)
            )
        });
    let search = state
        .get(&config.from)
        .and_then(Value::as_json)
        .and_then(|source| source.get(&config.search_by))
        .filter(|search| !search.is_null())
        .cloned();

    trace!(
        operation = %operation.name(),
        search_by = %config.search_by,
        search = ?search,
        "Fetching model"
    );
    let record = search.and_then(|search| repository.fetch(&Value::json(search)));
    operation.wrap_if_present_as(record, NOT_FOUND, config.not_found_message.as_deref())
}

struct FetchModel;

impl DslPrimitive for FetchModel {
    fn execute(&self, run: &mut DslRun<'_>, _args: &[Value], _block: &Block) {
        let Some(config) = run
            .operation()
            .class()
            .setting(MODEL_SETTING)
            .and_then(Value::downcast_arc::<ModelConfig>)
        else {
            let missing = ResolvedCallable::new("fetch_model", |_, _, _| {
                Outcome::failure(Error::new("records").with_message("No model declared"))
            });
            run.step(&missing, &[]);
            return;
        };
        let key = config.key.clone();
        let lookup = ResolvedCallable::new("fetch_model", move |op, state, _| fetch(op, state, &config));
        run.set(&lookup, &[], &key);
    }

    fn verify(&self, name: &str, settings: &IndexMap<String, Value>) -> OperationResult<()> {
        if settings.get(MODEL_SETTING).is_some_and(|config| config.is::<ModelConfig>()) {
            Ok(())
        } else {
            Err(OperationError::InvalidDeclaration {
                declaration: name.to_string(),
                reason: "`model` must be declared before `fetch_model` is used".to_string(),
            })
        }
    }
}
