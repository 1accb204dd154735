// Copyright 2025 Cowboy AI, LLC.

//! Authorization plugin
//!
//! Adds the `authorization` declaration, which stores a rule over the
//! operation instance and the current state, and the `authorize` directive
//! and helper, which fail with `forbidden` when that rule does not hold.
//! A class that never declares a rule authorizes everything.

use std::sync::Arc;

use tracing::debug;

use crate::callable::ResolvedCallable;
use crate::dsl::{Block, DslPrimitive, DslRun};
use crate::errors::{Error, OperationError, OperationResult};
use crate::operation::{Operation, OperationBuilder};
use crate::outcome::Outcome;
use crate::plugin::{Capabilities, Plugin};
use crate::state::State;
use crate::value::Value;

/// Class setting holding the declared rule
pub const AUTHORIZATION_SETTING: &str = "authorization";

/// Rule deciding whether the current call may proceed
pub type AuthorizationRule = Arc<dyn Fn(&Operation, &State) -> bool + Send + Sync>;

/// Wrap a rule as the argument of the `authorization` declaration
pub fn authorization<F>(rule: F) -> Value
where
    F: Fn(&Operation, &State) -> bool + Send + Sync + 'static,
{
    let rule: AuthorizationRule = Arc::new(rule);
    Value::new(rule)
}

/// The authorization plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAuth;

impl SimpleAuth {
    fn check(operation: &Operation, state: &State) -> Outcome<Value> {
        let allowed = operation
            .class()
            .setting(AUTHORIZATION_SETTING)
            .and_then(Value::downcast_ref::<AuthorizationRule>)
            .map_or(true, |rule| rule(operation, state));

        if allowed {
            Outcome::success(Value::new(true))
        } else {
            debug!(operation = %operation.name(), "Authorization denied");
            Outcome::failure(Error::forbidden())
        }
    }
}

impl Plugin for SimpleAuth {
    fn name(&self) -> &str {
        "simple_auth"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .declaration("authorization", declare_authorization)
            .helper("authorize", |op, state, _| SimpleAuth::check(op, state))
            .primitive("authorize", Authorize)
    }
}

fn declare_authorization(builder: &mut OperationBuilder, args: &[Value]) -> OperationResult<()> {
    let rule = args
        .first()
        .filter(|rule| rule.is::<AuthorizationRule>())
        .ok_or_else(|| OperationError::InvalidDeclaration {
            declaration: "authorization".to_string(),
            reason: "expected a rule built with `authorization(..)`".to_string(),
        })?;
    builder.insert_setting(AUTHORIZATION_SETTING, rule.clone());
    Ok(())
}

struct Authorize;

impl DslPrimitive for Authorize {
    fn execute(&self, run: &mut DslRun<'_>, _args: &[Value], _block: &Block) {
        let check = ResolvedCallable::new("authorize", |op, state, _| SimpleAuth::check(op, state));
        run.step(&check, &[]);
    }
}
