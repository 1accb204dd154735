// Copyright 2025 Cowboy AI, LLC.

//! Plugin registration: idempotence, inheritance, isolation and conflicts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cim_operation::dsl::{Block, DslPrimitive, DslRun};
use cim_operation::plugins::{authorization, contract, RequiredFields, SimpleAuth, Validation};
use cim_operation::{
    register_plugin, Capabilities, OperationBuilder, OperationError, Outcome, Plugin, Process,
    ResolvedCallable, Scope, State, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Records every audited state key set through its `audit` directive
struct Audit {
    setups: Arc<AtomicUsize>,
}

impl Audit {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let setups = Arc::new(AtomicUsize::new(0));
        (
            Self {
                setups: Arc::clone(&setups),
            },
            setups,
        )
    }
}

struct AuditDirective;

impl DslPrimitive for AuditDirective {
    fn execute(&self, run: &mut DslRun<'_>, args: &[Value], block: &Block) {
        let label = args
            .first()
            .and_then(|v| v.downcast_ref::<String>())
            .cloned()
            .unwrap_or_else(|| "audit".to_string());
        run.run_block(block);
        let record = ResolvedCallable::new("audit", move |_, _, _| Value::new(label.clone()).into());
        run.set(&record, &[], "audited_by");
    }
}

impl Plugin for Audit {
    fn name(&self) -> &str {
        "audit"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .declaration("audited", |builder, args| {
                builder.insert_setting("audit.level", args.first().cloned().unwrap_or_default());
                Ok(())
            })
            .helper("audit_trail", |op, _, _| {
                let level = op.class().setting("audit.level").cloned().unwrap_or_default();
                Outcome::success(level)
            })
            .primitive("audit", AuditDirective)
    }

    fn apply(&self, builder: &mut OperationBuilder, args: &[Value]) -> anyhow::Result<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        builder.insert_setting("audit.args", Value::new(args.len() as i64));
        Ok(())
    }
}

/// Contributes a helper whose name clashes with `Audit`
struct Shadow;

impl Plugin for Shadow {
    fn name(&self) -> &str {
        "shadow"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new().helper("audit_trail", |_, _, _| Value::nil().into())
    }
}

struct Failing;

impl Plugin for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(&self, _builder: &mut OperationBuilder, _args: &[Value]) -> anyhow::Result<()> {
        anyhow::bail!("setup refused")
    }
}

#[test]
fn registering_twice_runs_setup_once_and_keeps_first_args() {
    let (audit, setups) = Audit::new();
    let mut builder = OperationBuilder::new("Audited");
    register_plugin(&mut builder, &audit, &[Value::from("first")]).unwrap();
    register_plugin(&mut builder, &audit, &[Value::from("a"), Value::from("b")]).unwrap();

    assert_eq!(setups.load(Ordering::SeqCst), 1);
    assert_eq!(builder.registry().plugins().collect::<Vec<_>>(), vec!["audit"]);
    assert_eq!(builder.get_setting("audit.args").and_then(|v| v.downcast_ref::<i64>()), Some(&1));
}

#[test]
fn subclass_inherits_capabilities_without_reregistering() {
    let (audit, setups) = Audit::new();
    let parent = OperationBuilder::new("Base")
        .plugin(audit, Vec::new())
        .unwrap()
        .plugin(SimpleAuth, Vec::new())
        .unwrap()
        .build()
        .unwrap();

    let child = parent
        .subclass("Child")
        .declare("audited", vec![Value::from("high")])
        .unwrap()
        .process(
            Process::new()
                .directive("authorize", Vec::new())
                .directive_block("audit", vec![Value::from("child")], |b| {
                    b.set_to("audit_trail", "trail")
                }),
        )
        .build()
        .unwrap();

    assert_eq!(setups.load(Ordering::SeqCst), 1);
    assert_eq!(child.registry().plugins().collect::<Vec<_>>(), vec!["audit", "simple_auth"]);
    assert!(child.responds_to("audit_trail"));
    assert!(child.responds_to("authorize"));

    let op = child.instantiate(Scope::new()).unwrap();
    let mut run = DslRun::new(&op, Outcome::success(State::new("value")));
    run.run_block(child.block());
    let state = run.into_outcome().value();

    assert_eq!(state.get_as::<String>("trail").map(String::as_str), Some("high"));
    assert_eq!(state.get_as::<String>("audited_by").map(String::as_str), Some("child"));
}

#[test]
fn siblings_do_not_see_each_others_plugins() {
    let base = OperationBuilder::new("Base").build().unwrap();
    let (audit, _) = Audit::new();
    let with_audit = base.subclass("WithAudit").plugin(audit, Vec::new()).unwrap().build().unwrap();
    let plain = base.subclass("Plain").build().unwrap();

    assert!(with_audit.registry().has_primitive("audit"));
    assert!(!plain.registry().has_primitive("audit"));
    assert!(!base.registry().has_plugin("audit"));

    let err = base
        .subclass("Plain")
        .process(Process::new().directive("audit", Vec::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, OperationError::UnknownDirective { ref directive, .. } if directive == "audit"));
}

#[test]
fn unrelated_plugins_union_in_any_order() {
    let in_order = OperationBuilder::new("A")
        .plugin(SimpleAuth, Vec::new())
        .unwrap()
        .plugin(Validation, Vec::new())
        .unwrap()
        .build()
        .unwrap();
    let reversed = OperationBuilder::new("B")
        .plugin(Validation, Vec::new())
        .unwrap()
        .plugin(SimpleAuth, Vec::new())
        .unwrap()
        .build()
        .unwrap();

    for name in ["authorize", "validate"] {
        assert_eq!(in_order.registry().has_primitive(name), reversed.registry().has_primitive(name));
    }
    for name in ["authorization", "contract"] {
        assert!(in_order.registry().has_declaration(name));
        assert!(reversed.registry().has_declaration(name));
    }
}

#[test]
fn conflicting_capabilities_are_rejected_in_either_order() {
    let (audit, _) = Audit::new();
    let err = OperationBuilder::new("Clash")
        .plugin(audit, Vec::new())
        .unwrap()
        .plugin(Shadow, Vec::new())
        .unwrap_err();
    assert!(matches!(err, OperationError::CapabilityConflict { ref existing, .. } if existing == "audit"));

    let (audit, setups) = Audit::new();
    let err = OperationBuilder::new("Clash")
        .plugin(Shadow, Vec::new())
        .unwrap()
        .plugin(audit, Vec::new())
        .unwrap_err();
    assert!(matches!(err, OperationError::CapabilityConflict { ref plugin, .. } if plugin == "audit"));
    assert_eq!(setups.load(Ordering::SeqCst), 0);
}

#[test]
fn class_methods_override_plugin_helpers() {
    let (audit, _) = Audit::new();
    let class = OperationBuilder::new("Override")
        .plugin(audit, Vec::new())
        .unwrap()
        .method("audit_trail", |_, _, _| Value::from("own").into())
        .process(Process::new().set("audit_trail"))
        .build()
        .unwrap();

    let value = class.call(Scope::new(), Value::nil()).unwrap().value();
    assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("own"));
}

#[test]
fn failing_setup_is_reported() {
    let err = OperationBuilder::new("Broken").plugin(Failing, Vec::new()).unwrap_err();

    assert!(matches!(err, OperationError::PluginSetup { ref plugin, .. } if plugin == "failing"));
}

#[test]
fn unknown_declaration_without_plugin() {
    let err = OperationBuilder::new("Plain")
        .declare("contract", Vec::new())
        .unwrap_err();

    assert!(matches!(err, OperationError::UnknownDeclaration { .. }));
}

#[test]
fn bundled_plugins_compose_into_one_process() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let class = OperationBuilder::new("CreatePost")
        .scope(["role"])
        .plugin(SimpleAuth, Vec::new())
        .unwrap()
        .plugin(Validation, Vec::new())
        .unwrap()
        .declare(
            "authorization",
            vec![authorization(|op, _| op.scope::<String>("role").is_some_and(|r| r == "editor"))],
        )
        .unwrap()
        .declare("contract", vec![contract(RequiredFields::new(["title"]))])
        .unwrap()
        .method("publish", move |_, state, _| {
            *sink.lock().unwrap() = state.get_as::<serde_json::Value>("params").cloned();
            Value::from("published").into()
        })
        .process(
            Process::new()
                .directive("authorize", Vec::new())
                .directive("validate", Vec::new())
                .set("publish"),
        )
        .build()
        .unwrap();

    let editor = || Scope::new().with("role", "editor");

    let denied = class
        .call(Scope::new().with("role", "guest"), json!({ "title": "Hi" }))
        .unwrap();
    assert!(denied.error().is_kind("forbidden"));
    assert!(seen.lock().unwrap().is_none());

    let invalid = class.call(editor(), json!({ "body": "..." })).unwrap().error();
    assert_eq!(invalid.kind, "validation");
    assert_eq!(invalid.details["title"], vec!["is missing".to_string()]);

    let published = class.call(editor(), json!({ "title": "Hi", "body": "..." })).unwrap();
    assert_eq!(
        published.value().downcast_ref::<String>().map(String::as_str),
        Some("published")
    );
    assert_eq!(*seen.lock().unwrap(), Some(json!({ "title": "Hi" })));
}
