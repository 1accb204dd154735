// Copyright 2025 Cowboy AI, LLC.

//! End-to-end operation scenarios with injected collaborators.

use std::sync::Arc;

use cim_operation::{
    Details, Error, Operation, OperationBuilder, OperationClass, OperationError, Outcome, Process,
    Scope, State, Value,
};
use mockall::automock;
use pretty_assertions::assert_eq;
use serde_json::json;

#[automock]
trait Backend: Send + Sync {
    fn fetch(&self, name: &str) -> Option<String>;
}

#[automock]
trait Notifier: Send + Sync {
    fn notify(&self, state: &State);
}

fn backend(op: &Operation) -> &Arc<dyn Backend> {
    op.scope::<Arc<dyn Backend>>("backend")
        .expect("backend is a declared scope dependency")
}

fn notifier(op: &Operation) -> &Arc<dyn Notifier> {
    op.scope::<Arc<dyn Notifier>>("notifier")
        .expect("notifier is a declared scope dependency")
}

fn input_field<'a>(state: &'a State, field: &str) -> Option<&'a serde_json::Value> {
    state
        .input()
        .and_then(Value::as_json)
        .and_then(|input| input.get(field))
        .filter(|value| !value.is_null())
}

fn register_user() -> Arc<OperationClass> {
    OperationBuilder::new("RegisterUser")
        .scope(["backend", "notifier"])
        .method("validate_required_field", |_, state, args| {
            let field = args
                .first()
                .and_then(|v| v.downcast_ref::<String>())
                .cloned()
                .unwrap_or_default();
            match input_field(state, &field) {
                Some(_) => Value::new(true).into(),
                None => Outcome::failure(Error::validation(Details::from([(
                    field,
                    vec!["is missing".to_string()],
                )]))),
            }
        })
        .method("fetch_backend_value", |op, state, _| {
            let name = input_field(state, "name").and_then(|v| v.as_str()).unwrap_or_default();
            op.wrap_if_present(backend(op).fetch(name).map(Value::new))
        })
        .method("notify", |op, state, _| {
            notifier(op).notify(state);
            Value::nil().into()
        })
        .process(
            Process::new()
                .step_with("validate_required_field", vec![Value::from("name")])
                .set("fetch_backend_value")
                .step("notify"),
        )
        .build()
        .unwrap()
}

fn scope(backend: MockBackend, notifier: MockNotifier) -> Scope {
    let backend: Arc<dyn Backend> = Arc::new(backend);
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    Scope::new()
        .with_any("backend", backend)
        .with_any("notifier", notifier)
}

#[test]
fn missing_required_field_fails_before_any_collaborator_runs() {
    let mut backend = MockBackend::new();
    backend.expect_fetch().never();
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().never();

    let error = register_user()
        .call(scope(backend, notifier), json!({}))
        .unwrap()
        .error();

    assert_eq!(error.kind, "validation");
    assert_eq!(
        error.details,
        Details::from([("name".to_string(), vec!["is missing".to_string()])])
    );
}

#[test]
fn valid_input_returns_backend_value_and_notifies_with_merged_state() {
    let mut backend = MockBackend::new();
    backend
        .expect_fetch()
        .withf(|name| name == "Paul Smith")
        .times(1)
        .returning(|_| Some("backend-value".to_string()));
    let mut notifier = MockNotifier::new();
    notifier
        .expect_notify()
        .withf(|state: &State| {
            input_field(state, "name").is_some()
                && input_field(state, "email").is_some()
                && state.get_as::<String>("value").map(String::as_str) == Some("backend-value")
                && state.contains("backend")
                && state.contains("notifier")
        })
        .times(1)
        .return_const(());

    let outcome = register_user()
        .call(
            scope(backend, notifier),
            json!({ "name": "Paul Smith", "email": "psmith@email.com" }),
        )
        .unwrap();

    assert_eq!(
        outcome.value().downcast_ref::<String>().map(String::as_str),
        Some("backend-value")
    );
}

#[test]
fn absent_backend_value_is_not_found() {
    let mut backend = MockBackend::new();
    backend.expect_fetch().returning(|_| None);
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().never();

    let outcome = register_user()
        .call(scope(backend, notifier), json!({ "name": "Nobody" }))
        .unwrap();

    assert!(outcome.error().is_kind("not_found"));
}

#[test]
fn missing_scope_is_reported_at_instantiation() {
    let backend: Arc<dyn Backend> = Arc::new(MockBackend::new());
    let err = register_user()
        .instantiate(Scope::new().with_any("backend", backend))
        .unwrap_err();

    assert!(err.is_missing_scope());
    assert_eq!(err.to_string(), "Missing scope for RegisterUser: notifier");
}

#[test]
fn result_at_reads_a_different_key() {
    let class = OperationBuilder::new("Lookup")
        .result_at("found")
        .method("lookup", |_, _, _| Value::from("record").into())
        .method("audit", |_, _, _| Value::from("logged").into())
        .process(Process::new().set_to("lookup", "found").set_to("audit", "log"))
        .build()
        .unwrap();

    let outcome = class.call(Scope::new(), Value::nil()).unwrap();

    assert_eq!(outcome.value().downcast_ref::<String>().map(String::as_str), Some("record"));
}

#[test]
fn unqualified_set_writes_the_overridden_result_key() {
    let class = OperationBuilder::new("Lookup")
        .result_at("found")
        .method("lookup", |_, _, _| Value::from("record").into())
        .method("audit", |_, _, _| Value::from("logged").into())
        .process(Process::new().set_to("lookup", "found").set("audit"))
        .build()
        .unwrap();

    let outcome = class.call(Scope::new(), Value::nil()).unwrap();

    assert_eq!(outcome.value().downcast_ref::<String>().map(String::as_str), Some("logged"));
}

#[test]
fn subclass_overrides_apply_to_the_inherited_process() {
    let parent = OperationBuilder::new("Price")
        .scope(["currency"])
        .method("amount", |_, _, _| Value::new(100_i64).into())
        .process(Process::new().set("amount"))
        .build()
        .unwrap();
    let child = parent
        .subclass("DiscountedPrice")
        .method("amount", |_, _, _| Value::new(80_i64).into())
        .build()
        .unwrap();

    let currency = || Scope::new().with("currency", "EUR");
    let parent_value = parent.call(currency(), Value::nil()).unwrap().value();
    let child_value = child.call(currency(), Value::nil()).unwrap().value();

    assert_eq!(parent_value.downcast_ref::<i64>(), Some(&100));
    assert_eq!(child_value.downcast_ref::<i64>(), Some(&80));
    assert_eq!(child.parent(), Some("Price"));
    assert_eq!(child.scope_names().collect::<Vec<_>>(), vec!["currency"]);
    assert!(child.instantiate(Scope::new()).is_err());
}

#[test]
fn unknown_method_is_a_build_error() {
    let err = OperationBuilder::new("Broken")
        .process(Process::new().step("does_not_exist"))
        .build()
        .unwrap_err();

    assert!(matches!(err, OperationError::UnknownMethod { ref method, .. } if method == "does_not_exist"));
}

#[test]
fn invoke_dispatches_named_methods() {
    let class = OperationBuilder::new("Echo")
        .method("echo", |_, _, args| args.first().cloned().unwrap_or_default().into())
        .build()
        .unwrap();
    let op = class.instantiate(Scope::new()).unwrap();
    let state = State::new("value");

    let echoed = op.invoke("echo", &state, &[Value::from("hi")]).unwrap().value();

    assert_eq!(echoed.downcast_ref::<String>().map(String::as_str), Some("hi"));
    assert!(op.invoke("missing", &state, &[]).is_err());
    assert!(class.responds_to("echo"));
}

#[test]
fn call_with_runs_the_matching_branch() {
    let class = OperationBuilder::new("Find")
        .method("find", |op, state, _| {
            op.wrap_if_present(state.input().filter(|v| v.is_truthy()).cloned())
        })
        .process(Process::new().set("find"))
        .build()
        .unwrap();

    let respond = |input: Value| {
        class
            .call_with(Scope::new(), input, |r| {
                r.success(|_| 200_u16)
                    .failure_of("not_found", |_| 404)
                    .failure(|_| 500)
            })
            .unwrap()
    };

    assert_eq!(respond(Value::from("present")), Some(200));
    assert_eq!(respond(Value::nil()), Some(404));
}

#[test]
fn error_helpers_build_structured_failures() {
    let class = OperationBuilder::new("Helpers").build().unwrap();
    let op = class.instantiate(Scope::new()).unwrap();

    let plain = op.error::<()>("not_found").error();
    assert_eq!(plain.message, "Not found");

    let detailed = op
        .error_with::<()>(
            "validation",
            Some("Bad input"),
            Some(Details::from([("email".to_string(), vec!["is invalid".to_string()])])),
        )
        .error();
    assert_eq!(detailed.message, "Bad input");
    assert_eq!(detailed.details["email"], vec!["is invalid".to_string()]);

    assert!(op.wrap(5).is_success());
    assert!(op
        .wrap_if_present_as(Some(Value::nil()), "forbidden", None)
        .error()
        .is_kind("forbidden"));
}
