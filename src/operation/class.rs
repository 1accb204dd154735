// Copyright 2025 Cowboy AI, LLC.

//! Operation classes and their builder
//!
//! An [`OperationClass`] is the immutable definition of one unit of business
//! logic: declared scope names, result key, methods, class settings, plugin
//! registry and the compiled process. Classes are produced by an
//! [`OperationBuilder`]; a subclass starts from a builder seeded with a copy
//! of everything its parent declared.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::callable::StepFn;
use crate::dsl::block::{Block, Compiler};
use crate::dsl::Process;
use crate::errors::{OperationError, OperationResult};
use crate::operation::{Operation, Scope};
use crate::outcome::Outcome;
use crate::plugin::{register_plugin, Plugin, Registry};
use crate::responder::Responder;
use crate::state::{State, DEFAULT_RESULT_KEY};
use crate::value::Value;

/// Builder for an operation class
///
/// ```rust
/// use cim_operation::{Callable, OperationBuilder, Process, Scope, Value};
///
/// let class = OperationBuilder::new("Greet")
///     .scope(["greeting"])
///     .method("greet", |op, state, _| {
///         let greeting = op.scope::<String>("greeting").cloned().unwrap_or_default();
///         let name = state.input().and_then(|v| v.downcast_ref::<String>()).cloned().unwrap_or_default();
///         Value::new(format!("{greeting}, {name}")).into()
///     })
///     .process(Process::new().set("greet"))
///     .build()
///     .unwrap();
///
/// let outcome = class
///     .call(Scope::new().with("greeting", "Hello"), Value::from("Paul"))
///     .unwrap();
/// assert_eq!(outcome.value().downcast_ref::<String>().unwrap(), "Hello, Paul");
/// ```
#[derive(Clone)]
pub struct OperationBuilder {
    name: String,
    parent: Option<String>,
    scope: IndexSet<String>,
    result_key: String,
    methods: IndexMap<String, StepFn>,
    settings: IndexMap<String, Value>,
    registry: Registry,
    process: Process,
}

impl OperationBuilder {
    /// Start a new root class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            scope: IndexSet::new(),
            result_key: DEFAULT_RESULT_KEY.to_string(),
            methods: IndexMap::new(),
            settings: IndexMap::new(),
            registry: Registry::default(),
            process: Process::new(),
        }
    }

    /// Declare required scope dependencies
    pub fn scope<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_scope(names);
        self
    }

    /// Read the final value from `key` instead of the inherited result key
    pub fn result_at(mut self, key: impl Into<String>) -> Self {
        self.result_key = key.into();
        self
    }

    /// Define or override a named method
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Operation, &State, &[Value]) -> Outcome<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Set a class-level setting
    pub fn setting(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_setting(name, value);
        self
    }

    /// Register a plugin with setup arguments
    pub fn plugin(mut self, plugin: impl Plugin, args: Vec<Value>) -> OperationResult<Self> {
        register_plugin(&mut self, &plugin, &args)?;
        Ok(self)
    }

    /// Run a class-level declaration contributed by a plugin
    pub fn declare(mut self, name: &str, args: Vec<Value>) -> OperationResult<Self> {
        let declaration =
            self.registry
                .declaration(name)
                .ok_or_else(|| OperationError::UnknownDeclaration {
                    operation: self.name.clone(),
                    declaration: name.to_string(),
                })?;
        declaration(&mut self, &args)?;
        Ok(self)
    }

    /// Set the process description
    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// Compile the process and freeze the class
    pub fn build(self) -> OperationResult<Arc<OperationClass>> {
        let lookup = self.method_table();
        let block = Compiler {
            operation: &self.name,
            result_key: &self.result_key,
            methods: &lookup,
            primitives: self.registry.primitives(),
            settings: &self.settings,
        }
        .compile(&self.process)?;

        debug!(
            operation = %self.name,
            parent = ?self.parent,
            directives = block.len(),
            plugins = ?self.registry.plugins().collect::<Vec<_>>(),
            "Operation class built"
        );

        Ok(Arc::new(OperationClass {
            definition: self,
            lookup,
            block,
        }))
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add scope names in place (for plugin declarations)
    pub fn add_scope<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set a class setting in place (for plugin declarations)
    pub fn insert_setting(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.settings.insert(name.into(), value.into());
        self
    }

    /// Read a class setting
    pub fn get_setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    /// Capabilities registered so far
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Plugin helpers overlaid by the class's own methods
    fn method_table(&self) -> IndexMap<String, StepFn> {
        let mut table = self.registry.helpers().clone();
        table.extend(self.methods.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }
}

impl fmt::Debug for OperationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationBuilder")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("scope", &self.scope)
            .field("result_key", &self.result_key)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Immutable, compiled operation class
pub struct OperationClass {
    definition: OperationBuilder,
    lookup: IndexMap<String, StepFn>,
    block: Block,
}

impl OperationClass {
    /// Class name
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Name of the class this one was derived from
    pub fn parent(&self) -> Option<&str> {
        self.definition.parent.as_deref()
    }

    /// Declared scope names, inherited ones first
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.definition.scope.iter().map(String::as_str)
    }

    /// Key the final value is read from
    pub fn result_key(&self) -> &str {
        &self.definition.result_key
    }

    /// Read a class setting
    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.definition.settings.get(name)
    }

    /// Capabilities available to this class
    pub fn registry(&self) -> &Registry {
        &self.definition.registry
    }

    /// The process description this class was built from
    pub fn process(&self) -> &Process {
        &self.definition.process
    }

    /// Compiled process
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Whether a named method (own, inherited or plugin helper) exists
    pub fn responds_to(&self, method: &str) -> bool {
        self.lookup.contains_key(method)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&StepFn> {
        self.lookup.get(name)
    }

    /// Start a subclass seeded with everything this class declares
    ///
    /// The inherited process is recompiled when the subclass is built, so
    /// method overrides in the subclass apply to it.
    pub fn subclass(&self, name: impl Into<String>) -> OperationBuilder {
        let mut builder = self.definition.clone();
        builder.parent = Some(self.definition.name.clone());
        builder.name = name.into();
        builder
    }

    /// Bind scope values, checking every declared name is supplied
    pub fn instantiate(self: &Arc<Self>, scope: Scope) -> OperationResult<Operation> {
        let missing: Vec<String> = self
            .definition
            .scope
            .iter()
            .filter(|name| !scope.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OperationError::MissingScope {
                operation: self.name().to_string(),
                names: missing,
            });
        }
        Ok(Operation::new(Arc::clone(self), scope))
    }

    /// Instantiate from `scope` and call with `input`
    pub fn call(
        self: &Arc<Self>,
        scope: Scope,
        input: impl Into<Value>,
    ) -> OperationResult<Outcome<Value>> {
        Ok(self.instantiate(scope)?.call(input))
    }

    /// Instantiate, call, and hand the outcome to a responder
    ///
    /// Returns whatever the matching branch returns, or `None` when no branch
    /// matches the outcome.
    pub fn call_with<'a, R, F>(
        self: &Arc<Self>,
        scope: Scope,
        input: impl Into<Value>,
        branches: F,
    ) -> OperationResult<Option<R>>
    where
        F: FnOnce(Responder<'a, R>) -> Responder<'a, R>,
    {
        let outcome = self.call(scope, input)?;
        Ok(branches(Responder::new()).respond(outcome))
    }
}

impl fmt::Debug for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationClass")
            .field("name", &self.definition.name)
            .field("parent", &self.definition.parent)
            .field("result_key", &self.definition.result_key)
            .field("block", &self.block)
            .finish()
    }
}
