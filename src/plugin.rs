// Copyright 2025 Cowboy AI, LLC.

//! Plugin registration
//!
//! A [`Plugin`] contributes up to three capability sets to an operation
//! class, plus an optional one-time setup hook:
//!
//! - **declarations**: class-level macros run against the builder
//!   (e.g. `authorization`, `contract`, `model`)
//! - **helpers**: instance-level methods, callable by name from steps
//! - **primitives**: new DSL directives usable inside a process
//!
//! Each class owns its own [`Registry`]; a subclass starts from a copy of its
//! parent's, so capabilities registered on one class never leak into a
//! sibling. Registering the same plugin twice is a no-op. Two different
//! plugins contributing the same name is an error, which keeps the union of
//! unrelated plugins independent of registration order.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::callable::StepFn;
use crate::dsl::DslPrimitive;
use crate::errors::{OperationError, OperationResult};
use crate::operation::{Operation, OperationBuilder};
use crate::outcome::Outcome;
use crate::state::State;
use crate::value::Value;

/// Class-level declaration run against the builder of the class using it
pub type DeclarationFn =
    Arc<dyn Fn(&mut OperationBuilder, &[Value]) -> OperationResult<()> + Send + Sync>;

/// Bundle of capabilities a plugin contributes
#[derive(Clone, Default)]
pub struct Capabilities {
    declarations: IndexMap<String, DeclarationFn>,
    helpers: IndexMap<String, StepFn>,
    primitives: IndexMap<String, Arc<dyn DslPrimitive>>,
}

impl Capabilities {
    /// Empty capability set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class-level declaration
    pub fn declaration<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut OperationBuilder, &[Value]) -> OperationResult<()> + Send + Sync + 'static,
    {
        self.declarations.insert(name.into(), Arc::new(f));
        self
    }

    /// Add an instance-level helper
    pub fn helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Operation, &State, &[Value]) -> Outcome<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f));
        self
    }

    /// Add a DSL primitive
    pub fn primitive(mut self, name: impl Into<String>, primitive: impl DslPrimitive + 'static) -> Self {
        self.primitives.insert(name.into(), Arc::new(primitive));
        self
    }

    /// Whether nothing is contributed
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.helpers.is_empty() && self.primitives.is_empty()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("declarations", &self.declarations.keys().collect::<Vec<_>>())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("primitives", &self.primitives.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A bundle of class, instance and DSL extensions
pub trait Plugin: Send + Sync {
    /// Unique plugin name; re-registration is detected by it
    fn name(&self) -> &str;

    /// Capabilities contributed by this plugin
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// One-time setup against the class being defined
    fn apply(&self, _builder: &mut OperationBuilder, _args: &[Value]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Capabilities available to one operation class
#[derive(Clone, Default)]
pub struct Registry {
    plugins: IndexSet<String>,
    owners: IndexMap<String, String>,
    declarations: IndexMap<String, DeclarationFn>,
    helpers: IndexMap<String, StepFn>,
    primitives: IndexMap<String, Arc<dyn DslPrimitive>>,
}

impl Registry {
    /// Plugin names in registration order
    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(String::as_str)
    }

    /// Whether a plugin has been registered
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains(name)
    }

    /// Whether a DSL primitive is available
    pub fn has_primitive(&self, name: &str) -> bool {
        self.primitives.contains_key(name)
    }

    /// Whether a class-level declaration is available
    pub fn has_declaration(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Whether an instance helper is available
    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub(crate) fn declaration(&self, name: &str) -> Option<DeclarationFn> {
        self.declarations.get(name).cloned()
    }

    pub(crate) fn helpers(&self) -> &IndexMap<String, StepFn> {
        &self.helpers
    }

    pub(crate) fn primitives(&self) -> &IndexMap<String, Arc<dyn DslPrimitive>> {
        &self.primitives
    }

    /// Union `capabilities` into this registry on behalf of `plugin`
    ///
    /// Nothing is merged when any name is already owned by another plugin.
    fn merge(&mut self, plugin: &str, capabilities: Capabilities) -> OperationResult<()> {
        let names = capabilities
            .declarations
            .keys()
            .map(|name| format!("declaration:{name}"))
            .chain(capabilities.helpers.keys().map(|name| format!("helper:{name}")))
            .chain(capabilities.primitives.keys().map(|name| format!("primitive:{name}")))
            .collect::<Vec<_>>();

        for name in &names {
            if let Some(existing) = self.owners.get(name) {
                if existing != plugin {
                    return Err(OperationError::CapabilityConflict {
                        name: name.clone(),
                        plugin: plugin.to_string(),
                        existing: existing.clone(),
                    });
                }
            }
        }

        for name in names {
            self.owners.insert(name, plugin.to_string());
        }
        self.declarations.extend(capabilities.declarations);
        self.helpers.extend(capabilities.helpers);
        self.primitives.extend(capabilities.primitives);
        self.plugins.insert(plugin.to_string());
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.plugins)
            .field("owners", &self.owners)
            .finish()
    }
}

/// Register `plugin` on the class being built
///
/// The first registration merges the plugin's capabilities and then runs its
/// setup hook once with `args`. Later registrations of the same plugin name
/// change nothing.
pub fn register_plugin(
    builder: &mut OperationBuilder,
    plugin: &dyn Plugin,
    args: &[Value],
) -> OperationResult<()> {
    let name = plugin.name().to_string();
    if builder.registry().has_plugin(&name) {
        debug!(
            operation = %builder.name(),
            plugin = %name,
            "Plugin already registered"
        );
        return Ok(());
    }

    builder.registry_mut().merge(&name, plugin.capabilities())?;
    plugin
        .apply(builder, args)
        .map_err(|source| OperationError::PluginSetup {
            plugin: name.clone(),
            source,
        })?;

    debug!(
        operation = %builder.name(),
        plugin = %name,
        "Plugin registered"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagging;

    impl Plugin for Tagging {
        fn name(&self) -> &str {
            "tagging"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new()
                .helper("tag", |_, _, _| Outcome::success(Value::from("tagged")))
                .declaration("tags", |builder, args| {
                    builder.insert_setting("tags", Value::new(args.len() as i64));
                    Ok(())
                })
        }
    }

    struct Shadowing;

    impl Plugin for Shadowing {
        fn name(&self) -> &str {
            "shadowing"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new().helper("tag", |_, _, _| Outcome::success(Value::nil()))
        }
    }

    #[test]
    fn test_merge_is_idempotent_per_plugin() {
        let mut registry = Registry::default();
        registry.merge("tagging", Tagging.capabilities()).unwrap();
        registry.merge("tagging", Tagging.capabilities()).unwrap();

        assert_eq!(registry.plugins().collect::<Vec<_>>(), vec!["tagging"]);
        assert!(registry.has_helper("tag"));
        assert!(registry.has_declaration("tags"));
    }

    #[test]
    fn test_conflicting_names_are_rejected_in_either_order() {
        let mut first = Registry::default();
        first.merge("tagging", Tagging.capabilities()).unwrap();
        let err = first.merge("shadowing", Shadowing.capabilities()).unwrap_err();
        assert!(matches!(err, OperationError::CapabilityConflict { .. }));
        assert!(!first.has_plugin("shadowing"));

        let mut second = Registry::default();
        second.merge("shadowing", Shadowing.capabilities()).unwrap();
        assert!(second.merge("tagging", Tagging.capabilities()).is_err());
    }

    #[test]
    fn test_capabilities_debug_lists_names() {
        let rendered = format!("{:?}", Tagging.capabilities());
        assert!(rendered.contains("\"tag\""));
        assert!(rendered.contains("\"tags\""));
        assert!(!Tagging.capabilities().is_empty());
    }
}
