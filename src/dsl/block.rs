// Copyright 2025 Cowboy AI, LLC.

//! Compiled directive blocks
//!
//! Compilation resolves every callable against the class's method table,
//! fills in the default `set` target and binds plugin directives to the
//! primitives registered on that class. Anything unresolvable is reported
//! here, at class build time.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::callable::{ResolvedCallable, StepFn, Wrapper};
use crate::dsl::process::{Directive, Process};
use crate::dsl::run::{DslPrimitive, DslRun};
use crate::errors::{OperationError, OperationResult};
use crate::value::Value;

/// A directive ready to run
#[derive(Clone)]
pub(crate) enum CompiledDirective {
    Step {
        callable: ResolvedCallable,
        args: Vec<Value>,
    },
    Set {
        callable: ResolvedCallable,
        args: Vec<Value>,
        to: String,
    },
    Map {
        callable: ResolvedCallable,
    },
    Sequence {
        wrapper: Wrapper,
        block: Block,
    },
    Guard {
        condition: ResolvedCallable,
        block: Block,
        expected: bool,
    },
    Custom {
        name: String,
        primitive: Arc<dyn DslPrimitive>,
        args: Vec<Value>,
        block: Block,
    },
}

impl CompiledDirective {
    pub(crate) fn kind(&self) -> &str {
        match self {
            CompiledDirective::Step { .. } => "step",
            CompiledDirective::Set { .. } => "set",
            CompiledDirective::Map { .. } => "map",
            CompiledDirective::Sequence { .. } => "sequence",
            CompiledDirective::Guard { expected: true, .. } => "guard",
            CompiledDirective::Guard { expected: false, .. } => "unless",
            CompiledDirective::Custom { name, .. } => name.as_str(),
        }
    }

    pub(crate) fn target(&self) -> &str {
        match self {
            CompiledDirective::Step { callable, .. }
            | CompiledDirective::Set { callable, .. }
            | CompiledDirective::Map { callable } => callable.label(),
            CompiledDirective::Guard { condition, .. } => condition.label(),
            CompiledDirective::Sequence { .. } | CompiledDirective::Custom { .. } => "block",
        }
    }

    pub(crate) fn execute(&self, run: &mut DslRun<'_>) {
        match self {
            CompiledDirective::Step { callable, args } => run.step(callable, args),
            CompiledDirective::Set { callable, args, to } => run.set(callable, args, to),
            CompiledDirective::Map { callable } => run.map(callable),
            CompiledDirective::Sequence { wrapper, block } => run.sequence(wrapper, block),
            CompiledDirective::Guard {
                condition,
                block,
                expected,
            } => run.branch(condition, *expected, block),
            CompiledDirective::Custom {
                primitive,
                args,
                block,
                ..
            } => primitive.execute(run, args, block),
        }
    }
}

/// Compiled, shareable list of directives
#[derive(Clone, Default)]
pub struct Block {
    directives: Arc<Vec<CompiledDirective>>,
}

impl Block {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CompiledDirective> {
        self.directives.iter()
    }

    /// Number of top-level directives
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether the block has no directives
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.directives.iter().map(CompiledDirective::kind))
            .finish()
    }
}

/// Everything compilation resolves against
pub(crate) struct Compiler<'a> {
    pub operation: &'a str,
    pub result_key: &'a str,
    pub methods: &'a IndexMap<String, StepFn>,
    pub primitives: &'a IndexMap<String, Arc<dyn DslPrimitive>>,
    pub settings: &'a IndexMap<String, Value>,
}

impl Compiler<'_> {
    pub(crate) fn compile(&self, process: &Process) -> OperationResult<Block> {
        let directives = process
            .directives()
            .iter()
            .map(|directive| self.compile_directive(directive))
            .collect::<OperationResult<Vec<_>>>()?;
        Ok(Block {
            directives: Arc::new(directives),
        })
    }

    fn compile_directive(&self, directive: &Directive) -> OperationResult<CompiledDirective> {
        let compiled = match directive {
            Directive::Step { callable, args } => CompiledDirective::Step {
                callable: callable.resolve(self.operation, self.methods)?,
                args: args.clone(),
            },
            Directive::Set { callable, args, to } => CompiledDirective::Set {
                callable: callable.resolve(self.operation, self.methods)?,
                args: args.clone(),
                to: to.clone().unwrap_or_else(|| self.result_key.to_string()),
            },
            Directive::Map { callable } => CompiledDirective::Map {
                callable: callable.resolve(self.operation, self.methods)?,
            },
            Directive::Sequence { wrapper, block } => CompiledDirective::Sequence {
                wrapper: wrapper.clone(),
                block: self.compile(block)?,
            },
            Directive::Guard { condition, block } => CompiledDirective::Guard {
                condition: condition.resolve(self.operation, self.methods)?,
                block: self.compile(block)?,
                expected: true,
            },
            Directive::Unless { condition, block } => CompiledDirective::Guard {
                condition: condition.resolve(self.operation, self.methods)?,
                block: self.compile(block)?,
                expected: false,
            },
            Directive::Custom { name, args, block } => {
                let primitive = self.primitives.get(name).cloned().ok_or_else(|| {
                    OperationError::UnknownDirective {
                        operation: self.operation.to_string(),
                        directive: name.clone(),
                    }
                })?;
                primitive.verify(name, self.settings)?;
                CompiledDirective::Custom {
                    name: name.clone(),
                    primitive,
                    args: args.clone(),
                    block: self.compile(block)?,
                }
            }
        };
        Ok(compiled)
    }
}
