// Copyright 2025 Cowboy AI, LLC.

//! Bundled plugins
//!
//! Thin adapters showing the three capability kinds working together:
//! - [`SimpleAuth`]: authorization rule, `authorize` directive and helper
//! - [`Validation`]: input contracts and the `validate` directive
//! - [`Records`]: repository-backed lookups and the `fetch_model` directive

pub mod records;
pub mod simple_auth;
pub mod validation;

pub use records::{ModelConfig, Records, Repository};
pub use simple_auth::{authorization, AuthorizationRule, SimpleAuth};
pub use validation::{contract, Contract, ContractRef, RequiredFields, Validation};
