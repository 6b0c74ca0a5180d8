//! tfplug - Terraform provider SDK for Rust
//!
//! The provider-side half of a Terraform plugin: value tree, schemas with
//! validators and diff suppression, resource data, the state-change waiter and
//! the traits a provider implements. The host RPC runtime drives these traits.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Helper modules
pub mod diff;
pub mod validator;
pub mod wait;

// Re-exports for convenience
pub use context::Context;
pub use diff::{AttributeDiff, DiffSuppress, InstanceDiff};
pub use error::{Result, TfplugError};
pub use provider::Provider;
pub use resource::{DataSource, Resource, ResourceData, ResourceTimeouts};
pub use schema::{AttributeBuilder, Elem, ResourceSchema, Schema, SchemaBuilder, ValueType};
pub use types::{Diagnostic, DiagnosticSeverity, Diagnostics, Dynamic};
pub use wait::{RefreshResult, StateChangeConf, WaitError};
