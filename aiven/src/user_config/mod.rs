//! User-config schema translator
//!
//! Aiven describes the `user_config` of services, integrations and
//! integration endpoints with JSON Schema documents. This module turns those
//! documents into Terraform attribute schemas and converts values in both
//! directions:
//!
//! - API responses become Terraform values (`api_to_terraform`). Objects are
//!   wrapped in a one-element list and scalars are rendered as text.
//! - Terraform values become API request bodies (`terraform_to_api`). The list
//!   wrappers are stripped, unset values dropped and text coerced back to the
//!   declared JSON type.
//!
//! Terraform does not accept `.` in attribute names, so dotted API keys (PostgreSQL
//! settings such as `pg.max_connections`) travel as `pg__dot__max_connections`.

pub mod convert;
pub mod generate;
pub mod schema;
pub mod templates;

pub use convert::{api_to_terraform, terraform_to_api};
pub use generate::generate_terraform_schema;
pub use schema::{ObjectSchema, SchemaNode, SchemaType};
pub use templates::{template_names, user_config_schema, UserConfigKind};

use thiserror::Error;

const DOT_PLACEHOLDER: &str = "__dot__";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UserConfigError {
    #[error("unsupported type {type_name} for user config key {key}")]
    UnsupportedType { key: String, type_name: String },

    #[error("unknown user config key {key}")]
    UnknownKey { key: String },

    #[error("invalid value {value:?} for user config key {key}, expected {expected}")]
    InvalidValue {
        key: String,
        expected: String,
        value: String,
    },

    #[error("no {kind} user config schema named {name}")]
    UnknownTemplate { kind: String, name: String },

    #[error("malformed user config schema: {0}")]
    InvalidTemplate(String),
}

/// API key name to Terraform attribute name
pub fn encode_key_name(key: &str) -> String {
    key.replace('.', DOT_PLACEHOLDER)
}

/// Terraform attribute name to API key name
pub fn decode_key_name(key: &str) -> String {
    key.replace(DOT_PLACEHOLDER, ".")
}
