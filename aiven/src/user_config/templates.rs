//! Embedded user-config schema documents
//!
//! Each document maps a service, integration or endpoint type to the JSON
//! Schema of its `user_config`. Documents are parsed once on first use.

use super::schema::ObjectSchema;
use super::UserConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

const SERVICE_SCHEMAS: &str = include_str!("templates/service_user_config_schema.json");
const INTEGRATION_SCHEMAS: &str = include_str!("templates/integrations_user_config_schema.json");
const ENDPOINT_SCHEMAS: &str =
    include_str!("templates/integration_endpoints_user_config_schema.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserConfigKind {
    Service,
    Integration,
    Endpoint,
}

impl fmt::Display for UserConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserConfigKind::Service => "service",
            UserConfigKind::Integration => "integration",
            UserConfigKind::Endpoint => "endpoint",
        };
        f.write_str(name)
    }
}

type Templates = Result<BTreeMap<String, ObjectSchema>, UserConfigError>;

fn parse_templates(source: &str) -> Templates {
    let document: Value =
        serde_json::from_str(source).map_err(|e| UserConfigError::InvalidTemplate(e.to_string()))?;
    let entries = document
        .as_object()
        .ok_or_else(|| UserConfigError::InvalidTemplate("top level is not an object".into()))?;

    entries
        .iter()
        .map(|(name, definition)| Ok::<_, UserConfigError>((name.clone(), ObjectSchema::parse(definition)?)))
        .collect()
}

fn templates(kind: UserConfigKind) -> &'static Templates {
    static SERVICE: OnceLock<Templates> = OnceLock::new();
    static INTEGRATION: OnceLock<Templates> = OnceLock::new();
    static ENDPOINT: OnceLock<Templates> = OnceLock::new();

    match kind {
        UserConfigKind::Service => SERVICE.get_or_init(|| parse_templates(SERVICE_SCHEMAS)),
        UserConfigKind::Integration => {
            INTEGRATION.get_or_init(|| parse_templates(INTEGRATION_SCHEMAS))
        }
        UserConfigKind::Endpoint => ENDPOINT.get_or_init(|| parse_templates(ENDPOINT_SCHEMAS)),
    }
}

/// Schema of the user config for one service, integration or endpoint type
pub fn user_config_schema(
    kind: UserConfigKind,
    name: &str,
) -> Result<&'static ObjectSchema, UserConfigError> {
    let templates = templates(kind).as_ref().map_err(Clone::clone)?;
    templates
        .get(name)
        .ok_or_else(|| UserConfigError::UnknownTemplate {
            kind: kind.to_string(),
            name: name.to_string(),
        })
}

/// Type names that have a user config schema, sorted
pub fn template_names(kind: UserConfigKind) -> Vec<&'static str> {
    match templates(kind) {
        Ok(templates) => templates.keys().map(String::as_str).collect(),
        Err(_) => Vec::new(),
    }
}
