//! Parsed form of the JSON Schema documents describing user configs

use super::UserConfigError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared type of one schema node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Object(ObjectSchema),
    Array(Box<SchemaNode>),
}

impl SchemaType {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Object(_) => "object",
            SchemaType::Array(_) => "array",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, SchemaType::Object(_) | SchemaType::Array(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub schema_type: SchemaType,
    pub title: String,
    pub default: Option<Value>,
    /// Can only be set when the resource is created
    pub create_only: bool,
    pub minimum: Option<f64>,
    pub max_length: Option<usize>,
    pub max_items: Option<usize>,
}

/// Properties of an object node, keyed by API name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, SchemaNode>,
}

impl ObjectSchema {
    /// Parse an object definition; a missing `properties` member yields an
    /// empty schema.
    pub fn parse(definition: &Value) -> Result<Self, UserConfigError> {
        let mut properties = BTreeMap::new();
        if let Some(props) = definition.get("properties").and_then(Value::as_object) {
            for (name, property) in props {
                properties.insert(name.clone(), SchemaNode::parse(name, property)?);
            }
        }
        Ok(Self { properties })
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.properties.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl SchemaNode {
    pub fn parse(name: &str, definition: &Value) -> Result<Self, UserConfigError> {
        let type_name = declared_type(name, definition.get("type"))?;

        let schema_type = match type_name.as_str() {
            "string" => SchemaType::String,
            "integer" => SchemaType::Integer,
            "number" => SchemaType::Number,
            "boolean" => SchemaType::Boolean,
            "object" => SchemaType::Object(ObjectSchema::parse(definition)?),
            "array" => {
                let items = definition.get("items").ok_or_else(|| UserConfigError::UnsupportedType {
                    key: name.to_string(),
                    type_name: "array without items".to_string(),
                })?;
                let item = SchemaNode::parse(name, first_one_of(items))?;
                if matches!(item.schema_type, SchemaType::Array(_)) {
                    return Err(UserConfigError::UnsupportedType {
                        key: name.to_string(),
                        type_name: "array of arrays".to_string(),
                    });
                }
                SchemaType::Array(Box::new(item))
            }
            other => {
                return Err(UserConfigError::UnsupportedType {
                    key: name.to_string(),
                    type_name: other.to_string(),
                })
            }
        };

        Ok(Self {
            schema_type,
            title: definition
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            default: definition.get("default").cloned(),
            create_only: definition
                .get("createOnly")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            minimum: definition.get("minimum").and_then(Value::as_f64),
            max_length: definition
                .get("maxLength")
                .and_then(Value::as_u64)
                .map(|n| n as usize),
            max_items: definition
                .get("maxItems")
                .and_then(Value::as_u64)
                .map(|n| n as usize),
        })
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.schema_type {
            SchemaType::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Item schema of an array node
    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.schema_type {
            SchemaType::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Array items given as `oneOf` use the first alternative only
fn first_one_of(items: &Value) -> &Value {
    items
        .get("oneOf")
        .and_then(Value::as_array)
        .and_then(|alternatives| alternatives.first())
        .unwrap_or(items)
}

/// A type is either a string or a list of alternatives in which `"null"`
/// only marks the field as nullable.
fn declared_type(name: &str, value: Option<&Value>) -> Result<String, UserConfigError> {
    let unsupported = |type_name: String| UserConfigError::UnsupportedType {
        key: name.to_string(),
        type_name,
    };

    match value {
        Some(Value::String(type_name)) => Ok(type_name.clone()),
        Some(Value::Array(alternatives)) => {
            let mut effective = None;
            for alternative in alternatives {
                match alternative.as_str() {
                    Some("null") => {}
                    Some(type_name) => effective = Some(type_name.to_string()),
                    None => return Err(unsupported(alternative.to_string())),
                }
            }
            effective.ok_or_else(|| unsupported("null".to_string()))
        }
        Some(other) => Err(unsupported(other.to_string())),
        None => Err(unsupported("missing".to_string())),
    }
}
