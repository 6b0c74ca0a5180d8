//! Schema types and builders for tfplug
//!
//! Schemas follow the classic provider SDK model: every attribute has a value
//! type, required/optional/computed flags, and optional nested element,
//! validators and diff-suppression hooks.

use crate::diff::DiffSuppress;
use crate::types::{Diagnostics, Dynamic};
use crate::validator::Validator;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    List,
    Set,
    Map,
}

impl ValueType {
    pub fn is_collection(self) -> bool {
        matches!(self, ValueType::List | ValueType::Set | ValueType::Map)
    }

    /// Whether a concrete value fits this type. Null and unknown always fit.
    pub fn accepts(self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (ValueType::String, Dynamic::String(_)) => true,
            (ValueType::Int, Dynamic::Number(n)) => n.fract() == 0.0,
            (ValueType::Float, Dynamic::Number(_)) => true,
            (ValueType::Bool, Dynamic::Bool(_)) => true,
            (ValueType::List | ValueType::Set, Dynamic::List(_)) => true,
            (ValueType::Map, Dynamic::Map(_)) => true,
            _ => false,
        }
    }
}

/// Element of a collection attribute
#[derive(Debug, Clone)]
pub enum Elem {
    /// Primitive elements
    Schema(Box<Schema>),
    /// Nested blocks
    Resource(ResourceSchema),
}

/// Schema of a single attribute
#[derive(Clone, Default)]
pub struct Schema {
    pub value_type: Option<ValueType>,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Dynamic>,
    pub max_items: Option<usize>,
    pub min_items: Option<usize>,
    pub elem: Option<Elem>,
    pub deprecated: Option<String>,
    pub diff_suppress: Vec<Arc<dyn DiffSuppress>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

// Manual Debug implementation since validators/suppressors don't implement Debug
impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("value_type", &self.value_type)
            .field("description", &self.description)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("force_new", &self.force_new)
            .field("sensitive", &self.sensitive)
            .field("default", &self.default)
            .field("max_items", &self.max_items)
            .field("elem", &self.elem)
            .field("diff_suppress", &self.diff_suppress.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Schema {
    pub fn value_type(&self) -> ValueType {
        self.value_type.unwrap_or(ValueType::String)
    }

    /// Set only by the server, never by configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Nested block schema for list/set attributes holding blocks
    pub fn nested(&self) -> Option<&ResourceSchema> {
        match &self.elem {
            Some(Elem::Resource(resource)) => Some(resource),
            _ => None,
        }
    }

    fn validate_value(&self, path: &str, value: &Dynamic, diags: &mut Diagnostics) {
        if value.is_null() {
            if self.required {
                diags.add_error(
                    format!("Missing required argument: {}", path),
                    Some(format!("The argument \"{}\" is required", path)),
                );
            }
            return;
        }
        if value.is_unknown() {
            return;
        }

        if !self.value_type().accepts(value) {
            diags.add_error(
                format!("Incorrect attribute value type: {}", path),
                Some(format!(
                    "expected {:?}, got {}",
                    self.value_type(),
                    value.type_name()
                )),
            );
            return;
        }

        if self.is_computed_only() {
            diags.add_error(
                format!("Value for unconfigurable attribute: {}", path),
                Some(format!("Can't configure a value for \"{}\"", path)),
            );
            return;
        }

        for validator in &self.validators {
            validator.validate(value, path, diags);
        }

        if let Dynamic::List(items) = value {
            if let Some(max) = self.max_items {
                if items.len() > max {
                    diags.add_error(
                        format!("Too many {} blocks", path),
                        Some(format!("No more than {} allowed, got {}", max, items.len())),
                    );
                }
            }
            if let Some(min) = self.min_items {
                if items.len() < min {
                    diags.add_error(
                        format!("Insufficient {} blocks", path),
                        Some(format!("At least {} required, got {}", min, items.len())),
                    );
                }
            }
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                match &self.elem {
                    Some(Elem::Schema(elem)) => elem.validate_value(&item_path, item, diags),
                    Some(Elem::Resource(resource)) => {
                        resource.validate_at(&item_path, item, diags)
                    }
                    None => {}
                }
            }
        }
    }
}

/// Schema of a resource, data source, provider or nested block
#[derive(Debug, Clone, Default)]
pub struct ResourceSchema {
    pub version: i64,
    pub description: String,
    pub attributes: BTreeMap<String, Schema>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Schema> {
        self.attributes.get(name)
    }

    /// Validate a configuration object against this schema
    pub fn validate_config(&self, config: &Dynamic) -> Diagnostics {
        let mut diags = Diagnostics::new();
        self.validate_at("", config, &mut diags);
        diags
    }

    fn validate_at(&self, prefix: &str, value: &Dynamic, diags: &mut Diagnostics) {
        let empty: HashMap<String, Dynamic> = HashMap::new();
        let values = match value {
            Dynamic::Map(values) => values,
            Dynamic::Null => &empty,
            other => {
                diags.add_error(
                    "Invalid configuration block",
                    Some(format!("expected an object, got {}", other.type_name())),
                );
                return;
            }
        };

        let join = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            }
        };

        for key in values.keys() {
            if key != "id" && !self.attributes.contains_key(key) {
                diags.add_error(
                    format!("Unsupported argument: {}", join(key)),
                    Some(format!("An argument named \"{}\" is not expected here", key)),
                );
            }
        }

        for (name, schema) in &self.attributes {
            let value = values.get(name).unwrap_or(&Dynamic::Null);
            schema.validate_value(&join(name), value, diags);
        }
    }

    /// Resolve the schema responsible for a flatmap key such as
    /// `pg_user_config.0.ip_filter.#` or `pg_user_config.0.ip_filter.0`.
    pub fn schema_for_key(&self, key: &str) -> Option<&Schema> {
        let mut parts = key.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        loop {
            let Some(part) = parts.next() else {
                return Some(current);
            };
            if part == "#" || part == "%" {
                return Some(current);
            }
            match &current.elem {
                Some(Elem::Schema(elem)) => current = elem.as_ref(),
                Some(Elem::Resource(resource)) => {
                    if current.value_type() == ValueType::Map {
                        return Some(current);
                    }
                    current = resource.attributes.get(parts.next()?)?;
                }
                None => return Some(current),
            }
        }
    }
}

/// AttributeBuilder provides fluent API for building attribute schemas
pub struct AttributeBuilder {
    schema: Schema,
}

impl AttributeBuilder {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            schema: Schema {
                value_type: Some(value_type),
                ..Default::default()
            },
        }
    }

    pub fn string() -> Self {
        Self::new(ValueType::String)
    }

    pub fn int() -> Self {
        Self::new(ValueType::Int)
    }

    pub fn float() -> Self {
        Self::new(ValueType::Float)
    }

    pub fn bool() -> Self {
        Self::new(ValueType::Bool)
    }

    /// List of primitive values
    pub fn list(elem: impl Into<Schema>) -> Self {
        Self::new(ValueType::List).elem(Elem::Schema(Box::new(elem.into())))
    }

    /// List of nested blocks
    pub fn list_block(block: ResourceSchema) -> Self {
        Self::new(ValueType::List).elem(Elem::Resource(block))
    }

    pub fn set(elem: impl Into<Schema>) -> Self {
        Self::new(ValueType::Set).elem(Elem::Schema(Box::new(elem.into())))
    }

    pub fn map(elem: impl Into<Schema>) -> Self {
        Self::new(ValueType::Map).elem(Elem::Schema(Box::new(elem.into())))
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.schema.description = desc.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.schema.required = true;
        self.schema.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.schema.optional = true;
        self.schema.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.schema.computed = true;
        self
    }

    /// Changing the value replaces the resource
    pub fn force_new(mut self) -> Self {
        self.schema.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.schema.sensitive = true;
        self
    }

    pub fn sensitive_if(mut self, sensitive: bool) -> Self {
        self.schema.sensitive = sensitive;
        self
    }

    pub fn default_value(mut self, value: impl Into<Dynamic>) -> Self {
        self.schema.default = Some(value.into());
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.schema.max_items = Some(max);
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.schema.min_items = Some(min);
        self
    }

    pub fn elem(mut self, elem: Elem) -> Self {
        self.schema.elem = Some(elem);
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.schema.deprecated = Some(message.into());
        self
    }

    pub fn diff_suppress(mut self, suppress: impl DiffSuppress + 'static) -> Self {
        self.schema.diff_suppress.push(Arc::new(suppress));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.schema.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl From<AttributeBuilder> for Schema {
    fn from(builder: AttributeBuilder) -> Self {
        builder.build()
    }
}

/// SchemaBuilder provides fluent API for building resource schemas
#[derive(Default)]
pub struct SchemaBuilder {
    schema: ResourceSchema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.schema.description = desc.into();
        self
    }

    pub fn attribute(mut self, name: &str, attribute: impl Into<Schema>) -> Self {
        self.schema
            .attributes
            .insert(name.to_string(), attribute.into());
        self
    }

    /// Merge a generated set of attributes
    pub fn attributes(mut self, attributes: BTreeMap<String, Schema>) -> Self {
        self.schema.attributes.extend(attributes);
        self
    }

    pub fn build_resource(mut self, version: i64) -> ResourceSchema {
        self.schema.version = version;
        self.schema
    }

    /// Nested block schemas carry no version
    pub fn build(self) -> ResourceSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::StringInSliceValidator;

    fn topic_schema() -> ResourceSchema {
        SchemaBuilder::new()
            .attribute("project", AttributeBuilder::string().required().force_new())
            .attribute("partitions", AttributeBuilder::int().required())
            .attribute("state", AttributeBuilder::string().computed())
            .attribute(
                "cleanup_policy",
                AttributeBuilder::string()
                    .optional()
                    .validator(StringInSliceValidator::new(&["delete", "compact"])),
            )
            .attribute(
                "config",
                AttributeBuilder::list_block(
                    SchemaBuilder::new()
                        .attribute("ip_filter", AttributeBuilder::list(AttributeBuilder::string()))
                        .build(),
                )
                .optional()
                .max_items(1),
            )
            .build_resource(1)
    }

    fn config(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
        Dynamic::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::string()
            .description("Project name")
            .required()
            .force_new()
            .build();

        assert_eq!(attr.value_type(), ValueType::String);
        assert!(attr.required);
        assert!(!attr.optional);
        assert!(attr.force_new);
        assert_eq!(attr.description, "Project name");
    }

    #[test]
    fn schema_builder_keeps_version_and_attributes() {
        let schema = topic_schema();
        assert_eq!(schema.version, 1);
        assert_eq!(schema.attributes.len(), 5);
        assert!(schema.attribute("state").unwrap().is_computed_only());
    }

    #[test]
    fn validate_config_reports_missing_required() {
        let diags = topic_schema().validate_config(&config(vec![(
            "project",
            Dynamic::from("my-project"),
        )]));
        assert!(diags.has_errors());
        assert!(diags.errors[0].summary.contains("partitions"));
    }

    #[test]
    fn validate_config_rejects_wrong_types_and_computed_values() {
        let diags = topic_schema().validate_config(&config(vec![
            ("project", Dynamic::from("my-project")),
            ("partitions", Dynamic::from("three")),
            ("state", Dynamic::from("ACTIVE")),
        ]));
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn validate_config_runs_validators_and_max_items() {
        let block = config(vec![("ip_filter", Dynamic::List(vec![]))]);
        let diags = topic_schema().validate_config(&config(vec![
            ("project", Dynamic::from("my-project")),
            ("partitions", Dynamic::from(3)),
            ("cleanup_policy", Dynamic::from("shred")),
            ("config", Dynamic::List(vec![block.clone(), block])),
        ]));
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn schema_for_key_walks_nested_blocks() {
        let schema = topic_schema();
        let list = schema.schema_for_key("config.0.ip_filter.#").unwrap();
        assert_eq!(list.value_type(), ValueType::List);

        let elem = schema.schema_for_key("config.0.ip_filter.0").unwrap();
        assert_eq!(elem.value_type(), ValueType::String);

        let block = schema.schema_for_key("config.#").unwrap();
        assert_eq!(block.max_items, Some(1));

        assert!(schema.schema_for_key("config.0.missing").is_none());
    }
}
