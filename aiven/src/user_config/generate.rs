//! JSON Schema to Terraform attribute schema

use super::schema::{ObjectSchema, SchemaNode, SchemaType};
use super::encode_key_name;
use crate::schemautil::diff;
use std::collections::BTreeMap;
use tfplug::validator::StringLengthValidator;
use tfplug::{AttributeBuilder, Schema, SchemaBuilder};

/// Terraform attributes for every property of `object`, keyed by encoded name
pub fn generate_terraform_schema(object: &ObjectSchema) -> BTreeMap<String, Schema> {
    object
        .properties
        .iter()
        .map(|(name, node)| (encode_key_name(name), attribute(name, node)))
        .collect()
}

fn is_sensitive(name: &str) -> bool {
    name.contains("api_key") || name.contains("password")
}

fn attribute(name: &str, node: &SchemaNode) -> Schema {
    let builder = match &node.schema_type {
        // Scalars are text in Terraform; the declared type is restored on the way out
        SchemaType::String => {
            let builder = AttributeBuilder::string().sensitive_if(is_sensitive(name));
            match node.max_length {
                Some(max) => builder.validator(StringLengthValidator::at_most(max)),
                None => builder,
            }
        }
        SchemaType::Integer | SchemaType::Number | SchemaType::Boolean => {
            AttributeBuilder::string().sensitive_if(is_sensitive(name))
        }
        SchemaType::Object(object) => {
            let builder = AttributeBuilder::list_block(nested(object)).max_items(1);
            if node.create_only {
                builder.diff_suppress(diff::create_only)
            } else {
                builder.diff_suppress(diff::empty_object)
            }
        }
        SchemaType::Array(items) => {
            let mut builder = match &items.schema_type {
                SchemaType::Object(object) => AttributeBuilder::list_block(nested(object)),
                _ if name == "ip_filter" => {
                    AttributeBuilder::list(AttributeBuilder::string().diff_suppress(diff::ip_filter_value))
                }
                _ => AttributeBuilder::list(AttributeBuilder::string()),
            };
            if let Some(max) = node.max_items.filter(|max| *max > 0) {
                builder = builder.max_items(max);
            }
            if name == "ip_filter" {
                builder = builder.diff_suppress(diff::ip_filter_array);
            } else if node.create_only {
                builder = builder.diff_suppress(diff::create_only);
            }
            builder.sensitive_if(is_sensitive(name))
        }
    };

    let builder = if node.create_only && node.schema_type.is_scalar() {
        builder.diff_suppress(diff::create_only)
    } else {
        builder
    };

    builder.optional().description(node.title.clone()).build()
}

fn nested(object: &ObjectSchema) -> tfplug::ResourceSchema {
    SchemaBuilder::new()
        .attributes(generate_terraform_schema(object))
        .build()
}
