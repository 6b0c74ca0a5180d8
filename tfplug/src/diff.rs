//! Attribute diffing with diff-suppression hooks
//!
//! Values are compared in the flatmap form the SDK has always used: nested
//! structures are flattened into dotted keys (`config.0.ip_filter.1`), lists
//! record their length under `.#` and maps under `.%`. Suppression hooks see
//! the flattened key and the old/new strings for that key.

use crate::resource::ResourceData;
use crate::schema::{Elem, ResourceSchema, Schema, ValueType};
use crate::types::Dynamic;
use std::collections::{BTreeMap, BTreeSet};

/// DiffSuppress decides whether a change on a flatmap key should be ignored
pub trait DiffSuppress: Send + Sync {
    fn suppress(&self, key: &str, old: &str, new: &str, data: &ResourceData) -> bool;
}

impl<F> DiffSuppress for F
where
    F: Fn(&str, &str, &str, &ResourceData) -> bool + Send + Sync,
{
    fn suppress(&self, key: &str, old: &str, new: &str, data: &ResourceData) -> bool {
        self(key, old, new, data)
    }
}

/// Change of a single flatmap key
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDiff {
    pub old: String,
    pub new: String,
    pub requires_new: bool,
}

/// All non-suppressed changes of one resource instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceDiff {
    pub attributes: BTreeMap<String, AttributeDiff>,
}

impl InstanceDiff {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn requires_new(&self) -> bool {
        self.attributes.values().any(|d| d.requires_new)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeDiff> {
        self.attributes.get(key)
    }
}

/// Flatten one attribute value into `out` following its schema
pub fn flatten(key: &str, schema: &Schema, value: &Dynamic, out: &mut BTreeMap<String, String>) {
    match value {
        Dynamic::Null | Dynamic::Unknown => {}
        Dynamic::List(items) => {
            out.insert(format!("{}.#", key), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                let item_key = format!("{}.{}", key, i);
                match &schema.elem {
                    Some(Elem::Resource(block)) => flatten_block(&item_key, block, item, out),
                    Some(Elem::Schema(elem)) => flatten(&item_key, elem, item, out),
                    None => flatten(&item_key, &Schema::default(), item, out),
                }
            }
        }
        Dynamic::Map(entries) if schema.value_type() == ValueType::Map => {
            out.insert(format!("{}.%", key), entries.len().to_string());
            let elem = match &schema.elem {
                Some(Elem::Schema(elem)) => elem.as_ref().clone(),
                _ => Schema::default(),
            };
            for (k, v) in entries {
                flatten(&format!("{}.{}", key, k), &elem, v, out);
            }
        }
        Dynamic::Map(_) => {}
        scalar => {
            out.insert(key.to_string(), scalar.to_string());
        }
    }
}

fn flatten_block(prefix: &str, block: &ResourceSchema, value: &Dynamic, out: &mut BTreeMap<String, String>) {
    let Dynamic::Map(entries) = value else {
        return;
    };
    for (name, schema) in &block.attributes {
        if let Some(v) = entries.get(name) {
            flatten(&format!("{}.{}", prefix, name), schema, v, out);
        }
    }
}

fn missing_value(key: &str) -> &'static str {
    if key.ends_with(".#") || key.ends_with(".%") {
        "0"
    } else {
        ""
    }
}

/// Compute the diff between the prior state and the configured values of
/// `data`, applying every diff-suppression hook declared on the schema.
pub fn diff(schema: &ResourceSchema, data: &ResourceData) -> InstanceDiff {
    let mut result = InstanceDiff::default();

    for (name, attr) in &schema.attributes {
        if attr.is_computed_only() {
            continue;
        }

        let new_value = data.get(name).cloned().unwrap_or_default();
        if new_value.is_null() && attr.computed {
            continue;
        }
        let old_value = data.get_old(name).cloned().unwrap_or_default();

        let mut old = BTreeMap::new();
        let mut new = BTreeMap::new();
        flatten(name, attr, &old_value, &mut old);
        flatten(name, attr, &new_value, &mut new);

        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for key in keys {
            let old_s = old.get(key).map(String::as_str).unwrap_or(missing_value(key));
            let new_s = new.get(key).map(String::as_str).unwrap_or(missing_value(key));
            if old_s == new_s {
                continue;
            }

            let leaf = schema.schema_for_key(key).unwrap_or(attr);
            if leaf.computed && !new.contains_key(key) {
                continue;
            }
            if leaf
                .diff_suppress
                .iter()
                .any(|s| s.suppress(key, old_s, new_s, data))
            {
                tracing::trace!(key = %key, old = old_s, new = new_s, "diff suppressed");
                continue;
            }

            result.attributes.insert(
                key.clone(),
                AttributeDiff {
                    old: old_s.to_string(),
                    new: new_s.to_string(),
                    requires_new: attr.force_new || leaf.force_new,
                },
            );
        }
    }

    result
}
