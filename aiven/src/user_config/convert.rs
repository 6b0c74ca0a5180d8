//! Value conversion between API user configs and Terraform values

use super::schema::{ObjectSchema, SchemaNode, SchemaType};
use super::{decode_key_name, encode_key_name, UserConfigError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tfplug::Dynamic;

/// Placeholder older provider versions stored for unset fields
const VALUE_NOT_SET: &str = "<<value not set>>";

/// Convert an API user config into the Terraform value of a
/// `<type>_user_config` attribute: a list holding one map, or an empty list
/// when the API returned nothing.
pub fn api_to_terraform(schema: &ObjectSchema, user_config: &Map<String, Value>) -> Dynamic {
    if user_config.is_empty() {
        return Dynamic::List(Vec::new());
    }
    Dynamic::List(vec![Dynamic::Map(object_to_terraform(schema, user_config))])
}

fn object_to_terraform(schema: &ObjectSchema, object: &Map<String, Value>) -> HashMap<String, Dynamic> {
    schema
        .properties
        .iter()
        .map(|(key, node)| {
            let value = match object.get(key) {
                None | Some(Value::Null) => empty_default(node),
                Some(value) => value_to_terraform(node, value),
            };
            (encode_key_name(key), value)
        })
        .collect()
}

/// Stand-in for keys the API left out, so they do not show up as changes
fn empty_default(node: &SchemaNode) -> Dynamic {
    match node.schema_type {
        SchemaType::Object(_) | SchemaType::Array(_) => Dynamic::List(Vec::new()),
        _ => Dynamic::String(String::new()),
    }
}

fn value_to_terraform(node: &SchemaNode, value: &Value) -> Dynamic {
    match (&node.schema_type, value) {
        (SchemaType::Object(object), Value::Object(map)) => {
            Dynamic::List(vec![Dynamic::Map(object_to_terraform(object, map))])
        }
        (SchemaType::Object(_), _) => Dynamic::List(Vec::new()),
        (SchemaType::Array(items), Value::Array(elements)) => {
            let nested = items.as_object().filter(|object| !object.is_empty());
            let converted = elements
                .iter()
                .map(|element| match (nested, element) {
                    (Some(object), Value::Object(map)) => Dynamic::Map(object_to_terraform(object, map)),
                    _ => Dynamic::String(scalar_text(element)),
                })
                .collect();
            Dynamic::List(converted)
        }
        (_, Value::Array(elements)) => {
            Dynamic::List(elements.iter().map(|e| Dynamic::String(scalar_text(e))).collect())
        }
        (_, value) => Dynamic::String(scalar_text(value)),
    }
}

/// Text form of a JSON scalar: `true`/`false`, base-10 integers and the
/// shortest decimal form of floats.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert the Terraform value of a `<type>_user_config` attribute into an
/// API request body.
///
/// `new_resource` selects create semantics: create-only fields are sent, and
/// empty arrays are left out instead of being sent as `[]` to clear them.
pub fn terraform_to_api(
    schema: &ObjectSchema,
    value: &Dynamic,
    new_resource: bool,
) -> Result<Map<String, Value>, UserConfigError> {
    match unwrap_single(value) {
        Some(Dynamic::Map(map)) => object_to_api(schema, map, new_resource),
        Some(other) => Err(invalid("user_config", "object", other)),
        None => Ok(Map::new()),
    }
}

/// Strip the one-element list wrapper; `None` for null and empty values
fn unwrap_single(value: &Dynamic) -> Option<&Dynamic> {
    match value {
        Dynamic::Null | Dynamic::Unknown => None,
        Dynamic::List(items) => match items.first() {
            None | Some(Dynamic::Null) => None,
            Some(first) => Some(first),
        },
        other => Some(other),
    }
}

fn object_to_api(
    schema: &ObjectSchema,
    values: &HashMap<String, Dynamic>,
    new_resource: bool,
) -> Result<Map<String, Value>, UserConfigError> {
    let mut body = Map::new();

    for (name, value) in values {
        let key = decode_key_name(name);
        let node = schema
            .get(&key)
            .ok_or_else(|| UserConfigError::UnknownKey { key: key.clone() })?;

        if node.create_only && !new_resource {
            continue;
        }

        if let Some(converted) = value_to_api(&key, node, value, new_resource)? {
            body.insert(key, converted);
        }
    }

    Ok(body)
}

/// `None` means the value is left out of the request
fn value_to_api(
    key: &str,
    node: &SchemaNode,
    value: &Dynamic,
    new_resource: bool,
) -> Result<Option<Value>, UserConfigError> {
    if can_omit(node, value) {
        return Ok(None);
    }

    let converted = match &node.schema_type {
        SchemaType::Integer => integer(key, value)?,
        SchemaType::Number => number(key, value)?,
        SchemaType::Boolean => boolean(key, value)?,
        SchemaType::String => string(key, value)?,
        SchemaType::Object(object) => return object_value(key, object, value, new_resource),
        SchemaType::Array(items) => return array_value(key, items, value, new_resource),
    };

    Ok(Some(converted))
}

/// Unset markers, plus `-1` unless the field accepts negative values
fn can_omit(node: &SchemaNode, value: &Dynamic) -> bool {
    if matches!(value, Dynamic::Null | Dynamic::Unknown) {
        return true;
    }
    match value.as_string() {
        Some("") | Some(VALUE_NOT_SET) => true,
        Some("-1") => !node.minimum.is_some_and(|min| min.is_sign_negative()),
        _ => false,
    }
}

fn object_value(
    key: &str,
    object: &ObjectSchema,
    value: &Dynamic,
    new_resource: bool,
) -> Result<Option<Value>, UserConfigError> {
    match value {
        Dynamic::Null => Ok(None),
        Dynamic::List(_) => match unwrap_single(value) {
            None => Ok(None),
            Some(Dynamic::Map(map)) if map.is_empty() => Ok(None),
            Some(Dynamic::Map(map)) => Ok(Some(Value::Object(object_to_api(object, map, new_resource)?))),
            Some(other) => Err(invalid(key, "object", other)),
        },
        Dynamic::Map(map) => Ok(Some(Value::Object(object_to_api(object, map, new_resource)?))),
        other => Err(invalid(key, "object", other)),
    }
}

fn array_value(
    key: &str,
    items: &SchemaNode,
    value: &Dynamic,
    new_resource: bool,
) -> Result<Option<Value>, UserConfigError> {
    // An empty array clears the field on update
    let empty = if new_resource {
        None
    } else {
        Some(Value::Array(Vec::new()))
    };

    match value {
        Dynamic::Null => Ok(empty),
        Dynamic::List(elements) if elements.is_empty() => Ok(empty),
        Dynamic::List(elements) => {
            let converted = elements
                .iter()
                .map(|element| {
                    value_to_api(key, items, element, new_resource).map(|v| v.unwrap_or(Value::Null))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::Array(converted)))
        }
        other => Err(invalid(key, "list", other)),
    }
}

fn integer(key: &str, value: &Dynamic) -> Result<Value, UserConfigError> {
    let parsed = match value {
        Dynamic::Number(_) => value.as_i64(),
        Dynamic::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(Value::from)
        .ok_or_else(|| invalid(key, "integer", value))
}

fn number(key: &str, value: &Dynamic) -> Result<Value, UserConfigError> {
    let parsed = match value {
        Dynamic::Number(n) => Some(*n),
        Dynamic::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        // Whole numbers go out without a fraction, as the API sent them
        Some(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
            Ok(Value::from(n as i64))
        }
        Some(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| invalid(key, "number", value)),
        None => Err(invalid(key, "number", value)),
    }
}

fn boolean(key: &str, value: &Dynamic) -> Result<Value, UserConfigError> {
    let parsed = match value {
        Dynamic::Bool(b) => Some(*b),
        Dynamic::String(s) => parse_bool(s),
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| invalid(key, "boolean", value))
}

fn string(key: &str, value: &Dynamic) -> Result<Value, UserConfigError> {
    match value {
        Dynamic::String(s) => Ok(Value::String(s.clone())),
        other => Err(invalid(key, "string", other)),
    }
}

/// Accepts the spellings Terraform and older states use for booleans
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, expected: &str, value: &Dynamic) -> UserConfigError {
    UserConfigError::InvalidValue {
        key: key.to_string(),
        expected: expected.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ObjectSchema {
        ObjectSchema::parse(&json!({
            "type": "object",
            "properties": {
                "admin_username": {"type": ["string", "null"], "createOnly": true},
                "backup_hour": {"type": ["integer", "null"], "minimum": 0},
                "log_retention": {"type": "integer", "minimum": -1},
                "ratio": {"type": "number"},
                "enabled": {"type": "boolean"},
                "ip_filter": {"type": "array", "items": {"oneOf": [{"type": "string"}, {"type": "object"}]}},
                "pg": {
                    "type": "object",
                    "properties": {
                        "pg.max_connections": {"type": "integer"},
                        "pg.jit": {"type": "boolean"}
                    }
                },
                "pgbouncer_users": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"username": {"type": "string"}, "weight": {"type": "integer"}}}
                }
            }
        }))
        .unwrap()
    }

    fn tf(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
        Dynamic::List(vec![Dynamic::Map(
            pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )])
    }

    fn entry<'a>(value: &'a Dynamic, key: &str) -> &'a Dynamic {
        &value.as_list().unwrap()[0].as_map().unwrap()[key]
    }

    #[test]
    fn api_values_become_text_with_defaults_for_missing_keys() {
        let api = json!({
            "backup_hour": 3,
            "ratio": 0.5,
            "enabled": true,
            "ip_filter": ["10.0.0.0/8", "0.0.0.0/0"],
            "admin_username": null,
            "pg": {"pg.max_connections": 100}
        });
        let value = api_to_terraform(&schema(), api.as_object().unwrap());

        assert_eq!(entry(&value, "backup_hour"), &Dynamic::from("3"));
        assert_eq!(entry(&value, "ratio"), &Dynamic::from("0.5"));
        assert_eq!(entry(&value, "enabled"), &Dynamic::from("true"));
        assert_eq!(entry(&value, "admin_username"), &Dynamic::from(""));
        assert_eq!(entry(&value, "log_retention"), &Dynamic::from(""));
        assert_eq!(entry(&value, "pgbouncer_users"), &Dynamic::List(vec![]));
        assert_eq!(
            entry(&value, "ip_filter"),
            &Dynamic::List(vec!["10.0.0.0/8".into(), "0.0.0.0/0".into()])
        );

        let pg = entry(&value, "pg").as_list().unwrap();
        assert_eq!(pg.len(), 1);
        let pg = pg[0].as_map().unwrap();
        assert_eq!(pg["pg__dot__max_connections"], Dynamic::from("100"));
        assert_eq!(pg["pg__dot__jit"], Dynamic::from(""));
    }

    #[test]
    fn empty_api_config_is_an_empty_list() {
        assert_eq!(api_to_terraform(&schema(), &Map::new()), Dynamic::List(vec![]));
    }

    #[test]
    fn arrays_of_objects_recurse() {
        let api = json!({"pgbouncer_users": [{"username": "app", "weight": 2}]});
        let value = api_to_terraform(&schema(), api.as_object().unwrap());
        let users = entry(&value, "pgbouncer_users").as_list().unwrap();
        let user = users[0].as_map().unwrap();
        assert_eq!(user["username"], Dynamic::from("app"));
        assert_eq!(user["weight"], Dynamic::from("2"));
    }

    #[test]
    fn floats_use_minimal_text() {
        assert_eq!(scalar_text(&json!(100.0)), "100");
        assert_eq!(scalar_text(&json!(0.1)), "0.1");
        assert_eq!(scalar_text(&json!(-7)), "-7");
        assert_eq!(scalar_text(&json!(false)), "false");
    }

    #[test]
    fn terraform_values_are_coerced_and_unset_values_omitted() {
        let value = tf(vec![
            ("backup_hour", "4".into()),
            ("ratio", "0.25".into()),
            ("enabled", "true".into()),
            ("admin_username", "".into()),
            ("log_retention", "-1".into()),
            ("ip_filter", Dynamic::List(vec!["10.0.0.0/8".into()])),
            (
                "pg",
                Dynamic::List(vec![Dynamic::Map(HashMap::from([
                    ("pg__dot__max_connections".to_string(), Dynamic::from("200")),
                    ("pg__dot__jit".to_string(), Dynamic::from(VALUE_NOT_SET)),
                ]))]),
            ),
        ]);

        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert_eq!(
            Value::Object(body),
            json!({
                "backup_hour": 4,
                "ratio": 0.25,
                "enabled": true,
                "log_retention": -1,
                "ip_filter": ["10.0.0.0/8"],
                "pg": {"pg.max_connections": 200}
            })
        );
    }

    #[test]
    fn null_and_unknown_scalars_are_omitted() {
        let value = tf(vec![
            ("admin_username", "admin".into()),
            ("backup_hour", Dynamic::Null),
            ("ratio", Dynamic::Unknown),
            ("enabled", Dynamic::Null),
            ("log_retention", "30".into()),
        ]);
        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert_eq!(
            Value::Object(body),
            json!({"admin_username": "admin", "log_retention": 30})
        );
    }

    #[test]
    fn whole_numbers_are_sent_without_fraction() {
        let value = tf(vec![("ratio", "2".into())]);
        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert_eq!(body["ratio"].to_string(), "2");

        let value = tf(vec![("ratio", Dynamic::from(2.5))]);
        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert_eq!(body["ratio"].to_string(), "2.5");
    }

    #[test]
    fn minus_one_is_omitted_when_minimum_is_not_negative() {
        let value = tf(vec![("backup_hour", "-1".into())]);
        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn create_only_fields_are_skipped_on_update() {
        let value = tf(vec![("admin_username", "admin".into())]);
        assert_eq!(
            terraform_to_api(&schema(), &value, true).unwrap()["admin_username"],
            "admin"
        );
        assert!(terraform_to_api(&schema(), &value, false).unwrap().is_empty());
    }

    #[test]
    fn empty_arrays_clear_only_on_update() {
        let value = tf(vec![("ip_filter", Dynamic::List(vec![]))]);
        assert!(terraform_to_api(&schema(), &value, true).unwrap().is_empty());
        assert_eq!(
            terraform_to_api(&schema(), &value, false).unwrap()["ip_filter"],
            json!([])
        );
    }

    #[test]
    fn empty_objects_are_omitted() {
        for pg in [
            Dynamic::List(vec![]),
            Dynamic::List(vec![Dynamic::Null]),
            Dynamic::List(vec![Dynamic::Map(HashMap::new())]),
            Dynamic::Null,
        ] {
            let body = terraform_to_api(&schema(), &tf(vec![("pg", pg)]), true).unwrap();
            assert!(body.is_empty());
        }
    }

    #[test]
    fn native_values_are_accepted() {
        let value = tf(vec![
            ("backup_hour", Dynamic::from(5)),
            ("enabled", Dynamic::Bool(false)),
            ("ratio", Dynamic::from(1.5)),
        ]);
        let body = terraform_to_api(&schema(), &value, true).unwrap();
        assert_eq!(body["backup_hour"], 5);
        assert_eq!(body["enabled"], false);
        assert_eq!(body["ratio"], 1.5);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_errors() {
        let err = terraform_to_api(&schema(), &tf(vec![("nope", "1".into())]), true).unwrap_err();
        assert_eq!(err, UserConfigError::UnknownKey { key: "nope".into() });

        let err = terraform_to_api(&schema(), &tf(vec![("backup_hour", "soon".into())]), true).unwrap_err();
        assert!(matches!(err, UserConfigError::InvalidValue { ref key, .. } if key == "backup_hour"));

        let err = terraform_to_api(&schema(), &tf(vec![("enabled", "maybe".into())]), true).unwrap_err();
        assert!(matches!(err, UserConfigError::InvalidValue { .. }));
    }

    #[test]
    fn unset_user_config_is_an_empty_body() {
        assert!(terraform_to_api(&schema(), &Dynamic::Null, true).unwrap().is_empty());
        assert!(terraform_to_api(&schema(), &Dynamic::List(vec![]), false).unwrap().is_empty());
    }

    #[test]
    fn round_trip_through_terraform_preserves_values() {
        let api = json!({
            "backup_hour": 4,
            "ratio": 1,
            "enabled": false,
            "ip_filter": ["10.0.0.0/8"],
            "pg": {"pg.max_connections": 200, "pg.jit": true},
            "pgbouncer_users": [{"username": "app", "weight": 1}]
        });
        let tf_value = api_to_terraform(&schema(), api.as_object().unwrap());
        let body = terraform_to_api(&schema(), &tf_value, true).unwrap();
        assert_eq!(Value::Object(body), api);
    }
}
