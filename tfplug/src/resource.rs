//! Resource and data source traits plus the per-instance `ResourceData`
//!
//! Callbacks mutate a `ResourceData` in place the way SDK resources always
//! have: read attributes with `get`, write them back with `set`, and clear the
//! ID to signal that the remote object is gone.

use crate::context::Context;
use crate::error::{Result, TfplugError};
use crate::schema::ResourceSchema;
use crate::types::{Diagnostics, Dynamic};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Per-operation timeouts configured on a resource instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        let twenty = Duration::from_secs(20 * 60);
        Self {
            create: twenty,
            read: twenty,
            update: twenty,
            delete: twenty,
        }
    }
}

/// State and configuration of one resource instance
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,
    /// Prior state, used for change detection
    state: HashMap<String, Dynamic>,
    /// Configured or planned values, updated by `set`
    values: HashMap<String, Dynamic>,
    new_resource: bool,
    timeouts: ResourceTimeouts,
}

impl ResourceData {
    /// Data for a resource that is about to be created
    pub fn from_config(config: HashMap<String, Dynamic>) -> Self {
        Self {
            values: config,
            new_resource: true,
            ..Default::default()
        }
    }

    /// Data for an existing resource loaded from state
    pub fn from_state(id: impl Into<String>, state: HashMap<String, Dynamic>) -> Self {
        Self {
            id: id.into(),
            values: state.clone(),
            state,
            ..Default::default()
        }
    }

    /// Data for an update: prior state plus the planned values
    pub fn planned(
        id: impl Into<String>,
        state: HashMap<String, Dynamic>,
        planned: HashMap<String, Dynamic>,
    ) -> Self {
        Self {
            id: id.into(),
            state,
            values: planned,
            ..Default::default()
        }
    }

    /// Data for an import: only the ID is known
    pub fn for_import(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: ResourceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// An empty ID removes the resource from state
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn is_new_resource(&self) -> bool {
        self.new_resource
    }

    pub fn mark_new_resource(&mut self, new_resource: bool) {
        self.new_resource = new_resource;
    }

    pub fn timeouts(&self) -> ResourceTimeouts {
        self.timeouts
    }

    pub fn values(&self) -> &HashMap<String, Dynamic> {
        &self.values
    }

    /// Look up a value by attribute name or dotted path (`config.0.ip_filter`)
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        lookup(&self.values, key)
    }

    /// Same as `get`, against the prior state
    pub fn get_old(&self, key: &str) -> Option<&Dynamic> {
        lookup(&self.state, key)
    }

    /// Returns the value only when it is set to a non-zero value
    pub fn get_ok(&self, key: &str) -> Option<&Dynamic> {
        self.get(key).filter(|v| !v.is_zero())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_string())
            .map(|s| s.to_string())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Typed string lookup that reports what was missing
    pub fn require_string(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(Dynamic::String(s)) => Ok(s.clone()),
            Some(Dynamic::Null) | None => Err(TfplugError::AttributeNotSet(key.to_string())),
            Some(other) => Err(TfplugError::TypeMismatch {
                attribute: key.to_string(),
                expected: "string".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Dynamic>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn has_change(&self, key: &str) -> bool {
        let old = self.get_old(key).unwrap_or(&Dynamic::Null);
        let new = self.get(key).unwrap_or(&Dynamic::Null);
        old != new
    }

    /// Values to persist, with the ID under `id`
    pub fn state(&self) -> HashMap<String, Dynamic> {
        let mut state = self.values.clone();
        state.insert("id".to_string(), Dynamic::String(self.id.clone()));
        state
    }

    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(&self.state()).map_err(|e| TfplugError::EncodingError(e.to_string()))
    }

    pub fn decode_msgpack(bytes: &[u8]) -> Result<Self> {
        let state: HashMap<String, Dynamic> =
            rmp_serde::from_slice(bytes).map_err(|e| TfplugError::DecodingError(e.to_string()))?;
        Ok(Self::from_persisted(state))
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.state()).map_err(|e| TfplugError::EncodingError(e.to_string()))
    }

    pub fn decode_json(bytes: &[u8]) -> Result<Self> {
        let state: HashMap<String, Dynamic> =
            serde_json::from_slice(bytes).map_err(|e| TfplugError::DecodingError(e.to_string()))?;
        Ok(Self::from_persisted(state))
    }

    fn from_persisted(mut state: HashMap<String, Dynamic>) -> Self {
        let id = match state.remove("id") {
            Some(Dynamic::String(id)) => id,
            _ => String::new(),
        };
        Self::from_state(id, state)
    }
}

fn lookup<'a>(values: &'a HashMap<String, Dynamic>, key: &str) -> Option<&'a Dynamic> {
    let mut parts = key.split('.');
    let mut current = values.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Dynamic::List(items) => items.get(part.parse::<usize>().ok()?)?,
            Dynamic::Map(entries) => entries.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Base trait for resources - implement CRUD operations
/// Type name should be constant and match the name the provider registers
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name (e.g., "aiven_kafka_topic")
    fn type_name(&self) -> &str;

    /// Schema of the resource - cache this in your implementation
    fn schema(&self) -> ResourceSchema;

    /// MUST set the ID and populate computed attributes
    async fn create(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics;

    /// Clears the ID when the remote object no longer exists
    async fn read(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics;

    async fn update(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics;

    async fn delete(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics;

    /// Called during "terraform import"; the default passes the ID through
    /// and reads the resource.
    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        self.read(ctx, data).await
    }
}

/// Base trait for data sources - read only
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &str;

    fn schema(&self) -> ResourceSchema;

    /// MUST set an ID and populate all attributes
    async fn read(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics;
}
