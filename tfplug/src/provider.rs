//! Provider trait
//!
//! Providers create resources and data sources on demand after `configure`
//! has run, so no instance needs to share mutable state with another.

use crate::context::Context;
use crate::resource::{DataSource, Resource};
use crate::schema::ResourceSchema;
use crate::types::{Diagnostics, Dynamic};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider block schema
    fn schema(&self) -> ResourceSchema;

    /// Receives the provider block configuration. Errors go into the returned
    /// diagnostics.
    async fn configure(&mut self, ctx: Context, config: HashMap<String, Dynamic>) -> Diagnostics;

    /// Fails before configuration and for unknown names
    async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>>;

    async fn create_data_source(&self, name: &str) -> Result<Box<dyn DataSource>>;

    /// Schemas are requested often; implementations should cache them
    async fn resource_schemas(&self) -> HashMap<String, ResourceSchema>;

    async fn data_source_schemas(&self) -> HashMap<String, ResourceSchema>;
}
