pub mod api;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod resources;
pub mod schemautil;
pub mod user_config;

pub use error::{Error, Result};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, Context, DataSource, Diagnostics, Dynamic, Provider, Resource, ResourceSchema,
    SchemaBuilder,
};

const TOKEN_ENV: &str = "AIVEN_TOKEN";
const API_URL_ENV: &str = "AIVEN_WEB_URL";

pub struct AivenProvider {
    client: Option<api::Client>,
}

impl Default for AivenProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AivenProvider {
    pub fn new() -> Self {
        Self { client: None }
    }
}

/// Non-empty string from the provider block, else from the environment
fn config_or_env(config: &HashMap<String, Dynamic>, key: &str, env: &str) -> Option<String> {
    config
        .get(key)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .or_else(|| std::env::var(env).ok())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl Provider for AivenProvider {
    fn schema(&self) -> ResourceSchema {
        SchemaBuilder::new()
            .description("Aiven provider")
            .attribute(
                "api_token",
                AttributeBuilder::string()
                    .optional()
                    .sensitive()
                    .description("Aiven authentication token. Can also be set with the AIVEN_TOKEN environment variable."),
            )
            .attribute(
                "api_url",
                AttributeBuilder::string()
                    .optional()
                    .description("Aiven API URL. Can also be set with the AIVEN_WEB_URL environment variable."),
            )
            .build()
    }

    async fn configure(&mut self, _ctx: Context, config: HashMap<String, Dynamic>) -> Diagnostics {
        logging::init();

        let api_token = config_or_env(&config, "api_token", TOKEN_ENV);
        let api_url = config_or_env(&config, "api_url", API_URL_ENV)
            .unwrap_or_else(|| api::DEFAULT_API_URL.to_string());

        let mut diags = Diagnostics::new();

        match api_token {
            Some(api_token) => match api::Client::new(&api_url, &api_token) {
                Ok(client) => {
                    tracing::info!(%api_url, "aiven provider configured");
                    self.client = Some(client);
                }
                Err(e) => {
                    diags.add_error(format!("Failed to create API client: {}", e), None::<String>);
                }
            },
            None => {
                diags.add_error(
                    "api_token is required (set in provider config or AIVEN_TOKEN env var)",
                    None::<String>,
                );
            }
        }

        diags
    }

    async fn create_resource(&self, name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let client = self
            .client
            .as_ref()
            .ok_or("Provider not configured")?
            .clone();

        match name {
            "aiven_kafka_topic" => Ok(Box::new(resources::KafkaTopicResource::new(client))),
            "aiven_kafka_acl" => Ok(Box::new(resources::KafkaAclResource::new(client))),
            "aiven_project_vpc" => Ok(Box::new(resources::ProjectVpcResource::new(client))),
            "aiven_vpc_peering_connection" => {
                Ok(Box::new(resources::VpcPeeringConnectionResource::new(client)))
            }
            "aiven_service" => Ok(Box::new(resources::ServiceResource::new(client))),
            "aiven_service_integration" => {
                Ok(Box::new(resources::ServiceIntegrationResource::new(client)))
            }
            "aiven_service_integration_endpoint" => Ok(Box::new(
                resources::ServiceIntegrationEndpointResource::new(client),
            )),
            "aiven_elasticsearch_acl_rule" => {
                Ok(Box::new(resources::ElasticsearchAclRuleResource::new(client)))
            }
            _ => Err(format!("Unknown resource: {}", name).into()),
        }
    }

    async fn create_data_source(&self, name: &str) -> tfplug::Result<Box<dyn DataSource>> {
        let client = self
            .client
            .as_ref()
            .ok_or("Provider not configured")?
            .clone();

        match name {
            "aiven_kafka_topic" => Ok(Box::new(data_sources::KafkaTopicDataSource::new(client))),
            "aiven_project_vpc" => Ok(Box::new(data_sources::ProjectVpcDataSource::new(client))),
            _ => Err(format!("Unknown data source: {}", name).into()),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, ResourceSchema> {
        static SCHEMAS: OnceLock<HashMap<String, ResourceSchema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "aiven_kafka_topic".to_string(),
                        resources::KafkaTopicResource::schema_static(),
                    ),
                    (
                        "aiven_kafka_acl".to_string(),
                        resources::KafkaAclResource::schema_static(),
                    ),
                    (
                        "aiven_project_vpc".to_string(),
                        resources::ProjectVpcResource::schema_static(),
                    ),
                    (
                        "aiven_vpc_peering_connection".to_string(),
                        resources::VpcPeeringConnectionResource::schema_static(),
                    ),
                    (
                        "aiven_service".to_string(),
                        resources::ServiceResource::schema_static(),
                    ),
                    (
                        "aiven_service_integration".to_string(),
                        resources::ServiceIntegrationResource::schema_static(),
                    ),
                    (
                        "aiven_service_integration_endpoint".to_string(),
                        resources::ServiceIntegrationEndpointResource::schema_static(),
                    ),
                    (
                        "aiven_elasticsearch_acl_rule".to_string(),
                        resources::ElasticsearchAclRuleResource::schema_static(),
                    ),
                ])
            })
            .clone()
    }

    async fn data_source_schemas(&self) -> HashMap<String, ResourceSchema> {
        static SCHEMAS: OnceLock<HashMap<String, ResourceSchema>> = OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "aiven_kafka_topic".to_string(),
                        data_sources::KafkaTopicDataSource::schema_static(),
                    ),
                    (
                        "aiven_project_vpc".to_string(),
                        data_sources::ProjectVpcDataSource::schema_static(),
                    ),
                ])
            })
            .clone()
    }
}
