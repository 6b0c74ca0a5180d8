//! Service integration endpoint resource

use super::{
    delete_diagnostics, read_diagnostics, set_user_config, user_config_attributes,
    user_config_to_api,
};
use crate::api::integrations::{
    CreateIntegrationEndpointRequest, IntegrationEndpoint, UpdateIntegrationEndpointRequest,
};
use crate::api::Client;
use crate::schemautil::{build_resource_id, split_resource_id};
use crate::user_config::UserConfigKind;
use crate::Error;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Resource, ResourceData, ResourceSchema, SchemaBuilder,
};

pub struct ServiceIntegrationEndpointResource {
    client: Client,
}

impl ServiceIntegrationEndpointResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Manages an external endpoint services can be integrated with")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Project the service integration endpoint belongs to"),
                    )
                    .attribute(
                        "endpoint_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Name of the service integration endpoint"),
                    )
                    .attribute(
                        "endpoint_type",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Type of the service integration endpoint"),
                    )
                    .attributes(user_config_attributes(UserConfigKind::Endpoint))
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_endpoint(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let endpoint_type = data.require_string("endpoint_type")?;
        let request = CreateIntegrationEndpointRequest {
            endpoint_name: data.require_string("endpoint_name")?,
            user_config: user_config_to_api(UserConfigKind::Endpoint, &endpoint_type, data, true)?,
            endpoint_type,
        };

        let endpoint = self.client.integration_endpoints().create(&project, &request).await?;
        tracing::info!(%project, endpoint_id = %endpoint.endpoint_id, "created integration endpoint");
        data.set_id(build_resource_id(&[&project, &endpoint.endpoint_id]));
        set_endpoint_attributes(data, &project, &endpoint)
    }

    async fn read_endpoint(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, endpoint_id] = split_resource_id::<2>(data.id())?;
        let endpoint = self
            .client
            .integration_endpoints()
            .get(&project, &endpoint_id)
            .await?;
        set_endpoint_attributes(data, &project, &endpoint)
    }

    async fn update_endpoint(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, endpoint_id] = split_resource_id::<2>(data.id())?;
        let endpoint_type = data.require_string("endpoint_type")?;
        let request = UpdateIntegrationEndpointRequest {
            user_config: user_config_to_api(UserConfigKind::Endpoint, &endpoint_type, data, false)?,
        };

        let endpoint = self
            .client
            .integration_endpoints()
            .update(&project, &endpoint_id, &request)
            .await?;
        set_endpoint_attributes(data, &project, &endpoint)
    }

    async fn delete_endpoint(&self, data: &ResourceData) -> crate::Result<()> {
        let [project, endpoint_id] = split_resource_id::<2>(data.id())?;
        self.client
            .integration_endpoints()
            .delete(&project, &endpoint_id)
            .await
            .map_err(Error::from)
    }
}

fn set_endpoint_attributes(
    data: &mut ResourceData,
    project: &str,
    endpoint: &IntegrationEndpoint,
) -> crate::Result<()> {
    data.set("project", project);
    data.set("endpoint_name", endpoint.endpoint_name.as_str());
    data.set("endpoint_type", endpoint.endpoint_type.as_str());
    set_user_config(
        data,
        UserConfigKind::Endpoint,
        &endpoint.endpoint_type,
        &endpoint.user_config,
    )
}

#[async_trait]
impl Resource for ServiceIntegrationEndpointResource {
    fn type_name(&self) -> &str {
        "aiven_service_integration_endpoint"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.create_endpoint(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to create service integration endpoint", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_endpoint(data).await;
        read_diagnostics(data, result, "Failed to read service integration endpoint")
    }

    async fn update(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.update_endpoint(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to update service integration endpoint", e),
        }
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        delete_diagnostics(
            self.delete_endpoint(data).await,
            "Failed to delete service integration endpoint",
        )
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<2>(data.id()) {
            return Diagnostics::from_error("Invalid import ID, expected <project_name>/<endpoint_id>", e);
        }
        self.read(ctx, data).await
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use crate::resources::test_support::values;
    use mockito::{Matcher, Server};
    use tfplug::Dynamic;

    const DATADOG: &str = r#"{"service_integration_endpoint":{"endpoint_id":"ep-9",
        "endpoint_name":"dd","endpoint_type":"datadog",
        "user_config":{"datadog_api_key":"k3y","datadog_tags":[{"tag":"env:prod"}]}}}"#;

    fn datadog_config() -> Dynamic {
        Dynamic::List(vec![Dynamic::Map(values(&[
            ("datadog_api_key", "k3y".into()),
            (
                "datadog_tags",
                Dynamic::List(vec![Dynamic::Map(values(&[("tag", "env:prod".into())]))]),
            ),
        ]))])
    }

    fn resource(url: &str) -> ServiceIntegrationEndpointResource {
        ServiceIntegrationEndpointResource::new(create_test_client(url))
    }

    #[test]
    fn api_key_is_sensitive() {
        let schema = ServiceIntegrationEndpointResource::schema_static();
        let datadog = schema.attribute("datadog_user_config").unwrap();
        let key = datadog.nested().unwrap().attribute("datadog_api_key").unwrap();
        assert!(key.sensitive);
        assert!(schema.attribute("rsyslog_user_config").is_some());
    }

    #[tokio::test]
    async fn create_sends_datadog_settings() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/project/p/integration_endpoint")
            .match_body(Matcher::Json(serde_json::json!({
                "endpoint_name": "dd",
                "endpoint_type": "datadog",
                "user_config": {"datadog_api_key": "k3y", "datadog_tags": [{"tag": "env:prod"}]},
            })))
            .with_body(DATADOG)
            .create_async()
            .await;

        let mut data = ResourceData::from_config(values(&[
            ("project", "p".into()),
            ("endpoint_name", "dd".into()),
            ("endpoint_type", "datadog".into()),
            ("datadog_user_config", datadog_config()),
        ]));
        let diags = resource(&server.url()).create(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        create.assert_async().await;
        assert_eq!(data.id(), "p/ep-9");
        assert_eq!(
            data.get_string("datadog_user_config.0.datadog_tags.0.tag").as_deref(),
            Some("env:prod")
        );
    }

    #[tokio::test]
    async fn unknown_user_config_key_fails_before_request() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/project/p/integration_endpoint")
            .expect(0)
            .create_async()
            .await;

        let mut data = ResourceData::from_config(values(&[
            ("project", "p".into()),
            ("endpoint_name", "dd".into()),
            ("endpoint_type", "datadog".into()),
            (
                "datadog_user_config",
                Dynamic::List(vec![Dynamic::Map(values(&[("api_secret", "x".into())]))]),
            ),
        ]));
        let diags = resource(&server.url()).create(Context::new(), &mut data).await;

        assert!(diags.has_errors());
        create.assert_async().await;
    }

    #[tokio::test]
    async fn read_of_missing_endpoint_clears_id() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/integration_endpoint/ep-9")
            .with_status(404)
            .with_body(r#"{"message":"Integration endpoint not found"}"#)
            .create_async()
            .await;

        let mut data = ResourceData::for_import("p/ep-9");
        let diags = resource(&server.url()).read(Context::new(), &mut data).await;
        assert!(diags.is_empty());
        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn update_puts_user_config() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("PUT", "/project/p/integration_endpoint/ep-9")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "user_config": {"datadog_api_key": "k3y"},
            })))
            .with_body(DATADOG)
            .create_async()
            .await;

        let config = values(&[
            ("project", "p".into()),
            ("endpoint_name", "dd".into()),
            ("endpoint_type", "datadog".into()),
            ("datadog_user_config", datadog_config()),
        ]);
        let mut data = ResourceData::planned("p/ep-9", config.clone(), config);
        let diags = resource(&server.url()).update(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        update.assert_async().await;
    }
}
