//! Service integration resource

use super::{
    delete_diagnostics, optional_string, read_diagnostics, set_user_config, user_config_attributes,
    user_config_to_api,
};
use crate::api::integrations::{
    CreateServiceIntegrationRequest, ServiceIntegration, UpdateServiceIntegrationRequest,
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

pub struct ServiceIntegrationResource {
    client: Client,
}

impl ServiceIntegrationResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let endpoint = |description: &str| {
                    AttributeBuilder::string()
                        .optional()
                        .force_new()
                        .description(description)
                };
                SchemaBuilder::new()
                    .description("Manages an integration between two services or a service and an endpoint")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Project the integration belongs to"),
                    )
                    .attribute(
                        "integration_type",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Type of the service integration"),
                    )
                    .attribute(
                        "source_service_name",
                        endpoint("Source service for the integration (if any)"),
                    )
                    .attribute(
                        "destination_service_name",
                        endpoint("Destination service for the integration (if any)"),
                    )
                    .attribute(
                        "source_endpoint_id",
                        endpoint("Source endpoint for the integration (if any), as <project>/<endpoint_id>"),
                    )
                    .attribute(
                        "destination_endpoint_id",
                        endpoint("Destination endpoint for the integration (if any), as <project>/<endpoint_id>"),
                    )
                    .attributes(user_config_attributes(UserConfigKind::Integration))
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_integration(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let integration_type = data.require_string("integration_type")?;

        let request = CreateServiceIntegrationRequest {
            source_service: optional_string(data, "source_service_name"),
            dest_service: optional_string(data, "destination_service_name"),
            source_endpoint_id: plain_endpoint_id(data, "source_endpoint_id")?,
            dest_endpoint_id: plain_endpoint_id(data, "destination_endpoint_id")?,
            user_config: user_config_to_api(UserConfigKind::Integration, &integration_type, data, true)?,
            integration_type,
        };

        let integration = self.client.service_integrations().create(&project, &request).await?;
        tracing::info!(
            %project,
            integration_id = %integration.service_integration_id,
            integration_type = %integration.integration_type,
            "created service integration"
        );
        data.set_id(build_resource_id(&[&project, &integration.service_integration_id]));
        set_integration_attributes(data, &project, &integration)
    }

    async fn read_integration(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, integration_id] = split_resource_id::<2>(data.id())?;
        let integration = self
            .client
            .service_integrations()
            .get(&project, &integration_id)
            .await?;
        set_integration_attributes(data, &project, &integration)
    }

    /// Only the user config of an integration can change in place
    async fn update_integration(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, integration_id] = split_resource_id::<2>(data.id())?;
        let integration_type = data.require_string("integration_type")?;
        let request = UpdateServiceIntegrationRequest {
            user_config: user_config_to_api(UserConfigKind::Integration, &integration_type, data, false)?,
        };

        let integration = self
            .client
            .service_integrations()
            .update(&project, &integration_id, &request)
            .await?;
        set_integration_attributes(data, &project, &integration)
    }

    async fn delete_integration(&self, data: &ResourceData) -> crate::Result<()> {
        let [project, integration_id] = split_resource_id::<2>(data.id())?;
        self.client
            .service_integrations()
            .delete(&project, &integration_id)
            .await
            .map_err(Error::from)
    }
}

/// Endpoint references are `<project>/<endpoint_id>`; the API wants the id alone
fn plain_endpoint_id(data: &ResourceData, key: &str) -> crate::Result<Option<String>> {
    match optional_string(data, key) {
        Some(id) => {
            let [_, endpoint_id] = split_resource_id::<2>(&id)?;
            Ok(Some(endpoint_id))
        }
        None => Ok(None),
    }
}

fn set_integration_attributes(
    data: &mut ResourceData,
    project: &str,
    integration: &ServiceIntegration,
) -> crate::Result<()> {
    data.set("project", project);
    data.set("integration_type", integration.integration_type.as_str());

    if let Some(endpoint_id) = &integration.dest_endpoint_id {
        data.set("destination_endpoint_id", build_resource_id(&[project, endpoint_id]));
    } else if let Some(service) = &integration.dest_service {
        data.set("destination_service_name", service.as_str());
    }

    if let Some(endpoint_id) = &integration.source_endpoint_id {
        data.set("source_endpoint_id", build_resource_id(&[project, endpoint_id]));
    } else if let Some(service) = &integration.source_service {
        data.set("source_service_name", service.as_str());
    }

    set_user_config(
        data,
        UserConfigKind::Integration,
        &integration.integration_type,
        &integration.user_config,
    )
}

#[async_trait]
impl Resource for ServiceIntegrationResource {
    fn type_name(&self) -> &str {
        "aiven_service_integration"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.create_integration(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to create service integration", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_integration(data).await;
        read_diagnostics(data, result, "Failed to read service integration")
    }

    async fn update(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.update_integration(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to update service integration", e),
        }
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        delete_diagnostics(
            self.delete_integration(data).await,
            "Failed to delete service integration",
        )
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<2>(data.id()) {
            return Diagnostics::from_error(
                "Invalid import ID, expected <project_name>/<integration_id>",
                e,
            );
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

    const MIRRORMAKER: &str = r#"{"service_integration":{"service_integration_id":"si-1",
        "integration_type":"mirrormaker","source_service":"kafka-a","dest_service":"mm-1",
        "user_config":{"mirrormaker_whitelist":"events.*"}}}"#;

    const LOGS_TO_ENDPOINT: &str = r#"{"service_integration":{"service_integration_id":"si-2",
        "integration_type":"logs","source_service":"pg-1","dest_endpoint_id":"ep-9",
        "user_config":{}}}"#;

    fn resource(url: &str) -> ServiceIntegrationResource {
        ServiceIntegrationResource::new(create_test_client(url))
    }

    #[test]
    fn schema_has_integration_user_configs() {
        let schema = ServiceIntegrationResource::schema_static();
        assert!(schema.attribute("mirrormaker_user_config").is_some());
        assert!(schema.attribute("logs_user_config").is_some());
        assert!(schema.attribute("source_endpoint_id").unwrap().force_new);
    }

    #[tokio::test]
    async fn create_sends_plain_endpoint_id() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/project/p/integration")
            .match_body(Matcher::Json(serde_json::json!({
                "integration_type": "logs",
                "source_service": "pg-1",
                "dest_endpoint_id": "ep-9",
                "user_config": {},
            })))
            .with_body(LOGS_TO_ENDPOINT)
            .create_async()
            .await;

        let mut data = ResourceData::from_config(values(&[
            ("project", "p".into()),
            ("integration_type", "logs".into()),
            ("source_service_name", "pg-1".into()),
            ("destination_endpoint_id", "p/ep-9".into()),
        ]));
        let diags = resource(&server.url()).create(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        create.assert_async().await;
        assert_eq!(data.id(), "p/si-2");
        assert_eq!(data.get_string("destination_endpoint_id").as_deref(), Some("p/ep-9"));
    }

    #[tokio::test]
    async fn update_sends_only_user_config() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("PUT", "/project/p/integration/si-1")
            .match_body(Matcher::Json(serde_json::json!({
                "user_config": {"mirrormaker_whitelist": "events.*"},
            })))
            .with_body(MIRRORMAKER)
            .create_async()
            .await;

        let config = values(&[
            ("project", "p".into()),
            ("integration_type", "mirrormaker".into()),
            ("source_service_name", "kafka-a".into()),
            ("destination_service_name", "mm-1".into()),
            (
                "mirrormaker_user_config",
                Dynamic::List(vec![Dynamic::Map(values(&[(
                    "mirrormaker_whitelist",
                    "events.*".into(),
                )]))]),
            ),
        ]);
        let mut data = ResourceData::planned("p/si-1", config.clone(), config);
        let diags = resource(&server.url()).update(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        update.assert_async().await;
    }

    #[tokio::test]
    async fn import_reads_user_config() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/integration/si-1")
            .with_body(MIRRORMAKER)
            .create_async()
            .await;

        let resource = resource(&server.url());

        let mut data = ResourceData::for_import("p/si-1");
        assert!(resource.import(Context::new(), &mut data).await.is_empty());
        assert_eq!(data.get_string("source_service_name").as_deref(), Some("kafka-a"));
        assert_eq!(
            data.get_string("mirrormaker_user_config.0.mirrormaker_whitelist").as_deref(),
            Some("events.*")
        );

        let mut data = ResourceData::for_import("si-1");
        assert!(resource.import(Context::new(), &mut data).await.has_errors());
    }

    #[tokio::test]
    async fn delete_of_missing_integration_succeeds() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/project/p/integration/si-1")
            .with_status(404)
            .with_body(r#"{"message":"Service integration not found"}"#)
            .create_async()
            .await;

        let mut data = ResourceData::for_import("p/si-1");
        assert!(resource(&server.url())
            .delete(Context::new(), &mut data)
            .await
            .is_empty());
        delete.assert_async().await;
    }
}
