//! Service integration and integration endpoint API implementation

use super::client::segment;
use super::{ApiError, Client};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

type UserConfig = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIntegration {
    pub service_integration_id: String,
    pub integration_type: String,
    #[serde(default)]
    pub source_service: Option<String>,
    #[serde(default)]
    pub dest_service: Option<String>,
    #[serde(default)]
    pub source_endpoint_id: Option<String>,
    #[serde(default)]
    pub dest_endpoint_id: Option<String>,
    #[serde(default)]
    pub user_config: UserConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServiceIntegrationRequest {
    pub integration_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_endpoint_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_endpoint_id: Option<String>,
    pub user_config: UserConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateServiceIntegrationRequest {
    pub user_config: UserConfig,
}

#[derive(Debug, Deserialize)]
struct IntegrationResponse {
    service_integration: ServiceIntegration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationEndpoint {
    pub endpoint_id: String,
    pub endpoint_name: String,
    pub endpoint_type: String,
    #[serde(default)]
    pub user_config: UserConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIntegrationEndpointRequest {
    pub endpoint_name: String,
    pub endpoint_type: String,
    pub user_config: UserConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateIntegrationEndpointRequest {
    pub user_config: UserConfig,
}

#[derive(Debug, Deserialize)]
struct EndpointResponse {
    service_integration_endpoint: IntegrationEndpoint,
}

fn integrations_path(project: &str) -> String {
    format!("/project/{}/integration", segment(project))
}

fn endpoints_path(project: &str) -> String {
    format!("/project/{}/integration_endpoint", segment(project))
}

/// Service integrations API
pub struct ServiceIntegrationsApi<'a> {
    client: &'a Client,
}

impl<'a> ServiceIntegrationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/integration/{integration_id}
    pub async fn get(&self, project: &str, integration_id: &str) -> Result<ServiceIntegration, ApiError> {
        let path = format!("{}/{}", integrations_path(project), segment(integration_id));
        let response: IntegrationResponse = self.client.get(&path).await?;
        Ok(response.service_integration)
    }

    /// POST /project/{project}/integration
    pub async fn create(
        &self,
        project: &str,
        request: &CreateServiceIntegrationRequest,
    ) -> Result<ServiceIntegration, ApiError> {
        let response: IntegrationResponse =
            self.client.post(&integrations_path(project), request).await?;
        Ok(response.service_integration)
    }

    /// PUT /project/{project}/integration/{integration_id}
    pub async fn update(
        &self,
        project: &str,
        integration_id: &str,
        request: &UpdateServiceIntegrationRequest,
    ) -> Result<ServiceIntegration, ApiError> {
        let path = format!("{}/{}", integrations_path(project), segment(integration_id));
        let response: IntegrationResponse = self.client.put(&path, request).await?;
        Ok(response.service_integration)
    }

    /// DELETE /project/{project}/integration/{integration_id}
    pub async fn delete(&self, project: &str, integration_id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", integrations_path(project), segment(integration_id));
        self.client.delete::<IgnoredAny>(&path).await.map(|_| ())
    }
}

/// Integration endpoints API
pub struct IntegrationEndpointsApi<'a> {
    client: &'a Client,
}

impl<'a> IntegrationEndpointsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/integration_endpoint/{endpoint_id}
    pub async fn get(&self, project: &str, endpoint_id: &str) -> Result<IntegrationEndpoint, ApiError> {
        let path = format!("{}/{}", endpoints_path(project), segment(endpoint_id));
        let response: EndpointResponse = self.client.get(&path).await?;
        Ok(response.service_integration_endpoint)
    }

    /// POST /project/{project}/integration_endpoint
    pub async fn create(
        &self,
        project: &str,
        request: &CreateIntegrationEndpointRequest,
    ) -> Result<IntegrationEndpoint, ApiError> {
        let response: EndpointResponse = self.client.post(&endpoints_path(project), request).await?;
        Ok(response.service_integration_endpoint)
    }

    /// PUT /project/{project}/integration_endpoint/{endpoint_id}
    pub async fn update(
        &self,
        project: &str,
        endpoint_id: &str,
        request: &UpdateIntegrationEndpointRequest,
    ) -> Result<IntegrationEndpoint, ApiError> {
        let path = format!("{}/{}", endpoints_path(project), segment(endpoint_id));
        let response: EndpointResponse = self.client.put(&path, request).await?;
        Ok(response.service_integration_endpoint)
    }

    /// DELETE /project/{project}/integration_endpoint/{endpoint_id}
    pub async fn delete(&self, project: &str, endpoint_id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", endpoints_path(project), segment(endpoint_id));
        self.client.delete::<IgnoredAny>(&path).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn create_integration_omits_missing_endpoints() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/project/p/integration")
            .match_body(Matcher::Json(serde_json::json!({
                "integration_type": "logs",
                "source_service": "pg-1",
                "dest_service": "es-1",
                "user_config": {"elasticsearch_index_days_max": 3},
            })))
            .with_body(
                r#"{"service_integration":{"service_integration_id":"i-1","integration_type":"logs",
                "source_service":"pg-1","dest_service":"es-1",
                "user_config":{"elasticsearch_index_days_max":3}}}"#,
            )
            .create_async()
            .await;

        let mut user_config = serde_json::Map::new();
        user_config.insert("elasticsearch_index_days_max".into(), 3.into());

        let client = create_test_client(&server.url());
        let integration = client
            .service_integrations()
            .create(
                "p",
                &CreateServiceIntegrationRequest {
                    integration_type: "logs".into(),
                    source_service: Some("pg-1".into()),
                    dest_service: Some("es-1".into()),
                    source_endpoint_id: None,
                    dest_endpoint_id: None,
                    user_config,
                },
            )
            .await
            .unwrap();
        assert_eq!(integration.service_integration_id, "i-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_endpoint_unwraps_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/project/p/integration_endpoint/e-1")
            .with_body(
                r#"{"service_integration_endpoint":{"endpoint_id":"e-1","endpoint_name":"dd",
                "endpoint_type":"datadog","user_config":{"datadog_api_key":"secret"}}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let endpoint = client
            .integration_endpoints()
            .get("p", "e-1")
            .await
            .unwrap();
        assert_eq!(endpoint.endpoint_type, "datadog");
        assert_eq!(endpoint.user_config["datadog_api_key"], "secret");
    }
}
