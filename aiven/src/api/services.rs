//! Service API implementation

use super::client::segment;
use super::{ApiError, Client};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub service_name: String,
    pub service_type: String,
    pub plan: String,
    pub cloud_name: String,
    pub state: String,
    #[serde(default)]
    pub termination_protection: bool,
    #[serde(default)]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(default)]
    pub project_vpc_id: Option<String>,
    #[serde(default)]
    pub service_uri: String,
    #[serde(default)]
    pub service_uri_params: HashMap<String, String>,
    #[serde(default)]
    pub user_config: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub components: Vec<ServiceComponent>,
    #[serde(default)]
    pub backups: Vec<serde_json::Value>,
    #[serde(default)]
    pub service_integrations: Vec<ServiceIntegrationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub dow: String,
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceComponent {
    pub component: String,
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub usage: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIntegrationSummary {
    pub integration_type: String,
    #[serde(default)]
    pub dest_service: Option<String>,
    #[serde(default)]
    pub source_service: Option<String>,
}

/// Integration requested together with a new service
#[derive(Debug, Clone, Serialize)]
pub struct NewServiceIntegration {
    pub integration_type: String,
    pub source_service: String,
    pub user_config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateServiceRequest {
    pub cloud: String,
    pub plan: String,
    pub service_name: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_integrations: Vec<NewServiceIntegration>,
    pub termination_protection: bool,
    pub user_config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateServiceRequest {
    pub cloud: String,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_vpc_id: Option<String>,
    pub powered: bool,
    pub termination_protection: bool,
    pub user_config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    service: Service,
}

fn services_path(project: &str) -> String {
    format!("/project/{}/service", segment(project))
}

fn service_path(project: &str, service: &str) -> String {
    format!("{}/{}", services_path(project), segment(service))
}

/// Services API
pub struct ServicesApi<'a> {
    client: &'a Client,
}

impl<'a> ServicesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/service/{service}
    pub async fn get(&self, project: &str, service: &str) -> Result<Service, ApiError> {
        let response: ServiceResponse = self.client.get(&service_path(project, service)).await?;
        Ok(response.service)
    }

    /// POST /project/{project}/service
    pub async fn create(&self, project: &str, request: &CreateServiceRequest) -> Result<Service, ApiError> {
        let response: ServiceResponse = self.client.post(&services_path(project), request).await?;
        Ok(response.service)
    }

    /// PUT /project/{project}/service/{service}
    pub async fn update(
        &self,
        project: &str,
        service: &str,
        request: &UpdateServiceRequest,
    ) -> Result<Service, ApiError> {
        let response: ServiceResponse = self
            .client
            .put(&service_path(project, service), request)
            .await?;
        Ok(response.service)
    }

    /// DELETE /project/{project}/service/{service}
    pub async fn delete(&self, project: &str, service: &str) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&service_path(project, service))
            .await
            .map(|_| ())
    }
}
