//! Project VPC and VPC peering connection API implementation

use super::client::segment;
use super::{ApiError, Client};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Project VPC
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectVpc {
    pub project_vpc_id: String,
    pub cloud_name: String,
    pub network_cidr: String,
    pub state: String,
    #[serde(default)]
    pub peering_connections: Vec<PeeringConnection>,
}

/// Peering between a project VPC and a VPC in the customer's cloud account
#[derive(Debug, Clone, Deserialize)]
pub struct PeeringConnection {
    pub peer_cloud_account: String,
    pub peer_vpc: String,
    pub state: String,
    #[serde(default)]
    pub state_info: Option<HashMap<String, serde_json::Value>>,
}

impl PeeringConnection {
    /// Cloud-side connection ID once the provider has created it
    pub fn peering_connection_id(&self) -> Option<&str> {
        self.state_info
            .as_ref()?
            .get("aws_vpc_peering_connection_id")?
            .as_str()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVpcRequest {
    pub cloud_name: String,
    pub network_cidr: String,
    pub peering_connections: Vec<CreatePeeringConnectionRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePeeringConnectionRequest {
    pub peer_cloud_account: String,
    pub peer_vpc: String,
}

fn vpcs_path(project: &str) -> String {
    format!("/project/{}/vpcs", segment(project))
}

fn vpc_path(project: &str, vpc_id: &str) -> String {
    format!("{}/{}", vpcs_path(project), segment(vpc_id))
}

/// Project VPC API
pub struct VpcsApi<'a> {
    client: &'a Client,
}

impl<'a> VpcsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/vpcs/{vpc_id}
    pub async fn get(&self, project: &str, vpc_id: &str) -> Result<ProjectVpc, ApiError> {
        self.client.get(&vpc_path(project, vpc_id)).await
    }

    /// GET /project/{project}/vpcs
    pub async fn list(&self, project: &str) -> Result<Vec<ProjectVpc>, ApiError> {
        #[derive(Deserialize)]
        struct VpcList {
            #[serde(default)]
            vpcs: Vec<ProjectVpc>,
        }

        let response: VpcList = self.client.get(&vpcs_path(project)).await?;
        Ok(response.vpcs)
    }

    /// POST /project/{project}/vpcs
    pub async fn create(&self, project: &str, request: &CreateVpcRequest) -> Result<ProjectVpc, ApiError> {
        self.client.post(&vpcs_path(project), request).await
    }

    /// DELETE /project/{project}/vpcs/{vpc_id}
    pub async fn delete(&self, project: &str, vpc_id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&vpc_path(project, vpc_id))
            .await
            .map(|_| ())
    }
}

fn peering_path(project: &str, vpc_id: &str, peer_account: &str, peer_vpc: &str) -> String {
    format!(
        "{}/peering-connections/peer-accounts/{}/peer-vpcs/{}",
        vpc_path(project, vpc_id),
        segment(peer_account),
        segment(peer_vpc)
    )
}

/// VPC peering connection API
pub struct PeeringConnectionsApi<'a> {
    client: &'a Client,
}

impl<'a> PeeringConnectionsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Looks the connection up in the VPC's connection list; a missing
    /// connection is reported as a 404.
    pub async fn get(
        &self,
        project: &str,
        vpc_id: &str,
        peer_account: &str,
        peer_vpc: &str,
    ) -> Result<PeeringConnection, ApiError> {
        let vpc = self.client.vpcs().get(project, vpc_id).await?;
        vpc.peering_connections
            .into_iter()
            .find(|pc| pc.peer_cloud_account == peer_account && pc.peer_vpc == peer_vpc)
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: format!(
                    "Peering connection {}/{} not found in VPC {}",
                    peer_account, peer_vpc, vpc_id
                ),
                more_info: None,
            })
    }

    /// POST /project/{project}/vpcs/{vpc_id}/peering-connections
    pub async fn create(
        &self,
        project: &str,
        vpc_id: &str,
        request: &CreatePeeringConnectionRequest,
    ) -> Result<PeeringConnection, ApiError> {
        let path = format!("{}/peering-connections", vpc_path(project, vpc_id));
        self.client.post(&path, request).await
    }

    /// DELETE /project/{project}/vpcs/{vpc_id}/peering-connections/peer-accounts/{account}/peer-vpcs/{peer_vpc}
    pub async fn delete(
        &self,
        project: &str,
        vpc_id: &str,
        peer_account: &str,
        peer_vpc: &str,
    ) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&peering_path(project, vpc_id, peer_account, peer_vpc))
            .await
            .map(|_| ())
    }
}
