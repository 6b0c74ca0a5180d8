//! Project VPC resource

use super::{read_diagnostics, PollSettings, DEFAULT_POLL};
use crate::api::vpcs::{CreateVpcRequest, ProjectVpc};
use crate::api::{ApiError, Client};
use crate::schemautil::{build_resource_id, split_resource_id};
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::wait::RefreshResult;
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Resource, ResourceData, ResourceSchema,
    SchemaBuilder, StateChangeConf,
};

pub struct ProjectVpcResource {
    client: Client,
    poll: PollSettings,
}

impl ProjectVpcResource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Manages a VPC of an Aiven project")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The project the VPC belongs to"),
                    )
                    .attribute(
                        "cloud_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Cloud the VPC is in"),
                    )
                    .attribute(
                        "network_cidr",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Network address range used by the VPC like 192.168.0.0/24"),
                    )
                    .attribute(
                        "state",
                        AttributeBuilder::string()
                            .computed()
                            .description("State of the VPC (APPROVED, ACTIVE, DELETING, DELETED)"),
                    )
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_vpc(&self, ctx: &Context, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let request = CreateVpcRequest {
            cloud_name: data.require_string("cloud_name")?,
            network_cidr: data.require_string("network_cidr")?,
            peering_connections: Vec::new(),
        };

        let vpc = self.client.vpcs().create(&project, &request).await?;
        tracing::info!(%project, vpc_id = %vpc.project_vpc_id, "created project VPC");
        data.set_id(build_resource_id(&[&project, &vpc.project_vpc_id]));

        let client = &self.client;
        let (project_name, vpc_id) = (project.as_str(), vpc.project_vpc_id.as_str());
        let conf = StateChangeConf::new(|| async move {
            let vpc = client.vpcs().get(project_name, vpc_id).await?;
            tracing::debug!(vpc_id, state = %vpc.state, "waiting for project VPC to be ACTIVE");
            let state = vpc.state.clone();
            Ok::<_, ApiError>((Some(vpc), state))
        })
        .pending(&["APPROVED"])
        .target(&["ACTIVE"])
        .timeout(data.timeouts().create);

        let vpc = self.poll.apply(conf).wait_for_state(ctx).await?;
        set_vpc_attributes(data, &project, &vpc);
        Ok(())
    }

    async fn read_vpc(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, vpc_id] = split_resource_id::<2>(data.id())?;
        let vpc = self.client.vpcs().get(&project, &vpc_id).await?;
        set_vpc_attributes(data, &project, &vpc);
        Ok(())
    }

    /// Deletion is requested from inside the wait, so a VPC that is still
    /// busy (409) gets another request on the next poll.
    async fn delete_vpc(&self, ctx: &Context, data: &ResourceData) -> crate::Result<()> {
        let [project, vpc_id] = split_resource_id::<2>(data.id())?;
        let client = &self.client;
        let (project, vpc_id) = (project.as_str(), vpc_id.as_str());

        let conf = StateChangeConf::new(|| refresh_deletion(client, project, vpc_id))
            .pending(&["APPROVED", "DELETING", "ACTIVE"])
            .target(&["DELETED"])
            .timeout(data.timeouts().delete);

        self.poll.apply(conf).wait_for_state(ctx).await?;
        Ok(())
    }
}

async fn refresh_deletion(client: &Client, project: &str, vpc_id: &str) -> RefreshResult<(), ApiError> {
    let vpc = match client.vpcs().get(project, vpc_id).await {
        Ok(vpc) => vpc,
        Err(e) if e.is_not_found() => return Ok((Some(()), "DELETED".to_string())),
        Err(e) => return Err(e),
    };

    if vpc.state != "DELETING" && vpc.state != "DELETED" {
        match client.vpcs().delete(project, vpc_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok((Some(()), "DELETED".to_string())),
            Err(e) if e.status() == Some(409) => {
                tracing::debug!(vpc_id, error = %e, "project VPC not deletable yet");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(vpc_id, state = %vpc.state, "waiting for project VPC to be DELETED");
    Ok((Some(()), vpc.state))
}

pub(crate) fn set_vpc_attributes(data: &mut ResourceData, project: &str, vpc: &ProjectVpc) {
    data.set("project", project);
    data.set("cloud_name", vpc.cloud_name.as_str());
    data.set("network_cidr", vpc.network_cidr.as_str());
    data.set("state", vpc.state.as_str());
}

#[async_trait]
impl Resource for ProjectVpcResource {
    fn type_name(&self) -> &str {
        "aiven_project_vpc"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.create_vpc(&ctx, data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Error waiting for Aiven project VPC to be ACTIVE", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_vpc(data).await;
        read_diagnostics(data, result, "Failed to read project VPC")
    }

    /// Every configurable attribute forces replacement
    async fn update(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.delete_vpc(&ctx, data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Error waiting for Aiven project VPC to be DELETED", e),
        }
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<2>(data.id()) {
            return Diagnostics::from_error("Invalid import ID, expected <project_name>/<vpc_id>", e);
        }
        self.read(ctx, data).await
    }
}
