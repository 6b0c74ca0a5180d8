//! VPC peering connection resource

use super::{delete_diagnostics, read_diagnostics, PollSettings, DEFAULT_POLL};
use crate::api::vpcs::{CreatePeeringConnectionRequest, PeeringConnection};
use crate::api::{ApiError, Client};
use crate::schemautil::{build_resource_id, split_resource_id};
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Dynamic, Resource, ResourceData, ResourceSchema,
    SchemaBuilder, StateChangeConf,
};

/// States in which the connection build has finished, successfully or not
const BUILT_STATES: [&str; 7] = [
    "ACTIVE",
    "REJECTED_BY_PEER",
    "PENDING_PEER",
    "INVALID_SPECIFICATION",
    "DELETING",
    "DELETED",
    "DELETED_BY_PEER",
];

const BUILD_TIMEOUT: Duration = Duration::from_secs(2 * 60);

pub struct VpcPeeringConnectionResource {
    client: Client,
    poll: PollSettings,
}

impl VpcPeeringConnectionResource {
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
                    .description("Manages a peering between a project VPC and a VPC in another cloud account")
                    .attribute(
                        "vpc_id",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The VPC the peering connection belongs to, as <project>/<vpc_id>"),
                    )
                    .attribute(
                        "peer_cloud_account",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("AWS account ID or GCP project ID of the peered VPC"),
                    )
                    .attribute(
                        "peer_vpc",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("AWS VPC ID or GCP VPC network name of the peered VPC"),
                    )
                    .attribute(
                        "state",
                        AttributeBuilder::string()
                            .computed()
                            .description("State of the peering connection"),
                    )
                    .attribute(
                        "state_info",
                        AttributeBuilder::map(AttributeBuilder::string())
                            .computed()
                            .description("State-specific help or error information"),
                    )
                    .attribute(
                        "peering_connection_id",
                        AttributeBuilder::string()
                            .computed()
                            .description("Cloud provider identifier for the peering connection if available"),
                    )
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_connection(&self, ctx: &Context, data: &mut ResourceData) -> crate::Result<Diagnostics> {
        let [project, vpc_id] = split_resource_id::<2>(&data.require_string("vpc_id")?)?;
        let request = CreatePeeringConnectionRequest {
            peer_cloud_account: data.require_string("peer_cloud_account")?,
            peer_vpc: data.require_string("peer_vpc")?,
        };

        let created = self
            .client
            .vpc_peering_connections()
            .create(&project, &vpc_id, &request)
            .await?;

        let client = &self.client;
        let (project_name, vpc) = (project.as_str(), vpc_id.as_str());
        let (account, peer_vpc) = (created.peer_cloud_account.as_str(), created.peer_vpc.as_str());
        let conf = StateChangeConf::new(|| async move {
            let pc = client
                .vpc_peering_connections()
                .get(project_name, vpc, account, peer_vpc)
                .await?;
            tracing::debug!(state = %pc.state, "waiting for peering connection to be built");
            let state = pc.state.clone();
            Ok::<_, ApiError>((Some(pc), state))
        })
        .pending(&["APPROVED"])
        .target(&BUILT_STATES)
        .timeout(data.timeouts().create.min(BUILD_TIMEOUT));

        let pc = self.poll.apply(conf).wait_for_state(ctx).await?;
        data.set_id(build_resource_id(&[&project, &vpc_id, &pc.peer_cloud_account, &pc.peer_vpc]));
        set_connection_attributes(data, &project, &vpc_id, &pc);

        let mut diags = Diagnostics::new();
        if pc.state != "ACTIVE" {
            diags.add_warning(
                format!("Peering connection is in state {}", pc.state),
                pc.state_info
                    .as_ref()
                    .and_then(|info| info.get("message"))
                    .and_then(|message| message.as_str())
                    .map(|message| message.to_string()),
            );
        }
        Ok(diags)
    }

    async fn read_connection(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, vpc_id, account, peer_vpc] = split_resource_id::<4>(data.id())?;
        let pc = self
            .client
            .vpc_peering_connections()
            .get(&project, &vpc_id, &account, &peer_vpc)
            .await?;
        set_connection_attributes(data, &project, &vpc_id, &pc);
        Ok(())
    }

    async fn delete_connection(&self, data: &ResourceData) -> crate::Result<()> {
        let [project, vpc_id, account, peer_vpc] = split_resource_id::<4>(data.id())?;
        self.client
            .vpc_peering_connections()
            .delete(&project, &vpc_id, &account, &peer_vpc)
            .await
            .map_err(Error::from)
    }
}

fn set_connection_attributes(data: &mut ResourceData, project: &str, vpc_id: &str, pc: &PeeringConnection) {
    data.set("vpc_id", build_resource_id(&[project, vpc_id]));
    data.set("peer_cloud_account", pc.peer_cloud_account.as_str());
    data.set("peer_vpc", pc.peer_vpc.as_str());
    data.set("state", pc.state.as_str());
    data.set("peering_connection_id", pc.peering_connection_id().unwrap_or_default());

    let state_info: HashMap<String, Dynamic> = pc
        .state_info
        .iter()
        .flatten()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), Dynamic::String(text))
        })
        .collect();
    data.set("state_info", state_info);
}

#[async_trait]
impl Resource for VpcPeeringConnectionResource {
    fn type_name(&self) -> &str {
        "aiven_vpc_peering_connection"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.create_connection(&ctx, data).await {
            Ok(diags) => diags,
            Err(e) => Diagnostics::from_error("Error waiting for VPC peering connection creation", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_connection(data).await;
        read_diagnostics(data, result, "Error getting VPC peering connection")
    }

    /// Every configurable attribute forces replacement
    async fn update(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        delete_diagnostics(
            self.delete_connection(data).await,
            "Error deleting VPC peering connection",
        )
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<4>(data.id()) {
            return Diagnostics::from_error(
                "Invalid import ID, expected <project_name>/<vpc_id>/<peer_cloud_account>/<peer_vpc>",
                e,
            );
        }
        self.read(ctx, data).await
    }
}
