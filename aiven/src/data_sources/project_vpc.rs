//! Project VPC data source, looked up by cloud

use crate::api::Client;
use crate::resources::project_vpc::set_vpc_attributes;
use crate::schemautil::build_resource_id;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, Context, DataSource, Diagnostics, ResourceData, ResourceSchema, SchemaBuilder,
    TfplugError,
};

pub struct ProjectVpcDataSource {
    client: Client,
}

impl ProjectVpcDataSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Reads the VPC of an Aiven project in a given cloud")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .description("The project the VPC belongs to"),
                    )
                    .attribute(
                        "cloud_name",
                        AttributeBuilder::string()
                            .required()
                            .description("Cloud the VPC is in"),
                    )
                    .attribute("network_cidr", AttributeBuilder::string().computed())
                    .attribute("state", AttributeBuilder::string().computed())
                    .build()
            })
            .clone()
    }

    async fn read_vpc(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let cloud_name = data.require_string("cloud_name")?;

        let vpcs = self.client.vpcs().list(&project).await?;
        let vpc = vpcs
            .iter()
            .find(|vpc| vpc.cloud_name == cloud_name)
            .ok_or_else(|| {
                TfplugError::from(format!(
                    "project {} has no VPC in cloud {}",
                    project, cloud_name
                ))
            })?;

        data.set_id(build_resource_id(&[&project, &vpc.project_vpc_id]));
        set_vpc_attributes(data, &project, vpc);
        Ok(())
    }
}

#[async_trait]
impl DataSource for ProjectVpcDataSource {
    fn type_name(&self) -> &str {
        "aiven_project_vpc"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.read_vpc(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to read project VPC", e),
        }
    }
}
