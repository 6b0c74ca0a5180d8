//! Kafka ACL resource

use super::{delete_diagnostics, read_diagnostics};
use crate::api::kafka::{CreateKafkaAclRequest, KafkaAcl};
use crate::api::Client;
use crate::schemautil::{build_resource_id, split_resource_id};
use crate::Error;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::{StringInSliceValidator, StringPatternValidator};
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Resource, ResourceData, ResourceSchema, SchemaBuilder,
};

const PERMISSIONS: [&str; 4] = ["admin", "read", "readwrite", "write"];
const USERNAME_PATTERN: &str = r"^(\*$|[a-zA-Z0-9-_?][a-zA-Z0-9-_?*]+)$";

pub struct KafkaAclResource {
    client: Client,
}

impl KafkaAclResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Manages an ACL entry of an Aiven Kafka service")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Project to link the Kafka ACL to"),
                    )
                    .attribute(
                        "service_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Service to link the Kafka ACL to"),
                    )
                    .attribute(
                        "permission",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .validator(StringInSliceValidator::new(&PERMISSIONS))
                            .description("Kafka permission to grant (admin, read, readwrite, write)"),
                    )
                    .attribute(
                        "topic",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Topic name pattern for the ACL entry"),
                    )
                    .attribute("username", username_attribute())
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_acl(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let service = data.require_string("service_name")?;
        let request = CreateKafkaAclRequest {
            permission: data.require_string("permission")?,
            topic: data.require_string("topic")?,
            username: data.require_string("username")?,
        };

        let acl = self.client.kafka_acls().create(&project, &service, &request).await?;
        tracing::info!(%project, %service, acl_id = %acl.id, "created kafka ACL entry");
        data.set_id(build_resource_id(&[&project, &service, &acl.id]));
        set_acl_attributes(data, &project, &service, &acl);
        Ok(())
    }

    async fn read_acl(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, service, acl_id] = split_resource_id::<3>(data.id())?;
        let acl = self.client.kafka_acls().get(&project, &service, &acl_id).await?;
        set_acl_attributes(data, &project, &service, &acl);
        Ok(())
    }

    async fn delete_acl(&self, data: &ResourceData) -> crate::Result<()> {
        let [project, service, acl_id] = split_resource_id::<3>(data.id())?;
        self.client
            .kafka_acls()
            .delete(&project, &service, &acl_id)
            .await
            .map_err(Error::from)
    }
}

fn username_attribute() -> AttributeBuilder {
    let builder = AttributeBuilder::string()
        .required()
        .force_new()
        .description("Username pattern for the ACL entry");
    match StringPatternValidator::new(USERNAME_PATTERN, "an alphanumeric username pattern") {
        Ok(validator) => builder.validator(validator),
        Err(e) => {
            tracing::error!(error = %e, "kafka ACL username pattern does not compile");
            builder
        }
    }
}

fn set_acl_attributes(data: &mut ResourceData, project: &str, service: &str, acl: &KafkaAcl) {
    data.set("project", project);
    data.set("service_name", service);
    data.set("permission", acl.permission.as_str());
    data.set("topic", acl.topic.as_str());
    data.set("username", acl.username.as_str());
}

#[async_trait]
impl Resource for KafkaAclResource {
    fn type_name(&self) -> &str {
        "aiven_kafka_acl"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.create_acl(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to create Kafka ACL", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_acl(data).await;
        read_diagnostics(data, result, "Failed to read Kafka ACL")
    }

    /// Every attribute forces replacement
    async fn update(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        delete_diagnostics(self.delete_acl(data).await, "Failed to delete Kafka ACL")
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<3>(data.id()) {
            return Diagnostics::from_error(
                "Invalid import ID, expected <project_name>/<service_name>/<acl_id>",
                e,
            );
        }
        self.read(ctx, data).await
    }
}
