//! Kafka topic data source

use crate::api::Client;
use crate::resources::kafka_topic::set_topic_attributes;
use crate::schemautil::build_resource_id;
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::{
    AttributeBuilder, Context, DataSource, Diagnostics, ResourceData, ResourceSchema, SchemaBuilder,
};

pub struct KafkaTopicDataSource {
    client: Client,
}

impl KafkaTopicDataSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Reads a topic of an Aiven Kafka service")
                    .attribute("project", AttributeBuilder::string().required())
                    .attribute("service_name", AttributeBuilder::string().required())
                    .attribute("topic_name", AttributeBuilder::string().required())
                    .attribute("partitions", AttributeBuilder::int().computed())
                    .attribute("replication", AttributeBuilder::int().computed())
                    .attribute("retention_bytes", AttributeBuilder::int().computed())
                    .attribute("retention_hours", AttributeBuilder::int().computed())
                    .attribute("minimum_in_sync_replicas", AttributeBuilder::int().computed())
                    .attribute("cleanup_policy", AttributeBuilder::string().computed())
                    .attribute("state", AttributeBuilder::string().computed())
                    .build()
            })
            .clone()
    }

    async fn read_topic(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let service = data.require_string("service_name")?;
        let topic_name = data.require_string("topic_name")?;

        let topic = self
            .client
            .kafka_topics()
            .get(&project, &service, &topic_name)
            .await?;
        data.set_id(build_resource_id(&[&project, &service, &topic_name]));
        set_topic_attributes(data, &project, &service, &topic);
        Ok(())
    }
}

#[async_trait]
impl DataSource for KafkaTopicDataSource {
    fn type_name(&self) -> &str {
        "aiven_kafka_topic"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.read_topic(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to read Kafka topic", e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use crate::resources::test_support::values;
    use mockito::Server;

    fn config() -> ResourceData {
        ResourceData::from_config(values(&[
            ("project", "p".into()),
            ("service_name", "kafka-1".into()),
            ("topic_name", "events".into()),
        ]))
    }

    #[tokio::test]
    async fn read_populates_topic() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_body(
                r#"{"topic":{"topic_name":"events","state":"ACTIVE","replication":3,
                "partitions":[{"partition":0},{"partition":1}],"retention_bytes":-1,
                "retention_hours":72,"min_insync_replicas":2,"cleanup_policy":"compact"}}"#,
            )
            .create_async()
            .await;

        let mut data = config();
        let diags = KafkaTopicDataSource::new(create_test_client(&server.url()))
            .read(Context::new(), &mut data)
            .await;

        assert!(!diags.has_errors(), "{:?}", diags);
        assert_eq!(data.id(), "p/kafka-1/events");
        assert_eq!(data.get_i64("partitions"), Some(2));
        assert_eq!(data.get_i64("minimum_in_sync_replicas"), Some(2));
        assert_eq!(data.get_string("cleanup_policy").as_deref(), Some("compact"));
    }

    #[tokio::test]
    async fn missing_topic_is_an_error() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_status(404)
            .with_body(r#"{"message":"Topic 'events' does not exist"}"#)
            .create_async()
            .await;

        let mut data = config();
        let diags = KafkaTopicDataSource::new(create_test_client(&server.url()))
            .read(Context::new(), &mut data)
            .await;
        assert!(diags.has_errors());
    }
}
