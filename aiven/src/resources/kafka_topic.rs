//! Kafka topic resource

use super::{delete_diagnostics, optional_i64, optional_string, read_diagnostics, PollSettings, DEFAULT_POLL};
use crate::api::kafka::{CreateKafkaTopicRequest, KafkaTopic, UpdateKafkaTopicRequest};
use crate::api::{ApiError, Client};
use crate::schemautil::{build_resource_id, split_resource_id};
use crate::Error;
use async_trait::async_trait;
use std::sync::OnceLock;
use std::time::Duration;
use tfplug::validator::{NumberRangeValidator, StringInSliceValidator};
use tfplug::wait::RefreshResult;
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Resource, ResourceData, ResourceSchema,
    SchemaBuilder, StateChangeConf,
};

const CONFIGURING: &str = "CONFIGURING";
const ACTIVE: &str = "ACTIVE";

pub struct KafkaTopicResource {
    client: Client,
    poll: PollSettings,
}

impl KafkaTopicResource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll: DEFAULT_POLL.with_poll_interval(Duration::from_secs(30)),
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
                    .description("Manages a topic of an Aiven Kafka service")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Project to link the kafka topic to"),
                    )
                    .attribute(
                        "service_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Service to link the kafka topic to"),
                    )
                    .attribute(
                        "topic_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("Topic name"),
                    )
                    .attribute(
                        "partitions",
                        AttributeBuilder::int()
                            .required()
                            .validator(NumberRangeValidator::between(1.0, 1_000_000.0))
                            .description("Number of partitions to create in the topic"),
                    )
                    .attribute(
                        "replication",
                        AttributeBuilder::int()
                            .required()
                            .validator(NumberRangeValidator::at_least(1.0))
                            .description("Replication factor for the topic"),
                    )
                    .attribute(
                        "retention_bytes",
                        AttributeBuilder::int()
                            .optional()
                            .default_value(-1i64)
                            .description("Retention bytes"),
                    )
                    .attribute(
                        "retention_hours",
                        AttributeBuilder::int()
                            .optional()
                            .default_value(72i64)
                            .description("Retention period (hours)"),
                    )
                    .attribute(
                        "minimum_in_sync_replicas",
                        AttributeBuilder::int()
                            .optional()
                            .default_value(1i64)
                            .description(
                                "Minimum required nodes in-sync replicas (ISR) to produce to a partition",
                            ),
                    )
                    .attribute(
                        "cleanup_policy",
                        AttributeBuilder::string()
                            .optional()
                            .force_new()
                            .default_value("delete")
                            .validator(StringInSliceValidator::new(&["delete", "compact"]))
                            .description("Topic cleanup policy. Allowed values: delete, compact"),
                    )
                    .attribute(
                        "state",
                        AttributeBuilder::string()
                            .computed()
                            .description("Current state of the topic"),
                    )
                    .build_resource(0)
            })
            .clone()
    }

    async fn create_topic(&self, ctx: &Context, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let service = data.require_string("service_name")?;
        let topic_name = data.require_string("topic_name")?;

        let request = CreateKafkaTopicRequest {
            topic_name: topic_name.clone(),
            partitions: data.get_i64("partitions").unwrap_or_default(),
            replication: data.get_i64("replication").unwrap_or_default(),
            retention_bytes: optional_i64(data, "retention_bytes"),
            retention_hours: optional_i64(data, "retention_hours"),
            min_insync_replicas: optional_i64(data, "minimum_in_sync_replicas"),
            cleanup_policy: optional_string(data, "cleanup_policy"),
        };

        match self.client.kafka_topics().create(&project, &service, &request).await {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {
                tracing::info!(%project, %service, %topic_name, "kafka topic already exists, adopting it");
            }
            Err(e) => return Err(e.into()),
        }

        data.set_id(build_resource_id(&[&project, &service, &topic_name]));
        self.wait_for_active(ctx, &project, &service, &topic_name, true, data.timeouts().create)
            .await?;
        Ok(())
    }

    async fn update_topic(&self, ctx: &Context, data: &mut ResourceData) -> crate::Result<()> {
        let [project, service, topic_name] = split_resource_id::<3>(data.id())?;

        let request = UpdateKafkaTopicRequest {
            partitions: data.get_i64("partitions").unwrap_or_default(),
            replication: data.get_i64("replication").unwrap_or_default(),
            retention_bytes: optional_i64(data, "retention_bytes"),
            retention_hours: optional_i64(data, "retention_hours"),
            min_insync_replicas: optional_i64(data, "minimum_in_sync_replicas"),
        };
        self.client
            .kafka_topics()
            .update(&project, &service, &topic_name, &request)
            .await?;

        self.wait_for_active(ctx, &project, &service, &topic_name, false, data.timeouts().update)
            .await?;
        Ok(())
    }

    async fn read_topic(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, service, topic_name] = split_resource_id::<3>(data.id())?;
        let topic = self
            .client
            .kafka_topics()
            .get(&project, &service, &topic_name)
            .await?;
        set_topic_attributes(data, &project, &service, &topic);
        Ok(())
    }

    async fn wait_for_active(
        &self,
        ctx: &Context,
        project: &str,
        service: &str,
        topic_name: &str,
        fresh: bool,
        timeout: Duration,
    ) -> crate::Result<KafkaTopic> {
        let client = &self.client;
        let conf = StateChangeConf::new(|| refresh_topic(client, project, service, topic_name, fresh))
            .pending(&[CONFIGURING])
            .target(&[ACTIVE])
            .timeout(timeout);

        self.poll
            .apply(conf)
            .wait_for_state(ctx)
            .await
            .map_err(Error::from)
    }
}

/// One observation of a topic. Topic creation is asynchronous, so a 404 right
/// after creation and the occasional 501/502 count as still configuring.
pub(crate) async fn refresh_topic(
    client: &Client,
    project: &str,
    service: &str,
    topic_name: &str,
    fresh: bool,
) -> RefreshResult<KafkaTopic, ApiError> {
    match client.kafka_topics().get(project, service, topic_name).await {
        Ok(topic) => {
            tracing::debug!(topic = %topic_name, state = %topic.state, "kafka topic state");
            let state = topic.state.clone();
            Ok((Some(topic), state))
        }
        Err(e) if fresh && e.is_not_found() => {
            tracing::debug!(topic = %topic_name, error = %e, "kafka topic not visible yet");
            Ok((None, CONFIGURING.to_string()))
        }
        Err(e) if matches!(e.status(), Some(501) | Some(502)) => {
            tracing::warn!(topic = %topic_name, error = %e, "transient error while waiting for kafka topic");
            Ok((None, CONFIGURING.to_string()))
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn set_topic_attributes(
    data: &mut ResourceData,
    project: &str,
    service: &str,
    topic: &KafkaTopic,
) {
    data.set("project", project);
    data.set("service_name", service);
    data.set("topic_name", topic.topic_name.as_str());
    data.set("state", topic.state.as_str());
    data.set("partitions", topic.partitions.len() as i64);
    data.set("replication", topic.replication);
    data.set("retention_bytes", topic.retention_bytes);
    data.set("retention_hours", topic.retention_hours);
    data.set("minimum_in_sync_replicas", topic.min_insync_replicas);
    data.set("cleanup_policy", topic.cleanup_policy.clone());
}

#[async_trait]
impl Resource for KafkaTopicResource {
    fn type_name(&self) -> &str {
        "aiven_kafka_topic"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.create_topic(&ctx, data).await {
            return Diagnostics::from_error("Failed to create Kafka topic", e);
        }
        self.read(ctx, data).await
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_topic(data).await;
        read_diagnostics(data, result, "Failed to read Kafka topic")
    }

    async fn update(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = self.update_topic(&ctx, data).await {
            return Diagnostics::from_error("Failed to update Kafka topic", e);
        }
        self.read(ctx, data).await
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = async {
            let [project, service, topic_name] = split_resource_id::<3>(data.id())?;
            self.client
                .kafka_topics()
                .delete(&project, &service, &topic_name)
                .await?;
            Ok::<_, Error>(())
        }
        .await;
        delete_diagnostics(result, "Failed to delete Kafka topic")
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<3>(data.id()) {
            return Diagnostics::from_error(
                "Invalid import ID, expected <project_name>/<service_name>/<topic_name>",
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
    use std::collections::HashMap;
    use tfplug::{Dynamic, WaitError};

    const ACTIVE_TOPIC: &str = r#"{"topic":{"topic_name":"events","partitions":[{"partition":0},{"partition":1},{"partition":2}],
        "replication":2,"retention_bytes":-1,"retention_hours":72,"min_insync_replicas":1,
        "cleanup_policy":"delete","state":"ACTIVE"}}"#;

    fn resource(url: &str) -> KafkaTopicResource {
        KafkaTopicResource::new(create_test_client(url)).with_poll_settings(PollSettings::immediate())
    }

    fn topic_config() -> HashMap<String, Dynamic> {
        values(&[
            ("project", "p".into()),
            ("service_name", "kafka-1".into()),
            ("topic_name", "events".into()),
            ("partitions", 3i64.into()),
            ("replication", 2i64.into()),
            ("retention_bytes", (-1i64).into()),
            ("retention_hours", 72i64.into()),
            ("minimum_in_sync_replicas", 1i64.into()),
            ("cleanup_policy", "delete".into()),
        ])
    }

    #[tokio::test]
    async fn create_waits_for_active_and_reads_back() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/project/p/service/kafka-1/topic")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "topic_name": "events",
                "partitions": 3,
                "replication": 2,
                "cleanup_policy": "delete",
            })))
            .with_body("{}")
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_body(ACTIVE_TOPIC)
            .expect_at_least(2)
            .create_async()
            .await;

        let mut data = ResourceData::from_config(topic_config());
        let diags = resource(&server.url()).create(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        create.assert_async().await;
        assert_eq!(data.id(), "p/kafka-1/events");
        assert_eq!(data.get_i64("partitions"), Some(3));
        assert_eq!(data.get_string("state").as_deref(), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn create_adopts_existing_topic() {
        let mut server = Server::new_async().await;
        let _create = server
            .mock("POST", "/project/p/service/kafka-1/topic")
            .with_status(409)
            .with_body(r#"{"message":"Topic 'events' already exists"}"#)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_body(ACTIVE_TOPIC)
            .create_async()
            .await;

        let mut data = ResourceData::from_config(topic_config());
        let diags = resource(&server.url()).create(Context::new(), &mut data).await;

        assert!(!diags.has_errors(), "{:?}", diags);
        assert_eq!(data.id(), "p/kafka-1/events");
    }

    #[tokio::test]
    async fn fresh_topics_tolerate_not_found() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_status(404)
            .with_body(r#"{"message":"Topic not found"}"#)
            .create_async()
            .await;
        let client = create_test_client(&server.url());

        let (topic, state) = refresh_topic(&client, "p", "kafka-1", "events", true)
            .await
            .unwrap();
        assert!(topic.is_none());
        assert_eq!(state, CONFIGURING);

        let err = refresh_topic(&client, "p", "kafka-1", "events", false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn gateway_errors_count_as_configuring() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_status(502)
            .create_async()
            .await;
        let client = create_test_client(&server.url());

        let (topic, state) = refresh_topic(&client, "p", "kafka-1", "events", false)
            .await
            .unwrap();
        assert!(topic.is_none());
        assert_eq!(state, CONFIGURING);
    }

    #[tokio::test]
    async fn unexpected_topic_state_fails_the_wait() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_body(ACTIVE_TOPIC.replace("ACTIVE", "DELETING"))
            .create_async()
            .await;

        let resource = resource(&server.url());
        let err = resource
            .wait_for_active(
                &Context::new(),
                "p",
                "kafka-1",
                "events",
                false,
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Wait(WaitError::UnexpectedState { .. })));
    }

    #[tokio::test]
    async fn update_sends_new_partition_count() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("PUT", "/project/p/service/kafka-1/topic/events")
            .match_body(Matcher::PartialJson(serde_json::json!({"partitions": 6})))
            .with_body("{}")
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_body(ACTIVE_TOPIC)
            .create_async()
            .await;

        let mut planned = topic_config();
        planned.insert("partitions".into(), 6i64.into());
        let mut data = ResourceData::planned("p/kafka-1/events", topic_config(), planned);

        let diags = resource(&server.url()).update(Context::new(), &mut data).await;
        assert!(!diags.has_errors(), "{:?}", diags);
        update.assert_async().await;
    }

    #[tokio::test]
    async fn read_of_deleted_topic_removes_it_from_state() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/project/p/service/kafka-1/topic/events")
            .with_status(404)
            .with_body(r#"{"message":"Topic not found"}"#)
            .create_async()
            .await;

        let mut data = ResourceData::from_state("p/kafka-1/events", topic_config());
        let diags = resource(&server.url()).read(Context::new(), &mut data).await;
        assert!(diags.is_empty());
        assert_eq!(data.id(), "");
    }

    #[tokio::test]
    async fn delete_ignores_missing_topic() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/project/p/service/kafka-1/topic/events")
            .with_status(404)
            .with_body(r#"{"message":"Topic not found"}"#)
            .create_async()
            .await;

        let mut data = ResourceData::from_state("p/kafka-1/events", topic_config());
        let diags = resource(&server.url()).delete(Context::new(), &mut data).await;
        assert!(diags.is_empty());
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn import_rejects_malformed_ids() {
        let server = Server::new_async().await;
        let mut data = ResourceData::for_import("p/kafka-1");
        let diags = resource(&server.url()).import(Context::new(), &mut data).await;
        assert!(diags.has_errors());
    }

    #[test]
    fn schema_defaults_and_validation() {
        let schema = KafkaTopicResource::schema_static();
        assert!(schema.attribute("topic_name").unwrap().force_new);
        assert!(schema.attribute("state").unwrap().computed);

        let diags = schema.validate_config(&Dynamic::Map(values(&[
            ("project", "p".into()),
            ("service_name", "kafka-1".into()),
            ("topic_name", "events".into()),
            ("partitions", 3i64.into()),
            ("replication", 2i64.into()),
            ("cleanup_policy", "shred".into()),
        ])));
        assert!(diags.has_errors());

        let diags = schema.validate_config(&Dynamic::Map(values(&[
            ("project", "p".into()),
            ("service_name", "kafka-1".into()),
            ("topic_name", "events".into()),
            ("partitions", 0i64.into()),
            ("replication", 2i64.into()),
        ])));
        assert_eq!(diags.errors.len(), 1, "{:?}", diags);
    }
}
