//! Kafka topic and Kafka ACL API implementation

use super::client::segment;
use super::{ApiError, Client};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Kafka topic as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaTopic {
    pub topic_name: String,
    #[serde(default)]
    pub partitions: Vec<Partition>,
    pub replication: i64,
    #[serde(default)]
    pub retention_bytes: Option<i64>,
    #[serde(default)]
    pub retention_hours: Option<i64>,
    #[serde(default)]
    pub min_insync_replicas: Option<i64>,
    #[serde(default)]
    pub cleanup_policy: Option<String>,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    pub partition: i64,
    #[serde(default)]
    pub isr: i64,
    #[serde(default)]
    pub size: i64,
}

#[derive(Debug, Deserialize)]
struct TopicResponse {
    topic: KafkaTopic,
}

#[derive(Debug, Deserialize)]
struct TopicListResponse {
    #[serde(default)]
    topics: Vec<TopicSummary>,
}

/// Entry of the topic listing
#[derive(Debug, Clone, Deserialize)]
pub struct TopicSummary {
    pub topic_name: String,
    #[serde(default)]
    pub partitions: i64,
    #[serde(default)]
    pub replication: i64,
    #[serde(default)]
    pub state: String,
}

/// Request body for creating topics
#[derive(Debug, Clone, Serialize)]
pub struct CreateKafkaTopicRequest {
    pub topic_name: String,
    pub partitions: i64,
    pub replication: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<String>,
}

/// Request body for updating topics
#[derive(Debug, Clone, Serialize)]
pub struct UpdateKafkaTopicRequest {
    pub partitions: i64,
    pub replication: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
}

fn topics_path(project: &str, service: &str) -> String {
    format!(
        "/project/{}/service/{}/topic",
        segment(project),
        segment(service)
    )
}

fn topic_path(project: &str, service: &str, topic: &str) -> String {
    format!("{}/{}", topics_path(project, service), segment(topic))
}

/// Kafka topics API
pub struct KafkaTopicsApi<'a> {
    client: &'a Client,
}

impl<'a> KafkaTopicsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/service/{service}/topic
    pub async fn list(&self, project: &str, service: &str) -> Result<Vec<TopicSummary>, ApiError> {
        let response: TopicListResponse = self.client.get(&topics_path(project, service)).await?;
        Ok(response.topics)
    }

    /// GET /project/{project}/service/{service}/topic/{topic}
    pub async fn get(&self, project: &str, service: &str, topic: &str) -> Result<KafkaTopic, ApiError> {
        let response: TopicResponse = self.client.get(&topic_path(project, service, topic)).await?;
        Ok(response.topic)
    }

    /// POST /project/{project}/service/{service}/topic
    pub async fn create(
        &self,
        project: &str,
        service: &str,
        request: &CreateKafkaTopicRequest,
    ) -> Result<(), ApiError> {
        self.client
            .post::<IgnoredAny, _>(&topics_path(project, service), request)
            .await
            .map(|_| ())
    }

    /// PUT /project/{project}/service/{service}/topic/{topic}
    pub async fn update(
        &self,
        project: &str,
        service: &str,
        topic: &str,
        request: &UpdateKafkaTopicRequest,
    ) -> Result<(), ApiError> {
        self.client
            .put::<IgnoredAny, _>(&topic_path(project, service, topic), request)
            .await
            .map(|_| ())
    }

    /// DELETE /project/{project}/service/{service}/topic/{topic}
    pub async fn delete(&self, project: &str, service: &str, topic: &str) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&topic_path(project, service, topic))
            .await
            .map(|_| ())
    }
}

/// Kafka ACL entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KafkaAcl {
    pub id: String,
    pub permission: String,
    pub topic: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateKafkaAclRequest {
    pub permission: String,
    pub topic: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct AclListResponse {
    #[serde(default)]
    acl: Vec<KafkaAcl>,
}

fn acls_path(project: &str, service: &str) -> String {
    format!(
        "/project/{}/service/{}/acl",
        segment(project),
        segment(service)
    )
}

/// Kafka ACL API. The API has no single-entry GET, entries are looked up in
/// the service's full list.
pub struct KafkaAclsApi<'a> {
    client: &'a Client,
}

impl<'a> KafkaAclsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/service/{service}/acl
    pub async fn list(&self, project: &str, service: &str) -> Result<Vec<KafkaAcl>, ApiError> {
        let response: AclListResponse = self.client.get(&acls_path(project, service)).await?;
        Ok(response.acl)
    }

    /// Find one entry by ID; a missing entry is reported as a 404
    pub async fn get(&self, project: &str, service: &str, acl_id: &str) -> Result<KafkaAcl, ApiError> {
        self.list(project, service)
            .await?
            .into_iter()
            .find(|acl| acl.id == acl_id)
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: format!("Kafka ACL entry {} not found", acl_id),
                more_info: None,
            })
    }

    /// POST /project/{project}/service/{service}/acl
    ///
    /// The response lists every ACL of the service; the created entry is the
    /// one matching the request.
    pub async fn create(
        &self,
        project: &str,
        service: &str,
        request: &CreateKafkaAclRequest,
    ) -> Result<KafkaAcl, ApiError> {
        let response: AclListResponse = self
            .client
            .post(&acls_path(project, service), request)
            .await?;

        response
            .acl
            .into_iter()
            .find(|acl| {
                acl.permission == request.permission
                    && acl.topic == request.topic
                    && acl.username == request.username
            })
            .ok_or_else(|| {
                ApiError::Parse("created Kafka ACL entry missing from response".to_string())
            })
    }

    /// DELETE /project/{project}/service/{service}/acl/{acl_id}
    pub async fn delete(&self, project: &str, service: &str, acl_id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", acls_path(project, service), segment(acl_id));
        self.client.delete::<IgnoredAny>(&path).await.map(|_| ())
    }
}
