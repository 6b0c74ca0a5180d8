//! Elasticsearch ACL API implementation
//!
//! The ACL configuration of a service is a single document: rules are added
//! and removed by fetching it, editing it and writing the whole thing back.

use super::client::segment;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchAclConfig {
    #[serde(default)]
    pub acls: Vec<ElasticsearchAcl>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "extendedAcl", default)]
    pub extended_acl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchAcl {
    pub username: String,
    #[serde(default)]
    pub rules: Vec<ElasticsearchAclRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchAclRule {
    pub index: String,
    pub permission: String,
}

impl ElasticsearchAclConfig {
    /// Permission granted to `username` on `index`, if any
    pub fn permission(&self, username: &str, index: &str) -> Option<&str> {
        self.acls
            .iter()
            .find(|acl| acl.username == username)?
            .rules
            .iter()
            .find(|rule| rule.index == index)
            .map(|rule| rule.permission.as_str())
    }

    /// Insert or replace the rule for `username` on `index`
    pub fn add_rule(&mut self, username: &str, index: &str, permission: &str) {
        let rule = ElasticsearchAclRule {
            index: index.to_string(),
            permission: permission.to_string(),
        };

        match self.acls.iter_mut().find(|acl| acl.username == username) {
            Some(acl) => match acl.rules.iter_mut().find(|r| r.index == index) {
                Some(existing) => *existing = rule,
                None => acl.rules.push(rule),
            },
            None => self.acls.push(ElasticsearchAcl {
                username: username.to_string(),
                rules: vec![rule],
            }),
        }
    }

    /// Remove the rule for `username` on `index`; users left without rules
    /// are dropped from the document.
    pub fn delete_rule(&mut self, username: &str, index: &str) {
        for acl in self.acls.iter_mut().filter(|acl| acl.username == username) {
            acl.rules.retain(|rule| rule.index != index);
        }
        self.acls.retain(|acl| !acl.rules.is_empty());
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AclDocument {
    elasticsearch_acl_config: ElasticsearchAclConfig,
}

fn acl_path(project: &str, service: &str) -> String {
    format!(
        "/project/{}/service/{}/elasticsearch/acl",
        segment(project),
        segment(service)
    )
}

/// Elasticsearch ACL API
pub struct ElasticsearchAclsApi<'a> {
    client: &'a Client,
}

impl<'a> ElasticsearchAclsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /project/{project}/service/{service}/elasticsearch/acl
    pub async fn get(&self, project: &str, service: &str) -> Result<ElasticsearchAclConfig, ApiError> {
        let document: AclDocument = self.client.get(&acl_path(project, service)).await?;
        Ok(document.elasticsearch_acl_config)
    }

    /// PUT /project/{project}/service/{service}/elasticsearch/acl
    pub async fn update(
        &self,
        project: &str,
        service: &str,
        config: ElasticsearchAclConfig,
    ) -> Result<ElasticsearchAclConfig, ApiError> {
        let body = AclDocument {
            elasticsearch_acl_config: config,
        };
        let document: AclDocument = self.client.put(&acl_path(project, service), &body).await?;
        Ok(document.elasticsearch_acl_config)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::{Matcher, Server};

    fn config() -> ElasticsearchAclConfig {
        let mut config = ElasticsearchAclConfig {
            enabled: true,
            ..Default::default()
        };
        config.add_rule("alice", "logs-*", "read");
        config
    }

    #[test]
    fn add_rule_replaces_existing_permission() {
        let mut config = config();
        config.add_rule("alice", "logs-*", "readwrite");
        config.add_rule("alice", "metrics", "read");
        config.add_rule("bob", "logs-*", "deny");

        assert_eq!(config.permission("alice", "logs-*"), Some("readwrite"));
        assert_eq!(config.permission("alice", "metrics"), Some("read"));
        assert_eq!(config.permission("bob", "logs-*"), Some("deny"));
        assert_eq!(config.acls.len(), 2);
        assert_eq!(config.acls[0].rules.len(), 2);
    }

    #[test]
    fn delete_rule_drops_empty_users() {
        let mut config = config();
        config.add_rule("bob", "logs-*", "read");
        config.delete_rule("alice", "logs-*");

        assert_eq!(config.permission("alice", "logs-*"), None);
        assert_eq!(config.acls.len(), 1);
        assert_eq!(config.acls[0].username, "bob");

        config.delete_rule("carol", "missing");
        assert_eq!(config.acls.len(), 1);
    }

    #[tokio::test]
    async fn update_wraps_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/project/p/service/es-1/elasticsearch/acl")
            .match_body(Matcher::Json(serde_json::json!({
                "elasticsearch_acl_config": {
                    "acls": [{"username": "alice", "rules": [{"index": "logs-*", "permission": "read"}]}],
                    "enabled": true,
                    "extendedAcl": false,
                }
            })))
            .with_body(
                r#"{"elasticsearch_acl_config":{"acls":[{"username":"alice","rules":[{"index":"logs-*","permission":"read"}]}],"enabled":true,"extendedAcl":false}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let updated = client
            .elasticsearch_acls()
            .update("p", "es-1", config())
            .await
            .unwrap();
        assert_eq!(updated, config());
        mock.assert_async().await;
    }
}
