//! Elasticsearch ACL rule resource
//!
//! Every rule of a service lives in one ACL document, so all writes for the
//! same `project/service` are serialized through a keyed lock.

use super::{delete_diagnostics, read_diagnostics};
use crate::api::Client;
use crate::schemautil::{build_resource_id, split_resource_id, KeyedLock};
use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::validator::StringInSliceValidator;
use tfplug::{
    AttributeBuilder, Context, Diagnostics, Resource, ResourceData, ResourceSchema, SchemaBuilder,
};

const PERMISSIONS: [&str; 5] = ["deny", "admin", "read", "readwrite", "write"];

fn acl_lock() -> &'static KeyedLock {
    static LOCK: OnceLock<KeyedLock> = OnceLock::new();
    LOCK.get_or_init(KeyedLock::new)
}

/// How a rule edit changes the ACL document
enum RuleChange<'a> {
    Put(&'a str),
    Remove,
}

pub struct ElasticsearchAclRuleResource {
    client: Client,
}

impl ElasticsearchAclRuleResource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn schema_static() -> ResourceSchema {
        static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                SchemaBuilder::new()
                    .description("Manages a single rule of the Elasticsearch ACL of a service")
                    .attribute(
                        "project",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The project the ACL belongs to"),
                    )
                    .attribute(
                        "service_name",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The Elasticsearch service the ACL belongs to"),
                    )
                    .attribute(
                        "username",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The username for the ACL entry"),
                    )
                    .attribute(
                        "index",
                        AttributeBuilder::string()
                            .required()
                            .force_new()
                            .description("The index pattern for this ACL entry"),
                    )
                    .attribute(
                        "permission",
                        AttributeBuilder::string()
                            .required()
                            .validator(StringInSliceValidator::new(&PERMISSIONS))
                            .description("The permission for this ACL entry"),
                    )
                    .build_resource(0)
            })
            .clone()
    }

    /// Fetch, edit and write back the ACL document while holding the lock
    /// of the service.
    async fn modify_rules(
        &self,
        project: &str,
        service: &str,
        username: &str,
        index: &str,
        change: RuleChange<'_>,
    ) -> crate::Result<()> {
        let _guard = acl_lock().lock(&build_resource_id(&[project, service])).await;

        let acls = self.client.elasticsearch_acls();
        let mut config = acls.get(project, service).await?;
        match change {
            RuleChange::Put(permission) => config.add_rule(username, index, permission),
            RuleChange::Remove => config.delete_rule(username, index),
        }
        acls.update(project, service, config).await?;
        tracing::debug!(project, service, username, index, "updated elasticsearch ACL");
        Ok(())
    }

    async fn write_rule(&self, data: &mut ResourceData) -> crate::Result<()> {
        let project = data.require_string("project")?;
        let service = data.require_string("service_name")?;
        let username = data.require_string("username")?;
        let index = data.require_string("index")?;
        let permission = data.require_string("permission")?;

        self.modify_rules(&project, &service, &username, &index, RuleChange::Put(&permission))
            .await?;
        data.set_id(build_resource_id(&[&project, &service, &username, &index]));
        data.set("permission", permission);
        Ok(())
    }

    async fn read_rule(&self, data: &mut ResourceData) -> crate::Result<()> {
        let [project, service, username, index] = split_resource_id::<4>(data.id())?;
        let config = self.client.elasticsearch_acls().get(&project, &service).await?;

        match config.permission(&username, &index) {
            Some(permission) => {
                data.set("project", project.as_str());
                data.set("service_name", service.as_str());
                data.set("username", username.as_str());
                data.set("index", index.as_str());
                data.set("permission", permission);
            }
            None => {
                tracing::warn!(id = %data.id(), "elasticsearch ACL rule is gone, removing from state");
                data.set_id("");
            }
        }
        Ok(())
    }

    async fn delete_rule(&self, data: &ResourceData) -> crate::Result<()> {
        let [project, service, username, index] = split_resource_id::<4>(data.id())?;
        self.modify_rules(&project, &service, &username, &index, RuleChange::Remove)
            .await
    }
}

#[async_trait]
impl Resource for ElasticsearchAclRuleResource {
    fn type_name(&self) -> &str {
        "aiven_elasticsearch_acl_rule"
    }

    fn schema(&self) -> ResourceSchema {
        Self::schema_static()
    }

    async fn create(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.write_rule(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to create Elasticsearch ACL rule", e),
        }
    }

    async fn read(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        let result = self.read_rule(data).await;
        read_diagnostics(data, result, "Failed to read Elasticsearch ACL rule")
    }

    /// Only the permission can change in place
    async fn update(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        match self.write_rule(data).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => Diagnostics::from_error("Failed to update Elasticsearch ACL rule", e),
        }
    }

    async fn delete(&self, _ctx: Context, data: &mut ResourceData) -> Diagnostics {
        delete_diagnostics(
            self.delete_rule(data).await,
            "Failed to delete Elasticsearch ACL rule",
        )
    }

    async fn import(&self, ctx: Context, data: &mut ResourceData) -> Diagnostics {
        if let Err(e) = split_resource_id::<4>(data.id()) {
            return Diagnostics::from_error(
                "Invalid import ID, expected <project_name>/<service_name>/<username>/<index>",
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
    use tfplug::Dynamic;

    const ACL_PATH: &str = "/project/p/service/es-1/elasticsearch/acl";
    const ACL_DOC: &str = r#"{"elasticsearch_acl_config":{"enabled":true,"extendedAcl":false,
        "acls":[{"username":"alice","rules":[{"index":"logs-*","permission":"read"}]}]}}"#;

    fn rule_config(permission: &str) -> std::collections::HashMap<String, Dynamic> {
        values(&[
            ("project", "p".into()),
            ("service_name", "es-1".into()),
            ("username", "bob".into()),
            ("index", "metrics-*".into()),
            ("permission", permission.into()),
        ])
    }

    #[test]
    fn permission_is_validated() {
        let schema = ElasticsearchAclRuleResource::schema_static();
        assert!(!schema.validate_config(&Dynamic::Map(rule_config("deny"))).has_errors());
        assert!(schema.validate_config(&Dynamic::Map(rule_config("owner"))).has_errors());
    }

    #[tokio::test]
    async fn create_adds_rule_to_document() {
        let mut server = Server::new_async().await;
        let updated = r#"{"elasticsearch_acl_config":{"enabled":true,"extendedAcl":false,
            "acls":[{"username":"alice","rules":[{"index":"logs-*","permission":"read"}]},
            {"username":"bob","rules":[{"index":"metrics-*","permission":"write"}]}]}}"#;
        let _get = server
            .mock("GET", ACL_PATH)
            .with_body(ACL_DOC)
            .create_async()
            .await;
        let put = server
            .mock("PUT", ACL_PATH)
            .match_body(Matcher::Json(serde_json::from_str(updated).unwrap()))
            .with_body(updated)
            .create_async()
            .await;
        let mut data = ResourceData::from_config(rule_config("write"));
        let diags = ElasticsearchAclRuleResource::new(create_test_client(&server.url()))
            .create(Context::new(), &mut data)
            .await;

        assert!(!diags.has_errors(), "{:?}", diags);
        put.assert_async().await;
        assert_eq!(data.id(), "p/es-1/bob/metrics-%2A");
        assert_eq!(data.get_string("permission").as_deref(), Some("write"));
    }

    #[tokio::test]
    async fn delete_removes_rule_and_user() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", ACL_PATH)
            .with_body(ACL_DOC)
            .create_async()
            .await;
        let put = server
            .mock("PUT", ACL_PATH)
            .match_body(Matcher::Json(serde_json::json!({
                "elasticsearch_acl_config": {"enabled": true, "extendedAcl": false, "acls": []}
            })))
            .with_body(r#"{"elasticsearch_acl_config":{"enabled":true,"extendedAcl":false,"acls":[]}}"#)
            .create_async()
            .await;

        let mut data = ResourceData::for_import(build_resource_id(&["p", "es-1", "alice", "logs-*"]));
        let diags = ElasticsearchAclRuleResource::new(create_test_client(&server.url()))
            .delete(Context::new(), &mut data)
            .await;

        assert!(diags.is_empty(), "{:?}", diags);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn read_of_missing_rule_clears_id() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", ACL_PATH)
            .with_body(ACL_DOC)
            .create_async()
            .await;

        let resource = ElasticsearchAclRuleResource::new(create_test_client(&server.url()));

        let mut data = ResourceData::for_import(build_resource_id(&["p", "es-1", "alice", "logs-*"]));
        assert!(resource.import(Context::new(), &mut data).await.is_empty());
        assert_eq!(data.get_string("permission").as_deref(), Some("read"));

        let mut data = ResourceData::for_import(build_resource_id(&["p", "es-1", "bob", "logs-*"]));
        assert!(resource.read(Context::new(), &mut data).await.is_empty());
        assert_eq!(data.id(), "");
    }
}
