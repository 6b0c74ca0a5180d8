//! Resource implementations

pub mod elasticsearch_acl_rule;
pub mod kafka_acl;
pub mod kafka_topic;
pub mod project_vpc;
pub mod service;
pub mod service_integration;
pub mod service_integration_endpoint;
pub mod vpc_peering_connection;

pub use elasticsearch_acl_rule::ElasticsearchAclRuleResource;
pub use kafka_acl::KafkaAclResource;
pub use kafka_topic::KafkaTopicResource;
pub use project_vpc::ProjectVpcResource;
pub use service::ServiceResource;
pub use service_integration::ServiceIntegrationResource;
pub use service_integration_endpoint::ServiceIntegrationEndpointResource;
pub use vpc_peering_connection::VpcPeeringConnectionResource;

use crate::schemautil::diff;
use crate::user_config::{self, UserConfigError, UserConfigKind};
use crate::Error;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tfplug::{AttributeBuilder, Diagnostics, Dynamic, ResourceData, Schema, SchemaBuilder, StateChangeConf};

/// Sleep settings of a state-change wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub delay: Duration,
    pub min_timeout: Duration,
    pub poll_interval: Option<Duration>,
}

impl PollSettings {
    pub const fn new(delay: Duration, min_timeout: Duration) -> Self {
        Self {
            delay,
            min_timeout,
            poll_interval: None,
        }
    }

    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// No sleeping at all, for tests against a mock server
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn apply<F>(&self, conf: StateChangeConf<F>) -> StateChangeConf<F> {
        let conf = conf.delay(self.delay).min_timeout(self.min_timeout);
        match self.poll_interval {
            Some(interval) => conf.poll_interval(interval),
            None => conf,
        }
    }
}

/// Waits used by most resources: 10s before the second poll, 2s after
pub(crate) const DEFAULT_POLL: PollSettings =
    PollSettings::new(Duration::from_secs(10), Duration::from_secs(2));

/// Outcome of a read: a vanished object drops the resource from state,
/// anything else is an error diagnostic.
pub(crate) fn read_diagnostics(
    data: &mut ResourceData,
    result: Result<(), Error>,
    summary: &str,
) -> Diagnostics {
    match result {
        Ok(()) => Diagnostics::new(),
        Err(e) if e.is_not_found() => {
            tracing::warn!(id = %data.id(), "remote object is gone, removing from state");
            data.set_id("");
            Diagnostics::new()
        }
        Err(e) => Diagnostics::from_error(summary, e),
    }
}

/// Delete outcome where an already deleted object is success
pub(crate) fn delete_diagnostics(result: Result<(), Error>, summary: &str) -> Diagnostics {
    match result {
        Ok(()) => Diagnostics::new(),
        Err(e) if e.is_not_found() => Diagnostics::new(),
        Err(e) => Diagnostics::from_error(summary, e),
    }
}

/// Optional integer attribute; unset and null are `None`
pub(crate) fn optional_i64(data: &ResourceData, key: &str) -> Option<i64> {
    data.get(key).and_then(|v| v.as_i64())
}

/// Optional string attribute; empty strings count as unset
pub(crate) fn optional_string(data: &ResourceData, key: &str) -> Option<String> {
    data.get_string(key).filter(|s| !s.is_empty())
}

/// Name of the attribute holding the user config of `type_name`
pub(crate) fn user_config_key(type_name: &str) -> String {
    format!("{}_user_config", type_name)
}

/// One optional `<type>_user_config` block per type that has a template
pub(crate) fn user_config_attributes(kind: UserConfigKind) -> BTreeMap<String, Schema> {
    user_config::template_names(kind)
        .into_iter()
        .filter_map(|name| {
            let template = user_config::user_config_schema(kind, name).ok()?;
            let block = SchemaBuilder::new()
                .attributes(user_config::generate_terraform_schema(template))
                .build();
            let attribute = AttributeBuilder::list_block(block)
                .optional()
                .max_items(1)
                .diff_suppress(diff::empty_object)
                .description(format!("{} user configurable settings", name))
                .build();
            Some((user_config_key(name), attribute))
        })
        .collect()
}

/// Request body for the user config of `type_name`. Types without a
/// template carry no settings.
pub(crate) fn user_config_to_api(
    kind: UserConfigKind,
    type_name: &str,
    data: &ResourceData,
    new_resource: bool,
) -> crate::Result<Map<String, Value>> {
    let template = match user_config::user_config_schema(kind, type_name) {
        Ok(template) => template,
        Err(UserConfigError::UnknownTemplate { .. }) => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };
    let value = data
        .get(&user_config_key(type_name))
        .cloned()
        .unwrap_or(Dynamic::Null);
    Ok(user_config::terraform_to_api(template, &value, new_resource)?)
}

/// Store the API user config under `<type>_user_config`
pub(crate) fn set_user_config(
    data: &mut ResourceData,
    kind: UserConfigKind,
    type_name: &str,
    user_config: &Map<String, Value>,
) -> crate::Result<()> {
    match user_config::user_config_schema(kind, type_name) {
        Ok(template) => {
            data.set(
                &user_config_key(type_name),
                user_config::api_to_terraform(template, user_config),
            );
            Ok(())
        }
        Err(UserConfigError::UnknownTemplate { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
