//! Composite resource IDs
//!
//! Resources that live below a project or service are identified by their
//! path components joined with `/`. Each component is percent-escaped so a
//! `/` inside a name cannot shift the split.

use crate::Error;

pub fn build_resource_id(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| urlencoding::encode(part))
        .collect::<Vec<_>>()
        .join("/")
}

/// Split `id` into exactly `N` components
pub fn split_resource_id<const N: usize>(id: &str) -> Result<[String; N], Error> {
    let invalid = || Error::InvalidResourceId {
        id: id.to_string(),
        expected: N,
    };

    let parts = id
        .splitn(N, '/')
        .map(|part| {
            urlencoding::decode(part)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| invalid())
        })
        .collect::<Result<Vec<_>, _>>()?;

    parts.try_into().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_joins_components() {
        assert_eq!(
            build_resource_id(&["my-project", "kafka-1", "events"]),
            "my-project/kafka-1/events"
        );
    }

    #[test]
    fn split_returns_components() {
        let [project, service, topic] = split_resource_id::<3>("my-project/kafka-1/events").unwrap();
        assert_eq!(project, "my-project");
        assert_eq!(service, "kafka-1");
        assert_eq!(topic, "events");
    }

    #[test]
    fn separator_inside_component_survives_round_trip() {
        let id = build_resource_id(&["p", "es-1", "team/alice", "logs-*"]);
        assert_eq!(id, "p/es-1/team%2Falice/logs-%2A");

        let parts = split_resource_id::<4>(&id).unwrap();
        assert_eq!(parts, ["p", "es-1", "team/alice", "logs-*"]);
    }

    #[test]
    fn split_rejects_wrong_component_count() {
        let err = split_resource_id::<3>("my-project/kafka-1").unwrap_err();
        assert!(matches!(err, Error::InvalidResourceId { expected: 3, .. }));
        assert!(err.to_string().contains("my-project/kafka-1"));

        assert!(split_resource_id::<2>("").is_err());
    }

    #[test]
    fn split_keeps_extra_separators_in_last_component() {
        let [project, rest] = split_resource_id::<2>("p/a/b").unwrap();
        assert_eq!(project, "p");
        assert_eq!(rest, "a/b");
    }
}
