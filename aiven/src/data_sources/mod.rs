//! Data source implementations

pub mod kafka_topic;
pub mod project_vpc;

pub use kafka_topic::KafkaTopicDataSource;
pub use project_vpc::ProjectVpcDataSource;
