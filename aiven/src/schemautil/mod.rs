//! Helpers shared by the resource implementations

pub mod diff;
pub mod lock;
pub mod resource_id;

pub use lock::KeyedLock;
pub use resource_id::{build_resource_id, split_resource_id};
