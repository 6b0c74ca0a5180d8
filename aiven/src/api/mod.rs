//! Aiven REST API client and typed collections

pub mod client;
pub mod elasticsearch;
pub mod error;
pub mod integrations;
pub mod kafka;
pub mod services;
pub mod test_helpers;
pub mod vpcs;

pub use client::{Client, RetryConfig, DEFAULT_API_URL};
pub use error::ApiError;
