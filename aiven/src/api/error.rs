use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        more_info: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of an API error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// 409 responses whose message says the object is already there
    pub fn is_already_exists(&self) -> bool {
        match self {
            ApiError::Api {
                status: 409,
                message,
                ..
            } => {
                let message = message.to_lowercase();
                message.contains("already exists") || message.contains("already in use")
            }
            _ => false,
        }
    }
}

/// Error body returned by the Aiven API
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub more_info: Option<String>,
}
