//! Error types for relay-meta

use thiserror::Error;

/// relay-meta error type
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Graph API error: {0}")]
    Api(String),

    #[error("Graph API request failed: {0}")]
    Request(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("OAuth exchange failed: {0}")]
    OAuth(String),
}

impl From<reqwest::Error> for MetaError {
    fn from(err: reqwest::Error) -> Self {
        MetaError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        MetaError::InvalidPayload(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MetaError>;
