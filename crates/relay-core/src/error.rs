//! Error types for relay-core

use thiserror::Error;

/// Main error type for relay-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relay-core
pub type Result<T> = std::result::Result<T, Error>;
