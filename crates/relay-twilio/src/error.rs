//! Error types for relay-twilio

use thiserror::Error;

/// relay-twilio error type
#[derive(Error, Debug)]
pub enum TwilioError {
    #[error("Twilio API error: {0}")]
    Api(String),

    #[error("Twilio request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TwilioError {
    fn from(err: reqwest::Error) -> Self {
        TwilioError::Request(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TwilioError>;
