//! Error types for relay-http

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// relay-http error type. Converts into a JSON error response with the
/// status code the variant implies.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Feature not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Core error: {0}")]
    Core(#[from] relay_core::Error),

    #[error("Cloud API error: {0}")]
    Meta(#[from] relay_meta::MetaError),

    #[error("Twilio error: {0}")]
    Twilio(#[from] relay_twilio::TwilioError),
}

/// JSON body for error responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotConfigured(_)
            | ApiError::Core(_)
            | ApiError::Meta(_)
            | ApiError::Twilio(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
