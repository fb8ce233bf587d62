//! Route definitions
//!
//! Defines all HTTP endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    auth_callback, auth_start, auth_token, health, meta_webhook, send_test_message,
    twilio_webhook, verify_webhook,
};
use crate::server::AppState;

/// Create the gateway router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check with feature flags
        .route("/", get(health))
        // Cloud API webhook: verification handshake + message events
        .route("/webhook", get(verify_webhook))
        .route("/webhook", post(meta_webhook))
        // Twilio inbound channel
        .route("/twilio/whatsapp/webhook", post(twilio_webhook))
        // Manual outbound send, for checking credentials
        .route("/send", post(send_test_message))
        // OAuth account linking
        .route("/auth/start", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/token", get(auth_token))
}
