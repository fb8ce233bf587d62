//! relay-http: HTTP surface of the relay gateway
//!
//! Exposes the webhook endpoints (Cloud API and Twilio), the OAuth
//! linking endpoints, a health check, and a manual send endpoint for
//! smoke-testing credentials.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use routes::routes;
pub use server::{start_server, AppState};
