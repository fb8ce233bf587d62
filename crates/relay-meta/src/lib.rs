//! relay-meta: WhatsApp Cloud API integration
//!
//! Covers the Graph send-message API, inbound webhook payload parsing,
//! the verification handshake, and the OAuth flow that links a user's
//! Meta business account.

pub mod client;
pub mod error;
pub mod oauth;
pub mod webhook;

pub use client::CloudApi;
pub use error::{MetaError, Result};
pub use oauth::{LinkedAccount, OauthClient};
pub use webhook::{verify_subscription, InboundText, WebhookPayload};
