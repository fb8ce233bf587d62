//! Inbound webhook payload types and the verification handshake
//!
//! The payload shape is dictated by the Cloud API message-event schema:
//! `entry[].changes[].value.messages[]`. Only the first text message is
//! relevant to the relay; everything else (statuses, media, reactions)
//! is ignored.

use serde::Deserialize;

/// Check the webhook verification handshake parameters.
///
/// True when `mode` is `subscribe` and the token matches the configured
/// secret. Pure and idempotent; the caller echoes the challenge on success.
pub fn verify_subscription(expected_token: &str, mode: &str, token: &str) -> bool {
    mode == "subscribe" && token == expected_token
}

/// Top-level webhook payload
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: String,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

/// A single inbound message event
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub from: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<MessageText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub body: String,
}

/// Sender and body of an extracted text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub from: String,
    pub body: String,
}

impl WebhookPayload {
    /// Extract the first text message, if the payload carries one.
    ///
    /// Non-message events, non-text message types, and payloads for other
    /// objects all yield None.
    pub fn first_text_message(&self) -> Option<InboundText> {
        if self.object != "whatsapp_business_account" {
            return None;
        }

        let message = self
            .entry
            .first()?
            .changes
            .first()?
            .value
            .messages
            .first()?;

        if message.kind != "text" {
            return None;
        }

        let text = message.text.as_ref()?;
        Some(InboundText {
            from: message.from.clone(),
            body: text.body.clone(),
        })
    }
}
