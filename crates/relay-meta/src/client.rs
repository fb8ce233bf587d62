//! WhatsApp Cloud API client

use reqwest::Client;
use relay_core::config::MetaConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{MetaError, Result};

/// Cloud API client for sending messages
#[derive(Clone)]
pub struct CloudApi {
    client: Client,
    base_url: String,
    phone_number_id: String,
    access_token: String,
}

/// Outgoing text message payload
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl CloudApi {
    /// Create a new Cloud API client
    pub fn new(base_url: &str, phone_number_id: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            phone_number_id: phone_number_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Build a client from configuration, or None when sending credentials
    /// are absent
    pub fn from_config(meta: &MetaConfig) -> Option<Self> {
        match (&meta.access_token, &meta.phone_number_id) {
            (Some(token), Some(phone_id)) => {
                Some(Self::new(&meta.graph_base_url, phone_id, token))
            }
            _ => None,
        }
    }

    /// Send a text message to a recipient phone number.
    ///
    /// Returns the provider message id. Failures are not retried; no
    /// delivery confirmation is awaited beyond the HTTP response.
    pub async fn send_message(&self, to: &str, body: &str) -> Result<String> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);

        let payload = SendMessagePayload {
            messaging_product: "whatsapp",
            to,
            text: TextBody { body },
        };

        debug!("Sending WhatsApp message to {}", to);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Cloud API error: {} - {}", status, body);
            return Err(MetaError::Api(format!("{} - {}", status, body)));
        }

        let parsed: SendMessageResponse = response.json().await?;
        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_default();

        info!("Message sent to {}: id={}", to, message_id);
        Ok(message_id)
    }
}
