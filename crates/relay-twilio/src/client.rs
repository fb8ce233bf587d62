//! Twilio API client for WhatsApp

use reqwest::Client;
use relay_core::config::TwilioConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Result, TwilioError};

/// Twilio API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    phone_number: String,
    base_url: String,
}

/// Outgoing message payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendMessagePayload {
    from: String,
    to: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    sid: String,
}

impl TwilioClient {
    /// Create a new Twilio client
    pub fn new(account_sid: String, auth_token: String, phone_number: String) -> Self {
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            phone_number,
            base_url: "https://api.twilio.com".to_string(),
        }
    }

    /// Build a client from configuration
    pub fn from_config(config: &TwilioConfig) -> Self {
        Self::new(
            config.account_sid.clone(),
            config.auth_token.clone(),
            config.phone_number.clone(),
        )
    }

    /// Override the API base URL, for tests
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Send a WhatsApp message. `to` is a bare phone number; the
    /// `whatsapp:` channel prefix is added here.
    pub async fn send_message(&self, to: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let payload = SendMessagePayload {
            from: format!("whatsapp:{}", self.phone_number),
            to: format!("whatsapp:{}", to),
            body: body.to_string(),
        };

        debug!("Sending Twilio WhatsApp message to {}", to);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Twilio API error: {} - {}", status, text);
            return Err(TwilioError::Api(format!("{} - {}", status, text)));
        }

        let result: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| TwilioError::Api(format!("Malformed send response: {}", e)))?;

        info!("Twilio message sent to {}: sid={}", to, result.sid);
        Ok(result.sid)
    }

    /// Verify a webhook signature against the account auth token
    pub fn verify_signature(&self, url: &str, params: &str, signature: &str) -> bool {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let mut mac = match HmacSha256::new_from_slice(self.auth_token.as_bytes()) {
            Ok(m) => m,
            Err(_) => return false,
        };

        let data = format!("{}{}", url, params);
        mac.update(data.as_bytes());

        let expected_hex = hex::encode(mac.finalize().into_bytes());
        expected_hex == signature
    }
}
