//! LLM API HTTP client
//!
//! One synchronous chat-completion call per inbound message. The public
//! entry point is [`LlmClient::generate_reply`], which never fails: with no
//! API key configured it returns the canned template, and any upstream
//! failure (network, timeout, non-2xx, malformed body) is logged and
//! replaced by the configured fallback string.

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::types::*;

/// LLM completion client (Groq / Gemini / OpenAI, all OpenAI-compatible)
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::Http)?;

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => config.provider.default_base_url().to_string(),
        };

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Create with a custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: LlmConfig, base_url: String) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Whether a completion API is configured
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate a reply for an inbound message. Infallible by contract.
    pub async fn generate_reply(&self, user_message: &str) -> String {
        if self.config.api_key.is_none() {
            debug!("No LLM API key configured, using template reply");
            return self
                .config
                .reply_template
                .replace("{message}", user_message);
        }

        match self.chat_completion(user_message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("LLM completion failed, using fallback reply: {}", e);
                self.config.fallback_reply.clone()
            }
        }
    }

    /// Send one chat-completion request
    async fn chat_completion(&self, user_message: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| Error::LlmApi("No API key configured".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(&self.config.system_prompt),
                ChatMessage::user(user_message),
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(0.7),
        };

        debug!("Sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            return Err(Error::LlmApi(format!("{}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::LlmApi(format!("Failed to parse response: {} - {}", e, body)))?;

        let text = parsed
            .first_text()
            .ok_or_else(|| Error::LlmApi("Response contained no text".to_string()))?
            .to_string();

        info!(
            "LLM reply generated: {} chars, tokens={}",
            text.len(),
            parsed.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0)
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use axum::{routing::post, Json, Router};

    fn config_with_key(key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: key.map(|k| k.to_string()),
            ..LlmConfig::default()
        }
    }

    /// Bind a stub completion endpoint on an ephemeral port.
    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_template_reply_without_api_key() {
        let client = LlmClient::new(config_with_key(None)).unwrap();
        assert!(!client.is_enabled());

        let reply = client.generate_reply("what are your hours?").await;
        assert_eq!(
            reply,
            "Hello! Thanks for your message: \"what are your hours?\". How can I help you?"
        );
    }

    #[tokio::test]
    async fn test_completion_reply() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "id": "chatcmpl-1",
                    "model": "llama-3.1-8b-instant",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "We open at 9am."},
                        "finish_reason": "stop"
                    }]
                }))
            }),
        );
        let base_url = spawn_stub(router).await;

        let client = LlmClient::with_base_url(config_with_key(Some("test-key")), base_url).unwrap();
        let reply = client.generate_reply("what are your hours?").await;
        assert_eq!(reply, "We open at 9am.");
    }

    #[tokio::test]
    async fn test_fallback_on_upstream_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream broke",
                )
            }),
        );
        let base_url = spawn_stub(router).await;

        let client = LlmClient::with_base_url(config_with_key(Some("test-key")), base_url).unwrap();
        let reply = client.generate_reply("hello").await;
        assert_eq!(reply, LlmConfig::default().fallback_reply);
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_body() {
        let router = Router::new().route("/chat/completions", post(|| async { "not json" }));
        let base_url = spawn_stub(router).await;

        let client = LlmClient::with_base_url(config_with_key(Some("test-key")), base_url).unwrap();
        let reply = client.generate_reply("hello").await;
        assert_eq!(reply, LlmConfig::default().fallback_reply);
    }

    #[tokio::test]
    async fn test_fallback_on_unreachable_endpoint() {
        // Port 1 on loopback refuses connections.
        let mut config = config_with_key(Some("test-key"));
        config.timeout_secs = 1;
        let client =
            LlmClient::with_base_url(config, "http://127.0.0.1:1".to_string()).unwrap();
        let reply = client.generate_reply("hello").await;
        assert_eq!(reply, LlmConfig::default().fallback_reply);
    }
}
