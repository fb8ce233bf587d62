//! Configuration management
//!
//! Settings are resolved in the following priority order:
//! 1. Environment variables
//! 2. `relay-gateway.toml` configuration file
//! 3. Defaults
//!
//! Inside the configuration file, `${VAR_NAME}` is expanded from the
//! environment.
//!
//! Only the webhook verify token is mandatory. Every other group (Meta
//! sending, OAuth linking, Twilio, LLM, persistence) is optional and its
//! absence degrades the matching feature instead of failing startup.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// LLM provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Groq OpenAI-compatible API
    #[default]
    Groq,
    /// Google Gemini via its OpenAI-compatibility endpoint
    Gemini,
    /// OpenAI API
    OpenAi,
}

impl LlmProvider {
    /// Default chat-completions base URL for the provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "gemini" | "google" => LlmProvider::Gemini,
            "openai" => LlmProvider::OpenAi,
            _ => LlmProvider::Groq,
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LlmProvider::Groq => "groq",
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAi => "openai",
        };
        f.write_str(name)
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// API key. None disables the LLM call-out entirely; replies fall back
    /// to the canned template.
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL override (for custom endpoints or testing)
    pub base_url: Option<String>,

    /// Output length bound passed to the completion API
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    /// Per-request timeout for the completion call
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed system prompt sent with every completion request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Reply used when no API key is configured. `{message}` is replaced
    /// with the inbound message text.
    #[serde(default = "default_reply_template")]
    pub reply_template: String,

    /// Reply used when the completion call fails
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            api_key: None,
            model: default_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
            system_prompt: default_system_prompt(),
            reply_template: default_reply_template(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_max_tokens() -> u64 {
    150
}

fn default_llm_timeout_secs() -> u64 {
    10
}

fn default_system_prompt() -> String {
    "You are a friendly WhatsApp assistant. Reply helpfully and concisely.".to_string()
}

fn default_reply_template() -> String {
    "Hello! Thanks for your message: \"{message}\". How can I help you?".to_string()
}

fn default_fallback_reply() -> String {
    "Welcome! Thanks for reaching out. How can I help you?".to_string()
}

/// Meta (WhatsApp Cloud API) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetaConfig {
    /// Bearer token for the send-message API
    pub access_token: Option<String>,

    /// Phone number id the gateway sends from
    pub phone_number_id: Option<String>,

    /// App id for the OAuth linking flow
    pub app_id: Option<String>,

    /// App secret for the OAuth code exchange
    pub app_secret: Option<String>,

    /// Redirect URI registered with the Meta app
    pub redirect_uri: Option<String>,

    /// Graph API base URL (overridable for tests)
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

impl MetaConfig {
    /// Whether outbound message sending is configured
    pub fn can_send(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }

    /// Whether the OAuth linking flow is configured
    pub fn oauth_enabled(&self) -> bool {
        self.app_id.is_some() && self.app_secret.is_some() && self.redirect_uri.is_some()
    }
}

/// Twilio WhatsApp configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sending phone number, without the `whatsapp:` prefix
    pub phone_number: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser redirect target after a successful OAuth callback
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_port() -> u16 {
    10000
}

fn default_frontend_url() -> String {
    "/".to_string()
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Path to the SQLite database file. None disables persistence.
    pub db_path: Option<String>,
}

/// Main configuration for relay-gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared secret for the webhook verification handshake (required)
    pub verify_token: String,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Meta Cloud API settings
    #[serde(default)]
    pub meta: MetaConfig,

    /// Twilio settings (optional alternate provider)
    pub twilio: Option<TwilioConfig>,

    /// LLM settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Persistence settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` references against the environment.
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(c);
                    chars.next();
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// `${VAR_NAME}` references in the file are expanded from the
    /// environment, and explicit environment variables still override the
    /// file afterwards.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let toml_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let toml_config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(toml_config)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load configuration from the default file path, falling back to the
    /// environment when no file exists.
    pub fn load() -> crate::Result<Self> {
        if Path::new("relay-gateway.toml").exists() {
            return Self::from_toml_file("relay-gateway.toml");
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config {
            verify_token: String::new(),
            server: ServerConfig::default(),
            meta: MetaConfig::default(),
            twilio: None,
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.verify_token.is_empty() {
            return Err(Error::Config("VERIFY_TOKEN not set".to_string()));
        }
        Ok(())
    }

    fn from_toml_config(toml: TomlConfig) -> crate::Result<Self> {
        let server = toml.server.unwrap_or_default();
        let server_config = ServerConfig {
            port: server.port.unwrap_or_else(default_port),
            frontend_url: server.frontend_url.unwrap_or_else(default_frontend_url),
        };

        let meta = toml.meta.unwrap_or_default();
        let meta_config = MetaConfig {
            access_token: meta.access_token,
            phone_number_id: meta.phone_number_id,
            app_id: meta.app_id,
            app_secret: meta.app_secret,
            redirect_uri: meta.redirect_uri,
            graph_base_url: meta.graph_base_url.unwrap_or_else(default_graph_base_url),
        };

        // Twilio is all-or-nothing: a partially filled section is treated
        // as absent.
        let twilio_config = toml.twilio.and_then(|t| {
            match (t.account_sid, t.auth_token, t.phone_number) {
                (Some(account_sid), Some(auth_token), Some(phone_number)) => Some(TwilioConfig {
                    account_sid,
                    auth_token,
                    phone_number,
                }),
                _ => None,
            }
        });

        let llm = toml.llm.unwrap_or_default();
        let llm_config = LlmConfig {
            provider: llm
                .provider
                .map(|p| LlmProvider::parse(&p))
                .unwrap_or_default(),
            api_key: llm.api_key.filter(|k| !k.is_empty()),
            model: llm.model.unwrap_or_else(default_model),
            base_url: llm.base_url,
            max_tokens: llm.max_tokens.unwrap_or_else(default_max_tokens),
            timeout_secs: llm.timeout_secs.unwrap_or_else(default_llm_timeout_secs),
            system_prompt: llm.system_prompt.unwrap_or_else(default_system_prompt),
            reply_template: llm.reply_template.unwrap_or_else(default_reply_template),
            fallback_reply: llm.fallback_reply.unwrap_or_else(default_fallback_reply),
        };

        let store = toml.store.unwrap_or_default();
        let store_config = StoreConfig {
            db_path: store.db_path,
        };

        Ok(Config {
            verify_token: toml.verify_token.unwrap_or_default(),
            server: server_config,
            meta: meta_config,
            twilio: twilio_config,
            llm: llm_config,
            store: store_config,
        })
    }

    /// Override configuration values from the environment
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("VERIFY_TOKEN") {
            self.verify_token = token;
        } else if let Ok(token) = std::env::var("META_VERIFY_TOKEN") {
            self.verify_token = token;
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(url) = std::env::var("FRONTEND_URL") {
            self.server.frontend_url = url;
        }

        if let Ok(token) = std::env::var("WHATSAPP_TOKEN") {
            self.meta.access_token = Some(token);
        }
        if let Ok(id) = std::env::var("WHATSAPP_PHONE_NUMBER_ID") {
            self.meta.phone_number_id = Some(id);
        }
        if let Ok(id) = std::env::var("META_APP_ID") {
            self.meta.app_id = Some(id);
        }
        if let Ok(secret) = std::env::var("META_APP_SECRET") {
            self.meta.app_secret = Some(secret);
        }
        if let Ok(uri) = std::env::var("META_REDIRECT_URI") {
            self.meta.redirect_uri = Some(uri);
        }
        if let Ok(url) = std::env::var("GRAPH_BASE_URL") {
            if !url.is_empty() {
                self.meta.graph_base_url = url;
            }
        }

        if let (Ok(account_sid), Ok(auth_token), Ok(phone_number)) = (
            std::env::var("TWILIO_ACCOUNT_SID"),
            std::env::var("TWILIO_AUTH_TOKEN"),
            std::env::var("TWILIO_PHONE_NUMBER"),
        ) {
            self.twilio = Some(TwilioConfig {
                account_sid,
                auth_token,
                phone_number,
            });
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = LlmProvider::parse(&provider);
            }
        }
        if let Ok(api_key) = std::env::var("LLM_API_KEY").or_else(|_| std::env::var("GROQ_API_KEY")) {
            if !api_key.is_empty() {
                self.llm.api_key = Some(api_key);
            }
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }
        if let Ok(max_tokens) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = max_tokens.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(timeout) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(n) = timeout.parse() {
                self.llm.timeout_secs = n;
            }
        }
        if let Ok(prompt) = std::env::var("LLM_SYSTEM_PROMPT") {
            if !prompt.is_empty() {
                self.llm.system_prompt = prompt;
            }
        }
        if let Ok(reply) = std::env::var("LLM_FALLBACK_REPLY") {
            if !reply.is_empty() {
                self.llm.fallback_reply = reply;
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            if !path.is_empty() {
                self.store.db_path = Some(path);
            }
        }
    }
}

// ============================================================================
// TOML mirror structs (file parsing only)
// ============================================================================

/// Top-level structure of the TOML file
#[derive(Debug, Deserialize)]
struct TomlConfig {
    verify_token: Option<String>,
    server: Option<TomlServerConfig>,
    meta: Option<TomlMetaConfig>,
    twilio: Option<TomlTwilioConfig>,
    llm: Option<TomlLlmConfig>,
    store: Option<TomlStoreConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    port: Option<u16>,
    frontend_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlMetaConfig {
    access_token: Option<String>,
    phone_number_id: Option<String>,
    app_id: Option<String>,
    app_secret: Option<String>,
    redirect_uri: Option<String>,
    graph_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlTwilioConfig {
    account_sid: Option<String>,
    auth_token: Option<String>,
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u64>,
    timeout_secs: Option<u64>,
    system_prompt: Option<String>,
    reply_template: Option<String>,
    fallback_reply: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlStoreConfig {
    db_path: Option<String>,
}
