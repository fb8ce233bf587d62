//! relay-core: shared core for the WhatsApp relay gateway
//!
//! Provides configuration loading, the LLM completion client used to
//! generate replies, and the optional SQLite store for integration
//! records and the conversation log.

pub mod config;
pub mod error;
pub mod llm;
pub mod store;

pub use config::{Config, LlmConfig, LlmProvider, MetaConfig, ServerConfig, StoreConfig, TwilioConfig};
pub use error::{Error, Result};
pub use llm::LlmClient;
pub use store::{ConversationEntry, IntegrationRecord, RelayStore, Sender};
