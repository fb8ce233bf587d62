//! LLM completion client for reply generation

pub mod client;
pub mod types;

pub use client::LlmClient;
pub use types::{ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Usage};
