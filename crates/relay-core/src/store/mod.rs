//! Optional persistence: integration records and the conversation log

pub mod sqlite;
pub mod types;

pub use sqlite::RelayStore;
pub use types::{ConversationEntry, IntegrationRecord, Sender};
