//! Persisted record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials and identifiers linking an application user to their
/// WhatsApp business account, written by the OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationRecord {
    pub user_id: String,
    pub access_token: String,
    pub waba_id: String,
    pub phone_number: String,
    pub linked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationRecord {
    /// Create a fresh record with both timestamps set to now
    pub fn new(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        waba_id: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            waba_id: waba_id.into(),
            phone_number: phone_number.into(),
            linked_at: now,
            updated_at: now,
        }
    }
}

/// Which side of the conversation an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "bot" => Sender::Bot,
            _ => Sender::User,
        }
    }
}

/// Append-only conversation log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub user_id: String,
    pub sender: Sender,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    /// Entry for an inbound user message
    pub fn user(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            sender: Sender::User,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Entry for an outbound bot reply
    pub fn bot(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            sender: Sender::Bot,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_roundtrip() {
        assert_eq!(Sender::parse(Sender::User.as_str()), Sender::User);
        assert_eq!(Sender::parse(Sender::Bot.as_str()), Sender::Bot);
    }

    #[test]
    fn test_entry_constructors() {
        let entry = ConversationEntry::user("+15551234567", "hello");
        assert_eq!(entry.sender, Sender::User);

        let entry = ConversationEntry::bot("+15551234567", "hi!");
        assert_eq!(entry.sender, Sender::Bot);
    }
}
