//! Inbound Twilio webhook form

use serde::Deserialize;

/// Form fields Twilio posts for an inbound WhatsApp message.
///
/// Twilio uses PascalCase field names. The sender arrives with a
/// `whatsapp:` prefix, which [`IncomingForm::sender`] strips.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingForm {
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "AccountSid", default)]
    pub account_sid: Option<String>,
}

impl IncomingForm {
    /// Sender phone number without the `whatsapp:` channel prefix
    pub fn sender(&self) -> Option<&str> {
        self.from
            .as_deref()
            .map(|f| f.strip_prefix("whatsapp:").unwrap_or(f))
    }

    /// Whether the form carries everything the relay needs. Empty or
    /// whitespace-only fields count as missing.
    pub fn is_complete(&self) -> bool {
        has_text(&self.body) && has_text(&self.from)
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form() {
        let form: IncomingForm = serde_urlencoded::from_str(
            "MessageSid=SM123&AccountSid=AC456&From=whatsapp%3A%2B15551234567&To=whatsapp%3A%2B15550001111&Body=hello",
        )
        .unwrap();
        assert!(form.is_complete());
        assert_eq!(form.sender(), Some("+15551234567"));
        assert_eq!(form.body.as_deref(), Some("hello"));
    }

    #[test]
    fn test_missing_body_is_incomplete() {
        let form: IncomingForm =
            serde_urlencoded::from_str("From=whatsapp%3A%2B15551234567").unwrap();
        assert!(!form.is_complete());
    }

    #[test]
    fn test_empty_body_is_incomplete() {
        let form: IncomingForm =
            serde_urlencoded::from_str("From=whatsapp%3A%2B15551234567&Body=").unwrap();
        assert!(!form.is_complete());
    }

    #[test]
    fn test_blank_from_is_incomplete() {
        let form: IncomingForm = serde_urlencoded::from_str("From=%20&Body=hello").unwrap();
        assert!(!form.is_complete());
    }

    #[test]
    fn test_sender_without_prefix() {
        let form: IncomingForm =
            serde_urlencoded::from_str("From=%2B15551234567&Body=hi").unwrap();
        assert_eq!(form.sender(), Some("+15551234567"));
    }
}
