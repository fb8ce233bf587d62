//! relay-twilio: Twilio WhatsApp integration
//!
//! Alternative inbound/outbound channel to the Cloud API. Twilio posts
//! inbound messages as form-encoded webhooks and accepts outbound sends
//! on its Messages endpoint with basic auth.

pub mod client;
pub mod error;
pub mod webhook;

pub use client::TwilioClient;
pub use error::{Result, TwilioError};
pub use webhook::IncomingForm;
