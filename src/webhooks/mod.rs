//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Parsing of deliveries into [`WebhookEvent`]s

pub mod parser;
pub mod signature;

pub use parser::{ParseError, PullRequestEvent, WebhookEvent, parse_webhook};
pub use signature::{SignatureError, WebhookSecret, parse_signature_header};
