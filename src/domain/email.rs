//! Email domain types.
//!
//! Represents a fetched message in the normalized shape the pipeline consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EmailId;

/// Errors raised when an upstream record violates the input contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailValidationError {
    #[error("email record has an empty id")]
    MissingId,

    #[error("email {0} has an empty sender")]
    MissingSender(EmailId),
}

/// A single fetched email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Identifier from the fetch collaborator.
    pub id: EmailId,
    /// Sender, usually `Name <address>` or a bare address.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body. May be empty.
    pub body: String,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
    /// Unsubscribe URLs found in the message, in document order.
    #[serde(default)]
    pub unsubscribe_links: Vec<String>,
}

impl EmailRecord {
    /// Creates a record with no unsubscribe links.
    pub fn new(
        id: impl Into<EmailId>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
            received_at,
            unsubscribe_links: Vec::new(),
        }
    }

    /// Attaches unsubscribe links.
    pub fn with_unsubscribe_links(mut self, links: Vec<String>) -> Self {
        self.unsubscribe_links = links;
        self
    }

    /// Checks the fields the pipeline requires.
    pub fn validate(&self) -> Result<(), EmailValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(EmailValidationError::MissingId);
        }
        if self.sender.trim().is_empty() {
            return Err(EmailValidationError::MissingSender(self.id.clone()));
        }
        Ok(())
    }
}

/// Returns at most `max_chars` characters from the start of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
