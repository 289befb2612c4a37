//! Core identifier types for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to an email by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(pub String);

impl EmailId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EmailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_id_display() {
        let id = EmailId("msg-42".to_string());
        assert_eq!(id.to_string(), "msg-42");
    }

    #[test]
    fn email_id_equality() {
        let id1 = EmailId::from("msg-1");
        let id2 = EmailId::from("msg-1".to_string());
        assert_eq!(id1, id2);
    }

    #[test]
    fn email_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&EmailId::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
