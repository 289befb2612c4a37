//! Pipeline output types.

use serde::{Deserialize, Serialize};

use super::{CategoryLabel, CategoryProvenance, EmailRecord};

/// Marker shown wherever a summary could not be produced.
pub const SUMMARY_UNAVAILABLE: &str = "(summary unavailable)";

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryProvenance {
    /// Generated by the language model.
    Ai,
    /// A prefix of the body, used when the model could not answer.
    Excerpt,
    /// Nothing to show (empty body and no model output).
    Unavailable,
}

/// A short description of an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub provenance: SummaryProvenance,
}

impl Summary {
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: SummaryProvenance::Ai,
        }
    }

    pub fn excerpt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: SummaryProvenance::Excerpt,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            text: String::new(),
            provenance: SummaryProvenance::Unavailable,
        }
    }

    /// Whether the text was written by the language model.
    pub fn is_ai_generated(&self) -> bool {
        self.provenance == SummaryProvenance::Ai
    }

    /// Text suitable for display; never empty.
    pub fn display_text(&self) -> &str {
        match self.provenance {
            SummaryProvenance::Unavailable => SUMMARY_UNAVAILABLE,
            _ if self.text.trim().is_empty() => SUMMARY_UNAVAILABLE,
            _ => &self.text,
        }
    }
}

/// An email with its category and summary attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedEmail {
    #[serde(flatten)]
    pub email: EmailRecord,
    pub category: CategoryLabel,
    pub category_provenance: CategoryProvenance,
    pub summary: Summary,
}
