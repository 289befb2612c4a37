//! Category labels and provenance flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of categories an email can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryLabel {
    Work,
    Promotions,
    Social,
    News,
    Other,
}

impl CategoryLabel {
    /// All labels in report order.
    pub const ALL: [CategoryLabel; 5] = [
        CategoryLabel::Work,
        CategoryLabel::Promotions,
        CategoryLabel::Social,
        CategoryLabel::News,
        CategoryLabel::Other,
    ];

    /// Returns the canonical name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::Work => "Work",
            CategoryLabel::Promotions => "Promotions",
            CategoryLabel::Social => "Social",
            CategoryLabel::News => "News",
            CategoryLabel::Other => "Other",
        }
    }

    /// Comma-separated label names, used in prompts.
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for CategoryLabel {
    type Err = UnknownCategory;

    /// Case-insensitive exact match. Surrounding whitespace, quotes and
    /// trailing sentence punctuation are ignored; nothing else is.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
            .trim_end_matches(['.', '!'])
            .trim();

        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(cleaned))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Where an email's category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryProvenance {
    /// A deterministic rule matched.
    Rules,
    /// The language model returned a valid label.
    Llm,
    /// Rules were inconclusive and the model failed or answered garbage.
    FallbackDefault,
}
