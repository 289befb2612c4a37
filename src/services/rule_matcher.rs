//! Deterministic rule matching.
//!
//! Rules are evaluated in order against a single email field each; the first
//! rule that matches decides the label. Matching is case-insensitive and does
//! no I/O.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CategoryLabel, EmailRecord};

/// Errors raised while compiling a rule list.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {index} ({label}) has an empty pattern")]
    EmptyPattern { index: usize, label: CategoryLabel },

    #[error("rule {index} ({label}) has an invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        index: usize,
        label: CategoryLabel,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The email field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Sender,
    Subject,
    Body,
}

impl RuleField {
    fn select<'a>(&self, email: &'a EmailRecord) -> &'a str {
        match self {
            RuleField::Sender => &email.sender,
            RuleField::Subject => &email.subject,
            RuleField::Body => &email.body,
        }
    }
}

/// How a rule matches its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePattern {
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive regular expression.
    Regex(String),
}

impl RulePattern {
    fn source(&self) -> &str {
        match self {
            RulePattern::Contains(s) | RulePattern::Regex(s) => s,
        }
    }
}

/// A single predicate mapping an email to a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub label: CategoryLabel,
    pub field: RuleField,
    pub pattern: RulePattern,
}

impl MatchRule {
    pub fn contains(label: CategoryLabel, field: RuleField, needle: impl Into<String>) -> Self {
        Self {
            label,
            field,
            pattern: RulePattern::Contains(needle.into()),
        }
    }

    pub fn regex(label: CategoryLabel, field: RuleField, pattern: impl Into<String>) -> Self {
        Self {
            label,
            field,
            pattern: RulePattern::Regex(pattern.into()),
        }
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Contains(String),
    Regex(Regex),
}

impl Compiled {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Compiled::Contains(needle) => text.to_lowercase().contains(needle.as_str()),
            Compiled::Regex(re) => re.is_match(text),
        }
    }
}

/// An ordered, compiled rule list.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Vec<(MatchRule, Compiled)>,
}

impl RuleMatcher {
    /// Compiles `rules`, rejecting empty or malformed patterns.
    pub fn new(rules: Vec<MatchRule>) -> Result<Self, RuleError> {
        let compiled = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                let compiled = compile(index, &rule)?;
                Ok((rule, compiled))
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(Self { rules: compiled })
    }

    /// The built-in rule list.
    pub fn with_default_rules() -> Result<Self, RuleError> {
        Self::new(default_rules())
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The label of the first matching rule, if any.
    pub fn match_email(&self, email: &EmailRecord) -> Option<CategoryLabel> {
        self.matching_rule(email).map(|rule| rule.label)
    }

    /// The first matching rule, if any.
    pub fn matching_rule(&self, email: &EmailRecord) -> Option<&MatchRule> {
        self.rules
            .iter()
            .find(|(rule, compiled)| compiled.is_match(rule.field.select(email)))
            .map(|(rule, _)| rule)
    }
}

fn compile(index: usize, rule: &MatchRule) -> Result<Compiled, RuleError> {
    let source = rule.pattern.source();
    if source.trim().is_empty() {
        return Err(RuleError::EmptyPattern {
            index,
            label: rule.label,
        });
    }

    match &rule.pattern {
        RulePattern::Contains(needle) => Ok(Compiled::Contains(needle.to_lowercase())),
        RulePattern::Regex(pattern) => RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Compiled::Regex)
            .map_err(|source| RuleError::InvalidRegex {
                index,
                label: rule.label,
                pattern: pattern.clone(),
                source,
            }),
    }
}

/// Keyword rules checked in label order: Work, Promotions, Social, News.
pub fn default_rules() -> Vec<MatchRule> {
    use CategoryLabel::*;
    use RuleField::*;

    let groups: [(CategoryLabel, RuleField, &[&str]); 8] = [
        (
            Work,
            Subject,
            &[
                "invoice",
                "meeting",
                "client",
                "project",
                "deadline",
                "task",
                "urgent",
                "code review",
            ],
        ),
        (
            Work,
            Body,
            &[
                r"invoice\s+number",
                "invoice",
                "payment",
                "due date",
                "project",
                "meeting",
            ],
        ),
        (
            Promotions,
            Subject,
            &[
                "sale",
                "offer",
                "discount",
                "deal",
                "limited time",
                r"save\s+\d+%",
                "buy now",
                "checkout",
            ],
        ),
        (
            Promotions,
            Body,
            &[
                "shop now",
                "buy now",
                "limited offer",
                "discount code",
                "coupon",
                "special price",
            ],
        ),
        (
            Social,
            Subject,
            &[
                "friend request",
                "mentioned you",
                "commented",
                "liked your",
                "new follower",
            ],
        ),
        (
            Social,
            Sender,
            &["facebook", "linkedin", "twitter", "instagram", "tiktok", "youtube"],
        ),
        (
            News,
            Subject,
            &["newsletter", "daily digest", "breaking", "news", "update"],
        ),
        (News, Sender, &["news", "digest", "newsletter"]),
    ];

    groups
        .iter()
        .flat_map(|(label, field, patterns)| {
            patterns.iter().map(move |p| {
                if p.contains('\\') {
                    MatchRule::regex(*label, *field, *p)
                } else {
                    MatchRule::contains(*label, *field, *p)
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn email(sender: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord::new("e1", sender, subject, body, Utc::now())
    }

    fn defaults() -> RuleMatcher {
        RuleMatcher::with_default_rules().unwrap()
    }

    #[test]
    fn default_rules_compile() {
        let matcher = defaults();
        assert!(!matcher.is_empty());
        assert_eq!(matcher.len(), default_rules().len());
    }

    #[test]
    fn promotions_by_subject() {
        let e = email("shop@store.example", "50% off sale", "Ends tonight.");
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::Promotions));
    }

    #[test]
    fn save_percentage_regex() {
        let e = email("shop@store.example", "Save 30% today", "");
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::Promotions));
    }

    #[test]
    fn work_wins_over_later_labels() {
        let e = email(
            "billing@vendor.example",
            "Invoice for your newsletter subscription",
            "",
        );
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::Work));
    }

    #[test]
    fn social_by_sender() {
        let e = email("notifications@LinkedIn.com", "You appeared in 4 searches", "");
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::Social));
    }

    #[test]
    fn news_by_sender() {
        let e = email("digest@paper.example", "Tuesday", "Headlines inside");
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::News));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let e = email("a@b.example", "URGENT: server down", "");
        assert_eq!(defaults().match_email(&e), Some(CategoryLabel::Work));
    }

    #[test]
    fn plain_address_is_inconclusive() {
        let e = email("grandma@family.example", "Hello dear", "Thinking of you.");
        assert_eq!(defaults().match_email(&e), None);
    }

    #[test]
    fn first_matching_rule_is_reported() {
        let matcher = RuleMatcher::new(vec![
            MatchRule::contains(CategoryLabel::News, RuleField::Body, "weekly"),
            MatchRule::contains(CategoryLabel::Social, RuleField::Body, "weekly"),
        ])
        .unwrap();
        let e = email("x@y.example", "hi", "Your weekly recap");

        let rule = matcher.matching_rule(&e).unwrap();
        assert_eq!(rule.label, CategoryLabel::News);
    }

    #[test]
    fn empty_rule_list_never_matches() {
        let matcher = RuleMatcher::new(Vec::new()).unwrap();
        assert_eq!(matcher.match_email(&email("a@b", "sale", "coupon")), None);
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let result = RuleMatcher::new(vec![MatchRule::regex(
            CategoryLabel::Work,
            RuleField::Subject,
            "(unclosed",
        )]);
        assert!(matches!(result, Err(RuleError::InvalidRegex { index: 0, .. })));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let result = RuleMatcher::new(vec![MatchRule::contains(
            CategoryLabel::Work,
            RuleField::Subject,
            "  ",
        )]);
        assert!(matches!(result, Err(RuleError::EmptyPattern { .. })));
    }

    #[test]
    fn rules_deserialize_from_json() {
        let rules: Vec<MatchRule> = serde_json::from_str(
            r#"[{"label": "Work", "field": "sender", "pattern": {"regex": "@acme\\.com$"}}]"#,
        )
        .unwrap();
        let matcher = RuleMatcher::new(rules).unwrap();
        assert_eq!(
            matcher.match_email(&email("bob@ACME.com", "hi", "")),
            Some(CategoryLabel::Work)
        );
    }
}
