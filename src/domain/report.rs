//! Aggregated output of a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use super::{AnnotatedEmail, CategoryLabel, CategoryProvenance};

/// Counts computed over a run's annotated emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_emails: usize,
    /// One entry per label, zeros included.
    pub category_counts: BTreeMap<CategoryLabel, usize>,
    pub total_unsubscribe_links: usize,
    pub emails_with_unsubscribe: usize,
    pub unique_unsubscribe_links: usize,
    pub rule_categorized: usize,
    pub llm_categorized: usize,
    pub default_categorized: usize,
    pub ai_summaries: usize,
    pub processed_at: DateTime<Utc>,
}

impl ReportStatistics {
    /// Computes statistics for `emails`.
    pub fn compute(emails: &[AnnotatedEmail], processed_at: DateTime<Utc>) -> Self {
        let mut category_counts: BTreeMap<CategoryLabel, usize> =
            CategoryLabel::ALL.iter().map(|label| (*label, 0)).collect();
        let mut stats = Self {
            total_emails: emails.len(),
            category_counts: BTreeMap::new(),
            total_unsubscribe_links: 0,
            emails_with_unsubscribe: 0,
            unique_unsubscribe_links: dedupe_links(emails).len(),
            rule_categorized: 0,
            llm_categorized: 0,
            default_categorized: 0,
            ai_summaries: 0,
            processed_at,
        };

        for annotated in emails {
            *category_counts.entry(annotated.category).or_insert(0) += 1;

            let links = annotated.email.unsubscribe_links.len();
            if links > 0 {
                stats.emails_with_unsubscribe += 1;
                stats.total_unsubscribe_links += links;
            }

            match annotated.category_provenance {
                CategoryProvenance::Rules => stats.rule_categorized += 1,
                CategoryProvenance::Llm => stats.llm_categorized += 1,
                CategoryProvenance::FallbackDefault => stats.default_categorized += 1,
            }

            if annotated.summary.is_ai_generated() {
                stats.ai_summaries += 1;
            }
        }

        stats.category_counts = category_counts;
        stats
    }

    /// Number of emails filed under `label`.
    pub fn count_for(&self, label: CategoryLabel) -> usize {
        self.category_counts.get(&label).copied().unwrap_or(0)
    }
}

/// The result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub statistics: ReportStatistics,
    /// Deduplicated unsubscribe links, in first-seen order.
    pub unsubscribe_links: Vec<String>,
    /// Annotated emails in input order.
    pub emails: Vec<AnnotatedEmail>,
}

impl Report {
    /// Builds a report stamped with the current time.
    pub fn new(emails: Vec<AnnotatedEmail>) -> Self {
        Self::with_timestamp(emails, Utc::now())
    }

    /// Builds a report with an explicit processing time.
    pub fn with_timestamp(emails: Vec<AnnotatedEmail>, processed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            statistics: ReportStatistics::compute(&emails, processed_at),
            unsubscribe_links: dedupe_links(&emails),
            emails,
        }
    }
}

fn dedupe_links(emails: &[AnnotatedEmail]) -> Vec<String> {
    let mut seen = HashSet::new();
    emails
        .iter()
        .flat_map(|annotated| annotated.email.unsubscribe_links.iter())
        .filter(|link| seen.insert(*link))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailRecord, Summary};
    use pretty_assertions::assert_eq;

    fn annotated(
        id: &str,
        category: CategoryLabel,
        provenance: CategoryProvenance,
        links: &[&str],
    ) -> AnnotatedEmail {
        AnnotatedEmail {
            email: EmailRecord::new(id, "sender@example.com", "Subject", "Body", Utc::now())
                .with_unsubscribe_links(links.iter().map(|l| l.to_string()).collect()),
            category,
            category_provenance: provenance,
            summary: Summary::excerpt("Body"),
        }
    }

    #[test]
    fn empty_report_has_zero_counts_for_every_label() {
        let report = Report::new(Vec::new());
        let stats = &report.statistics;

        assert_eq!(stats.total_emails, 0);
        assert_eq!(stats.category_counts.len(), CategoryLabel::ALL.len());
        assert!(stats.category_counts.values().all(|count| *count == 0));
        assert_eq!(stats.total_unsubscribe_links, 0);
        assert!(report.unsubscribe_links.is_empty());
    }

    #[test]
    fn counts_categories_and_links() {
        let emails = vec![
            annotated("1", CategoryLabel::Work, CategoryProvenance::Rules, &[]),
            annotated(
                "2",
                CategoryLabel::Promotions,
                CategoryProvenance::Llm,
                &["https://a.example/unsub", "https://b.example/unsub"],
            ),
            annotated(
                "3",
                CategoryLabel::Promotions,
                CategoryProvenance::FallbackDefault,
                &["https://a.example/unsub"],
            ),
        ];

        let report = Report::new(emails);
        let stats = &report.statistics;

        assert_eq!(stats.total_emails, 3);
        assert_eq!(stats.count_for(CategoryLabel::Work), 1);
        assert_eq!(stats.count_for(CategoryLabel::Promotions), 2);
        assert_eq!(stats.count_for(CategoryLabel::News), 0);
        assert_eq!(stats.total_unsubscribe_links, 3);
        assert_eq!(stats.emails_with_unsubscribe, 2);
        assert_eq!(stats.unique_unsubscribe_links, 2);
        assert_eq!(stats.rule_categorized, 1);
        assert_eq!(stats.llm_categorized, 1);
        assert_eq!(stats.default_categorized, 1);
        assert_eq!(
            report.unsubscribe_links,
            vec!["https://a.example/unsub", "https://b.example/unsub"]
        );
    }

    #[test]
    fn statistics_serialize_with_label_keys() {
        let report = Report::new(vec![annotated(
            "1",
            CategoryLabel::News,
            CategoryProvenance::Rules,
            &[],
        )]);
        let json = serde_json::to_value(&report.statistics).unwrap();
        assert_eq!(json["category_counts"]["News"], 1);
        assert_eq!(json["category_counts"]["Work"], 0);
    }
}
