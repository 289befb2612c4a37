//! Runs categorization and summarization over a batch of emails.

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::config::PipelineSettings;
use crate::domain::{AnnotatedEmail, EmailRecord, EmailValidationError, Report};

use super::{HybridCategorizer, Summarizer};

/// Errors that abort a run before any email is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid email record at position {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: EmailValidationError,
    },
}

/// Turns fetched emails into an annotated [`Report`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    categorizer: HybridCategorizer,
    summarizer: Summarizer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        categorizer: HybridCategorizer,
        summarizer: Summarizer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            categorizer,
            summarizer,
            settings,
        }
    }

    /// Categorizes and summarizes a single email.
    pub async fn annotate(&self, email: &EmailRecord) -> AnnotatedEmail {
        let (categorization, summary) = futures::join!(
            self.categorizer.categorize(email),
            self.summarizer.summarize(email)
        );

        AnnotatedEmail {
            email: email.clone(),
            category: categorization.label,
            category_provenance: categorization.provenance,
            summary,
        }
    }

    /// Processes `emails` and returns the report.
    ///
    /// Only the first `max_emails` records are processed; records past the
    /// cap are skipped without validation. Every processed record is
    /// validated before any model call. Output order matches input order
    /// regardless of the configured concurrency.
    pub async fn run(&self, mut emails: Vec<EmailRecord>) -> Result<Report, PipelineError> {
        let max_emails = self.settings.max_emails;
        if max_emails > 0 && emails.len() > max_emails {
            let skipped = emails.len() - max_emails;
            emails.truncate(max_emails);
            tracing::warn!(skipped, max_emails, "Email cap reached, skipping the rest");
        }

        for (index, email) in emails.iter().enumerate() {
            email
                .validate()
                .map_err(|source| PipelineError::InvalidRecord { index, source })?;
        }

        let total = emails.len();
        let concurrency = self.settings.concurrency.max(1);
        tracing::info!(total, concurrency, "Processing emails");

        let annotated: Vec<AnnotatedEmail> = stream::iter(emails.iter().enumerate())
            .map(|(index, email)| async move {
                let annotated = self.annotate(email).await;
                tracing::info!(
                    email_id = %annotated.email.id,
                    position = index + 1,
                    total,
                    category = %annotated.category,
                    "Processed email"
                );
                annotated
            })
            .buffered(concurrency)
            .collect()
            .await;

        let report = Report::new(annotated);
        tracing::info!(
            report_id = %report.id,
            total = report.statistics.total_emails,
            unsubscribe_links = report.statistics.unique_unsubscribe_links,
            "Report ready"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategorizerSettings, SummarySettings};
    use crate::domain::{CategoryLabel, CategoryProvenance, EmailId, SummaryProvenance};
    use crate::providers::ai::LlmClient;
    use crate::services::RuleMatcher;
    use chrono::Utc;

    fn pipeline(concurrency: usize) -> Pipeline {
        pipeline_with(PipelineSettings {
            concurrency,
            ..Default::default()
        })
    }

    fn pipeline_with(settings: PipelineSettings) -> Pipeline {
        let llm = LlmClient::disabled();
        Pipeline::new(
            HybridCategorizer::new(
                RuleMatcher::with_default_rules().unwrap(),
                llm.clone(),
                CategorizerSettings::default(),
            ),
            Summarizer::new(llm, SummarySettings::default()),
            settings,
        )
    }

    fn email(id: &str, subject: &str) -> EmailRecord {
        EmailRecord::new(id, "sender@example.org", subject, "Some body text", Utc::now())
    }

    #[tokio::test]
    async fn empty_input_gives_empty_report() {
        let report = pipeline(1).run(Vec::new()).await.unwrap();
        assert_eq!(report.statistics.total_emails, 0);
        assert!(report.emails.is_empty());
        assert!(report.statistics.category_counts.values().all(|c| *c == 0));
    }

    #[tokio::test]
    async fn invalid_record_aborts_the_run() {
        let mut bad = email("e2", "hi");
        bad.sender = "  ".into();

        let err = pipeline(1)
            .run(vec![email("e1", "hi"), bad])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidRecord {
                index: 1,
                source: EmailValidationError::MissingSender(_)
            }
        ));
    }

    #[tokio::test]
    async fn order_is_preserved_with_concurrency() {
        let emails: Vec<_> = (0..12)
            .map(|i| email(&format!("e{}", i), "Weekly newsletter"))
            .collect();

        let report = pipeline(4).run(emails).await.unwrap();
        let ids: Vec<EmailId> = report.emails.iter().map(|a| a.email.id.clone()).collect();
        let expected: Vec<EmailId> = (0..12).map(|i| EmailId::from(format!("e{}", i))).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn records_past_the_cap_are_skipped() {
        let mut emails: Vec<_> = (0..5).map(|i| email(&format!("e{}", i), "Hello")).collect();
        emails[4].id = EmailId::from("   ".to_string());

        let report = pipeline_with(PipelineSettings {
            concurrency: 2,
            max_emails: 2,
        })
        .run(emails)
        .await
        .unwrap();

        let ids: Vec<EmailId> = report.emails.iter().map(|a| a.email.id.clone()).collect();
        assert_eq!(ids, vec![EmailId::from("e0".to_string()), EmailId::from("e1".to_string())]);
        assert_eq!(report.statistics.total_emails, 2);
    }

    #[tokio::test]
    async fn zero_cap_processes_everything() {
        let emails: Vec<_> = (0..60).map(|i| email(&format!("e{}", i), "Hello")).collect();

        let report = pipeline_with(PipelineSettings {
            concurrency: 8,
            max_emails: 0,
        })
        .run(emails)
        .await
        .unwrap();
        assert_eq!(report.emails.len(), 60);
    }

    #[tokio::test]
    async fn annotate_degrades_without_a_model() {
        let annotated = pipeline(1).annotate(&email("e1", "Hello there")).await;
        assert_eq!(annotated.category, CategoryLabel::Other);
        assert_eq!(annotated.category_provenance, CategoryProvenance::FallbackDefault);
        assert_eq!(annotated.summary.provenance, SummaryProvenance::Excerpt);
        assert_eq!(annotated.summary.text, "Some body text");
    }
}
