//! Question answering grounded in a processed [`Report`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::ChatSettings;
use crate::domain::{truncate_chars, CategoryLabel, Report};
use crate::providers::ai::{GenerationParams, LlmClient};

/// Returned for an empty question.
pub const EMPTY_QUESTION_HINT: &str =
    "Ask a question about your emails, for example \"How many promotions did I get?\"";

const SYSTEM_PROMPT: &str = "You are an AI assistant helping users with their email management \
dashboard. You help users understand their email reports, categories and statistics, and answer \
questions about their emails. Answer using only the report context provided.";

/// Whether chat can reach a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStatus {
    pub available: bool,
    pub provider: String,
}

/// Answers free-form questions about a report.
#[derive(Debug, Clone)]
pub struct ChatEngine {
    llm: LlmClient,
    settings: ChatSettings,
}

impl ChatEngine {
    pub fn new(llm: LlmClient, settings: ChatSettings) -> Self {
        Self { llm, settings }
    }

    pub fn status(&self) -> ChatStatus {
        ChatStatus {
            available: self.llm.is_enabled(),
            provider: self.llm.provider_name().to_string(),
        }
    }

    /// Renders the report facts the model is allowed to use.
    pub fn grounding_context(&self, report: &Report) -> String {
        let stats = &report.statistics;
        let mut context = String::from("Current Email Report Context:\n");

        let _ = writeln!(context, "- Total emails processed: {}", stats.total_emails);
        let _ = writeln!(context, "- Emails per category:");
        for label in CategoryLabel::ALL {
            let _ = writeln!(context, "  - {}: {}", label, stats.count_for(label));
        }
        let _ = writeln!(
            context,
            "- Unsubscribe links found: {} ({} unique)",
            stats.total_unsubscribe_links, stats.unique_unsubscribe_links
        );
        let _ = writeln!(
            context,
            "- Processed at: {}",
            stats.processed_at.format("%Y-%m-%d %H:%M UTC")
        );

        if self.settings.sample_size > 0 && !report.emails.is_empty() {
            let _ = writeln!(context, "- Sample emails:");
            for annotated in report.emails.iter().take(self.settings.sample_size) {
                let _ = writeln!(
                    context,
                    "  - [{}] {} - {}",
                    annotated.category,
                    annotated.email.subject,
                    truncate_chars(annotated.summary.display_text(), self.settings.summary_chars)
                );
            }
        }

        context
    }

    /// Answers `question`. Always returns displayable text.
    pub async fn answer(&self, question: &str, report: &Report) -> String {
        let question = question.trim();
        if question.is_empty() {
            return EMPTY_QUESTION_HINT.to_string();
        }

        let prompt = format!(
            "{}\nUser question: {}\n\nPlease provide a helpful, concise response.",
            self.grounding_context(report),
            question
        );
        let params = GenerationParams::new(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_system_prompt(SYSTEM_PROMPT);

        match self.llm.generate(&prompt, &params).await {
            Ok(answer) => answer,
            Err(failure) => {
                tracing::warn!(error = %failure, "Chat answer unavailable, returning statistics");
                self.fallback_answer(report)
            }
        }
    }

    fn fallback_answer(&self, report: &Report) -> String {
        let stats = &report.statistics;
        let mut text = if self.llm.is_enabled() {
            String::from("AI chat is currently unavailable. Here are the report statistics:\n")
        } else {
            String::from("AI chat is disabled. Here are the report statistics:\n")
        };

        let _ = writeln!(text, "Total emails: {}", stats.total_emails);
        for label in CategoryLabel::ALL {
            let _ = writeln!(text, "{}: {}", label, stats.count_for(label));
        }
        let _ = write!(
            text,
            "Unsubscribe links: {} ({} unique)",
            stats.total_unsubscribe_links, stats.unique_unsubscribe_links
        );
        text
    }
}
