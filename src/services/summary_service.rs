//! Email summarization with a guaranteed deterministic fallback.

use crate::config::SummarySettings;
use crate::domain::{truncate_chars, EmailRecord, Summary};
use crate::providers::ai::{GenerationParams, LlmClient};

/// Replies that ask for input instead of summarizing.
const REFUSAL_PHRASES: &[&str] = &[
    "please provide",
    "i need more",
    "cannot summarize",
    "can't summarize",
    "no content to summarize",
    "text is missing",
    "i'm unable to",
    "i am unable to",
    "not enough information",
];

/// Produces a short summary for each email.
#[derive(Debug, Clone)]
pub struct Summarizer {
    llm: LlmClient,
    settings: SummarySettings,
}

impl Summarizer {
    pub fn new(llm: LlmClient, settings: SummarySettings) -> Self {
        Self { llm, settings }
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Summarizes one email.
    ///
    /// A blank body yields [`Summary::unavailable`] without calling the model.
    /// Any model failure, including a refusal-style reply, yields an excerpt
    /// of the body.
    pub async fn summarize(&self, email: &EmailRecord) -> Summary {
        if email.body.trim().is_empty() {
            tracing::debug!(email_id = %email.id, "Empty body, no summary");
            return Summary::unavailable();
        }

        let body = truncate_chars(&email.body, self.settings.body_limit);
        let prompt = format!(
            "Summarize this email briefly in 1-2 sentences. Focus on the key information.\n\n\
             Subject: {}\n\nBody:\n{}\n\nSummary:",
            email.subject, body
        );
        let params = GenerationParams::new(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        match self.llm.generate(&prompt, &params).await {
            Ok(text) if is_refusal(&text) => {
                tracing::warn!(email_id = %email.id, "LLM refused to summarize, using excerpt");
                self.excerpt(email)
            }
            Ok(text) => Summary::ai(text),
            Err(failure) => {
                tracing::warn!(email_id = %email.id, error = %failure, "Summarization failed, using excerpt");
                self.excerpt(email)
            }
        }
    }

    /// Leading body text, or [`Summary::unavailable`] when the prefix holds
    /// nothing printable.
    fn excerpt(&self, email: &EmailRecord) -> Summary {
        let limit = self.settings.excerpt_chars.min(self.settings.body_limit);
        let text = truncate_chars(email.body.trim_start(), limit).trim_end();
        if text.is_empty() {
            Summary::unavailable()
        } else {
            Summary::excerpt(text)
        }
    }
}

fn is_refusal(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SummaryProvenance;
    use crate::providers::ai::{
        CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CannedSummary {
        reply: Option<&'static str>,
        calls: AtomicUsize,
        last_prompt: std::sync::Mutex<String>,
    }

    impl CannedSummary {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_prompt: std::sync::Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedSummary {
        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = request.messages[0].content.clone();
            self.reply
                .map(CompletionResponse::text)
                .ok_or_else(|| LlmError::Unavailable("down".into()))
        }
    }

    fn email(body: &str) -> EmailRecord {
        EmailRecord::new("e1", "a@b.example", "Quarterly numbers", body, Utc::now())
    }

    #[tokio::test]
    async fn success_is_returned_verbatim() {
        let provider = CannedSummary::new(Some("  Revenue grew 4% this quarter.  "));
        let summarizer = Summarizer::new(LlmClient::new(provider), SummarySettings::default());

        let summary = summarizer.summarize(&email("Long report...")).await;
        assert_eq!(summary, Summary::ai("Revenue grew 4% this quarter."));
    }

    #[tokio::test]
    async fn failure_yields_body_prefix() {
        let body = "x".repeat(500);
        let summarizer = Summarizer::new(
            LlmClient::new(CannedSummary::new(None)),
            SummarySettings::default(),
        );

        let summary = summarizer.summarize(&email(&body)).await;
        assert_eq!(summary.provenance, SummaryProvenance::Excerpt);
        assert_eq!(summary.text.chars().count(), 200);
        assert!(body.starts_with(&summary.text));
    }

    #[tokio::test]
    async fn refusal_reply_yields_excerpt() {
        let summarizer = Summarizer::new(
            LlmClient::new(CannedSummary::new(Some(
                "Please provide the email text so I can help.",
            ))),
            SummarySettings::default(),
        );

        let summary = summarizer.summarize(&email("Short note")).await;
        assert_eq!(summary, Summary::excerpt("Short note"));
    }

    #[tokio::test]
    async fn blank_body_makes_no_call() {
        let provider = CannedSummary::new(Some("anything"));
        let summarizer =
            Summarizer::new(LlmClient::new(provider.clone()), SummarySettings::default());

        let summary = summarizer.summarize(&email(" \n\t")).await;
        assert_eq!(summary.provenance, SummaryProvenance::Unavailable);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn body_is_truncated_before_prompting() {
        let provider = CannedSummary::new(Some("ok"));
        let settings = SummarySettings {
            body_limit: 50,
            ..Default::default()
        };
        let summarizer = Summarizer::new(LlmClient::new(provider.clone()), settings);

        summarizer.summarize(&email(&"ü".repeat(80))).await;
        let prompt = provider.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains(&"ü".repeat(50)));
        assert!(!prompt.contains(&"ü".repeat(51)));
    }

    #[tokio::test]
    async fn excerpt_never_exceeds_body_limit() {
        let settings = SummarySettings {
            body_limit: 40,
            excerpt_chars: 200,
            ..Default::default()
        };
        let summarizer = Summarizer::new(LlmClient::disabled(), settings);

        let summary = summarizer.summarize(&email(&"y".repeat(100))).await;
        assert_eq!(summary.text.len(), 40);
    }

    #[tokio::test]
    async fn excerpt_skips_leading_whitespace() {
        let summarizer = Summarizer::new(LlmClient::disabled(), SummarySettings::default());
        let body = format!("{}Hello", "\n".repeat(250));

        let summary = summarizer.summarize(&email(&body)).await;
        assert_eq!(summary, Summary::excerpt("Hello"));
    }

    #[tokio::test]
    async fn zero_length_excerpt_is_unavailable() {
        for settings in [
            SummarySettings {
                excerpt_chars: 0,
                ..Default::default()
            },
            SummarySettings {
                body_limit: 0,
                ..Default::default()
            },
        ] {
            let summarizer = Summarizer::new(LlmClient::disabled(), settings);

            let summary = summarizer.summarize(&email("Meeting moved to 3pm")).await;
            assert_eq!(summary.provenance, SummaryProvenance::Unavailable);
            assert!(!summary.display_text().trim().is_empty());
        }
    }

    #[tokio::test]
    async fn summary_mentioning_inability_is_kept() {
        let summarizer = Summarizer::new(
            LlmClient::new(CannedSummary::new(Some(
                "The client was unable to pay the invoice and needs more time.",
            ))),
            SummarySettings::default(),
        );

        let summary = summarizer.summarize(&email("Overdue invoice")).await;
        assert_eq!(summary.provenance, SummaryProvenance::Ai);
    }

    #[test]
    fn refusal_detection() {
        assert!(is_refusal("I'm unable to summarize without content"));
        assert!(is_refusal("I am unable to see any email text."));
        assert!(is_refusal("I need more context to help."));
        assert!(is_refusal("There is NOT ENOUGH INFORMATION here."));
        assert!(!is_refusal("The team meets on Friday."));
        assert!(!is_refusal("The client was unable to pay the invoice."));
        assert!(!is_refusal("Finance will need more receipts by Monday."));
        assert!(!is_refusal("The vendor confirmed there is no content fee."));
    }
}
