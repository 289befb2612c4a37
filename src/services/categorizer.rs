//! Hybrid categorization: deterministic rules first, the language model only
//! when no rule matches.

use crate::config::CategorizerSettings;
use crate::domain::{truncate_chars, CategoryLabel, CategoryProvenance, EmailRecord};
use crate::providers::ai::{GenerationParams, LlmClient};

use super::RuleMatcher;

/// A label together with how it was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categorization {
    pub label: CategoryLabel,
    pub provenance: CategoryProvenance,
}

impl Categorization {
    fn new(label: CategoryLabel, provenance: CategoryProvenance) -> Self {
        Self { label, provenance }
    }
}

/// Assigns every email exactly one [`CategoryLabel`].
#[derive(Debug, Clone)]
pub struct HybridCategorizer {
    matcher: RuleMatcher,
    llm: LlmClient,
    settings: CategorizerSettings,
}

impl HybridCategorizer {
    pub fn new(matcher: RuleMatcher, llm: LlmClient, settings: CategorizerSettings) -> Self {
        Self {
            matcher,
            llm,
            settings,
        }
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Categorizes one email. Never fails: any model problem degrades to the
    /// configured default label.
    pub async fn categorize(&self, email: &EmailRecord) -> Categorization {
        if let Some(label) = self.matcher.match_email(email) {
            tracing::debug!(email_id = %email.id, category = %label, "Categorized by rules");
            return Categorization::new(label, CategoryProvenance::Rules);
        }

        let prompt = self.build_prompt(email);
        let params = GenerationParams::new(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let reply = match self.llm.generate(&prompt, &params).await {
            Ok(reply) => reply,
            Err(failure) => {
                tracing::warn!(
                    email_id = %email.id,
                    error = %failure,
                    default = %self.settings.default_label,
                    "LLM categorization failed, using default"
                );
                return self.fallback();
            }
        };

        match reply.parse::<CategoryLabel>() {
            Ok(label) => {
                tracing::info!(email_id = %email.id, category = %label, "Categorized by LLM");
                Categorization::new(label, CategoryProvenance::Llm)
            }
            Err(unknown) => {
                tracing::warn!(
                    email_id = %email.id,
                    error = %unknown,
                    default = %self.settings.default_label,
                    "LLM returned an unrecognized category"
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Categorization {
        Categorization::new(self.settings.default_label, CategoryProvenance::FallbackDefault)
    }

    fn build_prompt(&self, email: &EmailRecord) -> String {
        format!(
            "Classify this email into one of these categories: {labels}.\n\n\
             Subject: {subject}\n\
             Sender: {sender}\n\
             Body (first {limit} chars): {body}\n\n\
             Respond with ONLY the category name (one word):",
            labels = CategoryLabel::names(),
            subject = email.subject,
            sender = email.sender,
            limit = self.settings.body_chars,
            body = truncate_chars(&email.body, self.settings.body_chars),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ai::{
        CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    struct FixedReply {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedReply {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            match &self.reply {
                Some(text) => Ok(CompletionResponse::text(text.clone())),
                None => Err(LlmError::Unavailable("connection refused".into())),
            }
        }
    }

    fn categorizer(provider: Arc<FixedReply>) -> HybridCategorizer {
        HybridCategorizer::new(
            RuleMatcher::with_default_rules().unwrap(),
            LlmClient::new(provider),
            CategorizerSettings::default(),
        )
    }

    fn email(subject: &str, body: &str) -> EmailRecord {
        EmailRecord::new("e1", "someone@example.org", subject, body, Utc::now())
    }

    #[tokio::test]
    async fn rule_hit_skips_llm() {
        let provider = FixedReply::new(Some("Social"));
        let result = categorizer(provider.clone())
            .categorize(&email("50% off sale", ""))
            .await;

        assert_eq!(result.label, CategoryLabel::Promotions);
        assert_eq!(result.provenance, CategoryProvenance::Rules);
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn llm_label_is_used_when_rules_miss() {
        let provider = FixedReply::new(Some(" social.\n"));
        let result = categorizer(provider.clone())
            .categorize(&email("Photos from Saturday", "Here they are"))
            .await;

        assert_eq!(result.label, CategoryLabel::Social);
        assert_eq!(result.provenance, CategoryProvenance::Llm);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn garbage_reply_falls_back() {
        let provider = FixedReply::new(Some("I think this might be Work-related"));
        let result = categorizer(provider)
            .categorize(&email("Photos from Saturday", ""))
            .await;

        assert_eq!(result.label, CategoryLabel::Other);
        assert_eq!(result.provenance, CategoryProvenance::FallbackDefault);
    }

    #[tokio::test]
    async fn unavailable_backend_falls_back_to_configured_default() {
        let categorizer = HybridCategorizer::new(
            RuleMatcher::with_default_rules().unwrap(),
            LlmClient::new(FixedReply::new(None)),
            CategorizerSettings {
                default_label: CategoryLabel::News,
                ..Default::default()
            },
        );
        let result = categorizer.categorize(&email("Hello", "")).await;

        assert_eq!(result.label, CategoryLabel::News);
        assert_eq!(result.provenance, CategoryProvenance::FallbackDefault);
    }

    #[tokio::test]
    async fn prompt_truncates_body_and_lists_labels() {
        let provider = FixedReply::new(Some("Other"));
        let body = "é".repeat(800);
        categorizer(provider.clone())
            .categorize(&email("Hello", &body))
            .await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Work, Promotions, Social, News, Other"));
        assert!(prompts[0].contains(&"é".repeat(500)));
        assert!(!prompts[0].contains(&"é".repeat(501)));
    }
}
