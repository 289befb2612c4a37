//! inbox-brief - Entry point for the batch triage command
//!
//! Usage: `inbox-brief <emails.json> [question]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use inbox_brief::config::{BackendKind, Settings};
use inbox_brief::providers::ai::{LlmClient, OllamaProvider};
use inbox_brief::services::{ChatEngine, HybridCategorizer, Pipeline, RuleMatcher, Summarizer};
use inbox_brief::EmailRecord;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: inbox-brief <emails.json> [question]");
    };
    let question = args.collect::<Vec<_>>().join(" ");

    let mut settings = Settings::load().context("failed to load settings")?;
    settings
        .apply_env_overrides()
        .context("invalid environment override")?;

    tracing::info!(input = %input.display(), backend = ?settings.ai.backend, "Starting inbox-brief");

    let llm = match LlmClient::from_settings(&settings.ai) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "AI backend unavailable, continuing without it");
            LlmClient::disabled()
        }
    };

    if settings.ai.backend == BackendKind::Local && llm.is_enabled() {
        let ollama =
            OllamaProvider::with_url(&settings.ai.local.base_url, &settings.ai.local.model);
        if let Err(e) = ollama.check_connection().await {
            tracing::warn!(error = %e, "Cannot reach Ollama; categories and summaries will fall back");
        }
    }

    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let emails: Vec<EmailRecord> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", input.display()))?;

    let matcher = match settings.rules.clone() {
        Some(rules) => RuleMatcher::new(rules),
        None => RuleMatcher::with_default_rules(),
    }
    .context("invalid categorization rules")?;

    let pipeline = Pipeline::new(
        HybridCategorizer::new(matcher, llm.clone(), settings.categorizer.clone()),
        Summarizer::new(llm.clone(), settings.summary.clone()),
        settings.pipeline.clone(),
    );

    let report = pipeline.run(emails).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !question.trim().is_empty() {
        let chat = ChatEngine::new(llm.clone(), settings.chat.clone());
        println!("\n{}", chat.answer(&question, &report).await);
    }

    tracing::info!(llm_calls = llm.call_count(), "Done");
    Ok(())
}
