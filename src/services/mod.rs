//! Business services layer.
//!
//! Services hold the categorization, summarization and chat logic. They talk
//! to language models only through [`LlmClient`](crate::providers::ai::LlmClient)
//! and never fail because a model did.
//!
//! ```text
//!  Vec<EmailRecord>
//!        |
//!        v
//!    Pipeline ----> HybridCategorizer (RuleMatcher, then LLM)
//!        |    \---> Summarizer
//!        v
//!     Report  ----> ChatEngine
//! ```
//!
//! # Services Overview
//!
//! - [`RuleMatcher`]: ordered keyword and regex rules
//! - [`HybridCategorizer`]: rules first, model second, default last
//! - [`Summarizer`]: model summary or body excerpt
//! - [`ChatEngine`]: questions answered from report statistics
//! - [`Pipeline`]: batch processing into a [`Report`](crate::domain::Report)

mod categorizer;
mod chat_service;
mod pipeline;
mod rule_matcher;
mod summary_service;

pub use categorizer::{Categorization, HybridCategorizer};
pub use chat_service::{ChatEngine, ChatStatus, EMPTY_QUESTION_HINT};
pub use pipeline::{Pipeline, PipelineError};
pub use rule_matcher::{default_rules, MatchRule, RuleError, RuleField, RuleMatcher, RulePattern};
pub use summary_service::Summarizer;
