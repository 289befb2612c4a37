//! inbox-brief - Hybrid rule/LLM email triage
//!
//! This crate categorizes fetched emails with deterministic rules backed by a
//! language model, summarizes them, aggregates the results into a report and
//! answers questions about that report. Every language model failure degrades
//! to a deterministic result; none aborts a run.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;

pub use domain::{AnnotatedEmail, CategoryLabel, EmailRecord, Report};
pub use services::{ChatEngine, HybridCategorizer, Pipeline, RuleMatcher, Summarizer};
