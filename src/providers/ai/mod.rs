//! AI/LLM provider implementations.
//!
//! This module provides a unified interface over the supported backends and
//! the [`LlmClient`] adapter the services use.
//!
//! # Supported Backends
//!
//! - **Local**: an Ollama server (or any OpenAI-compatible endpoint)
//! - **Cloud free tier**: Google Gemini
//! - **Disabled**: every call fails with `Unavailable`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use inbox_brief::providers::ai::{GenerationParams, LlmClient, OllamaProvider};
//!
//! # async fn example() {
//! let client = LlmClient::new(Arc::new(OllamaProvider::llama3()));
//!
//! match client.generate("Say hi", &GenerationParams::chat()).await {
//!     Ok(text) => println!("{}", text),
//!     Err(failure) => eprintln!("no answer: {}", failure),
//! }
//! # }
//! ```

mod client;
mod disabled;
mod gemini;
mod ollama;
mod openai;
mod traits;

pub use client::{GenerationParams, LlmClient, LlmFailure, DEFAULT_TIMEOUT};
pub use disabled::DisabledProvider;
pub use gemini::{GeminiProvider, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL};
pub use ollama::{OllamaProvider, OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL};
pub use openai::OpenAiCompatibleProvider;
pub use traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, LlmResult,
    Message, Role, TokenUsage,
};
