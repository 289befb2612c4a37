//! External service providers.
//!
//! - [`ai`] - LLM backends (local Ollama, Gemini, disabled) and the client adapter

pub mod ai;
