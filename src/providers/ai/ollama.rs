//! Ollama provider implementation.
//!
//! Ollama exposes an OpenAI-compatible API, so this is a thin wrapper
//! around OpenAiCompatibleProvider with Ollama-specific defaults, plus
//! the native `/api/tags` endpoint for a startup connection check.

use async_trait::async_trait;
use serde::Deserialize;

use super::openai::OpenAiCompatibleProvider;
use super::traits::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult};

/// Default Ollama API URL.
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434/v1";

/// Default local model.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";

/// Appends `/v1` unless the URL already points at the compatible API.
fn api_root(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

/// Provider for Ollama's local LLM server.
pub struct OllamaProvider {
    inner: OpenAiCompatibleProvider,
}

impl OllamaProvider {
    /// Creates a new Ollama provider with default localhost URL.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_url(OLLAMA_DEFAULT_URL, model)
    }

    /// Creates a new Ollama provider with a custom URL.
    ///
    /// Accepts either the server root (`http://host:11434`) or the
    /// compatible API root (`http://host:11434/v1`).
    pub fn with_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let inner = OpenAiCompatibleProvider::custom(api_root(&base_url.into()), None, model);
        Self { inner }
    }

    /// Creates a provider with llama3.2 model.
    pub fn llama3() -> Self {
        Self::new(OLLAMA_DEFAULT_MODEL)
    }

    /// Overrides the HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.inner = self.inner.with_client(client);
        self
    }

    /// Server root, i.e. the base URL without the `/v1` suffix.
    fn server_root(&self) -> &str {
        let base = self.inner.base_url();
        base.strip_suffix("/v1").unwrap_or(base)
    }

    /// Lists models installed on the server.
    pub async fn list_models(&self) -> LlmResult<Vec<String>> {
        let url = format!("{}/api/tags", self.server_root());
        let response = self.inner.client().get(&url).send().await?;

        if !response.status().is_success() {
            return Err(LlmError::Unavailable(format!(
                "Ollama returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse tags: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Checks the server is reachable and logs whether the model is installed.
    pub async fn check_connection(&self) -> LlmResult<()> {
        let models = self.list_models().await?;
        if models.iter().any(|m| m.starts_with(self.model())) {
            tracing::info!(url = %self.server_root(), model = %self.model(), "Connected to Ollama");
        } else {
            tracing::warn!(
                model = %self.model(),
                available = ?models,
                "Model may not be installed on the Ollama server"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
        self.inner.complete(request).await
    }
}
