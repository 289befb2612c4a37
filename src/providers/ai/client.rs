//! The adapter every service talks to.
//!
//! [`LlmClient`] hides which backend is configured, enforces one timeout per
//! call, folds provider errors into the small [`LlmFailure`] taxonomy and
//! optionally caches successful completions. It never retries.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use thiserror::Error;

use super::disabled::DisabledProvider;
use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::traits::{CompletionRequest, LlmError, LlmProvider, Message};
use crate::config::{AiSettings, BackendKind, ConfigError};

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Why a generation attempt produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmFailure {
    #[error("LLM unavailable: {0}")]
    Unavailable(String),

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("LLM returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for LlmFailure {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::HttpError(e) if e.is_timeout() => LlmFailure::Timeout,
            LlmError::HttpError(e) if e.is_decode() => LlmFailure::InvalidResponse(e.to_string()),
            LlmError::HttpError(e) => LlmFailure::Unavailable(e.to_string()),
            LlmError::ApiError { status, message } if status >= 500 => {
                LlmFailure::Unavailable(format!("{}: {}", status, message))
            }
            LlmError::ApiError { status, message } => {
                LlmFailure::InvalidResponse(format!("{}: {}", status, message))
            }
            LlmError::InvalidResponse(message) => LlmFailure::InvalidResponse(message),
            LlmError::RateLimited { retry_after_secs } => {
                LlmFailure::RateLimited { retry_after_secs }
            }
            LlmError::AuthenticationError(message) => {
                LlmFailure::Unavailable(format!("authentication failed: {}", message))
            }
            e @ LlmError::ContextLengthExceeded { .. } => {
                LlmFailure::InvalidResponse(e.to_string())
            }
            LlmError::Unavailable(message) => LlmFailure::Unavailable(message),
        }
    }
}

/// Sampling parameters for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub system_prompt: Option<String>,
}

impl GenerationParams {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
            system_prompt: None,
        }
    }

    /// Near-deterministic, a handful of tokens.
    pub fn classification() -> Self {
        Self::new(0.1).with_max_tokens(10)
    }

    pub fn summary() -> Self {
        Self::new(0.5).with_max_tokens(150)
    }

    pub fn chat() -> Self {
        Self::new(0.7).with_max_tokens(800)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    system_prompt: Option<String>,
    prompt: String,
    temperature_bits: u32,
    max_tokens: Option<usize>,
}

impl CacheKey {
    fn new(prompt: &str, params: &GenerationParams, max_tokens: Option<usize>) -> Self {
        Self {
            system_prompt: params.system_prompt.clone(),
            prompt: prompt.to_string(),
            temperature_bits: params.temperature.to_bits(),
            max_tokens,
        }
    }
}

type ResponseCache = Arc<Mutex<LruCache<CacheKey, String>>>;

/// Backend-agnostic LLM handle shared by the categorizer, summarizer and chat.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
    max_output_tokens: Option<usize>,
    cache: Option<ResponseCache>,
    calls: Arc<AtomicUsize>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("timeout", &self.timeout)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl LlmClient {
    /// Wraps a provider with the default timeout and no cache.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
            max_output_tokens: None,
            cache: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A client whose every call fails with [`LlmFailure::Unavailable`].
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledProvider))
    }

    /// Resolves the configured backend.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(settings.timeout_secs);

        let provider: Arc<dyn LlmProvider> = match settings.backend {
            BackendKind::Local => {
                settings.local.validate()?;
                Arc::new(
                    OllamaProvider::with_url(&settings.local.base_url, &settings.local.model)
                        .with_client(http_client(timeout)?),
                )
            }
            BackendKind::CloudFreeTier => {
                let api_key = settings.cloud.validate()?;
                Arc::new(
                    GeminiProvider::new(api_key, &settings.cloud.model)
                        .with_base_url(&settings.cloud.base_url)
                        .with_client(http_client(timeout)?),
                )
            }
            BackendKind::Disabled => Arc::new(DisabledProvider),
        };

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            timeout_secs = settings.timeout_secs,
            "LLM client configured"
        );

        Ok(Self::new(provider)
            .with_timeout(timeout)
            .with_max_output_tokens(settings.max_output_tokens)
            .with_cache_capacity(settings.cache_capacity))
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps the tokens any single call may request.
    pub fn with_max_output_tokens(mut self, max_tokens: usize) -> Self {
        self.max_output_tokens = Some(max_tokens);
        self
    }

    /// Enables an LRU cache of successful completions. Zero disables it.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(|cap| Arc::new(Mutex::new(LruCache::new(cap))));
        self
    }

    /// Whether the backend can produce output at all.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_enabled()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Number of requests sent to the backend (cache hits excluded).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Generates text for `prompt`, trimmed of surrounding whitespace.
    pub async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, LlmFailure> {
        if !self.provider.is_enabled() {
            return Err(LlmFailure::Unavailable("AI backend is disabled".to_string()));
        }

        let max_tokens = match (params.max_tokens, self.max_output_tokens) {
            (Some(wanted), Some(cap)) => Some(wanted.min(cap)),
            (wanted, cap) => wanted.or(cap),
        };

        let key = CacheKey::new(prompt, params, max_tokens);
        if let Some(hit) = self.cache_get(&key) {
            tracing::debug!(provider = self.provider.name(), "LLM cache hit");
            return Ok(hit);
        }

        let mut request =
            CompletionRequest::new(vec![Message::user(prompt)]).with_temperature(params.temperature);
        if let Some(ref system) = params.system_prompt {
            request = request.with_system_prompt(system.clone());
        }
        if let Some(max) = max_tokens {
            request = request.with_max_tokens(max);
        }

        self.calls.fetch_add(1, Ordering::Relaxed);
        let response = match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                let failure = LlmFailure::from(error);
                tracing::warn!(provider = self.provider.name(), error = %failure, "LLM call failed");
                return Err(failure);
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "LLM call timed out"
                );
                return Err(LlmFailure::Timeout);
            }
        };

        let text = response.text.trim();
        if text.is_empty() {
            return Err(LlmFailure::InvalidResponse("empty completion".to_string()));
        }

        self.cache_put(key, text.to_string());
        Ok(text.to_string())
    }

    fn cache_get(&self, key: &CacheKey) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let mut guard = cache.lock().ok()?;
        guard.get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, value: String) {
        if let Some(cache) = &self.cache {
            if let Ok(mut guard) = cache.lock() {
                guard.put(key, value);
            }
        }
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ConfigError::HttpClient)
}
