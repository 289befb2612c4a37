//! Application settings and configuration types.
//!
//! Settings are read from `settings.json` in the user's config directory
//! (XDG or platform equivalent), with a handful of environment variables
//! able to override the AI backend selection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::CategoryLabel;
use crate::providers::ai::{
    DEFAULT_TIMEOUT, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL, OLLAMA_DEFAULT_MODEL,
    OLLAMA_DEFAULT_URL,
};
use crate::services::MatchRule;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} is required for the cloud backend")]
    MissingApiKey(&'static str),

    #[error("{field} is not a valid URL ({value}): {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// LLM backend configuration.
    pub ai: AiSettings,
    /// Hybrid categorizer tuning.
    pub categorizer: CategorizerSettings,
    /// Summarizer tuning.
    pub summary: SummarySettings,
    /// Chat assistant tuning.
    pub chat: ChatSettings,
    /// Run-level options.
    pub pipeline: PipelineSettings,
    /// Replaces the built-in rule list when present.
    pub rules: Option<Vec<MatchRule>>,
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "inbox-brief")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from the default location, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads settings from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup.
    ///
    /// Recognized keys: `LLM_PROVIDER` (`ollama`, `gemini`, `none`),
    /// `OLLAMA_BASE_URL`, `OLLAMA_MODEL`, `GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `SUMMARY_LIMIT`, `LLM_TIMEOUT_SECS`, `MAX_EMAILS_TO_PROCESS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("LLM_PROVIDER") {
            self.ai.backend = BackendKind::from_provider_name(&provider).ok_or(
                ConfigError::InvalidValue {
                    key: "LLM_PROVIDER",
                    value: provider,
                },
            )?;
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.ai.local.base_url = url;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.ai.local.model = model;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.ai.cloud.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.ai.cloud.model = model;
        }
        if let Some(limit) = get("SUMMARY_LIMIT") {
            self.summary.body_limit = parse_number("SUMMARY_LIMIT", limit)?;
        }
        if let Some(secs) = get("LLM_TIMEOUT_SECS") {
            self.ai.timeout_secs = parse_number("LLM_TIMEOUT_SECS", secs)?;
        }
        if let Some(max) = get("MAX_EMAILS_TO_PROCESS") {
            self.pipeline.max_emails = parse_number("MAX_EMAILS_TO_PROCESS", max)?;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

/// Which LLM backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// A local model server (Ollama).
    Local,
    /// A hosted API on its free tier (Gemini).
    CloudFreeTier,
    /// No language model; rules and excerpts only.
    Disabled,
}

impl BackendKind {
    /// Maps the provider names used in environment overrides.
    pub fn from_provider_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ollama" | "local" => Some(BackendKind::Local),
            "gemini" | "cloud" | "cloud_free_tier" => Some(BackendKind::CloudFreeTier),
            "none" | "disabled" => Some(BackendKind::Disabled),
            _ => None,
        }
    }
}

/// LLM backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Selected backend.
    pub backend: BackendKind,
    /// Local model server settings.
    pub local: LocalModelSettings,
    /// Cloud API settings.
    pub cloud: CloudSettings,
    /// Timeout applied to every call, in seconds.
    pub timeout_secs: u64,
    /// Upper bound on tokens requested by any call.
    pub max_output_tokens: usize,
    /// Entries kept in the response cache (0 disables caching).
    pub cache_capacity: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            local: LocalModelSettings::default(),
            cloud: CloudSettings::default(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_output_tokens: 500,
            cache_capacity: 256,
        }
    }
}

/// Local model server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelSettings {
    /// Ollama server, e.g. `http://localhost:11434`. A trailing `/v1` is
    /// optional.
    pub base_url: String,
    /// Model name.
    pub model: String,
}

impl Default for LocalModelSettings {
    fn default() -> Self {
        Self {
            base_url: OLLAMA_DEFAULT_URL.to_string(),
            model: OLLAMA_DEFAULT_MODEL.to_string(),
        }
    }
}

impl LocalModelSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("ai.local.base_url", &self.base_url)
    }
}

/// Cloud API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    /// API key. Required when the cloud backend is selected.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// API base URL.
    pub base_url: String,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GEMINI_DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

impl CloudSettings {
    /// Checks the endpoint and returns the API key.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        validate_url("ai.cloud.base_url", &self.base_url)?;
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey("ai.cloud.api_key"))
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
            source,
        })
}

/// Hybrid categorizer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerSettings {
    /// Label used when rules are inconclusive and the model fails.
    pub default_label: CategoryLabel,
    /// Body characters included in the classification prompt.
    pub body_chars: usize,
    /// Sampling temperature for classification.
    pub temperature: f32,
    /// Tokens requested for the label.
    pub max_tokens: usize,
}

impl Default for CategorizerSettings {
    fn default() -> Self {
        Self {
            default_label: CategoryLabel::Other,
            body_chars: 500,
            temperature: 0.1,
            max_tokens: 10,
        }
    }
}

/// Summarizer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Body characters sent to the model.
    pub body_limit: usize,
    /// Characters kept when falling back to an excerpt.
    pub excerpt_chars: usize,
    /// Sampling temperature for summaries.
    pub temperature: f32,
    /// Tokens requested for the summary.
    pub max_tokens: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            body_limit: 1000,
            excerpt_chars: 200,
            temperature: 0.5,
            max_tokens: 150,
        }
    }
}

/// Chat assistant tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Sample emails included in the grounding context.
    pub sample_size: usize,
    /// Characters of each sample summary included.
    pub summary_chars: usize,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Tokens requested for an answer.
    pub max_tokens: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            sample_size: 10,
            summary_chars: 160,
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

/// Run-level options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Emails processed at once. Output order never depends on this.
    pub concurrency: usize,
    /// Leading records processed per run; the rest are skipped. Zero means
    /// no limit.
    pub max_emails: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_emails: 50,
        }
    }
}
