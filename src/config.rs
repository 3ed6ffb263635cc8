use crate::error::{ConfigError, Error, IoError, Result};
use crate::summarize::chunked::DEFAULT_MAX_CHUNK_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Environment variable holding the hosted-model credential
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the local model server address
pub const HOST_ENV: &str = "OLLAMA_HOST";

/// Top-level configuration, optionally loaded from a TOML file and then
/// overridden by command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Which family of backend serves summaries
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Decide from the model identifier
    #[default]
    Auto,
    /// Self-hosted Ollama-compatible server
    Local,
    /// Hosted Gemini API
    Hosted,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::Local => write!(f, "local"),
            Backend::Hosted => write!(f, "hosted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_model")]
    pub model: String,
    /// Use the chunked map-reduce summarizer (local backend only)
    #[serde(default)]
    pub batch: bool,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Local server address; falls back to `OLLAMA_HOST`
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_key: Option<ApiKey>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Attempts per backend call; 1 disables retries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for summarizing a single day
    #[serde(default = "default_day_timeout")]
    pub day_timeout_secs: u64,
    /// Days summarized concurrently
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "qwen3:14b".to_string()
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_request_timeout() -> u64 {
    180
}

fn default_max_attempts() -> u32 {
    1
}

fn default_day_timeout() -> u64 {
    300
}

fn default_jobs() -> usize {
    1
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: Backend::default(),
            model: default_model(),
            batch: false,
            max_chunk_chars: default_max_chunk_chars(),
            host: None,
            api_key: None,
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            day_timeout_secs: default_day_timeout(),
            jobs: default_jobs(),
        }
    }
}

/// API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl Config {
    /// Load a TOML config file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| {
            Error::Io(IoError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })
        })?;
        toml::from_str(&text).map_err(|e| {
            Error::Config(ConfigError::ParseFailed {
                path: path.display().to_string(),
                source: e.to_string(),
            })
        })
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, details: &str| {
            Err(Error::Config(ConfigError::InvalidValue {
                field: field.to_string(),
                details: details.to_string(),
            }))
        };

        if self.summarizer.max_chunk_chars == 0 {
            return invalid("max_chunk_chars", "must be greater than zero");
        }
        if self.summarizer.max_attempts == 0 {
            return invalid("max_attempts", "must be at least 1");
        }
        if self.summarizer.model.trim().is_empty() {
            return invalid("model", "must not be empty");
        }
        if self.pipeline.jobs == 0 {
            return invalid("jobs", "must be at least 1");
        }
        if self.pipeline.day_timeout_secs == 0 {
            return invalid("day_timeout_secs", "must be greater than zero");
        }
        Ok(())
    }
}

impl SummarizerConfig {
    /// Resolve values that may come from the environment. The credential
    /// from the environment wins over an explicit one; an explicit host
    /// wins over the environment.
    pub fn with_environment<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            self.api_key = Some(ApiKey::new(key));
        }
        if self.host.is_none() {
            self.host = non_empty(HOST_ENV);
        }
        self
    }
}
