//! Ollama HTTP client
//!
//! Talks to a self-hosted model server through `POST /api/generate` with
//! streaming disabled, so each prompt is one request and one JSON reply.

use crate::error::{ConfigError, Error, SummarizationError};
use crate::llm::{request_failed, status_failed, Generation, RetryPolicy, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_HOST: &str = "http://localhost:11434";

const NAME: &str = "ollama";

/// Ollama generate-endpoint client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Reply from `/api/generate` with `stream: false`
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl From<GenerateResponse> for Generation {
    fn from(reply: GenerateResponse) -> Self {
        Generation {
            text: reply.response,
            prompt_tokens: reply.prompt_eval_count,
            completion_tokens: reply.eval_count,
        }
    }
}

impl OllamaClient {
    /// Create a client for `model` on `host` (defaults to
    /// [`DEFAULT_HOST`] when `None`).
    pub fn new(
        host: Option<&str>,
        model: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::Config(ConfigError::InvalidValue {
                    field: "host".to_string(),
                    details: format!("Failed to build HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            http,
            host: normalize_host(host.unwrap_or(DEFAULT_HOST)),
            model: model.to_string(),
            retry,
        })
    }

    /// Generate text with the configured retry policy
    pub async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        self.retry.run(NAME, move || self.generate_once(prompt)).await
    }

    /// Execute a single request without retry
    async fn generate_once(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        let url = format!("{}/api/generate", self.host);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(
            "POST {} [model: {}, prompt: {} chars]",
            url,
            self.model,
            prompt.len()
        );

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_failed(NAME, status, &text));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            SummarizationError::Transport {
                backend: NAME.to_string(),
                details: format!("Failed to parse JSON: {}", e),
                status: Some(status.as_u16()),
            }
        })?;

        debug!(
            "Ollama replied in {}ms [prompt tokens: {:?}, response tokens: {:?}, done: {}]",
            started.elapsed().as_millis(),
            reply.prompt_eval_count,
            reply.eval_count,
            reply.done
        );

        Ok(reply.into())
    }
}

/// Accept `host:port` as well as full URLs, and drop trailing slashes
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait::async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        self.generate(prompt).await
    }

    fn name(&self) -> &str {
        NAME
    }
}
