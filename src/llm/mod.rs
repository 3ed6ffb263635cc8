//! Text-generation backends
//!
//! Summarizers talk to models only through the [`TextGenerator`] trait.
//! Two HTTP implementations ship with the crate: a local Ollama server and
//! the hosted Gemini API.

pub mod gemini;
pub mod ollama;

use crate::error::SummarizationError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Text produced by one backend call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Prompt tokens reported by the backend, for logging only
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the backend, for logging only
    pub completion_tokens: Option<u64>,
}

impl Generation {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Common trait for model backends
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one prompt and return the generated text
    async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError>;

    /// Backend name used in logs and errors (e.g., "ollama", "gemini")
    fn name(&self) -> &str;
}

/// Bounded exponential backoff for transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    pub async fn run<F, Fut, T>(&self, backend: &str, mut attempt: F) -> Result<T, SummarizationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SummarizationError>>,
    {
        let mut attempts = 0;
        let mut backoff = self.initial_backoff;

        loop {
            attempts += 1;
            debug!("{} request attempt {} of {}", backend, attempts, self.max_attempts);

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts >= self.max_attempts => {
                    if attempts > 1 {
                        warn!("{} request failed after {} attempts", backend, attempts);
                    }
                    return Err(e);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        "{} request failed (attempt {}), retrying in {}ms: {}",
                        backend,
                        attempts,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a reqwest failure to a transport error
pub(crate) fn request_failed(backend: &str, err: reqwest::Error) -> SummarizationError {
    let details = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    SummarizationError::Transport {
        backend: backend.to_string(),
        details,
        status: err.status().map(|s| s.as_u16()),
    }
}

/// Map a non-success HTTP reply to a transport error, keeping a short
/// excerpt of the body
pub(crate) fn status_failed(backend: &str, status: reqwest::StatusCode, body: &str) -> SummarizationError {
    let excerpt: String = body.chars().take(200).collect();
    SummarizationError::Transport {
        backend: backend.to_string(),
        details: format!("{}: {}", status, excerpt.trim()),
        status: Some(status.as_u16()),
    }
}
