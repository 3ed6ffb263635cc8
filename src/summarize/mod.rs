//! Pluggable day summarizers
//!
//! [`Summarizer`] is a closed set of strategies chosen once at startup by
//! [`Summarizer::from_config`]. Only the transport underneath is a trait
//! object ([`TextGenerator`]), so any strategy can run against a scripted
//! backend in tests.

pub mod chunked;
pub mod cleanup;
pub mod prompts;

use crate::config::{Backend, SummarizerConfig, API_KEY_ENV};
use crate::error::{ConfigError, Error, SummarizationError};
use crate::git::CommitRecord;
use crate::llm::gemini::GeminiClient;
use crate::llm::ollama::OllamaClient;
use crate::llm::{RetryPolicy, TextGenerator};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use chunked::{ChunkBuffer, ChunkedSummarizer};
pub use cleanup::{clean_response, strip_reasoning};

/// Strategy selected by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizerKind {
    NoOp,
    SingleShotRemote,
    SingleShotLocal,
    ChunkedLocal,
}

impl fmt::Display for SummarizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizerKind::NoOp => write!(f, "disabled"),
            SummarizerKind::SingleShotRemote => write!(f, "hosted"),
            SummarizerKind::SingleShotLocal => write!(f, "local"),
            SummarizerKind::ChunkedLocal => write!(f, "local (chunked)"),
        }
    }
}

/// Hosted models are recognized by name
pub fn is_hosted_model(model: &str) -> bool {
    let name = model.trim().trim_start_matches("models/");
    name.starts_with("gemini-")
}

/// Backend selection policy, independent of credentials and clients.
pub fn select_kind(config: &SummarizerConfig) -> SummarizerKind {
    if !config.enabled {
        return SummarizerKind::NoOp;
    }
    if config.batch {
        return SummarizerKind::ChunkedLocal;
    }
    match config.backend {
        Backend::Hosted => SummarizerKind::SingleShotRemote,
        Backend::Local => SummarizerKind::SingleShotLocal,
        Backend::Auto if is_hosted_model(&config.model) => SummarizerKind::SingleShotRemote,
        Backend::Auto => SummarizerKind::SingleShotLocal,
    }
}

#[derive(Clone)]
pub enum Summarizer {
    /// Summarization disabled
    NoOp,
    /// One call to a hosted model with messages and diffs
    SingleShotRemote(Arc<dyn TextGenerator>),
    /// One call to a local model with messages, reasoning trace removed
    SingleShotLocal(Arc<dyn TextGenerator>),
    /// Chunked map-reduce against a local model
    ChunkedLocal(ChunkedSummarizer),
}

impl fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summarizer::NoOp => write!(f, "NoOp"),
            Summarizer::SingleShotRemote(backend) => write!(f, "SingleShotRemote({})", backend.name()),
            Summarizer::SingleShotLocal(backend) => write!(f, "SingleShotLocal({})", backend.name()),
            Summarizer::ChunkedLocal(chunked) => write!(f, "{:?}", chunked),
        }
    }
}

impl Summarizer {
    /// Build the summarizer described by `config`. Fails when the hosted
    /// backend is selected without an API key.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, Error> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let retry = RetryPolicy::with_attempts(config.max_attempts);

        let local = || -> Result<Arc<dyn TextGenerator>, Error> {
            Ok(Arc::new(OllamaClient::new(
                config.host.as_deref(),
                &config.model,
                timeout,
                retry,
            )?))
        };

        let summarizer = match select_kind(config) {
            SummarizerKind::NoOp => Summarizer::NoOp,
            SummarizerKind::SingleShotRemote => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    Error::Config(ConfigError::MissingCredential {
                        backend: "Gemini".to_string(),
                        env_var: API_KEY_ENV.to_string(),
                    })
                })?;
                let client = GeminiClient::new(&config.model, api_key, timeout, retry)?;
                Summarizer::SingleShotRemote(Arc::new(client))
            }
            SummarizerKind::SingleShotLocal => Summarizer::SingleShotLocal(local()?),
            SummarizerKind::ChunkedLocal => {
                Summarizer::ChunkedLocal(ChunkedSummarizer::new(local()?, config.max_chunk_chars))
            }
        };

        Ok(summarizer)
    }

    pub fn kind(&self) -> SummarizerKind {
        match self {
            Summarizer::NoOp => SummarizerKind::NoOp,
            Summarizer::SingleShotRemote(_) => SummarizerKind::SingleShotRemote,
            Summarizer::SingleShotLocal(_) => SummarizerKind::SingleShotLocal,
            Summarizer::ChunkedLocal(_) => SummarizerKind::ChunkedLocal,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Summarizer::NoOp)
    }

    /// Produce a digest of `commits`. Empty input yields an empty digest
    /// without contacting any backend.
    pub async fn summarize(&self, commits: &[CommitRecord]) -> Result<String, SummarizationError> {
        if commits.is_empty() {
            return Ok(String::new());
        }

        match self {
            Summarizer::NoOp => Ok(String::new()),
            Summarizer::SingleShotRemote(backend) => {
                let reply = backend.generate(&prompts::remote_prompt(commits)).await?;
                let text = reply.text.trim();
                if text.is_empty() {
                    return Err(SummarizationError::EmptyResponse {
                        backend: backend.name().to_string(),
                    });
                }
                Ok(text.to_string())
            }
            Summarizer::SingleShotLocal(backend) => {
                let reply = backend.generate(&prompts::local_prompt(commits)).await?;
                clean_response(backend.name(), &reply.text)
            }
            Summarizer::ChunkedLocal(chunked) => chunked.summarize(commits).await,
        }
    }

    /// [`Summarizer::summarize`] bounded by `deadline`.
    pub async fn summarize_within(
        &self,
        commits: &[CommitRecord],
        deadline: Duration,
    ) -> Result<String, SummarizationError> {
        debug!("Summarizing {} commits with {} backend", commits.len(), self.kind());
        tokio::time::timeout(deadline, self.summarize(commits))
            .await
            .map_err(|_| SummarizationError::Timeout {
                secs: deadline.as_secs(),
            })?
    }
}
