//! Gemini HTTP client
//!
//! Calls `models/{model}:generateContent` on the hosted Generative Language
//! API. The key travels in the `x-goog-api-key` header so it never shows up
//! in URLs or logs.

use crate::config::ApiKey;
use crate::error::{ConfigError, Error, SummarizationError};
use crate::llm::{request_failed, status_failed, Generation, RetryPolicy, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const NAME: &str = "gemini";

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Reply from `generateContent`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or `None` when the reply carries no
    /// candidate with text parts.
    pub fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

impl GeminiClient {
    pub fn new(
        model: &str,
        api_key: ApiKey,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::Config(ConfigError::InvalidValue {
                    field: "api_key".to_string(),
                    details: format!("Failed to build HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model_id(model).to_string(),
            api_key,
            retry,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Generate text with the configured retry policy
    pub async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        self.retry.run(NAME, move || self.generate_once(prompt)).await
    }

    async fn generate_once(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        let url = self.endpoint();
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("POST {} [prompt: {} chars]", url, prompt.len());

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_failed(NAME, status, &text));
        }

        let reply: GenerateContentResponse = response.json().await.map_err(|e| {
            SummarizationError::Transport {
                backend: NAME.to_string(),
                details: format!("Failed to parse JSON: {}", e),
                status: Some(status.as_u16()),
            }
        })?;

        let usage = reply.usage_metadata.as_ref();
        let prompt_tokens = usage.and_then(|u| u.prompt_token_count);
        let completion_tokens = usage.and_then(|u| u.candidates_token_count);

        debug!(
            "Gemini replied in {}ms [{} candidates, prompt tokens: {:?}, candidate tokens: {:?}]",
            started.elapsed().as_millis(),
            reply.candidates.len(),
            prompt_tokens,
            completion_tokens
        );

        let text = reply.first_text().ok_or_else(|| SummarizationError::EmptyResponse {
            backend: NAME.to_string(),
        })?;

        Ok(Generation {
            text,
            prompt_tokens,
            completion_tokens,
        })
    }
}

/// Bare model id as used in the endpoint path; `models/gemini-x` and
/// `gemini-x` name the same model.
fn model_id(model: &str) -> &str {
    model.trim().trim_start_matches("models/")
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        self.generate(prompt).await
    }

    fn name(&self) -> &str {
        NAME
    }
}
