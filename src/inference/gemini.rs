//! Gemini `generateContent` client.
//!
//! Speaks the API-key authenticated Gemini endpoint
//! (`{base}/{model}:generateContent?key=...`) with fixed low-randomness
//! decoding: temperature 0.1, top_p 0.8, top_k 40, bounded output length.
//! Every request carries a wall-clock timeout.
//!
//! The `reqwest::Client` is created once by the embedder and shared; reqwest
//! keeps per-host connection pools internally, so concurrent calls need no
//! coordination here.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{InferenceError, TextGenerator, retry::with_retry};
use crate::config::{GeminiConfig, RetryConfig};

/// Decoding temperature. Low for consistent, repeatable analysis output.
const TEMPERATURE: f64 = 0.1;

/// Nucleus sampling parameter.
const TOP_P: f64 = 0.8;

/// Top-k sampling parameter.
const TOP_K: i32 = 40;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u64,
    temperature: f64,
    top_p: f64,
    top_k: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    /// Thought-summary parts are not payload text.
    #[serde(default)]
    thought: bool,
}

/// Pull the text payload out of a response.
///
/// Primary accessor: the concatenated non-thought text parts of the first
/// candidate. Fallback accessor: the first text part found in any candidate.
fn response_text(response: &GenerateContentResponse) -> Option<String> {
    if let Some(first) = response.candidates.first() {
        let joined: String = first
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if !joined.trim().is_empty() {
            return Some(joined);
        }
    }

    response
        .candidates
        .iter()
        .flat_map(|c| c.content.iter())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.clone())
        .find(|t| !t.trim().is_empty())
}

// ============================================================================
// Client
// ============================================================================

/// Production [`TextGenerator`] backed by the Gemini API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    max_output_tokens: u64,
    retry: RetryConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from configuration and a shared HTTP client.
    pub fn from_config(config: &GeminiConfig, http: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_output_tokens: config.max_output_tokens,
            retry: config.retry.clone(),
            http,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[tracing::instrument(
        skip(self, prompt),
        fields(
            provider = "gemini",
            operation = "generate_content",
            model = %self.model,
            prompt_len = prompt.len()
        )
    )]
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt.to_string())],
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
            }),
        };

        // Pre-serialize the body so retry attempts clone bytes instead of
        // re-serializing the request struct.
        let body = serde_json::to_vec(&request).unwrap_or_default();
        let url = self.generate_url();
        let timeout = self.timeout;

        let response = with_retry(&self.retry, "generate_content", || async {
            self.http
                .post(&url)
                .header("content-type", "application/json")
                .timeout(timeout)
                .body(body.clone())
                .send()
                .await
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Gemini API returned an error status");
            return Err(InferenceError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        response_text(&parsed).ok_or(InferenceError::EmptyResponse)
    }
}
