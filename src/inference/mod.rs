//! External inference plumbing.
//!
//! [`TextGenerator`] is the seam between the orchestration layer and the
//! external model: the production implementation is [`gemini::GeminiClient`],
//! and tests substitute scripted doubles. Every call is an independent,
//! stateless unit of work; one client is safely shared across concurrent
//! tasks and an in-flight call is abandoned by dropping its future.
//!
//! A call moves `Pending -> Sent -> {ParsedOK | ParseFailed | TransportFailed}`.
//! Failures are terminal: the caller (the engine) absorbs them and switches
//! to the fallback synthesizer rather than surfacing an error.

pub mod extract;
pub mod gemini;
pub mod prompts;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while obtaining or interpreting model output.
///
/// None of these propagate to the crate's callers; the engine converts every
/// variant into fallback output.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Network-level failure reaching the endpoint (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status (auth, quota, 5xx).
    #[error("provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    /// A well-formed response that carried no usable text content.
    #[error("response contained no text content")]
    EmptyResponse,

    /// The extracted text was not a valid document of the expected shape.
    /// Carries the raw text for diagnosis.
    #[error("failed to parse model output: {message}")]
    Parse { message: String, raw: String },
}

impl InferenceError {
    /// Whether the failure happened before any text was obtained
    /// (TransportFailed), as opposed to malformed output (ParseFailed).
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Parse { .. })
    }
}

/// A text-generation backend with fixed, deterministic decoding.
///
/// Implementations must be safe to call concurrently; no per-call session
/// state may be shared between requests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Render one completion for `prompt` and return its raw text.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}
