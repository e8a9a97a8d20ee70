//! Inference client configuration.
//!
//! The external credential is required at construction time, never per
//! request: [`GeminiConfig::from_env`] fails fast with
//! [`ConfigError::MissingApiKey`] so a misconfigured process cannot start
//! serving requests that would silently degrade to fallback output.
//!
//! Retries are disabled by default. The upstream behavior this crate
//! reproduces makes exactly one attempt per inference call, so bounded
//! backoff is an explicit opt-in via [`RetryConfig`], not a silent change
//! of contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model used for all three analysis use cases.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Default endpoint for API-key authenticated Gemini calls.
pub const DEFAULT_BASE_URL: &str = "https://aiplatform.googleapis.com/v1/publishers/google/models";

/// Configuration errors. The only error this crate surfaces to callers.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing Gemini API key: set {API_KEY_ENV} or provide one explicitly")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Configuration for the Gemini inference client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter.
    pub api_key: String,

    /// Base URL up to (not including) the model segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name, e.g. `gemini-2.5-pro`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Wall-clock timeout per request in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Output token cap for generated responses.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u64,

    /// Retry policy. Disabled by default (single attempt).
    #[serde(default)]
    pub retry: RetryConfig,
}

impl GeminiConfig {
    /// Build a config with default endpoint, model, and timeouts.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            retry: RetryConfig::default(),
        })
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) => Self::new(key),
            Err(_) => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Validation(
                "max_output_tokens must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry policy for inference requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Whether retries are enabled. Off by default: a failed call goes
    /// straight to the fallback synthesizer.
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of retry attempts (not including the initial request).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Random jitter applied to delays (fraction of the delay, 0.0-1.0).
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Status codes that should trigger a retry.
    #[serde(default = "default_retryable_status_codes")]
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
            retryable_status_codes: default_retryable_status_codes(),
        }
    }
}

impl RetryConfig {
    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.enabled && self.retryable_status_codes.contains(&status)
    }

    /// Calculate the delay for a given retry attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let base_delay =
            (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let jitter_range = capped_delay * self.jitter;
        let jitter = if jitter_range > 0.0 {
            use rand::Rng;
            rand::thread_rng().gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };

        let final_delay = (capped_delay + jitter).max(0.0);
        std::time::Duration::from_millis(final_delay as u64)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_output_tokens() -> u64 {
    4096
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

fn default_retryable_status_codes() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_requires_api_key() {
        temp_env::with_var_unset(API_KEY_ENV, || {
            assert!(matches!(
                GeminiConfig::from_env(),
                Err(ConfigError::MissingApiKey)
            ));
        });
    }

    #[test]
    fn from_env_reads_api_key() {
        temp_env::with_var(API_KEY_ENV, Some("test-key"), || {
            let config = GeminiConfig::from_env().unwrap();
            assert_eq!(config.api_key, "test-key");
            assert_eq!(config.model, DEFAULT_MODEL);
            assert_eq!(config.timeout_secs, 30);
            assert!(!config.retry.enabled);
        });
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiConfig::new(""),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn retry_disabled_never_matches_status() {
        let config = RetryConfig::default();
        assert!(!config.should_retry_status(503));

        let enabled = RetryConfig {
            enabled: true,
            ..RetryConfig::default()
        };
        assert!(enabled.should_retry_status(503));
        assert!(!enabled.should_retry_status(404));
    }

    #[test]
    fn backoff_delays_grow_and_cap() {
        let config = RetryConfig {
            enabled: true,
            initial_delay_ms: 100,
            max_delay_ms: 300,
            backoff_multiplier: 2.0,
            jitter: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        // Capped at max_delay_ms from the third attempt on.
        assert_eq!(config.delay_for_attempt(2).as_millis(), 300);
        assert_eq!(config.delay_for_attempt(5).as_millis(), 300);
    }
}
