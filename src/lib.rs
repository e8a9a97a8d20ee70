//! # Auspex
//!
//! Usage-aggregation and external-inference orchestration for a subscription
//! analytics backend.
//!
//! The crate takes per-user daily usage telemetry, reduces it into aggregate
//! and trend features, ships fixed-schema payloads to a Gemini
//! `generateContent` endpoint, and defensively parses the model's JSON
//! output. When the external call fails or returns unparseable text, a
//! deterministic local fallback keeps the output schema intact, so callers
//! never see an error from the three analysis operations.
//!
//! Storage, HTTP routing, and authentication are external collaborators: the
//! embedding service fetches usage rows and user profiles, hands them to
//! [`AnalyticsEngine`], and persists whatever comes back.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use auspex::{AnalyticsEngine, GeminiClient, GeminiConfig};
//!
//! # async fn run(profile: auspex::models::UserProfile, window: auspex::models::UsageWindow) {
//! let config = GeminiConfig::from_env().expect("GEMINI_API_KEY must be set");
//! let http = reqwest::Client::new();
//! let engine = AnalyticsEngine::new(Arc::new(GeminiClient::from_config(&config, http)));
//!
//! // Never fails: degraded results are synthesized locally when Gemini is down.
//! let recommendations = engine.generate_user_recommendations(&profile, &window).await;
//! # let _ = recommendations;
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod fallback;
pub mod inference;
pub mod models;
#[cfg(test)]
mod tests;

pub use config::{ConfigError, GeminiConfig, RetryConfig};
pub use engine::AnalyticsEngine;
pub use inference::{InferenceError, TextGenerator, gemini::GeminiClient};
