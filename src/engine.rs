//! Orchestration of the three analysis operations.
//!
//! [`AnalyticsEngine`] ties the pipeline together: build the envelope for
//! the use case, render its prompt, call the injected [`TextGenerator`],
//! defensively parse the output, and switch to the fallback synthesizer on
//! any failure. The generator is injected at construction, so a process
//! builds its client once during initialization and fails fast on a missing
//! credential instead of discovering it per request.
//!
//! Absorption policy: no operation here ever returns an error. Transport
//! failures and parse failures are logged (parse failures with the raw model
//! text) and converted into deterministic local results that satisfy the
//! same output schema.

use std::sync::Arc;

use tracing::warn;

use crate::{
    envelope::{self, FleetUsageEntry, RecommendationEnvelope, UserRenewalEnvelope},
    fallback::{self, FailureKind},
    inference::{InferenceError, TextGenerator, extract, prompts},
    models::{
        EXPECTED_RECOMMENDATIONS, FleetInsights, RecommendationResult, RecommendationsPayload,
        RenewalPrediction, UsageWindow, UserProfile,
    },
};

/// Stateless front door for the analysis operations.
///
/// Cheap to clone; safe to call concurrently from any number of tasks. The
/// only suspending operation is the external call itself, and dropping a
/// returned future abandons that call without side effects, since nothing is
/// persisted until a full result is available.
#[derive(Clone)]
pub struct AnalyticsEngine {
    generator: Arc<dyn TextGenerator>,
}

impl AnalyticsEngine {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Personalized recommendations for one user.
    ///
    /// Returns a non-empty list in every case: the model's output when it
    /// parses, a locally synthesized substitute otherwise.
    #[tracing::instrument(skip_all, fields(user_id = %profile.user_id, records = window.len()))]
    pub async fn generate_user_recommendations(
        &self,
        profile: &UserProfile,
        window: &UsageWindow,
    ) -> Vec<RecommendationResult> {
        let envelope = RecommendationEnvelope::from_profile(profile, window);
        let prompt = prompts::recommendation_prompt(&envelope);

        let kind = match self.generator.generate(&prompt).await {
            Ok(text) => match extract::parse_payload::<RecommendationsPayload>(&text) {
                Ok(payload) if !payload.recommendations.is_empty() => {
                    if payload.recommendations.len() != EXPECTED_RECOMMENDATIONS {
                        warn!(
                            count = payload.recommendations.len(),
                            expected = EXPECTED_RECOMMENDATIONS,
                            "model returned an unexpected recommendation count, accepting as-is"
                        );
                    }
                    return payload.recommendations;
                }
                Ok(_) => {
                    // A valid document with zero entries would break the
                    // non-empty guarantee; treat it like a parse failure.
                    warn!(raw_text = %text, "model returned an empty recommendation list");
                    FailureKind::Parse
                }
                Err(err) => {
                    log_failure(&err, "user recommendations");
                    FailureKind::Parse
                }
            },
            Err(err) => {
                log_failure(&err, "user recommendations");
                failure_kind(&err)
            }
        };

        fallback::recommendations(&envelope, kind)
    }

    /// Renewal-likelihood analysis over a batch of users.
    #[tracing::instrument(skip_all, fields(users = batch.len()))]
    pub async fn analyze_renewal_likelihood(
        &self,
        batch: &[UserRenewalEnvelope],
    ) -> RenewalPrediction {
        let prompt = prompts::renewal_prompt(batch);

        match self.generate_and_parse::<RenewalPrediction>(&prompt, "renewal likelihood").await {
            Some(prediction) => prediction,
            None => fallback::renewal(batch),
        }
    }

    /// Fleet-wide usage insights over flattened per-record entries.
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub async fn generate_usage_insights(&self, entries: &[FleetUsageEntry]) -> FleetInsights {
        let prompt = prompts::insights_prompt(entries);

        match self.generate_and_parse::<FleetInsights>(&prompt, "usage insights").await {
            Some(insights) => insights,
            None => fallback::insights(entries),
        }
    }

    /// Convenience: aggregate (profile, window) pairs and run the renewal
    /// analysis over the resulting batch.
    pub async fn analyze_renewal_likelihood_for(
        &self,
        users: &[(UserProfile, UsageWindow)],
    ) -> RenewalPrediction {
        let batch = envelope::build_renewal_batch(users);
        self.analyze_renewal_likelihood(&batch).await
    }

    /// Convenience: flatten (profile, window) pairs and run the fleet
    /// insights analysis.
    pub async fn generate_usage_insights_for(
        &self,
        users: &[(UserProfile, UsageWindow)],
    ) -> FleetInsights {
        let entries = envelope::build_fleet_entries(users);
        self.generate_usage_insights(&entries).await
    }

    async fn generate_and_parse<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
        operation: &'static str,
    ) -> Option<T> {
        match self.generator.generate(prompt).await {
            Ok(text) => match extract::parse_payload::<T>(&text) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    log_failure(&err, operation);
                    None
                }
            },
            Err(err) => {
                log_failure(&err, operation);
                None
            }
        }
    }
}

fn failure_kind(err: &InferenceError) -> FailureKind {
    if err.is_transport() {
        FailureKind::Transport
    } else {
        FailureKind::Parse
    }
}

fn log_failure(err: &InferenceError, operation: &str) {
    match err {
        InferenceError::Parse { message, raw } => {
            // The raw text is the only evidence of what the model actually
            // said; keep it in the log for diagnosis.
            warn!(
                operation = operation,
                error = %message,
                raw_text = %raw,
                "failed to parse model output, falling back to local synthesis"
            );
        }
        other => {
            warn!(
                operation = operation,
                error = %other,
                "inference call failed, falling back to local synthesis"
            );
        }
    }
}
