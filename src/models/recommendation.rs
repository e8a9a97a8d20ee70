use serde::{Deserialize, Serialize};

/// Category of a recommendation.
///
/// The external model is prompted to emit one of the three known values, but
/// model drift can produce anything. Unrecognized strings round-trip through
/// [`RecommendationType::Other`] instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecommendationType {
    CostOptimization,
    FeatureSuggestion,
    UsageImprovement,
    Other(String),
}

impl RecommendationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CostOptimization => "cost_optimization",
            Self::FeatureSuggestion => "feature_suggestion",
            Self::UsageImprovement => "usage_improvement",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for RecommendationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "cost_optimization" => Self::CostOptimization,
            "feature_suggestion" => Self::FeatureSuggestion,
            "usage_improvement" => Self::UsageImprovement,
            _ => Self::Other(s),
        }
    }
}

impl From<RecommendationType> for String {
    fn from(t: RecommendationType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recommendation, produced either by the inference client (parsed
/// from model output) or by the fallback synthesizer.
///
/// Identity and timestamps are assigned by the caller at persistence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub description: String,
    /// Model (or heuristic) confidence in [0, 1]. Defaults to 0 when the
    /// model omits it.
    #[serde(default)]
    pub confidence_score: f64,
    /// Estimated monthly savings in dollars, >= 0.
    #[serde(default)]
    pub potential_savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Top-level document the model is prompted to return for the per-user
/// recommendation use case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsPayload {
    pub recommendations: Vec<RecommendationResult>,
}

/// Number of recommendations the prompt contract demands per user.
pub const EXPECTED_RECOMMENDATIONS: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_round_trip() {
        let json = r#""cost_optimization""#;
        let parsed: RecommendationType = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, RecommendationType::CostOptimization);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }

    #[test]
    fn unknown_type_is_preserved_not_rejected() {
        let parsed: RecommendationType = serde_json::from_str(r#""plan_migration""#).unwrap();
        assert_eq!(parsed, RecommendationType::Other("plan_migration".into()));
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#""plan_migration""#
        );
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"type":"usage_improvement","title":"t","description":"d"}"#;
        let rec: RecommendationResult = serde_json::from_str(json).unwrap();
        assert_eq!(rec.confidence_score, 0.0);
        assert_eq!(rec.potential_savings, 0.0);
        assert!(rec.reasoning.is_none());
    }
}
