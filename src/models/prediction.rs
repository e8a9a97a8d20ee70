use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Churn risk bucket for one user.
///
/// Parsed from model output; unrecognized strings land in
/// [`RiskLevel::Unknown`] so model drift degrades gracefully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown(s),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(r: RiskLevel) -> Self {
        r.as_str().to_string()
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

/// Fleet-level renewal metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    #[serde(default)]
    pub average_renewal_likelihood: f64,
    #[serde(default)]
    pub high_risk_users: u64,
    #[serde(default)]
    pub likely_renewals: u64,
    #[serde(default)]
    pub total_analyzed: u64,
}

/// Per-user renewal prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPrediction {
    pub user_id: Uuid,
    #[serde(default)]
    pub renewal_likelihood: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

/// Structured result of the batch renewal-likelihood analysis.
///
/// Every field defaults so a structurally valid but sparse model response
/// still deserializes; which fields were defaulted is observable in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenewalPrediction {
    #[serde(default)]
    pub overall_metrics: OverallMetrics,
    #[serde(default)]
    pub user_predictions: Vec<UserPrediction>,
    #[serde(default)]
    pub insights: Vec<String>,
}

/// Fleet-wide usage totals reported by the insights analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTrends {
    #[serde(default)]
    pub total_api_calls: u64,
    #[serde(default)]
    pub average_session_duration: f64,
    #[serde(default)]
    pub most_used_features: Vec<String>,
    #[serde(default)]
    pub data_period_analyzed: String,
}

/// One behavioral segment of the user base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSegment {
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub characteristics: Vec<String>,
    /// Fraction of total revenue attributed to the segment, in [0, 1].
    #[serde(default)]
    pub revenue_contribution: f64,
}

/// Structured result of the fleet usage-insights analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetInsights {
    #[serde(default)]
    pub usage_trends: UsageTrends,
    #[serde(default)]
    pub user_segments: Vec<UserSegment>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub alerts: Vec<String>,
}
