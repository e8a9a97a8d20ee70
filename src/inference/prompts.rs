//! Prompt templates for the three analysis use cases.
//!
//! Each template pins the output contract the parser depends on: respond
//! with JSON only, use the exact field sets from §6 of the payload schemas,
//! and base the analysis exclusively on the embedded dataset. The envelope
//! is rendered as pretty-printed JSON inside the prompt; keeping the payload
//! shape stable is what keeps the model's output shape stable.

use serde::Serialize;

use crate::envelope::{FleetUsageEntry, RecommendationEnvelope, UserRenewalEnvelope};

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Prompt for the per-user recommendation use case. Demands exactly 3
/// recommendations in a fixed JSON schema.
pub fn recommendation_prompt(envelope: &RecommendationEnvelope) -> String {
    format!(
        r#"You are a subscription analytics assistant. Analyze ONLY the dataset below and produce personalized recommendations for this user.

Requirements:
1. Base the analysis exclusively on the provided data. No outside assumptions.
2. Return EXACTLY 3 recommendations, every time.
3. Respond with valid JSON only. No prose before or after the document.
4. Keep confidence scoring consistent: a value in [0, 1] reflecting how strongly the data supports the recommendation.

User profile and usage data for the requested lookback window:
{data}

Consider usage trends and averages, spend versus usage efficiency, and feature utilization patterns in the data.

Return this JSON structure:
{{
    "recommendations": [
        {{
            "type": "cost_optimization",
            "title": "short title",
            "description": "specific analysis grounded in the usage data",
            "confidence_score": 0.85,
            "potential_savings": 0.0,
            "reasoning": "one-line justification from the data"
        }},
        {{
            "type": "feature_suggestion",
            "title": "...",
            "description": "...",
            "confidence_score": 0.8,
            "potential_savings": 0.0,
            "reasoning": "..."
        }},
        {{
            "type": "usage_improvement",
            "title": "...",
            "description": "...",
            "confidence_score": 0.75,
            "potential_savings": 0.0,
            "reasoning": "..."
        }}
    ]
}}"#,
        data = render(envelope),
    )
}

/// Prompt for the batch renewal-likelihood use case.
pub fn renewal_prompt(batch: &[UserRenewalEnvelope]) -> String {
    format!(
        r#"You are a subscription analytics assistant estimating renewal likelihood. Base the analysis exclusively on the dataset below. No outside assumptions.

Per-user metrics (30-day window):
{data}

For each user weigh API call volume and trend, session and login behavior, support ticket history, feature adoption, subscription tenure, and days until the subscription ends.

Respond with valid JSON only, using numbers for all numeric fields:
{{
    "overall_metrics": {{
        "average_renewal_likelihood": 0.75,
        "high_risk_users": 0,
        "likely_renewals": 0,
        "total_analyzed": {total}
    }},
    "user_predictions": [
        {{
            "user_id": "uuid from the dataset",
            "renewal_likelihood": 0.85,
            "risk_level": "low|medium|high",
            "key_factors": ["metric observed in the data"],
            "recommended_actions": ["action grounded in the data"]
        }}
    ],
    "insights": [
        "insight derived only from the provided dataset"
    ]
}}"#,
        data = render(&batch),
        total = batch.len(),
    )
}

/// Prompt for the fleet-wide usage-insights use case.
pub fn insights_prompt(entries: &[FleetUsageEntry]) -> String {
    format!(
        r#"You are a subscription analytics assistant summarizing usage patterns across all users. Base every insight exclusively on the dataset below. No outside assumptions.

Per-record usage data across the fleet:
{data}

Apply descriptive statistics, group users by observed behavior, identify trends over the covered period, and flag anomalies present in the data.

Respond with valid JSON only, using numbers for all numeric fields:
{{
    "usage_trends": {{
        "total_api_calls": 0,
        "average_session_duration": 0.0,
        "most_used_features": ["feature from the dataset"],
        "data_period_analyzed": "period covered by the dataset"
    }},
    "user_segments": [
        {{
            "segment": "segment name from the analysis",
            "count": 0,
            "characteristics": ["characteristic found in the data"],
            "revenue_contribution": 0.0
        }}
    ],
    "recommendations": [
        "recommendation based only on dataset patterns"
    ],
    "alerts": [
        "alert derived from dataset anomalies"
    ]
}}"#,
        data = render(&entries),
    )
}
