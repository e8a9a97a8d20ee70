//! Feature envelopes: the exact payload objects handed to the external
//! inference call, one closed schema per use case.
//!
//! The prompt templates depend on these shapes staying stable, so the field
//! sets are closed by construction and numeric fields are never null:
//! missing profile fields are substituted with documented defaults
//! (`"Unknown"` for the plan, 0 for spend and durations) rather than
//! reported as errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    aggregate,
    models::{TrendDirection, UsageRecord, UsageWindow, UserProfile},
};

/// Plan name substituted when the profile has none.
pub const UNKNOWN_PLAN: &str = "Unknown";

/// Sentinel for "no subscription end on record", mirroring the
/// no-activity sentinel used by the aggregator.
const NO_SUBSCRIPTION_END_DAYS: i64 = 999;

/// One raw usage record as rendered into an outgoing payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    pub date: DateTime<Utc>,
    pub api_calls: u64,
    pub data_processed_gb: f64,
    pub features_used: Vec<String>,
    pub session_duration_minutes: u64,
    pub login_frequency: u64,
    pub support_tickets: u64,
    pub feature_adoption_score: f64,
}

impl From<&UsageRecord> for UsageEntry {
    fn from(r: &UsageRecord) -> Self {
        Self {
            date: r.date,
            api_calls: r.api_calls,
            data_processed_gb: r.data_processed_gb,
            features_used: r.features_used.clone(),
            session_duration_minutes: r.session_duration_minutes,
            login_frequency: r.login_frequency,
            support_tickets: r.support_tickets,
            feature_adoption_score: r.feature_adoption_score,
        }
    }
}

/// Payload for the per-user recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEnvelope {
    pub current_plan: String,
    pub monthly_spend: f64,
    pub subscription_duration_days: i64,
    pub usage: Vec<UsageEntry>,
}

impl RecommendationEnvelope {
    pub fn from_profile(profile: &UserProfile, window: &UsageWindow) -> Self {
        Self {
            current_plan: plan_or_unknown(profile),
            monthly_spend: profile.monthly_spend.unwrap_or(0.0),
            subscription_duration_days: subscription_days(profile, window.as_of),
            usage: window.records().iter().map(UsageEntry::from).collect(),
        }
    }
}

/// One user's row in the batch renewal-likelihood payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRenewalEnvelope {
    pub user_id: Uuid,
    pub username: String,
    pub current_plan: String,
    pub monthly_spend: f64,
    pub subscription_days: i64,
    pub usage_trend: TrendDirection,
    pub total_api_calls_30d: u64,
    pub support_tickets_30d: u64,
    pub avg_feature_adoption_score: f64,
    pub days_since_last_login: i64,
    /// Days until the subscription ends; 999 when no end date is on record.
    pub subscription_end_days: i64,
}

impl UserRenewalEnvelope {
    pub fn from_profile(profile: &UserProfile, window: &UsageWindow) -> Self {
        let summary = aggregate::aggregate(window);
        Self {
            user_id: profile.user_id,
            username: profile.username.clone(),
            current_plan: plan_or_unknown(profile),
            monthly_spend: profile.monthly_spend.unwrap_or(0.0),
            subscription_days: subscription_days(profile, window.as_of),
            usage_trend: summary.trend_direction,
            total_api_calls_30d: summary.total_api_calls,
            support_tickets_30d: summary.total_support_tickets,
            avg_feature_adoption_score: summary.avg_feature_adoption,
            days_since_last_login: summary.days_since_last_activity,
            subscription_end_days: profile
                .subscription_end
                .map(|end| (end - window.as_of).num_days())
                .unwrap_or(NO_SUBSCRIPTION_END_DAYS),
        }
    }
}

/// One per-record row in the flattened fleet usage-insights payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetUsageEntry {
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub api_calls: u64,
    pub data_processed_gb: f64,
    pub session_duration_minutes: u64,
    pub features_used: Vec<String>,
    pub support_tickets: u64,
    pub feature_adoption_score: f64,
}

impl FleetUsageEntry {
    pub fn from_record(user_id: Uuid, r: &UsageRecord) -> Self {
        Self {
            user_id,
            date: r.date,
            api_calls: r.api_calls,
            data_processed_gb: r.data_processed_gb,
            session_duration_minutes: r.session_duration_minutes,
            features_used: r.features_used.clone(),
            support_tickets: r.support_tickets,
            feature_adoption_score: r.feature_adoption_score,
        }
    }
}

/// Fleet mode: one renewal row per user, in input order.
pub fn build_renewal_batch(users: &[(UserProfile, UsageWindow)]) -> Vec<UserRenewalEnvelope> {
    users
        .iter()
        .map(|(profile, window)| UserRenewalEnvelope::from_profile(profile, window))
        .collect()
}

/// Fleet mode: flatten every user's records into a single entry list.
pub fn build_fleet_entries(users: &[(UserProfile, UsageWindow)]) -> Vec<FleetUsageEntry> {
    users
        .iter()
        .flat_map(|(profile, window)| {
            window
                .records()
                .iter()
                .map(|r| FleetUsageEntry::from_record(profile.user_id, r))
        })
        .collect()
}

fn plan_or_unknown(profile: &UserProfile) -> String {
    profile
        .current_plan
        .clone()
        .unwrap_or_else(|| UNKNOWN_PLAN.to_string())
}

fn subscription_days(profile: &UserProfile, as_of: DateTime<Utc>) -> i64 {
    profile
        .subscription_start
        .map(|start| (as_of - start).num_days())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn profile() -> UserProfile {
        UserProfile {
            user_id: Uuid::new_v4(),
            username: "ada".into(),
            current_plan: Some("Pro".into()),
            monthly_spend: Some(49.0),
            subscription_start: Some(as_of() - Duration::days(120)),
            subscription_end: Some(as_of() + Duration::days(45)),
        }
    }

    fn record(days_ago: i64, api_calls: u64) -> UsageRecord {
        UsageRecord {
            date: as_of() - Duration::days(days_ago),
            api_calls,
            data_processed_gb: 0.5,
            session_duration_minutes: 20,
            features_used: vec!["export".into()],
            login_frequency: 1,
            support_tickets: 1,
            feature_adoption_score: 0.4,
        }
    }

    fn window(records: Vec<UsageRecord>) -> UsageWindow {
        UsageWindow::with_reference_time(Uuid::new_v4(), records, 30, as_of())
    }

    #[test]
    fn missing_profile_fields_are_substituted_never_null() {
        let bare = UserProfile {
            user_id: Uuid::new_v4(),
            username: "joe".into(),
            current_plan: None,
            monthly_spend: None,
            subscription_start: None,
            subscription_end: None,
        };
        let envelope = RecommendationEnvelope::from_profile(&bare, &window(vec![]));
        assert_eq!(envelope.current_plan, UNKNOWN_PLAN);
        assert_eq!(envelope.monthly_spend, 0.0);
        assert_eq!(envelope.subscription_duration_days, 0);

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(!json["monthly_spend"].is_null());
        assert!(!json["subscription_duration_days"].is_null());
    }

    #[test]
    fn renewal_envelope_carries_window_aggregates() {
        let w = window(vec![record(3, 200), record(2, 300)]);
        let envelope = UserRenewalEnvelope::from_profile(&profile(), &w);

        assert_eq!(envelope.total_api_calls_30d, 500);
        assert_eq!(envelope.support_tickets_30d, 2);
        assert_eq!(envelope.days_since_last_login, 2);
        assert_eq!(envelope.subscription_days, 120);
        assert_eq!(envelope.subscription_end_days, 45);
        assert_eq!(envelope.usage_trend, TrendDirection::Increasing);
    }

    #[test]
    fn fleet_entries_flatten_across_users() {
        let users = vec![
            (profile(), window(vec![record(1, 10), record(2, 20)])),
            (profile(), window(vec![record(1, 30)])),
        ];
        let entries = build_fleet_entries(&users);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].user_id, users[0].0.user_id);
        assert_eq!(entries[2].user_id, users[1].0.user_id);
    }

    #[test]
    fn recommendation_payload_has_closed_field_set() {
        let envelope = RecommendationEnvelope::from_profile(&profile(), &window(vec![record(1, 5)]));
        let json = serde_json::to_value(&envelope).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec![
                "current_plan",
                "monthly_spend",
                "subscription_duration_days",
                "usage"
            ]
        );
        let entry_keys: Vec<&String> = json["usage"][0].as_object().unwrap().keys().collect();
        assert_eq!(entry_keys.len(), 8);
    }
}
