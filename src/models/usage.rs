use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day of usage telemetry for a single user.
///
/// Records are written by the ingestion pipeline and are immutable once
/// stored; aggregation only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Day-granularity timestamp of the activity.
    pub date: DateTime<Utc>,
    pub api_calls: u64,
    /// Data processed in gigabytes.
    pub data_processed_gb: f64,
    pub session_duration_minutes: u64,
    /// Feature names exercised that day. Duplicates across days collapse
    /// when a window is summarized.
    pub features_used: Vec<String>,
    pub login_frequency: u64,
    pub support_tickets: u64,
    /// Fraction of available features adopted, in [0, 1].
    pub feature_adoption_score: f64,
}

/// Subscription profile for one user, owned by the account subsystem.
///
/// Plan and spend are optional here because the account subsystem allows
/// partially provisioned users; envelope builders substitute documented
/// defaults so the outgoing payload never carries nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub current_plan: Option<String>,
    pub monthly_spend: Option<f64>,
    pub subscription_start: Option<DateTime<Utc>>,
    pub subscription_end: Option<DateTime<Utc>>,
}

/// The time-bounded sequence of one user's usage records considered for a
/// single aggregation or inference call.
///
/// Records are held in ascending date order; the recent-vs-older trend split
/// depends on that ordering. Windows are recomputed per request, never
/// persisted.
#[derive(Debug, Clone)]
pub struct UsageWindow {
    pub user_id: Uuid,
    /// Lookback length in days.
    pub days: u32,
    /// Reference time the window was taken at. Kept explicit so
    /// `days_since_last_activity` is deterministic under test.
    pub as_of: DateTime<Utc>,
    records: Vec<UsageRecord>,
}

/// Default lookback window in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

impl UsageWindow {
    /// Build a window over records fetched for `user_id`, anchored at now.
    pub fn new(user_id: Uuid, records: Vec<UsageRecord>, days: u32) -> Self {
        Self::with_reference_time(user_id, records, days, Utc::now())
    }

    /// Build a window anchored at an explicit reference time.
    pub fn with_reference_time(
        user_id: Uuid,
        mut records: Vec<UsageRecord>,
        days: u32,
        as_of: DateTime<Utc>,
    ) -> Self {
        // Storage is expected to return ascending order; sorting here keeps
        // the trend split correct if it does not.
        records.sort_by_key(|r| r.date);
        Self {
            user_id,
            days,
            as_of,
            records,
        }
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Trend of API call volume across a usage window.
///
/// Locally computed and closed: unlike the externally-parsed enums, no value
/// outside these three can ever be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        };
        f.write_str(s)
    }
}

/// Summary statistics derived from a [`UsageWindow`].
///
/// Purely derived; reconstructable from the raw records at any time without
/// the external inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_api_calls: u64,
    pub total_data_processed_gb: f64,
    /// Mean session duration in minutes; 0 for an empty window.
    pub avg_session_duration: f64,
    pub total_support_tickets: u64,
    /// Mean feature adoption score; 0 for an empty window.
    pub avg_feature_adoption: f64,
    pub trend_direction: TrendDirection,
    /// Days between the window's reference time and the latest record.
    /// `999` when the window is empty.
    pub days_since_last_activity: i64,
    /// Union of feature names seen across the window, sorted.
    pub features_used: Vec<String>,
}
