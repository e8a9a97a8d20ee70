//! Usage aggregation: reduces a time-windowed sequence of daily usage
//! records into summary statistics and trend signals.
//!
//! # Trend classification
//!
//! The window is split into a "recent" tail and an "older" head:
//!
//! - Fewer than 2 records: trend is `stable`.
//! - 7 or more records: recent = last 7, older = everything before. At
//!   exactly 7 the older head is empty and its mean is taken as 0.
//! - 2 to 6 records: recent = later half (ceiling), older = earlier half.
//!
//! Mean `api_calls` of recent strictly greater than older classifies as
//! `increasing`, otherwise `decreasing`. A tie therefore resolves to
//! `decreasing`. That asymmetry is long-standing observed behavior and is
//! preserved deliberately; see DESIGN.md.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::{AggregateSummary, TrendDirection, UsageRecord, UsageWindow};

/// Tail length used for the trend split on windows of 7+ records.
const RECENT_TAIL_LEN: usize = 7;

/// Sentinel for `days_since_last_activity` when a window has no records,
/// signaling "no recent activity observed".
pub const NO_ACTIVITY_SENTINEL_DAYS: i64 = 999;

/// Reduce a usage window into an [`AggregateSummary`].
///
/// All averages are 0 for an empty window; nothing here divides by zero.
pub fn aggregate(window: &UsageWindow) -> AggregateSummary {
    let records = window.records();

    AggregateSummary {
        total_api_calls: records.iter().map(|r| r.api_calls).sum(),
        total_data_processed_gb: records.iter().map(|r| r.data_processed_gb).sum(),
        avg_session_duration: mean(records, |r| r.session_duration_minutes as f64),
        total_support_tickets: records.iter().map(|r| r.support_tickets).sum(),
        avg_feature_adoption: mean(records, |r| r.feature_adoption_score),
        trend_direction: trend_direction(records),
        days_since_last_activity: days_since_last_activity(records, window.as_of),
        features_used: feature_union(records),
    }
}

/// Classify the API call trend across a window (ascending date order).
pub fn trend_direction(records: &[UsageRecord]) -> TrendDirection {
    if records.len() < 2 {
        return TrendDirection::Stable;
    }

    let split = if records.len() >= RECENT_TAIL_LEN {
        records.len() - RECENT_TAIL_LEN
    } else {
        // Later half gets the extra record on odd lengths.
        records.len() / 2
    };
    let (older, recent) = records.split_at(split);

    let recent_avg = mean(recent, |r| r.api_calls as f64);
    let older_avg = mean(older, |r| r.api_calls as f64);

    if recent_avg > older_avg {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

/// Days between the reference time and the latest record's date.
///
/// Returns [`NO_ACTIVITY_SENTINEL_DAYS`] for an empty window.
pub fn days_since_last_activity(records: &[UsageRecord], as_of: DateTime<Utc>) -> i64 {
    match records.last() {
        Some(latest) => (as_of - latest.date).num_days(),
        None => NO_ACTIVITY_SENTINEL_DAYS,
    }
}

/// Union of feature names used across a window.
///
/// Duplicates collapse; the result is sorted so equality is order-independent.
pub fn feature_union(records: &[UsageRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.features_used.iter().map(String::as_str))
        .collect();
    set.into_iter().map(str::to_string).collect()
}

fn mean(records: &[UsageRecord], f: impl Fn(&UsageRecord) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(f).sum::<f64>() / records.len() as f64
}
