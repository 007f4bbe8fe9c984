//! Aggregate math over a brand's sentiment counts.

use brandpulse_core::{MetricSnapshot, RiskLevel, RiskThresholds, SentimentCounts};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// `(positive - negative) / total * 100`, or `0` with no classified mentions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn overall_score(counts: &SentimentCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    (counts.positive - counts.negative) as f64 / total as f64 * 100.0
}

/// Share of negative mentions in percent, or `0` with no classified mentions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn negative_pct(counts: &SentimentCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    counts.negative as f64 / total as f64 * 100.0
}

/// Map a negative percentage to a risk level. Each level applies when the
/// percentage is strictly above its threshold.
#[must_use]
pub fn risk_level(negative_pct: f64, thresholds: &RiskThresholds) -> RiskLevel {
    if negative_pct > thresholds.critical {
        RiskLevel::Critical
    } else if negative_pct > thresholds.high {
        RiskLevel::High
    } else if negative_pct > thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Build a new snapshot for `brand_id` from `counts`, stamped `at`.
#[must_use]
pub fn build_snapshot(
    brand_id: Uuid,
    counts: SentimentCounts,
    thresholds: &RiskThresholds,
    at: DateTime<Utc>,
) -> MetricSnapshot {
    MetricSnapshot {
        id: Uuid::new_v4(),
        brand_id,
        timestamp: at,
        positive_count: counts.positive,
        negative_count: counts.negative,
        neutral_count: counts.neutral,
        total_count: counts.total(),
        overall_score: overall_score(&counts),
        risk_level: risk_level(negative_pct(&counts), thresholds),
    }
}
