//! The crisis alert rule.

use brandpulse_core::{Alert, AlertKind, MetricSnapshot, RiskLevel, Severity};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metrics::negative_pct;

/// Message text for a critical-sentiment alert.
#[must_use]
pub fn critical_message(negative_pct: f64) -> String {
    format!("Critical negative sentiment detected: {negative_pct:.1}% negative mentions")
}

/// Returns the alert a snapshot raises, if any. Only critical snapshots do.
#[must_use]
pub fn alert_for_snapshot(snapshot: &MetricSnapshot, at: DateTime<Utc>) -> Option<Alert> {
    if snapshot.risk_level != RiskLevel::Critical {
        return None;
    }

    Some(Alert {
        id: Uuid::new_v4(),
        brand_id: snapshot.brand_id,
        kind: AlertKind::CriticalSentiment,
        message: critical_message(negative_pct(&snapshot.counts())),
        severity: Severity::Critical,
        acknowledged: false,
        created_at: at,
    })
}
