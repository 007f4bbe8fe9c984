use brandpulse_core::{MetricSnapshot, RiskThresholds};
use brandpulse_sentiment::build_snapshot;
use chrono::Utc;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::store::MonitorStore;

/// Count the brand's classified mentions and append a new snapshot.
///
/// # Errors
///
/// Returns [`MonitorError::Db`] if counting or the insert fails; no snapshot
/// is stored in that case.
pub async fn recompute(
    store: &dyn MonitorStore,
    brand_id: Uuid,
    thresholds: &RiskThresholds,
) -> Result<MetricSnapshot, MonitorError> {
    let counts = store.sentiment_counts(brand_id).await?;
    let snapshot = build_snapshot(brand_id, counts, thresholds, Utc::now());
    store.insert_snapshot(&snapshot).await?;

    tracing::info!(
        brand_id = %brand_id,
        total = snapshot.total_count,
        score = snapshot.overall_score,
        risk = %snapshot.risk_level,
        "snapshot recorded"
    );
    Ok(snapshot)
}
