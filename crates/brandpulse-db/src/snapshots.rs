//! Database operations for the `metric_snapshots` table.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use brandpulse_core::{MetricSnapshot, RiskLevel};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `metric_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    pub total_count: i64,
    pub overall_score: Decimal,
    pub risk_level: String,
}

impl TryFrom<SnapshotRow> for MetricSnapshot {
    type Error = DbError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let risk_level =
            row.risk_level
                .parse::<RiskLevel>()
                .map_err(|_| DbError::InvalidColumn {
                    column: "metric_snapshots.risk_level",
                    value: row.risk_level.clone(),
                })?;

        Ok(MetricSnapshot {
            id: row.id,
            brand_id: row.brand_id,
            timestamp: row.timestamp,
            positive_count: row.positive_count,
            negative_count: row.negative_count,
            neutral_count: row.neutral_count,
            total_count: row.total_count,
            overall_score: row.overall_score.to_f64().unwrap_or(0.0),
            risk_level,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Append a snapshot. `overall_score` is stored with two decimal places.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_metric_snapshot(pool: &PgPool, snapshot: &MetricSnapshot) -> Result<(), DbError> {
    let overall_score = Decimal::from_f64(snapshot.overall_score)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2);

    sqlx::query(
        "INSERT INTO metric_snapshots \
             (id, brand_id, timestamp, positive_count, negative_count, neutral_count, \
              total_count, overall_score, risk_level) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(snapshot.id)
    .bind(snapshot.brand_id)
    .bind(snapshot.timestamp)
    .bind(snapshot.positive_count)
    .bind(snapshot.negative_count)
    .bind(snapshot.neutral_count)
    .bind(snapshot.total_count)
    .bind(overall_score)
    .bind(snapshot.risk_level.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Return the `limit` most recent snapshots for a brand, in ascending
/// timestamp order (oldest of the window first).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_snapshots(
    pool: &PgPool,
    brand_id: Uuid,
    limit: i64,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT * FROM ( \
             SELECT id, brand_id, timestamp, positive_count, negative_count, neutral_count, \
                    total_count, overall_score, risk_level \
             FROM metric_snapshots \
             WHERE brand_id = $1 \
             ORDER BY timestamp DESC, id DESC \
             LIMIT $2 \
         ) recent \
         ORDER BY timestamp ASC, id ASC",
    )
    .bind(brand_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
