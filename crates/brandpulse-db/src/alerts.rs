//! Database operations for the `alerts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use brandpulse_core::{Alert, AlertKind, Severity};

use crate::DbError;

/// A row from the `alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub kind: String,
    pub message: String,
    pub severity: String,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = DbError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<AlertKind>()
            .map_err(|_| DbError::InvalidColumn {
                column: "alerts.type",
                value: row.kind.clone(),
            })?;
        let severity = row
            .severity
            .parse::<Severity>()
            .map_err(|_| DbError::InvalidColumn {
                column: "alerts.severity",
                value: row.severity.clone(),
            })?;

        Ok(Alert {
            id: row.id,
            brand_id: row.brand_id,
            kind,
            message: row.message,
            severity,
            acknowledged: row.acknowledged,
            created_at: row.created_at,
        })
    }
}

const ALERT_COLUMNS: &str =
    "id, brand_id, type AS kind, message, severity, acknowledged, created_at";

/// Append an alert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_alert(pool: &PgPool, alert: &Alert) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO alerts (id, brand_id, type, message, severity, acknowledged, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(alert.id)
    .bind(alert.brand_id)
    .bind(alert.kind.as_str())
    .bind(&alert.message)
    .bind(alert.severity.as_str())
    .bind(alert.acknowledged)
    .bind(alert.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a brand's most recent alerts, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_alerts(
    pool: &PgPool,
    brand_id: Uuid,
    limit: i64,
) -> Result<Vec<AlertRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} \
         FROM alerts \
         WHERE brand_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(brand_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Return the newest alert of `kind` for a brand, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_alert_of_kind(
    pool: &PgPool,
    brand_id: Uuid,
    kind: AlertKind,
) -> Result<Option<AlertRow>, DbError> {
    let row = sqlx::query_as::<_, AlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} \
         FROM alerts \
         WHERE brand_id = $1 AND type = $2 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1"
    ))
    .bind(brand_id)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
