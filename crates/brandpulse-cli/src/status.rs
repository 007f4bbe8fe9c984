//! Read-only status query.

use sqlx::PgPool;
use uuid::Uuid;

const ALERT_LIMIT: i64 = 5;

/// Print a brand's monitoring state, recent snapshots, and latest alerts.
///
/// # Errors
///
/// Returns an error if the brand does not exist or a query fails.
pub(crate) async fn run_status(pool: &PgPool, brand_id: Uuid, limit: u32) -> anyhow::Result<()> {
    let brand: brandpulse_core::Brand = brandpulse_db::get_brand(pool, brand_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("brand {brand_id} not found"))?
        .into();

    let last_checked = brand
        .last_checked
        .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    println!(
        "{} ({}): monitoring={} last_checked={}",
        brand.name, brand.id, brand.is_monitoring, last_checked
    );

    let snapshots = brandpulse_db::list_recent_snapshots(pool, brand_id, i64::from(limit))
        .await?
        .into_iter()
        .map(brandpulse_core::MetricSnapshot::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if snapshots.is_empty() {
        println!("no snapshots yet; run `analyze --brand-id {brand_id}` first");
    } else {
        println!();
        println!(
            "{:<18}{:>6}{:>6}{:>6}{:>7}{:>9}  RISK",
            "TIMESTAMP", "POS", "NEG", "NEU", "TOTAL", "SCORE"
        );
        for snap in &snapshots {
            println!(
                "{:<18}{:>6}{:>6}{:>6}{:>7}{:>9.2}  {}",
                snap.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                snap.positive_count,
                snap.negative_count,
                snap.neutral_count,
                snap.total_count,
                snap.overall_score,
                snap.risk_level,
            );
        }
    }

    let alerts = brandpulse_db::list_recent_alerts(pool, brand_id, ALERT_LIMIT)
        .await?
        .into_iter()
        .map(brandpulse_core::Alert::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if !alerts.is_empty() {
        println!();
        for alert in &alerts {
            println!(
                "{}  [{}] {}",
                alert.created_at.format("%Y-%m-%d %H:%M"),
                alert.severity.as_str().to_uppercase(),
                alert.message
            );
        }
    }

    Ok(())
}
