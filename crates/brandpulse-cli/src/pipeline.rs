//! One-shot pipeline commands against the Postgres store.

use std::sync::Arc;

use brandpulse_core::{AppConfig, MetricSnapshot};
use brandpulse_monitor::{build_deps, Monitor, MonitorStore, PgStore};
use sqlx::PgPool;
use uuid::Uuid;

fn build_monitor(config: &AppConfig, pool: PgPool) -> anyhow::Result<Monitor> {
    let pipeline = brandpulse_core::load_pipeline_config(config.pipeline_config_path.as_deref())?;
    let store: Arc<dyn MonitorStore> = Arc::new(PgStore::new(pool));
    Ok(Monitor::new(build_deps(config, pipeline, store)?))
}

pub(crate) fn format_metrics(snapshot: &MetricSnapshot) -> String {
    format!(
        "positive={} negative={} neutral={} total={} score={:.2} risk={}",
        snapshot.positive_count,
        snapshot.negative_count,
        snapshot.neutral_count,
        snapshot.total_count,
        snapshot.overall_score,
        snapshot.risk_level,
    )
}

/// Register `brand` and run one full cycle. Does not schedule repeats; the
/// server picks the brand up on its next start.
///
/// # Errors
///
/// Returns an error if the name is invalid or the brand cannot be stored.
pub(crate) async fn run_monitor(
    config: &AppConfig,
    pool: PgPool,
    brand: &str,
    json: bool,
) -> anyhow::Result<()> {
    let monitor = build_monitor(config, pool)?;
    let brand = monitor.register_brand(brand).await?;
    let report = monitor.run_cycle(&brand, true).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("brand:     {} ({})", brand.name, brand.id);
    match report.ingest {
        Some(ingest) => println!(
            "ingested:  {} fetched, {} new, {} duplicate",
            ingest.fetched, ingest.inserted, ingest.duplicates
        ),
        None => println!("ingested:  failed (see log)"),
    }
    println!("analyzed:  {}", report.analyzed);
    match &report.snapshot {
        Some(snapshot) => println!("metrics:   {}", format_metrics(snapshot)),
        None => println!("metrics:   unavailable (see log)"),
    }
    if let Some(alert) = &report.alert {
        println!("ALERT:     {}", alert.message);
    }
    Ok(())
}

/// Classify pending mentions for a brand and print the new snapshot.
///
/// # Errors
///
/// Returns an error if the brand does not exist or the snapshot cannot be
/// stored.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    pool: PgPool,
    brand_id: Uuid,
) -> anyhow::Result<()> {
    let monitor = build_monitor(config, pool)?;
    let outcome = monitor.analyze(brand_id).await?;

    println!("analyzed:  {}", outcome.analyzed);
    println!("metrics:   {}", format_metrics(&outcome.snapshot));
    if let Some(alert) = &outcome.alert {
        println!("ALERT:     {}", alert.message);
    }
    Ok(())
}

/// Clear a brand's monitoring flag. A running server drops the brand's
/// interval job on its next tick.
///
/// # Errors
///
/// Returns an error if the brand does not exist.
pub(crate) async fn run_stop(pool: &PgPool, brand_id: Uuid) -> anyhow::Result<()> {
    brandpulse_db::set_brand_monitoring(pool, brand_id, false)
        .await
        .map_err(|e| match e {
            brandpulse_db::DbError::NotFound => anyhow::anyhow!("brand {brand_id} not found"),
            other => other.into(),
        })?;
    println!("stopped monitoring brand {brand_id}");
    Ok(())
}
