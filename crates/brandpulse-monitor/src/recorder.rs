//! Mention recording and ingestion.

use brandpulse_core::{Brand, RawMention};
use brandpulse_sentiment::MentionSource;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::store::MonitorStore;

/// Outcome of one ingestion pass for a brand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Mentions that could not be stored.
    pub failed: usize,
}

/// Store one mention for a brand. Returns whether a new row was written; a
/// repeat of `(brand_id, external_id)` is a no-op returning `false`.
///
/// Bumps the brand's `last_checked` after a successful insert.
///
/// # Errors
///
/// Returns [`MonitorError::Validation`] for a blank external id and
/// [`MonitorError::Db`] if the store fails.
pub async fn record(
    store: &dyn MonitorStore,
    brand_id: Uuid,
    mention: &RawMention,
) -> Result<bool, MonitorError> {
    if mention.external_id.trim().is_empty() {
        return Err(MonitorError::Validation(
            "mention external id must not be empty".to_string(),
        ));
    }

    let inserted = store.insert_mention(brand_id, mention).await?;
    if inserted {
        store.touch_last_checked(brand_id, Utc::now()).await?;
    }
    Ok(inserted)
}

/// Fetch mentions of `brand` from `source` and record each one.
///
/// A failure to store one mention is logged and counted; it does not stop
/// the rest.
///
/// # Errors
///
/// Returns [`MonitorError::Source`] if the source itself fails.
pub async fn ingest(
    store: &dyn MonitorStore,
    source: &dyn MentionSource,
    brand: &Brand,
) -> Result<IngestReport, MonitorError> {
    let mentions = source.fetch(&brand.name).await?;
    let mut report = IngestReport {
        fetched: mentions.len(),
        ..IngestReport::default()
    };

    for mention in &mentions {
        match record(store, brand.id, mention).await {
            Ok(true) => report.inserted += 1,
            Ok(false) => report.duplicates += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    brand_id = %brand.id,
                    external_id = %mention.external_id,
                    error = %e,
                    "failed to record mention"
                );
            }
        }
    }

    tracing::info!(
        brand_id = %brand.id,
        source = source.name(),
        fetched = report.fetched,
        inserted = report.inserted,
        duplicates = report.duplicates,
        "ingestion complete"
    );
    Ok(report)
}
