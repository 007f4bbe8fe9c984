//! Persistence contract for the monitoring pipeline.
//!
//! Every write is an append or a compare-and-set so a failed step never
//! corrupts what an earlier step committed.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use brandpulse_core::{
    Alert, AlertKind, Brand, Mention, MetricSnapshot, RawMention, Sentiment, SentimentCounts,
};
use brandpulse_db::DbError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Create the brand with monitoring enabled, or re-enable monitoring on
    /// the existing brand with the same case-insensitive name.
    async fn upsert_brand(&self, name: &str) -> Result<Brand, DbError>;

    async fn get_brand(&self, id: Uuid) -> Result<Option<Brand>, DbError>;

    /// Fails with [`DbError::NotFound`] for an unknown brand.
    async fn set_monitoring(&self, id: Uuid, enabled: bool) -> Result<(), DbError>;

    async fn list_monitoring(&self) -> Result<Vec<Brand>, DbError>;

    async fn touch_last_checked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DbError>;

    /// Store a mention. Returns `false` without writing when the brand already
    /// has a mention with the same external id.
    async fn insert_mention(&self, brand_id: Uuid, mention: &RawMention) -> Result<bool, DbError>;

    /// Up to `limit` unclassified mentions, oldest insert first.
    async fn list_unclassified(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Mention>, DbError>;

    /// Label a mention if it is still unclassified. Returns `false` when it
    /// was already labeled.
    async fn mark_classified(
        &self,
        mention_id: Uuid,
        label: Sentiment,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError>;

    async fn sentiment_counts(&self, brand_id: Uuid) -> Result<SentimentCounts, DbError>;

    async fn insert_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DbError>;

    /// The `limit` most recent snapshots in ascending timestamp order.
    async fn list_snapshots(&self, brand_id: Uuid, limit: u32)
        -> Result<Vec<MetricSnapshot>, DbError>;

    async fn insert_alert(&self, alert: &Alert) -> Result<(), DbError>;

    /// The `limit` most recent alerts, newest first.
    async fn list_alerts(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Alert>, DbError>;

    async fn latest_alert_of_kind(
        &self,
        brand_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, DbError>;
}
