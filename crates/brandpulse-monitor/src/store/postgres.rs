use async_trait::async_trait;
use brandpulse_core::{
    Alert, AlertKind, Brand, Mention, MetricSnapshot, RawMention, Sentiment, SentimentCounts,
};
use brandpulse_db::{DbError, NewMentionRow};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::MonitorStore;

/// [`MonitorStore`] backed by the Postgres queries in `brandpulse-db`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MonitorStore for PgStore {
    async fn upsert_brand(&self, name: &str) -> Result<Brand, DbError> {
        let row = brandpulse_db::upsert_monitored_brand(&self.pool, Uuid::new_v4(), name).await?;
        Ok(row.into())
    }

    async fn get_brand(&self, id: Uuid) -> Result<Option<Brand>, DbError> {
        Ok(brandpulse_db::get_brand(&self.pool, id).await?.map(Into::into))
    }

    async fn set_monitoring(&self, id: Uuid, enabled: bool) -> Result<(), DbError> {
        brandpulse_db::set_brand_monitoring(&self.pool, id, enabled).await
    }

    async fn list_monitoring(&self) -> Result<Vec<Brand>, DbError> {
        let rows = brandpulse_db::list_monitoring_brands(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn touch_last_checked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DbError> {
        brandpulse_db::touch_brand_last_checked(&self.pool, id, at).await
    }

    async fn insert_mention(&self, brand_id: Uuid, mention: &RawMention) -> Result<bool, DbError> {
        brandpulse_db::insert_mention(
            &self.pool,
            &NewMentionRow {
                id: Uuid::new_v4(),
                brand_id,
                external_id: &mention.external_id,
                content: &mention.text,
                author: &mention.author_handle,
                created_at: mention.created_at,
            },
        )
        .await
    }

    async fn list_unclassified(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Mention>, DbError> {
        brandpulse_db::list_unclassified_mentions(&self.pool, brand_id, i64::from(limit))
            .await?
            .into_iter()
            .map(Mention::try_from)
            .collect()
    }

    async fn mark_classified(
        &self,
        mention_id: Uuid,
        label: Sentiment,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        brandpulse_db::classify_mention(&self.pool, mention_id, label, confidence, at).await
    }

    async fn sentiment_counts(&self, brand_id: Uuid) -> Result<SentimentCounts, DbError> {
        Ok(brandpulse_db::count_sentiments(&self.pool, brand_id)
            .await?
            .into())
    }

    async fn insert_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DbError> {
        brandpulse_db::insert_metric_snapshot(&self.pool, snapshot).await
    }

    async fn list_snapshots(
        &self,
        brand_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MetricSnapshot>, DbError> {
        brandpulse_db::list_recent_snapshots(&self.pool, brand_id, i64::from(limit))
            .await?
            .into_iter()
            .map(MetricSnapshot::try_from)
            .collect()
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), DbError> {
        brandpulse_db::insert_alert(&self.pool, alert).await
    }

    async fn list_alerts(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Alert>, DbError> {
        brandpulse_db::list_recent_alerts(&self.pool, brand_id, i64::from(limit))
            .await?
            .into_iter()
            .map(Alert::try_from)
            .collect()
    }

    async fn latest_alert_of_kind(
        &self,
        brand_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, DbError> {
        brandpulse_db::get_latest_alert_of_kind(&self.pool, brand_id, kind)
            .await?
            .map(Alert::try_from)
            .transpose()
    }
}
