//! Deterministic collaborators for pipeline tests: no network, no database.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use brandpulse_core::{
    Alert, AlertKind, Brand, Mention, MetricSnapshot, PipelineConfig, RawMention, Sentiment,
    SentimentCounts,
};
use brandpulse_db::DbError;
use brandpulse_monitor::{
    AlertSink, MemoryStore, Monitor, MonitorDeps, MonitorError, MonitorStore,
};
use brandpulse_sentiment::{Lexicon, MentionSource, SentimentClassifier, SentimentError};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

pub fn raw(external_id: &str, text: &str) -> RawMention {
    RawMention {
        external_id: external_id.to_string(),
        text: text.to_string(),
        author_handle: "tester".to_string(),
        created_at: Utc::now(),
    }
}

pub fn config() -> PipelineConfig {
    PipelineConfig {
        classify_batch_size: 500,
        ..PipelineConfig::default()
    }
}

pub fn monitor_with(
    store: Arc<dyn MonitorStore>,
    source: Option<Arc<dyn MentionSource>>,
    sinks: Vec<Arc<dyn AlertSink>>,
    config: PipelineConfig,
) -> Monitor {
    Monitor::new(MonitorDeps {
        store,
        source,
        classifier: SentimentClassifier::heuristic_only(Lexicon::from_config(&config)),
        sinks,
        config,
    })
}

pub fn monitor(store: Arc<MemoryStore>) -> Monitor {
    monitor_with(store, None, Vec::new(), config())
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Returns the same mentions on every call.
pub struct StaticSource {
    pub mentions: Vec<RawMention>,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(mentions: Vec<RawMention>) -> Self {
        Self {
            mentions,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MentionSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, _brand_name: &str) -> Result<Vec<RawMention>, SentimentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.mentions.clone())
    }
}

/// Always fails.
pub struct FailingSource;

#[async_trait]
impl MentionSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self, _brand_name: &str) -> Result<Vec<RawMention>, SentimentError> {
        Err(SentimentError::Status {
            service: "failing",
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Signals `entered` and then blocks until `release` is notified.
pub struct GatedSource {
    pub mentions: Vec<RawMention>,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedSource {
    pub fn new(mentions: Vec<RawMention>) -> Self {
        Self {
            mentions,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl MentionSource for GatedSource {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn fetch(&self, _brand_name: &str) -> Result<Vec<RawMention>, SentimentError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.mentions.clone())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Forwards every delivered message to a channel.
pub struct RecordingSink(pub mpsc::UnboundedSender<String>);

#[async_trait]
impl AlertSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &str) -> Result<(), MonitorError> {
        let _ = self.0.send(message.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store with injected failures
// ---------------------------------------------------------------------------

/// Wraps a [`MemoryStore`] and fails `mark_classified` once for each listed
/// mention content.
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_once: Mutex<HashSet<String>>,
    contents: Mutex<std::collections::HashMap<Uuid, String>>,
}

impl FlakyStore {
    pub fn new(fail_once_for: &[&str]) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_once: Mutex::new(fail_once_for.iter().map(ToString::to_string).collect()),
            contents: Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[async_trait]
impl MonitorStore for FlakyStore {
    async fn upsert_brand(&self, name: &str) -> Result<Brand, DbError> {
        self.inner.upsert_brand(name).await
    }

    async fn get_brand(&self, id: Uuid) -> Result<Option<Brand>, DbError> {
        self.inner.get_brand(id).await
    }

    async fn set_monitoring(&self, id: Uuid, enabled: bool) -> Result<(), DbError> {
        self.inner.set_monitoring(id, enabled).await
    }

    async fn list_monitoring(&self) -> Result<Vec<Brand>, DbError> {
        self.inner.list_monitoring().await
    }

    async fn touch_last_checked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DbError> {
        self.inner.touch_last_checked(id, at).await
    }

    async fn insert_mention(&self, brand_id: Uuid, mention: &RawMention) -> Result<bool, DbError> {
        self.inner.insert_mention(brand_id, mention).await
    }

    async fn list_unclassified(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Mention>, DbError> {
        let pending = self.inner.list_unclassified(brand_id, limit).await?;
        let mut contents = self.contents.lock().unwrap();
        for m in &pending {
            contents.insert(m.id, m.content.clone());
        }
        Ok(pending)
    }

    async fn mark_classified(
        &self,
        mention_id: Uuid,
        label: Sentiment,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let content = self.contents.lock().unwrap().get(&mention_id).cloned();
        if let Some(content) = content {
            if self.fail_once.lock().unwrap().remove(&content) {
                return Err(DbError::NotFound);
            }
        }
        self.inner
            .mark_classified(mention_id, label, confidence, at)
            .await
    }

    async fn sentiment_counts(&self, brand_id: Uuid) -> Result<SentimentCounts, DbError> {
        self.inner.sentiment_counts(brand_id).await
    }

    async fn insert_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DbError> {
        self.inner.insert_snapshot(snapshot).await
    }

    async fn list_snapshots(
        &self,
        brand_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MetricSnapshot>, DbError> {
        self.inner.list_snapshots(brand_id, limit).await
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), DbError> {
        self.inner.insert_alert(alert).await
    }

    async fn list_alerts(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Alert>, DbError> {
        self.inner.list_alerts(brand_id, limit).await
    }

    async fn latest_alert_of_kind(
        &self,
        brand_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, DbError> {
        self.inner.latest_alert_of_kind(brand_id, kind).await
    }
}
