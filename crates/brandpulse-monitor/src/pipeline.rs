//! The monitoring service: ingest, classify, aggregate, alert and notify for
//! one brand at a time.

use std::sync::Arc;

use brandpulse_core::{Alert, Brand, MetricSnapshot, MonitorEvent, PipelineConfig};
use brandpulse_sentiment::{MentionSource, SentimentClassifier};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate;
use crate::alerts::AlertEngine;
use crate::classify::BatchClassifier;
use crate::error::MonitorError;
use crate::locks::BrandLocks;
use crate::notifier::Notifier;
use crate::recorder::{self, IngestReport};
use crate::sinks::{self, AlertSink};
use crate::store::MonitorStore;

const MAX_BRAND_NAME_LEN: usize = 200;

/// Collaborators needed to build a [`Monitor`].
pub struct MonitorDeps {
    pub store: Arc<dyn MonitorStore>,
    /// `None` disables ingestion; cycles then only classify what is stored.
    pub source: Option<Arc<dyn MentionSource>>,
    pub classifier: SentimentClassifier,
    pub sinks: Vec<Arc<dyn AlertSink>>,
    pub config: PipelineConfig,
}

/// Result of classifying and aggregating a brand.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutcome {
    pub analyzed: usize,
    pub snapshot: MetricSnapshot,
    pub alert: Option<Alert>,
}

/// What a full cycle managed to do. Failed stages leave their field empty.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub brand_id: Uuid,
    pub ingest: Option<IngestReport>,
    pub analyzed: usize,
    pub snapshot: Option<MetricSnapshot>,
    pub alert: Option<Alert>,
}

/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn MonitorStore>,
    source: Option<Arc<dyn MentionSource>>,
    classifier: BatchClassifier,
    engine: AlertEngine,
    notifier: Notifier,
    sinks: Vec<Arc<dyn AlertSink>>,
    config: PipelineConfig,
    publish_locks: BrandLocks,
}

impl Monitor {
    #[must_use]
    pub fn new(deps: MonitorDeps) -> Self {
        let MonitorDeps {
            store,
            source,
            classifier,
            sinks,
            config,
        } = deps;

        Self {
            inner: Arc::new(Inner {
                classifier: BatchClassifier::new(Arc::clone(&store), classifier),
                engine: AlertEngine::new(Arc::clone(&store), config.alert_cooldown()),
                notifier: Notifier::default(),
                store,
                source,
                sinks,
                config,
                publish_locks: BrandLocks::default(),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn MonitorStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Create the brand (or re-enable monitoring on it) after validating the
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] for a blank or overlong name and
    /// [`MonitorError::Db`] if the store fails.
    pub async fn register_brand(&self, name: &str) -> Result<Brand, MonitorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MonitorError::Validation(
                "brand name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_BRAND_NAME_LEN {
            return Err(MonitorError::Validation(format!(
                "brand name must be at most {MAX_BRAND_NAME_LEN} characters"
            )));
        }

        let brand = self.inner.store.upsert_brand(name).await?;
        tracing::info!(brand_id = %brand.id, brand = %brand.name, "brand registered for monitoring");
        Ok(brand)
    }

    /// Load a brand or fail with [`MonitorError::BrandNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::BrandNotFound`] or [`MonitorError::Db`].
    pub async fn brand(&self, brand_id: Uuid) -> Result<Brand, MonitorError> {
        self.inner
            .store
            .get_brand(brand_id)
            .await?
            .ok_or(MonitorError::BrandNotFound(brand_id))
    }

    /// Pull fresh mentions for the brand from the configured source.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Source`] if the source fails.
    pub async fn ingest(&self, brand: &Brand) -> Result<IngestReport, MonitorError> {
        match &self.inner.source {
            Some(source) => recorder::ingest(self.inner.store.as_ref(), source.as_ref(), brand).await,
            None => {
                tracing::debug!(brand_id = %brand.id, "no mention source configured; skipping ingestion");
                Ok(IngestReport::default())
            }
        }
    }

    /// Classify pending mentions, then aggregate and evaluate.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::BrandNotFound`] for an unknown brand, and
    /// [`MonitorError::Db`] if classification cannot start or the snapshot
    /// cannot be stored.
    pub async fn analyze(&self, brand_id: Uuid) -> Result<AnalyzeOutcome, MonitorError> {
        let brand = self.brand(brand_id).await?;
        let analyzed = self
            .inner
            .classifier
            .classify_batch(brand.id, self.inner.config.classify_batch_size)
            .await?;
        let (snapshot, alert) = self.aggregate_and_evaluate(&brand).await?;
        Ok(AnalyzeOutcome {
            analyzed,
            snapshot,
            alert,
        })
    }

    /// Run every stage for `brand`, absorbing stage failures.
    ///
    /// Each stage proceeds on whatever the earlier stages committed, so a
    /// failed ingestion still classifies and aggregates stored mentions.
    pub async fn run_cycle(&self, brand: &Brand, with_ingest: bool) -> CycleReport {
        let mut report = CycleReport {
            brand_id: brand.id,
            ingest: None,
            analyzed: 0,
            snapshot: None,
            alert: None,
        };

        if with_ingest {
            match self.ingest(brand).await {
                Ok(ingest) => report.ingest = Some(ingest),
                Err(e) => {
                    tracing::warn!(brand_id = %brand.id, error = %e, "ingestion failed; continuing with stored mentions");
                }
            }
        }

        match self
            .inner
            .classifier
            .classify_batch(brand.id, self.inner.config.classify_batch_size)
            .await
        {
            Ok(n) => report.analyzed = n,
            Err(e) => {
                tracing::warn!(brand_id = %brand.id, error = %e, "classification failed");
            }
        }

        match self.aggregate_and_evaluate(brand).await {
            Ok((snapshot, alert)) => {
                report.snapshot = Some(snapshot);
                report.alert = alert;
            }
            Err(e) => {
                tracing::error!(brand_id = %brand.id, error = %e, "aggregation failed");
            }
        }

        report
    }

    /// Append a snapshot, evaluate it, and push both to observers.
    ///
    /// Held under a per-brand lock so observers see snapshots and alerts in
    /// the order they were created.
    async fn aggregate_and_evaluate(
        &self,
        brand: &Brand,
    ) -> Result<(MetricSnapshot, Option<Alert>), MonitorError> {
        let inner = &self.inner;
        let _guard = inner.publish_locks.lock(brand.id).await;

        let snapshot = aggregate::recompute(
            inner.store.as_ref(),
            brand.id,
            &inner.config.risk_thresholds,
        )
        .await?;
        inner
            .notifier
            .publish(MonitorEvent::Snapshot(snapshot.clone()));

        let alert = match inner.engine.evaluate(&snapshot).await {
            Ok(alert) => alert,
            Err(e) => {
                tracing::error!(brand_id = %brand.id, error = %e, "alert evaluation failed");
                None
            }
        };

        if let Some(alert) = &alert {
            inner.notifier.publish(MonitorEvent::Alert(alert.clone()));
            sinks::dispatch(&inner.sinks, &sinks::format_alert(&brand.name, alert));
        }

        Ok((snapshot, alert))
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.inner.config)
            .field("has_source", &self.inner.source.is_some())
            .field("sinks", &self.inner.sinks.len())
            .finish_non_exhaustive()
    }
}
