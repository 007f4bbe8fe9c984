//! Batch classification of a brand's unclassified mentions.

use std::sync::Arc;

use brandpulse_sentiment::SentimentClassifier;
use chrono::Utc;
use uuid::Uuid;

use crate::error::MonitorError;
use crate::locks::BrandLocks;
use crate::store::MonitorStore;

/// Labels unclassified mentions, one brand at a time.
///
/// Calls for the same brand are serialized, and each label is written with
/// a compare-and-set, so a mention is classified at most once even when
/// batches overlap.
pub struct BatchClassifier {
    store: Arc<dyn MonitorStore>,
    classifier: SentimentClassifier,
    locks: BrandLocks,
}

impl BatchClassifier {
    #[must_use]
    pub fn new(store: Arc<dyn MonitorStore>, classifier: SentimentClassifier) -> Self {
        Self {
            store,
            classifier,
            locks: BrandLocks::default(),
        }
    }

    /// Classify up to `limit` unclassified mentions of `brand_id`, oldest
    /// first. Returns how many mentions were labeled by this call.
    ///
    /// A mention whose label cannot be written is skipped and stays
    /// eligible for a later batch.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Db`] only if the unclassified mentions cannot
    /// be listed.
    pub async fn classify_batch(&self, brand_id: Uuid, limit: u32) -> Result<usize, MonitorError> {
        let _guard = self.locks.lock(brand_id).await;

        let pending = self.store.list_unclassified(brand_id, limit).await?;
        let mut analyzed = 0;

        for mention in &pending {
            let verdict = self.classifier.classify(&mention.content).await;
            match self
                .store
                .mark_classified(mention.id, verdict.label, verdict.confidence, Utc::now())
                .await
            {
                Ok(true) => analyzed += 1,
                Ok(false) => {
                    tracing::debug!(mention_id = %mention.id, "mention already classified; skipping");
                }
                Err(e) => {
                    tracing::warn!(
                        brand_id = %brand_id,
                        mention_id = %mention.id,
                        error = %e,
                        "failed to store classification; mention left for a later batch"
                    );
                }
            }
        }

        tracing::debug!(
            brand_id = %brand_id,
            pending = pending.len(),
            analyzed,
            "classification batch complete"
        );
        Ok(analyzed)
    }
}
