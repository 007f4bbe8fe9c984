use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use brandpulse_core::{
    Alert, AlertKind, Brand, Mention, MetricSnapshot, RawMention, Sentiment, SentimentCounts,
};
use brandpulse_db::DbError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::MonitorStore;

#[derive(Debug, Default)]
struct State {
    brands: HashMap<Uuid, Brand>,
    /// Insertion order doubles as the mention sequence.
    mentions: Vec<Mention>,
    snapshots: Vec<MetricSnapshot>,
    alerts: Vec<Alert>,
}

/// Process-local [`MonitorStore`] with the same semantics as [`super::PgStore`].
///
/// Used by tests and by runs without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored mention for a brand, in insertion order.
    #[must_use]
    pub fn mentions(&self, brand_id: Uuid) -> Vec<Mention> {
        self.state()
            .mentions
            .iter()
            .filter(|m| m.brand_id == brand_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn upsert_brand(&self, name: &str) -> Result<Brand, DbError> {
        let key = Brand::name_key(name);
        let now = Utc::now();
        let mut state = self.state();

        if let Some(existing) = state
            .brands
            .values_mut()
            .find(|b| Brand::name_key(&b.name) == key)
        {
            existing.is_monitoring = true;
            existing.last_checked = Some(now);
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let brand = Brand {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_monitoring: true,
            last_checked: None,
            created_at: now,
            updated_at: now,
        };
        state.brands.insert(brand.id, brand.clone());
        Ok(brand)
    }

    async fn get_brand(&self, id: Uuid) -> Result<Option<Brand>, DbError> {
        Ok(self.state().brands.get(&id).cloned())
    }

    async fn set_monitoring(&self, id: Uuid, enabled: bool) -> Result<(), DbError> {
        let mut state = self.state();
        let brand = state.brands.get_mut(&id).ok_or(DbError::NotFound)?;
        brand.is_monitoring = enabled;
        brand.updated_at = Utc::now();
        Ok(())
    }

    async fn list_monitoring(&self) -> Result<Vec<Brand>, DbError> {
        let mut brands: Vec<Brand> = self
            .state()
            .brands
            .values()
            .filter(|b| b.is_monitoring)
            .cloned()
            .collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }

    async fn touch_last_checked(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DbError> {
        if let Some(brand) = self.state().brands.get_mut(&id) {
            brand.last_checked = Some(at);
            brand.updated_at = at;
        }
        Ok(())
    }

    async fn insert_mention(&self, brand_id: Uuid, mention: &RawMention) -> Result<bool, DbError> {
        let mut state = self.state();
        if !state.brands.contains_key(&brand_id) {
            return Err(DbError::NotFound);
        }
        let duplicate = state
            .mentions
            .iter()
            .any(|m| m.brand_id == brand_id && m.external_id == mention.external_id);
        if duplicate {
            return Ok(false);
        }

        state.mentions.push(Mention {
            id: Uuid::new_v4(),
            brand_id,
            external_id: mention.external_id.clone(),
            content: mention.text.clone(),
            author: mention.author_handle.clone(),
            created_at: mention.created_at,
            sentiment: None,
            confidence: None,
            analyzed_at: None,
        });
        Ok(true)
    }

    async fn list_unclassified(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Mention>, DbError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .state()
            .mentions
            .iter()
            .filter(|m| m.brand_id == brand_id && !m.is_classified())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_classified(
        &self,
        mention_id: Uuid,
        label: Sentiment,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let mut state = self.state();
        let Some(mention) = state
            .mentions
            .iter_mut()
            .find(|m| m.id == mention_id && !m.is_classified())
        else {
            return Ok(false);
        };
        mention.sentiment = Some(label);
        // Same precision as the NUMERIC(4,3) column.
        mention.confidence = Some((confidence.clamp(0.0, 1.0) * 1000.0).round() / 1000.0);
        mention.analyzed_at = Some(at);
        Ok(true)
    }

    async fn sentiment_counts(&self, brand_id: Uuid) -> Result<SentimentCounts, DbError> {
        let mut counts = SentimentCounts::default();
        for label in self
            .state()
            .mentions
            .iter()
            .filter(|m| m.brand_id == brand_id)
            .filter_map(|m| m.sentiment)
        {
            counts.add(label);
        }
        Ok(counts)
    }

    async fn insert_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DbError> {
        self.state().snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn list_snapshots(
        &self,
        brand_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MetricSnapshot>, DbError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut snapshots: Vec<MetricSnapshot> = self
            .state()
            .snapshots
            .iter()
            .filter(|s| s.brand_id == brand_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.timestamp);
        let skip = snapshots.len().saturating_sub(limit);
        Ok(snapshots.split_off(skip))
    }

    async fn insert_alert(&self, alert: &Alert) -> Result<(), DbError> {
        self.state().alerts.push(alert.clone());
        Ok(())
    }

    async fn list_alerts(&self, brand_id: Uuid, limit: u32) -> Result<Vec<Alert>, DbError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut alerts: Vec<Alert> = self
            .state()
            .alerts
            .iter()
            .filter(|a| a.brand_id == brand_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit);
        Ok(alerts)
    }

    async fn latest_alert_of_kind(
        &self,
        brand_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, DbError> {
        Ok(self
            .state()
            .alerts
            .iter()
            .filter(|a| a.brand_id == brand_id && a.kind == kind)
            .max_by_key(|a| a.created_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(external_id: &str) -> RawMention {
        RawMention {
            external_id: external_id.to_string(),
            text: "text".to_string(),
            author_handle: "someone".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_matches_names_case_insensitively() {
        let store = MemoryStore::new();
        let first = store.upsert_brand("Acme").await.unwrap();
        store.set_monitoring(first.id, false).await.unwrap();

        let second = store.upsert_brand("  aCmE ").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.is_monitoring);
        assert_eq!(second.name, "Acme");
    }

    #[tokio::test]
    async fn mention_for_unknown_brand_is_rejected() {
        let store = MemoryStore::new();
        let err = store.insert_mention(Uuid::new_v4(), &raw("x")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn mark_classified_is_compare_and_set() {
        let store = MemoryStore::new();
        let brand = store.upsert_brand("Acme").await.unwrap();
        store.insert_mention(brand.id, &raw("1")).await.unwrap();
        let id = store.list_unclassified(brand.id, 10).await.unwrap()[0].id;

        assert!(store
            .mark_classified(id, Sentiment::Positive, 0.66666, Utc::now())
            .await
            .unwrap());
        assert!(!store
            .mark_classified(id, Sentiment::Negative, 0.9, Utc::now())
            .await
            .unwrap());

        let stored = &store.mentions(brand.id)[0];
        assert_eq!(stored.sentiment, Some(Sentiment::Positive));
        assert!((stored.confidence.unwrap() - 0.667).abs() < 1e-9);
    }

    #[tokio::test]
    async fn list_snapshots_keeps_the_newest_window_ascending() {
        let store = MemoryStore::new();
        let brand = store.upsert_brand("Acme").await.unwrap();
        let base = Utc::now();
        for minutes in [3, 1, 2] {
            store
                .insert_snapshot(&MetricSnapshot {
                    id: Uuid::new_v4(),
                    brand_id: brand.id,
                    timestamp: base + chrono::Duration::minutes(minutes),
                    positive_count: minutes,
                    negative_count: 0,
                    neutral_count: 0,
                    total_count: minutes,
                    overall_score: 100.0,
                    risk_level: brandpulse_core::RiskLevel::Low,
                })
                .await
                .unwrap();
        }

        let window: Vec<i64> = store
            .list_snapshots(brand.id, 2)
            .await
            .unwrap()
            .iter()
            .map(|s| s.positive_count)
            .collect();
        assert_eq!(window, vec![2, 3]);
    }
}
