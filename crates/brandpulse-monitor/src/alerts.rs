//! Alert engine stage: evaluates snapshots and persists the alerts they raise.

use std::sync::Arc;
use std::time::Duration;

use brandpulse_core::{Alert, MetricSnapshot};
use brandpulse_sentiment::alert_for_snapshot;
use chrono::Utc;

use crate::error::MonitorError;
use crate::store::MonitorStore;

pub struct AlertEngine {
    store: Arc<dyn MonitorStore>,
    cooldown: Option<Duration>,
}

impl AlertEngine {
    /// With `cooldown` unset every critical snapshot raises an alert.
    #[must_use]
    pub fn new(store: Arc<dyn MonitorStore>, cooldown: Option<Duration>) -> Self {
        Self { store, cooldown }
    }

    /// Evaluate a snapshot and persist the resulting alert, if any.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Db`] if the cooldown lookup or the insert fails.
    pub async fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Option<Alert>, MonitorError> {
        let now = Utc::now();
        let Some(alert) = alert_for_snapshot(snapshot, now) else {
            return Ok(None);
        };

        if let Some(cooldown) = self.cooldown {
            if let Some(previous) = self
                .store
                .latest_alert_of_kind(alert.brand_id, alert.kind)
                .await?
            {
                let elapsed = (now - previous.created_at).to_std().unwrap_or_default();
                if elapsed < cooldown {
                    tracing::info!(
                        brand_id = %alert.brand_id,
                        previous_alert = %previous.id,
                        "critical snapshot within alert cooldown; no new alert"
                    );
                    return Ok(None);
                }
            }
        }

        self.store.insert_alert(&alert).await?;
        tracing::warn!(
            brand_id = %alert.brand_id,
            alert_id = %alert.id,
            message = %alert.message,
            "alert raised"
        );
        Ok(Some(alert))
    }
}
