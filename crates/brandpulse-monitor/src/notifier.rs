//! Brand-scoped realtime fan-out of snapshots and alerts.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use brandpulse_core::{Alert, MetricSnapshot, MonitorEvent};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// Pushes every published [`MonitorEvent`] to the current subscribers of its
/// brand. Publishing never waits on subscribers; one that falls more than
/// the channel capacity behind loses the oldest events.
#[derive(Debug)]
pub struct Notifier {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<MonitorEvent>>>,
    capacity: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Notifier {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Receive every event published for `brand_id` from now on.
    pub fn subscribe(&self, brand_id: Uuid) -> broadcast::Receiver<MonitorEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(brand_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribe with callbacks. The callbacks run on a spawned task, in
    /// publish order, until the returned handle is unsubscribed or dropped.
    pub fn subscribe_with<S, A>(
        &self,
        brand_id: Uuid,
        mut on_snapshot: S,
        mut on_alert: A,
    ) -> SubscriptionHandle
    where
        S: FnMut(MetricSnapshot) + Send + 'static,
        A: FnMut(Alert) + Send + 'static,
    {
        let mut rx = self.subscribe(brand_id);
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(MonitorEvent::Snapshot(snapshot)) => on_snapshot(snapshot),
                    Ok(MonitorEvent::Alert(alert)) => on_alert(alert),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(brand_id = %brand_id, missed, "subscriber lagged; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        SubscriptionHandle { task }
    }

    /// Push an event to the brand's subscribers. Returns how many received it.
    pub fn publish(&self, event: MonitorEvent) -> usize {
        let brand_id = event.brand_id();
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&brand_id) else {
            return 0;
        };
        if let Ok(delivered) = sender.send(event) {
            delivered
        } else {
            // No receivers left.
            channels.remove(&brand_id);
            0
        }
    }

    /// Number of live subscribers for a brand.
    #[must_use]
    pub fn subscriber_count(&self, brand_id: Uuid) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&brand_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

/// Handle returned by [`Notifier::subscribe_with`]. Dropping it also ends the
/// subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
