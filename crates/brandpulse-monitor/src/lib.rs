//! Brand monitoring pipeline.
//!
//! Mentions are recorded through a [`MonitorStore`], labeled by a
//! [`BatchClassifier`], rolled up into snapshots, checked by the
//! [`AlertEngine`], and pushed to observers by the [`Notifier`]. The
//! [`Monitor`] ties the stages together for one brand and the
//! [`MonitorScheduler`] repeats them on an interval.

pub mod aggregate;
pub mod alerts;
pub mod classify;
pub mod error;
mod locks;
pub mod notifier;
pub mod pipeline;
pub mod recorder;
pub mod scheduler;
pub mod sinks;
pub mod store;
pub mod wiring;

pub use alerts::AlertEngine;
pub use classify::BatchClassifier;
pub use error::MonitorError;
pub use notifier::{Notifier, SubscriptionHandle};
pub use pipeline::{AnalyzeOutcome, CycleReport, Monitor, MonitorDeps};
pub use recorder::{ingest, record, IngestReport};
pub use scheduler::{MonitorScheduler, StartOutcome};
pub use sinks::{format_alert, AlertSink, LogSink, WebhookSink};
pub use store::{MemoryStore, MonitorStore, PgStore};
pub use wiring::build_deps;
