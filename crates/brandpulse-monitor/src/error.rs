use brandpulse_db::DbError;
use brandpulse_sentiment::SentimentError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Bad caller input. Raised before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("brand not found: {0}")]
    BrandNotFound(Uuid),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("mention source failed: {0}")]
    Source(#[from] SentimentError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error("failed to build {component}: {source}")]
    Setup {
        component: &'static str,
        #[source]
        source: SentimentError,
    },

    #[error("alert sink {sink} failed: {reason}")]
    Delivery { sink: &'static str, reason: String },
}
