//! Shared domain types and configuration for brandpulse.

mod app_config;
mod config;
pub mod models;
mod pipeline;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use models::{
    Alert, AlertKind, Brand, Mention, MetricSnapshot, MonitorEvent, RawMention, RiskLevel,
    Sentiment, SentimentCounts, Severity,
};
pub use pipeline::{load_pipeline_config, parse_pipeline_config, PipelineConfig, RiskThresholds};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read pipeline config {path}: {source}")]
    PipelineFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse pipeline config: {0}")]
    PipelineFileParse(#[source] serde_yaml::Error),
    #[error("invalid pipeline config: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
