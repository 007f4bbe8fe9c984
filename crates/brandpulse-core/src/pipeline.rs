//! Tunables consumed by the classifier, aggregator, alert engine and scheduler.
//!
//! Every field has a default, so an absent or partial YAML file is valid:
//!
//! ```yaml
//! negative_words: [hate, terrible, recall]
//! risk_thresholds:
//!   critical: 45
//! alert_cooldown_secs: 3600
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_POSITIVE_WORDS: &[&str] = &[
    "love",
    "great",
    "amazing",
    "awesome",
    "excellent",
    "good",
    "best",
    "happy",
    "perfect",
];

const DEFAULT_NEGATIVE_WORDS: &[&str] = &[
    "hate",
    "terrible",
    "awful",
    "bad",
    "worst",
    "horrible",
    "disappointed",
    "angry",
    "sucks",
];

/// Negative-percentage cut-offs. A level applies when the negative share is
/// strictly greater than its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 20.0,
            high: 35.0,
            critical: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub risk_thresholds: RiskThresholds,
    /// Maximum mentions classified per `classify_batch` call.
    pub classify_batch_size: u32,
    /// Interval between scheduled classify+aggregate cycles.
    pub monitor_interval_secs: u64,
    /// When set, a critical snapshot raises no new alert if one of the same
    /// type was raised for the brand within this window.
    pub alert_cooldown_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            positive_words: DEFAULT_POSITIVE_WORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            negative_words: DEFAULT_NEGATIVE_WORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            risk_thresholds: RiskThresholds::default(),
            classify_batch_size: 50,
            monitor_interval_secs: 300,
            alert_cooldown_secs: None,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    #[must_use]
    pub fn alert_cooldown(&self) -> Option<Duration> {
        self.alert_cooldown_secs.map(Duration::from_secs)
    }

    /// Lowercase and trim the word sets, dropping blanks and duplicates.
    fn normalize(&mut self) {
        normalize_words(&mut self.positive_words);
        normalize_words(&mut self.negative_words);
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on empty word sets, thresholds that
    /// are not strictly ascending within `[0, 100]`, or zero batch size or
    /// interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.positive_words.is_empty() {
            return Err(ConfigError::Validation(
                "positive_words must not be empty".to_string(),
            ));
        }
        if self.negative_words.is_empty() {
            return Err(ConfigError::Validation(
                "negative_words must not be empty".to_string(),
            ));
        }

        let t = self.risk_thresholds;
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !(in_range(t.medium) && in_range(t.high) && in_range(t.critical)) {
            return Err(ConfigError::Validation(format!(
                "risk thresholds must be within [0, 100]; got medium={}, high={}, critical={}",
                t.medium, t.high, t.critical
            )));
        }
        if !(t.medium < t.high && t.high < t.critical) {
            return Err(ConfigError::Validation(format!(
                "risk thresholds must be strictly ascending; got medium={}, high={}, critical={}",
                t.medium, t.high, t.critical
            )));
        }

        if self.classify_batch_size == 0 {
            return Err(ConfigError::Validation(
                "classify_batch_size must be positive".to_string(),
            ));
        }
        if self.monitor_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalize_words(words: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let normalized: Vec<String> = words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect();
    *words = normalized;
}

/// Parse and validate a pipeline configuration from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::PipelineFileParse`] on malformed YAML or
/// [`ConfigError::Validation`] when the values are inconsistent.
pub fn parse_pipeline_config(yaml: &str) -> Result<PipelineConfig, ConfigError> {
    let mut config: PipelineConfig =
        serde_yaml::from_str(yaml).map_err(ConfigError::PipelineFileParse)?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

/// Load the pipeline configuration, falling back to defaults when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PipelineFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_pipeline_config(&content)
}
