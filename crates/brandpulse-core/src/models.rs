//! Domain records shared by every pipeline stage.
//!
//! A [`Brand`] owns its [`Mention`]s, [`MetricSnapshot`]s and [`Alert`]s; all
//! of them carry the owning `brand_id` and nothing is shared across brands.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

// ---------------------------------------------------------------------------
// Brand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    /// Display name. Uniqueness is case-insensitive.
    pub name: String,
    pub is_monitoring: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Key used for case-insensitive name comparison.
    #[must_use]
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Terminal sentiment label. An unclassified mention carries `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(CoreError::UnknownVariant {
                kind: "sentiment",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// A raw mention as returned by an ingestion source, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMention {
    pub external_id: String,
    pub text: String,
    pub author_handle: String,
    pub created_at: DateTime<Utc>,
}

/// A stored mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: Uuid,
    pub brand_id: Uuid,
    /// Source-side identifier, unique within the owning brand.
    pub external_id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
    /// In `[0, 1]` once classified.
    pub confidence: Option<f64>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Mention {
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.sentiment.is_some()
    }
}

/// Per-label counts over a brand's classified mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

impl SentimentCounts {
    #[must_use]
    pub fn total(&self) -> i64 {
        self.positive + self.negative + self.neutral
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Four-tier negative-sentiment severity. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(CoreError::UnknownVariant {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

/// Immutable aggregate of a brand's classified mentions at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
    /// Always `positive_count + negative_count + neutral_count`.
    pub total_count: i64,
    /// `(positive - negative) / total * 100`, or `0` with no mentions.
    pub overall_score: f64,
    pub risk_level: RiskLevel,
}

impl MetricSnapshot {
    #[must_use]
    pub fn counts(&self) -> SentimentCounts {
        SentimentCounts {
            positive: self.positive_count,
            negative: self.negative_count,
            neutral: self.neutral_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CriticalSentiment,
}

impl AlertKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::CriticalSentiment => "critical_sentiment",
        }
    }
}

impl FromStr for AlertKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical_sentiment" => Ok(AlertKind::CriticalSentiment),
            _ => Err(CoreError::UnknownVariant {
                kind: "alert type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(CoreError::UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub brand_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Realtime events
// ---------------------------------------------------------------------------

/// Event pushed to brand observers whenever a snapshot or alert is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MonitorEvent {
    Snapshot(MetricSnapshot),
    Alert(Alert),
}

impl MonitorEvent {
    #[must_use]
    pub fn brand_id(&self) -> Uuid {
        match self {
            MonitorEvent::Snapshot(s) => s.brand_id,
            MonitorEvent::Alert(a) => a.brand_id,
        }
    }
}
