//! Sentiment classification and scoring for brand mentions.
//!
//! A [`SentimentClassifier`] asks an optional [`SentimentModel`] first and
//! falls back to the keyword [`Lexicon`]. [`metrics`] turns label counts into
//! a [`brandpulse_core::MetricSnapshot`], and [`alerts`] decides whether that
//! snapshot raises a crisis alert. Raw mentions come from a [`MentionSource`].

pub mod alerts;
pub mod classifier;
pub mod error;
pub mod lexicon;
pub mod metrics;
pub mod model;
pub mod sources;
pub mod types;

pub use alerts::{alert_for_snapshot, critical_message};
pub use classifier::SentimentClassifier;
pub use error::{truncate_body, SentimentError, MAX_ERROR_BODY_CHARS};
pub use lexicon::Lexicon;
pub use metrics::{build_snapshot, negative_pct, overall_score, risk_level};
pub use model::{OpenAiSentimentModel, SentimentModel};
pub use sources::{MentionSource, TwitterSource};
pub use types::{Classification, ClassificationMethod};
