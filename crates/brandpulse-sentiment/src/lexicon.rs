//! Deterministic keyword heuristic used whenever the language model is
//! unavailable.

use brandpulse_core::{PipelineConfig, Sentiment};

use crate::types::{Classification, ClassificationMethod};

/// Confidence reported when positive and negative hits tie.
pub const TIE_CONFIDENCE: f64 = 0.6;

const BASE_CONFIDENCE: f64 = 0.5;
const PER_HIT_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.7;

/// Positive and negative keyword sets.
///
/// Words are matched case-insensitively as substrings of the text, and each
/// word counts at most once no matter how often it appears.
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Lexicon {
    #[must_use]
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            positive: lowercase_all(positive),
            negative: lowercase_all(negative),
        }
    }

    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.positive_words, &config.negative_words)
    }

    /// Number of positive and negative words present in `text`.
    #[must_use]
    pub fn hits(&self, text: &str) -> (u32, u32) {
        let text = text.to_lowercase();
        (count_present(&self.positive, &text), count_present(&self.negative, &text))
    }

    /// Classify `text`. The strictly larger hit count wins; a tie (including
    /// zero hits) is neutral.
    #[must_use]
    pub fn classify(&self, text: &str) -> Classification {
        let (positive, negative) = self.hits(text);

        let (label, confidence) = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => (Sentiment::Positive, hit_confidence(positive)),
            std::cmp::Ordering::Less => (Sentiment::Negative, hit_confidence(negative)),
            std::cmp::Ordering::Equal => (Sentiment::Neutral, TIE_CONFIDENCE),
        };

        Classification {
            label,
            confidence,
            reasoning: Some(format!(
                "keyword heuristic: {positive} positive, {negative} negative"
            )),
            method: ClassificationMethod::Heuristic,
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

fn lowercase_all<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn count_present(words: &[String], text: &str) -> u32 {
    let n = words.iter().filter(|w| text.contains(w.as_str())).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn hit_confidence(hits: u32) -> f64 {
    (BASE_CONFIDENCE + PER_HIT_CONFIDENCE * f64::from(hits)).min(MAX_CONFIDENCE)
}
