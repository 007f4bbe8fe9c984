//! Primary-then-fallback classification of a single mention.

use std::sync::Arc;

use crate::lexicon::Lexicon;
use crate::model::SentimentModel;
use crate::types::Classification;

/// Classifies text with the configured model, falling back to the keyword
/// [`Lexicon`] when no model is configured or the model call fails.
#[derive(Clone)]
pub struct SentimentClassifier {
    primary: Option<Arc<dyn SentimentModel>>,
    lexicon: Lexicon,
}

impl SentimentClassifier {
    #[must_use]
    pub fn new(primary: Option<Arc<dyn SentimentModel>>, lexicon: Lexicon) -> Self {
        Self { primary, lexicon }
    }

    /// A classifier that only ever uses the heuristic.
    #[must_use]
    pub fn heuristic_only(lexicon: Lexicon) -> Self {
        Self::new(None, lexicon)
    }

    #[must_use]
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Classify `text`. Never fails: every model error degrades to the
    /// heuristic.
    pub async fn classify(&self, text: &str) -> Classification {
        if let Some(model) = &self.primary {
            match model.classify(text).await {
                Ok(mut classification) => {
                    classification.confidence = classification.confidence.clamp(0.0, 1.0);
                    return classification;
                }
                Err(e) => {
                    tracing::warn!(
                        model = model.name(),
                        error = %e,
                        "sentiment model unavailable, using keyword heuristic"
                    );
                }
            }
        }
        self.lexicon.classify(text)
    }
}

impl std::fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("primary", &self.primary.as_ref().map(|m| m.name().to_string()))
            .field("lexicon", &self.lexicon)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use brandpulse_core::Sentiment;

    use super::*;
    use crate::error::SentimentError;
    use crate::types::ClassificationMethod;

    struct FixedModel(Result<Classification, ()>);

    #[async_trait]
    impl SentimentModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, _text: &str) -> Result<Classification, SentimentError> {
            self.0.clone().map_err(|()| SentimentError::Status {
                service: "fixed",
                status: 503,
                body: String::new(),
            })
        }
    }

    fn model_verdict(label: Sentiment, confidence: f64) -> Classification {
        Classification {
            label,
            confidence,
            reasoning: None,
            method: ClassificationMethod::Model,
        }
    }

    #[tokio::test]
    async fn uses_primary_when_it_answers() {
        let classifier = SentimentClassifier::new(
            Some(Arc::new(FixedModel(Ok(model_verdict(Sentiment::Negative, 0.9))))),
            Lexicon::default(),
        );
        let c = classifier.classify("I love it").await;
        assert_eq!(c.label, Sentiment::Negative);
        assert_eq!(c.method, ClassificationMethod::Model);
    }

    #[tokio::test]
    async fn falls_back_when_primary_errors() {
        let classifier =
            SentimentClassifier::new(Some(Arc::new(FixedModel(Err(())))), Lexicon::default());
        let c = classifier.classify("I love this brand, it's the best!").await;
        assert_eq!(c.label, Sentiment::Positive);
        assert_eq!(c.method, ClassificationMethod::Heuristic);
    }

    #[tokio::test]
    async fn clamps_primary_confidence() {
        let classifier = SentimentClassifier::new(
            Some(Arc::new(FixedModel(Ok(model_verdict(Sentiment::Neutral, 4.0))))),
            Lexicon::default(),
        );
        let c = classifier.classify("meh").await;
        assert!((c.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn heuristic_only_never_calls_a_model() {
        let classifier = SentimentClassifier::heuristic_only(Lexicon::default());
        assert!(!classifier.has_primary());
        let c = classifier.classify("worst purchase ever").await;
        assert_eq!(c.label, Sentiment::Negative);
    }
}
