use brandpulse_core::Sentiment;
use serde::{Deserialize, Serialize};

/// How a [`Classification`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// The external language model answered with a usable verdict.
    Model,
    /// The keyword heuristic was used.
    Heuristic,
}

/// Label and confidence for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Sentiment,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub method: ClassificationMethod,
}
