//! Mention sources: where raw brand mentions come from.

mod twitter;

pub use twitter::TwitterSource;

use async_trait::async_trait;
use brandpulse_core::RawMention;

use crate::error::SentimentError;

/// Searches an external service for recent mentions of a brand.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Return zero or more mentions of `brand_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if the service cannot be reached or answers
    /// with something unusable.
    async fn fetch(&self, brand_name: &str) -> Result<Vec<RawMention>, SentimentError>;
}
