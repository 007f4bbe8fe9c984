//! Twitter/X API v2 recent search.

use std::collections::HashMap;

use async_trait::async_trait;
use brandpulse_core::RawMention;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::MentionSource;
use crate::error::SentimentError;

const TWITTER_API_URL: &str = "https://api.twitter.com/2";
const SERVICE: &str = "twitter";
const MAX_RESULTS: &str = "100";
const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

/// Mention source backed by the v2 `tweets/search/recent` endpoint.
pub struct TwitterSource {
    http: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl TwitterSource {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(bearer_token: &str, timeout: std::time::Duration) -> Result<Self, SentimentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            bearer_token: bearer_token.to_string(),
            base_url: TWITTER_API_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

/// Search query for a brand: its name or an @-handle made from the
/// lowercased name with whitespace removed.
pub(crate) fn search_query(brand_name: &str) -> String {
    let handle: String = brand_name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    format!("{brand_name} OR @{handle}")
}

fn into_mentions(response: SearchResponse) -> Vec<RawMention> {
    let usernames: HashMap<String, String> = response
        .includes
        .map(|i| i.users)
        .unwrap_or_default()
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    response
        .data
        .into_iter()
        .map(|tweet| {
            let author_handle = tweet
                .author_id
                .as_ref()
                .and_then(|id| usernames.get(id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
            RawMention {
                external_id: tweet.id,
                text: tweet.text,
                author_handle,
                created_at: tweet.created_at.unwrap_or_else(Utc::now),
            }
        })
        .collect()
}

#[async_trait]
impl MentionSource for TwitterSource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn fetch(&self, brand_name: &str) -> Result<Vec<RawMention>, SentimentError> {
        let url = format!("{}/tweets/search/recent", self.base_url);
        let query = search_query(brand_name);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", MAX_RESULTS),
                ("tweet.fields", "created_at,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "username"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SentimentError::status(SERVICE, status, &body));
        }

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| SentimentError::MalformedResponse {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;

        let mentions = into_mentions(body);
        tracing::debug!(brand = brand_name, count = mentions.len(), "twitter search complete");
        Ok(mentions)
    }
}
