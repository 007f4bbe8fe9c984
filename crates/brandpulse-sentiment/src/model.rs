//! Primary classifier: an OpenAI-compatible chat-completions model.

use std::time::Duration;

use async_trait::async_trait;
use brandpulse_core::Sentiment;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;
use crate::types::{Classification, ClassificationMethod};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const SERVICE: &str = "openai";

const SYSTEM_PROMPT: &str = "You are a sentiment analysis expert. Analyze the sentiment of social \
media posts about brands. Respond with a JSON object containing: sentiment (positive, negative, \
or neutral), confidence (0-1), and reasoning (brief explanation).";

/// A language service that labels one piece of text.
///
/// Any error means the service is unavailable for this text and the caller
/// falls back to the keyword heuristic.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<Classification, SentimentError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// The JSON object the model is asked to produce.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    sentiment: String,
    confidence: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

pub struct OpenAiSentimentModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiSentimentModel {
    /// Build a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, SentimentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, SentimentError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| SentimentError::Config("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl SentimentModel for OpenAiSentimentModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, text: &str) -> Result<Classification, SentimentError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.1,
            max_tokens: 150,
        };

        tracing::debug!(model = %self.model, "sentiment model request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SentimentError::status(SERVICE, status, &body));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| malformed("no message content"))?;

        parse_verdict(&content)
    }
}

/// Parse the model's message content into a [`Classification`].
///
/// Accepts the object bare or wrapped in a Markdown code fence.
pub(crate) fn parse_verdict(content: &str) -> Result<Classification, SentimentError> {
    let body = strip_code_fence(content);
    let verdict: ModelVerdict =
        serde_json::from_str(body).map_err(|e| malformed(&format!("invalid JSON: {e}")))?;

    let label = verdict
        .sentiment
        .parse::<Sentiment>()
        .map_err(|e| malformed(&e.to_string()))?;

    if !verdict.confidence.is_finite() {
        return Err(malformed("confidence is not a finite number"));
    }

    Ok(Classification {
        label,
        confidence: verdict.confidence.clamp(0.0, 1.0),
        reasoning: verdict.reasoning,
        method: ClassificationMethod::Model,
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn malformed(reason: &str) -> SentimentError {
    SentimentError::MalformedResponse {
        service: SERVICE,
        reason: reason.to_string(),
    }
}
