use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {service} response: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Longest response-body prefix kept in an error, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

impl SentimentError {
    /// Non-2xx reply from `service`, keeping only a bounded prefix of `body`.
    #[must_use]
    pub fn status(service: &'static str, status: u16, body: &str) -> Self {
        Self::Status {
            service,
            status,
            body: truncate_body(body),
        }
    }
}

/// Cut `body` to at most [`MAX_ERROR_BODY_CHARS`] characters, marking the cut
/// with an ellipsis.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
