//! Database operations for the `mentions` table.
//!
//! Writes are append-only or compare-and-set: inserts ignore duplicate
//! `(brand_id, external_id)` pairs and classification only touches rows whose
//! `sentiment` is still `NULL`.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use sqlx::PgPool;
use uuid::Uuid;

use brandpulse_core::{Mention, Sentiment, SentimentCounts};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `mentions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub external_id: String,
    pub content: String,
    pub author: String,
    pub sentiment: Option<String>,
    pub confidence_score: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl TryFrom<MentionRow> for Mention {
    type Error = DbError;

    fn try_from(row: MentionRow) -> Result<Self, Self::Error> {
        let sentiment = row
            .sentiment
            .as_deref()
            .map(|s| {
                s.parse::<Sentiment>().map_err(|_| DbError::InvalidColumn {
                    column: "mentions.sentiment",
                    value: s.to_string(),
                })
            })
            .transpose()?;

        Ok(Mention {
            id: row.id,
            brand_id: row.brand_id,
            external_id: row.external_id,
            content: row.content,
            author: row.author,
            created_at: row.created_at,
            sentiment,
            confidence: row.confidence_score.and_then(|d| d.to_f64()),
            analyzed_at: row.analyzed_at,
        })
    }
}

/// Input for [`insert_mention`].
#[derive(Debug, Clone)]
pub struct NewMentionRow<'a> {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub external_id: &'a str,
    pub content: &'a str,
    pub author: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts of classified mentions for one brand.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct SentimentCountsRow {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

impl From<SentimentCountsRow> for SentimentCounts {
    fn from(row: SentimentCountsRow) -> Self {
        SentimentCounts {
            positive: row.positive,
            negative: row.negative,
            neutral: row.neutral,
        }
    }
}

const MENTION_COLUMNS: &str = "id, brand_id, external_id, content, author, sentiment, \
                               confidence_score, created_at, analyzed_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a mention unless one with the same `(brand_id, external_id)` exists.
///
/// Returns `true` when a row was inserted, `false` for a duplicate.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any reason other than
/// the duplicate key.
pub async fn insert_mention(pool: &PgPool, mention: &NewMentionRow<'_>) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO mentions (id, brand_id, external_id, content, author, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (brand_id, external_id) DO NOTHING",
    )
    .bind(mention.id)
    .bind(mention.brand_id)
    .bind(mention.external_id)
    .bind(mention.content)
    .bind(mention.author)
    .bind(mention.created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns up to `limit` unclassified mentions for a brand, oldest insert first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unclassified_mentions(
    pool: &PgPool,
    brand_id: Uuid,
    limit: i64,
) -> Result<Vec<MentionRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionRow>(&format!(
        "SELECT {MENTION_COLUMNS} \
         FROM mentions \
         WHERE brand_id = $1 AND sentiment IS NULL \
         ORDER BY seq \
         LIMIT $2"
    ))
    .bind(brand_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Label a mention, but only if it is still unclassified.
///
/// `confidence` is clamped to `[0, 1]` and rounded to the column's three
/// decimal places. Returns `false` when the mention was already labeled (or
/// does not exist), in which case nothing is written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn classify_mention(
    pool: &PgPool,
    mention_id: Uuid,
    sentiment: Sentiment,
    confidence: f64,
    analyzed_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let confidence = Decimal::from_f64(confidence.clamp(0.0, 1.0))
        .unwrap_or(Decimal::ZERO)
        .round_dp(3);

    let result = sqlx::query(
        "UPDATE mentions \
         SET sentiment = $1, confidence_score = $2, analyzed_at = $3 \
         WHERE id = $4 AND sentiment IS NULL",
    )
    .bind(sentiment.as_str())
    .bind(confidence)
    .bind(analyzed_at)
    .bind(mention_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Count classified mentions per label for a brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_sentiments(pool: &PgPool, brand_id: Uuid) -> Result<SentimentCountsRow, DbError> {
    let row = sqlx::query_as::<_, SentimentCountsRow>(
        "SELECT \
             COUNT(*) FILTER (WHERE sentiment = 'positive') AS positive, \
             COUNT(*) FILTER (WHERE sentiment = 'negative') AS negative, \
             COUNT(*) FILTER (WHERE sentiment = 'neutral') AS neutral \
         FROM mentions \
         WHERE brand_id = $1 AND sentiment IS NOT NULL",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
