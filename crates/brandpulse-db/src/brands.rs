//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use brandpulse_core::Brand;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: Uuid,
    pub name: String,
    pub is_monitoring: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Brand {
            id: row.id,
            name: row.name,
            is_monitoring: row.is_monitoring,
            last_checked: row.last_checked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BRAND_COLUMNS: &str = "id, name, is_monitoring, last_checked, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Create a brand in monitoring state, or re-enable monitoring on the existing
/// brand whose name matches case-insensitively.
///
/// `id` is only used when a new row is inserted; an existing brand keeps its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_monitored_brand(
    pool: &PgPool,
    id: Uuid,
    name: &str,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(&format!(
        "INSERT INTO brands (id, name, is_monitoring) \
         VALUES ($1, $2, true) \
         ON CONFLICT ((LOWER(name))) DO UPDATE \
         SET is_monitoring = true, last_checked = NOW(), updated_at = NOW() \
         RETURNING {BRAND_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a brand by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand(pool: &PgPool, id: Uuid) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every brand with monitoring enabled, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_monitoring_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE is_monitoring = true ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets `brands.is_monitoring` for a brand.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_brand_monitoring(pool: &PgPool, id: Uuid, enabled: bool) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE brands \
         SET is_monitoring = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(enabled)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Sets `brands.last_checked` for a brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_brand_last_checked(
    pool: &PgPool,
    id: Uuid,
    checked_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE brands \
         SET last_checked = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(checked_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
