//! Database operations for the `saved_searches` table.

use chrono::{DateTime, Utc};
use postwatch_core::{CoreError, SavedSearchConfig, SavedSearchPatch, SearchFilters};
use sqlx::PgPool;

use crate::DbError;

const SAVED_SEARCH_COLUMNS: &str = "id, name, query, content_type, time_range, location, \
     max_posts, schedule_hours, enabled, last_run, created_at";

/// A row from the `saved_searches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedSearchRow {
    pub id: i64,
    pub name: String,
    pub query: String,
    pub content_type: String,
    pub time_range: String,
    pub location: String,
    pub max_posts: i32,
    pub schedule_hours: i32,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SavedSearchRow {
    /// Parse the stored filter columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if a stored value is not a known filter.
    pub fn filters(&self) -> Result<SearchFilters, CoreError> {
        Ok(SearchFilters {
            content_type: self.content_type.parse()?,
            time_range: self.time_range.parse()?,
            location: self.location.clone(),
        })
    }
}

/// List all saved searches, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_saved_searches(pool: &PgPool) -> Result<Vec<SavedSearchRow>, DbError> {
    let sql = format!(
        "SELECT {SAVED_SEARCH_COLUMNS} FROM saved_searches ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, SavedSearchRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// List enabled saved searches in id order, the order the scheduler
/// evaluates them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enabled_saved_searches(pool: &PgPool) -> Result<Vec<SavedSearchRow>, DbError> {
    let sql = format!("SELECT {SAVED_SEARCH_COLUMNS} FROM saved_searches WHERE enabled ORDER BY id");
    let rows = sqlx::query_as::<_, SavedSearchRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_saved_search(pool: &PgPool, id: i64) -> Result<Option<SavedSearchRow>, DbError> {
    let sql = format!("SELECT {SAVED_SEARCH_COLUMNS} FROM saved_searches WHERE id = $1");
    let row = sqlx::query_as::<_, SavedSearchRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a saved search and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation on `name`.
pub async fn create_saved_search(
    pool: &PgPool,
    search: &SavedSearchConfig,
) -> Result<SavedSearchRow, DbError> {
    let sql = format!(
        "INSERT INTO saved_searches \
             (name, query, content_type, time_range, location, max_posts, schedule_hours, enabled) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {SAVED_SEARCH_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SavedSearchRow>(&sql)
        .bind(&search.name)
        .bind(&search.query)
        .bind(search.content_type.as_str())
        .bind(search.time_range.as_str())
        .bind(&search.location)
        .bind(search.max_posts)
        .bind(search.schedule_hours)
        .bind(search.enabled)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Apply the fields set in `patch` and return the updated row.
///
/// `last_run` is not editable here; see [`advance_last_run`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no saved search has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_saved_search(
    pool: &PgPool,
    id: i64,
    patch: &SavedSearchPatch,
) -> Result<SavedSearchRow, DbError> {
    let sql = format!(
        "UPDATE saved_searches SET \
             name = COALESCE($2, name), \
             query = COALESCE($3, query), \
             content_type = COALESCE($4, content_type), \
             time_range = COALESCE($5, time_range), \
             location = COALESCE($6, location), \
             max_posts = COALESCE($7, max_posts), \
             schedule_hours = COALESCE($8, schedule_hours), \
             enabled = COALESCE($9, enabled) \
         WHERE id = $1 \
         RETURNING {SAVED_SEARCH_COLUMNS}"
    );
    sqlx::query_as::<_, SavedSearchRow>(&sql)
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.query)
        .bind(patch.content_type.map(|c| c.as_str()))
        .bind(patch.time_range.map(|t| t.as_str()))
        .bind(&patch.location)
        .bind(patch.max_posts)
        .bind(patch.schedule_hours)
        .bind(patch.enabled)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Delete a saved search and, by cascade, its monitor results.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no saved search has `id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_saved_search(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM saved_searches WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Move `last_run` forward to `at`. An older `at` leaves it unchanged.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn advance_last_run(pool: &PgPool, id: i64, at: DateTime<Utc>) -> Result<(), DbError> {
    sqlx::query("UPDATE saved_searches SET last_run = GREATEST(last_run, $2) WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert saved searches from an import file, skipping names that already
/// exist. Returns the number inserted.
///
/// All inserts run inside a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn import_saved_searches(
    pool: &PgPool,
    searches: &[SavedSearchConfig],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for search in searches {
        let result = sqlx::query(
            "INSERT INTO saved_searches \
                 (name, query, content_type, time_range, location, max_posts, schedule_hours, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&search.name)
        .bind(&search.query)
        .bind(search.content_type.as_str())
        .bind(search.time_range.as_str())
        .bind(&search.location)
        .bind(search.max_posts)
        .bind(search.schedule_hours)
        .bind(search.enabled)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}
