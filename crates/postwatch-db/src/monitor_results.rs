//! Database operations for the append-only `monitor_results` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `monitor_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonitorResultRow {
    pub id: i64,
    pub saved_search_id: i64,
    pub new_posts_count: i32,
    pub run_at: DateTime<Utc>,
    pub run_id: Option<Uuid>,
}

/// Record one execution of a saved search and advance its `last_run` to
/// `run_at`, in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails; neither is applied.
pub async fn record_monitor_run(
    pool: &PgPool,
    saved_search_id: i64,
    new_posts_count: i32,
    run_id: Uuid,
    run_at: DateTime<Utc>,
) -> Result<MonitorResultRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, MonitorResultRow>(
        "INSERT INTO monitor_results (saved_search_id, new_posts_count, run_at, run_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, saved_search_id, new_posts_count, run_at, run_id",
    )
    .bind(saved_search_id)
    .bind(new_posts_count.max(0))
    .bind(run_at)
    .bind(run_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE saved_searches SET last_run = GREATEST(last_run, $2) WHERE id = $1")
        .bind(saved_search_id)
        .bind(run_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// List the most recent monitor results across all saved searches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_monitor_results(pool: &PgPool, limit: i64) -> Result<Vec<MonitorResultRow>, DbError> {
    let rows = sqlx::query_as::<_, MonitorResultRow>(
        "SELECT id, saved_search_id, new_posts_count, run_at, run_id \
         FROM monitor_results \
         ORDER BY run_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Total new posts reported by monitor runs at or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn unread_count_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, DbError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(new_posts_count), 0)::BIGINT FROM monitor_results WHERE run_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(total)
}
