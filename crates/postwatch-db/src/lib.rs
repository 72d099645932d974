use postwatch_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/postwatch-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; count that as zero.
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Run a health check: a `SELECT 1` round trip on the pool.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}


pub mod analytics;
pub mod monitor_results;
pub mod posts;
pub mod saved_searches;
pub mod search;

pub use analytics::{
    engagement_over_time, hashtag_frequency, overview, period_starts, sentiment_distribution,
    top_authors, trending_topics, AuthorStatRow, DailyEngagementRow, LabelCountRow, OverviewRow,
    TermCountRow,
};
pub use monitor_results::{
    list_monitor_results, record_monitor_run, unread_count_since, MonitorResultRow,
};
pub use posts::{
    apply_backfill, get_post_by_external_id, insert_new_posts, max_weighted_engagement,
    select_backfill_candidates, select_unanalyzed, update_analysis, AnalysisCandidate,
    BackfillCandidate, BackfillPatch, PostAnalysis, PostRow,
};
pub use saved_searches::{
    advance_last_run, create_saved_search, delete_saved_search, get_saved_search,
    import_saved_searches, list_enabled_saved_searches, list_saved_searches,
    update_saved_search, SavedSearchRow,
};
pub use search::{build_tsquery, effective_sort, search_posts, PostQuery, SearchPage};
