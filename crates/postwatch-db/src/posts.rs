//! Database operations for the `posts` table.
//!
//! Ingestion only ever inserts; enrichment updates rows in place.

use chrono::{DateTime, Utc};
use postwatch_core::NormalizedPost;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

pub(crate) const POST_COLUMNS: &str = "id, external_id, post_url, author_name, author_profile, \
     author_title, post_time, content, reactions, comments, impressions, collected_at, run_id, \
     sentiment, sentiment_label, topics, hashtags, engagement, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `posts` table. The `search_vector` column is never read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub external_id: String,
    pub post_url: String,
    pub author_name: Option<String>,
    pub author_profile: Option<String>,
    pub author_title: Option<String>,
    pub post_time: Option<String>,
    pub content: String,
    pub reactions: i32,
    pub comments: i32,
    pub impressions: i32,
    pub collected_at: DateTime<Utc>,
    pub run_id: Option<Uuid>,
    pub sentiment: Option<f64>,
    pub sentiment_label: Option<String>,
    pub topics: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
    pub engagement: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A post whose content or engagement looks truncated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BackfillCandidate {
    pub id: i64,
    pub post_url: String,
    pub content: String,
    pub reactions: i32,
    pub comments: i32,
    pub author_name: Option<String>,
    pub author_title: Option<String>,
}

/// Fields to overwrite on one post; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillPatch {
    pub content: Option<String>,
    pub reactions: Option<i32>,
    pub comments: Option<i32>,
    pub author_name: Option<String>,
    pub author_title: Option<String>,
}

impl BackfillPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A post awaiting text analysis.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisCandidate {
    pub id: i64,
    pub content: String,
    pub reactions: i32,
    pub comments: i32,
}

/// Derived signals written by the analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PostAnalysis {
    pub sentiment: f64,
    pub sentiment_label: String,
    pub topics: Vec<String>,
    pub hashtags: Vec<String>,
    pub engagement: f64,
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Insert every post whose `external_id` is not yet stored, tagging new rows
/// with `run_id`.
///
/// Existing ids are skipped via `ON CONFLICT DO NOTHING`, so a concurrent
/// writer inserting the same id first is not an error. Rows are inserted in
/// `external_id` order so overlapping concurrent batches lock unique-index
/// entries in the same order and cannot deadlock. Within one batch the first
/// post carrying a given id wins. Returns the number of rows actually
/// inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the batch is rolled back.
pub async fn insert_new_posts(
    pool: &PgPool,
    posts: &[NormalizedPost],
    run_id: Uuid,
) -> Result<u64, DbError> {
    let mut ordered: Vec<&NormalizedPost> = posts.iter().collect();
    ordered.sort_by(|a, b| a.external_id.cmp(&b.external_id));

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for post in ordered {
        let result = sqlx::query(
            "INSERT INTO posts \
                 (external_id, post_url, author_name, author_profile, author_title, post_time, \
                  content, reactions, comments, impressions, collected_at, run_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (external_id) DO NOTHING",
        )
        .bind(&post.external_id)
        .bind(&post.post_url)
        .bind(&post.author_name)
        .bind(&post.author_profile)
        .bind(&post.author_title)
        .bind(&post.post_time)
        .bind(&post.content)
        .bind(post.reactions.max(0))
        .bind(post.comments.max(0))
        .bind(post.impressions.max(0))
        .bind(post.collected_at)
        .bind(run_id)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Fetch one post by its external identifier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<PostRow>, DbError> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE external_id = $1");
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(external_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

// ---------------------------------------------------------------------------
// Content backfill
// ---------------------------------------------------------------------------

/// Select posts whose content is shorter than `min_chars` characters or
/// whose reaction and comment counts are both zero.
///
/// `run_id` restricts the scan to one ingestion run; `limit` of `None`
/// selects every match. Rows come back in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_backfill_candidates(
    pool: &PgPool,
    run_id: Option<Uuid>,
    min_chars: i32,
    limit: Option<i64>,
) -> Result<Vec<BackfillCandidate>, DbError> {
    let rows = sqlx::query_as::<_, BackfillCandidate>(
        "SELECT id, post_url, content, reactions, comments, author_name, author_title \
         FROM posts \
         WHERE ($1::UUID IS NULL OR run_id = $1) \
           AND (char_length(content) < $2 OR (reactions = 0 AND comments = 0)) \
         ORDER BY id \
         LIMIT $3",
    )
    .bind(run_id)
    .bind(min_chars)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Overwrite the fields set in `patch`. Returns `false` when the patch is
/// empty or the post no longer exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn apply_backfill(pool: &PgPool, id: i64, patch: &BackfillPatch) -> Result<bool, DbError> {
    if patch.is_empty() {
        return Ok(false);
    }
    let result = sqlx::query(
        "UPDATE posts SET \
             content = COALESCE($2, content), \
             reactions = COALESCE($3, reactions), \
             comments = COALESCE($4, comments), \
             author_name = COALESCE($5, author_name), \
             author_title = COALESCE($6, author_title) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&patch.content)
    .bind(patch.reactions)
    .bind(patch.comments)
    .bind(&patch.author_name)
    .bind(&patch.author_title)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Text analysis
// ---------------------------------------------------------------------------

/// Select posts with no sentiment yet, optionally restricted to one run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn select_unanalyzed(
    pool: &PgPool,
    run_id: Option<Uuid>,
) -> Result<Vec<AnalysisCandidate>, DbError> {
    let rows = sqlx::query_as::<_, AnalysisCandidate>(
        "SELECT id, content, reactions, comments \
         FROM posts \
         WHERE sentiment IS NULL AND ($1::UUID IS NULL OR run_id = $1) \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Largest `reactions + 2 * comments` in scope (one run, or the whole
/// corpus when `run_id` is `None`). Zero for an empty scope.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn max_weighted_engagement(pool: &PgPool, run_id: Option<Uuid>) -> Result<i64, DbError> {
    let max: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(reactions::BIGINT + 2 * comments::BIGINT), 0)::BIGINT \
         FROM posts \
         WHERE ($1::UUID IS NULL OR run_id = $1)",
    )
    .bind(run_id)
    .fetch_one(pool)
    .await?;
    Ok(max)
}

/// Store the analysis pass output for one post.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no post has `id`, or [`DbError::Sqlx`]
/// if the update fails (including CHECK violations for out-of-range scores).
pub async fn update_analysis(pool: &PgPool, id: i64, analysis: &PostAnalysis) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts SET \
             sentiment = $2, sentiment_label = $3, topics = $4, hashtags = $5, engagement = $6 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(analysis.sentiment)
    .bind(&analysis.sentiment_label)
    .bind(&analysis.topics)
    .bind(&analysis.hashtags)
    .bind(analysis.engagement)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
