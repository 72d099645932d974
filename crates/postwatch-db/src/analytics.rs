//! Aggregate reads over the corpus.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OverviewRow {
    pub total_posts: i64,
    pub total_authors: i64,
    /// Mean engagement score, rounded to one decimal; 0 when nothing is scored.
    pub avg_engagement: f64,
    pub posts_today: i64,
    /// Posts collected since midnight UTC on the current week's Monday.
    pub posts_this_week: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorStatRow {
    pub author_name: String,
    pub post_count: i64,
    pub avg_engagement: f64,
}

/// A topic or hashtag with the number of posts carrying it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TermCountRow {
    pub term: String,
    pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyEngagementRow {
    pub day: NaiveDate,
    pub avg_engagement: f64,
    pub post_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabelCountRow {
    pub label: String,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Midnight UTC today and midnight UTC on this week's Monday.
#[must_use]
pub fn period_starts(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let monday = today
        .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
        .unwrap_or(today);
    (
        today.and_time(chrono::NaiveTime::MIN).and_utc(),
        monday.and_time(chrono::NaiveTime::MIN).and_utc(),
    )
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn overview(pool: &PgPool, now: DateTime<Utc>) -> Result<OverviewRow, DbError> {
    let (today_start, week_start) = period_starts(now);
    let row = sqlx::query_as::<_, OverviewRow>(
        "SELECT \
             COUNT(*) AS total_posts, \
             COUNT(DISTINCT author_name) AS total_authors, \
             COALESCE(ROUND(AVG(engagement)::NUMERIC, 1), 0)::DOUBLE PRECISION AS avg_engagement, \
             COUNT(*) FILTER (WHERE collected_at >= $1) AS posts_today, \
             COUNT(*) FILTER (WHERE collected_at >= $2) AS posts_this_week \
         FROM posts",
    )
    .bind(today_start)
    .bind(week_start)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Authors ranked by number of posts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_authors(pool: &PgPool, limit: i64) -> Result<Vec<AuthorStatRow>, DbError> {
    let rows = sqlx::query_as::<_, AuthorStatRow>(
        "SELECT \
             author_name, \
             COUNT(*) AS post_count, \
             COALESCE(ROUND(AVG(engagement)::NUMERIC, 1), 0)::DOUBLE PRECISION AS avg_engagement \
         FROM posts \
         WHERE author_name IS NOT NULL \
         GROUP BY author_name \
         ORDER BY post_count DESC, author_name \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most frequent extracted topics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn trending_topics(pool: &PgPool, limit: i64) -> Result<Vec<TermCountRow>, DbError> {
    let rows = sqlx::query_as::<_, TermCountRow>(
        "SELECT t.term, COUNT(*) AS count \
         FROM posts, unnest(topics) AS t(term) \
         GROUP BY t.term \
         ORDER BY count DESC, t.term \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most frequent hashtags. Repeats within one post each count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn hashtag_frequency(pool: &PgPool, limit: i64) -> Result<Vec<TermCountRow>, DbError> {
    let rows = sqlx::query_as::<_, TermCountRow>(
        "SELECT t.term, COUNT(*) AS count \
         FROM posts, unnest(hashtags) AS t(term) \
         GROUP BY t.term \
         ORDER BY count DESC, t.term \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Per-day post count and mean engagement since `since`, oldest day first.
/// Unscored posts count as zero engagement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn engagement_over_time(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<DailyEngagementRow>, DbError> {
    let rows = sqlx::query_as::<_, DailyEngagementRow>(
        "SELECT \
             (collected_at AT TIME ZONE 'UTC')::DATE AS day, \
             ROUND(AVG(COALESCE(engagement, 0))::NUMERIC, 1)::DOUBLE PRECISION AS avg_engagement, \
             COUNT(*) AS post_count \
         FROM posts \
         WHERE collected_at >= $1 \
         GROUP BY day \
         ORDER BY day",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn sentiment_distribution(pool: &PgPool) -> Result<Vec<LabelCountRow>, DbError> {
    let rows = sqlx::query_as::<_, LabelCountRow>(
        "SELECT sentiment_label AS label, COUNT(*) AS count \
         FROM posts \
         WHERE sentiment_label IS NOT NULL \
         GROUP BY sentiment_label \
         ORDER BY count DESC, label",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
