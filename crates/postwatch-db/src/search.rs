//! Corpus retrieval: full-text relevance search and sorted listing.
//!
//! Text queries run against the `search_vector` column, which a trigger
//! keeps in step with every insert and update of a post.

use postwatch_core::SortOrder;
use sqlx::PgPool;
use uuid::Uuid;

use crate::posts::{PostRow, POST_COLUMNS};
use crate::DbError;

/// Parameters of one corpus search.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub text: Option<String>,
    /// Case-insensitive substring of the author name.
    pub author: Option<String>,
    pub sort: SortOrder,
    /// 1-based; values below 1 are treated as 1.
    pub page: i64,
    pub per_page: i64,
    /// Restricts results to one ingestion run. The text query is ignored
    /// when this is set.
    pub run_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub posts: Vec<PostRow>,
    /// Matches across all pages.
    pub total: i64,
}

/// Turns free text into a `to_tsquery` expression that cannot raise a
/// syntax error: each whitespace token loses surrounding double quotes, has
/// `\` and `'` escaped, and becomes a quoted lexeme. Tokens are ANDed.
///
/// Returns `None` when no token survives.
#[must_use]
pub fn build_tsquery(text: &str) -> Option<String> {
    let lexemes: Vec<String> = text
        .split_whitespace()
        .map(|token| token.trim_matches('"'))
        .filter(|token| !token.is_empty())
        .map(|token| format!("'{}'", token.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    (!lexemes.is_empty()).then(|| lexemes.join(" & "))
}

/// The ordering actually applied.
///
/// With a text query, the default `Date` becomes `Relevance` unless an
/// author filter is present. Without one, `Relevance` has nothing to rank
/// by and falls back to `Date`.
#[must_use]
pub fn effective_sort(has_text: bool, has_author: bool, requested: SortOrder) -> SortOrder {
    match (has_text, requested) {
        (true, SortOrder::Date) if !has_author => SortOrder::Relevance,
        (false, SortOrder::Relevance) => SortOrder::Date,
        (_, sort) => sort,
    }
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Relevance => "ts_rank_cd(search_vector, query) DESC, collected_at DESC, id DESC",
        SortOrder::Reactions => "reactions DESC, id DESC",
        SortOrder::Comments => "comments DESC, id DESC",
        SortOrder::Date => "collected_at DESC, id DESC",
    }
}

/// `%author%` with LIKE wildcards in the input escaped.
fn author_pattern(author: &str) -> String {
    let escaped = author
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Search the corpus.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn search_posts(pool: &PgPool, query: &PostQuery) -> Result<SearchPage, DbError> {
    let per_page = query.per_page.max(1);
    let offset = (query.page.max(1) - 1).saturating_mul(per_page);
    let author = query
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(author_pattern);

    let tsquery = if query.run_id.is_some() {
        None
    } else {
        query.text.as_deref().and_then(build_tsquery)
    };

    match tsquery {
        Some(tsquery) => {
            let sort = effective_sort(true, author.is_some(), query.sort);
            let sql = format!(
                "SELECT {POST_COLUMNS} \
                 FROM posts, to_tsquery('english', $1) AS query \
                 WHERE search_vector @@ query \
                   AND ($2::TEXT IS NULL OR author_name ILIKE $2) \
                 ORDER BY {} \
                 LIMIT $3 OFFSET $4",
                order_clause(sort)
            );
            let posts = sqlx::query_as::<_, PostRow>(&sql)
                .bind(&tsquery)
                .bind(&author)
                .bind(per_page)
                .bind(offset)
                .fetch_all(pool)
                .await?;
            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) \
                 FROM posts, to_tsquery('english', $1) AS query \
                 WHERE search_vector @@ query \
                   AND ($2::TEXT IS NULL OR author_name ILIKE $2)",
            )
            .bind(&tsquery)
            .bind(&author)
            .fetch_one(pool)
            .await?;
            Ok(SearchPage { posts, total })
        }
        None => {
            let sort = effective_sort(false, author.is_some(), query.sort);
            let sql = format!(
                "SELECT {POST_COLUMNS} \
                 FROM posts \
                 WHERE ($1::UUID IS NULL OR run_id = $1) \
                   AND ($2::TEXT IS NULL OR author_name ILIKE $2) \
                 ORDER BY {} \
                 LIMIT $3 OFFSET $4",
                order_clause(sort)
            );
            let posts = sqlx::query_as::<_, PostRow>(&sql)
                .bind(query.run_id)
                .bind(&author)
                .bind(per_page)
                .bind(offset)
                .fetch_all(pool)
                .await?;
            let total: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) \
                 FROM posts \
                 WHERE ($1::UUID IS NULL OR run_id = $1) \
                   AND ($2::TEXT IS NULL OR author_name ILIKE $2)",
            )
            .bind(query.run_id)
            .bind(&author)
            .fetch_one(pool)
            .await?;
            Ok(SearchPage { posts, total })
        }
    }
}
