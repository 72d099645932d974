//! The two enrichment passes: content backfill from the post's own page and
//! text analysis of stored content.
//!
//! Both passes only touch rows that still need them, so either may be rerun
//! at any time and in any order.

use std::time::Duration;

use postwatch_analysis::{analyze_text, engagement_score};
use postwatch_core::AppConfig;
use postwatch_db::{
    apply_backfill, max_weighted_engagement, select_backfill_candidates, select_unanalyzed,
    update_analysis, BackfillCandidate, BackfillPatch, DbError, PostAnalysis,
};
use postwatch_scraper::{ContentFetcher, PageMetadata, ScraperError};
use sqlx::PgPool;
use uuid::Uuid;

/// Which posts an enrichment pass considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Run(Uuid),
    Corpus,
}

impl Scope {
    fn run_id(self) -> Option<Uuid> {
        match self {
            Self::Run(id) => Some(id),
            Self::Corpus => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnrichmentSettings {
    /// Content shorter than this many characters is considered truncated.
    pub min_chars: usize,
    /// Pause after every page fetch.
    pub fetch_delay: Duration,
    /// Backfill cap for a corpus-wide pass.
    pub corpus_batch: i64,
}

impl EnrichmentSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_chars: config.backfill_min_chars,
            fetch_delay: Duration::from_millis(config.fetch_delay_ms),
            corpus_batch: config.backfill_batch,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub backfill_candidates: usize,
    pub backfilled: usize,
    pub analyzed: usize,
}

pub struct Enricher {
    fetcher: ContentFetcher,
    settings: EnrichmentSettings,
}

impl Enricher {
    #[must_use]
    pub fn new(fetcher: ContentFetcher, settings: EnrichmentSettings) -> Self {
        Self { fetcher, settings }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let fetcher = ContentFetcher::new(config.http_timeout_secs, &config.user_agent)?;
        Ok(Self::new(fetcher, EnrichmentSettings::from_app_config(config)))
    }

    /// Refetch posts in `scope` that look truncated and merge in whatever
    /// the page offers that is better than what is stored.
    ///
    /// A fetch that fails or yields nothing skips that post. Returns
    /// `(candidates, updated)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if selecting or updating posts fails.
    pub async fn backfill(&self, pool: &PgPool, scope: Scope) -> Result<(usize, usize), DbError> {
        let min_chars = i32::try_from(self.settings.min_chars).unwrap_or(i32::MAX);
        let limit = match scope {
            Scope::Run(_) => None,
            Scope::Corpus => Some(self.settings.corpus_batch),
        };
        let candidates = select_backfill_candidates(pool, scope.run_id(), min_chars, limit).await?;
        let mut updated = 0usize;

        for candidate in &candidates {
            match self.fetcher.fetch(&candidate.post_url).await {
                Ok(Some(metadata)) => {
                    let patch = merge_if_better(candidate, &metadata);
                    if apply_backfill(pool, candidate.id, &patch).await? {
                        updated += 1;
                    }
                }
                Ok(None) => {
                    tracing::debug!(post_id = candidate.id, "no metadata on post page");
                }
                Err(e) => {
                    tracing::warn!(
                        post_id = candidate.id,
                        url = %candidate.post_url,
                        error = %e,
                        "post page fetch failed; skipping"
                    );
                }
            }
            tokio::time::sleep(self.settings.fetch_delay).await;
        }

        Ok((candidates.len(), updated))
    }

    /// Backfill then analyze. Either pass failing is logged and the other
    /// still runs.
    pub async fn enrich(&self, pool: &PgPool, scope: Scope) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        match self.backfill(pool, scope).await {
            Ok((candidates, updated)) => {
                report.backfill_candidates = candidates;
                report.backfilled = updated;
            }
            Err(e) => tracing::error!(scope = ?scope, error = %e, "content backfill failed"),
        }

        match analyze_scope(pool, scope).await {
            Ok(analyzed) => report.analyzed = analyzed,
            Err(e) => tracing::error!(scope = ?scope, error = %e, "text analysis failed"),
        }

        tracing::info!(
            scope = ?scope,
            candidates = report.backfill_candidates,
            backfilled = report.backfilled,
            analyzed = report.analyzed,
            "enrichment finished"
        );
        report
    }
}

/// Build the update for one post: each field is taken from the page only
/// when it is longer or larger than the stored value, or fills a blank.
#[must_use]
pub fn merge_if_better(current: &BackfillCandidate, fetched: &PageMetadata) -> BackfillPatch {
    let content = fetched
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| c.chars().count() > current.content.chars().count())
        .map(ToOwned::to_owned);

    BackfillPatch {
        content,
        reactions: fetched.reactions.filter(|&r| r > current.reactions),
        comments: fetched.comments.filter(|&c| c > current.comments),
        author_name: fill_blank(current.author_name.as_deref(), fetched.author_name.as_deref()),
        author_title: fill_blank(
            current.author_title.as_deref(),
            fetched.author_title.as_deref(),
        ),
    }
}

fn fill_blank(current: Option<&str>, fetched: Option<&str>) -> Option<String> {
    if current.is_some_and(|c| !c.trim().is_empty()) {
        return None;
    }
    fetched
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToOwned::to_owned)
}

/// Analyze one post body; `None` for blank content.
#[must_use]
pub fn analyze_post(content: &str, reactions: i32, comments: i32, max_observed: i64) -> Option<PostAnalysis> {
    let analysis = analyze_text(content)?;
    Some(PostAnalysis {
        sentiment: analysis.sentiment,
        sentiment_label: analysis.label.as_str().to_string(),
        topics: analysis.topics,
        hashtags: analysis.hashtags,
        engagement: engagement_score(reactions, comments, max_observed),
    })
}

/// Score every post in `scope` that has no sentiment yet. Engagement is
/// relative to the scope's own maximum. Returns the number of posts updated.
///
/// # Errors
///
/// Returns [`DbError`] if selecting or updating posts fails.
pub async fn analyze_scope(pool: &PgPool, scope: Scope) -> Result<usize, DbError> {
    let max_observed = max_weighted_engagement(pool, scope.run_id()).await?;
    let candidates = select_unanalyzed(pool, scope.run_id()).await?;
    let mut analyzed = 0usize;

    for candidate in candidates {
        let Some(analysis) = analyze_post(
            &candidate.content,
            candidate.reactions,
            candidate.comments,
            max_observed,
        ) else {
            continue;
        };
        update_analysis(pool, candidate.id, &analysis).await?;
        analyzed += 1;
    }

    Ok(analyzed)
}

#[cfg(test)]
#[path = "enrichment_test.rs"]
mod tests;
