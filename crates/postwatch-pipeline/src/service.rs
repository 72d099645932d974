//! The operations exposed to front ends: ingestion, corpus search, saved
//! searches, monitoring and analytics.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use postwatch_core::{
    load_saved_searches, AppConfig, SavedSearchConfig, SavedSearchPatch, SearchFilters,
};
use postwatch_db::{
    AuthorStatRow, DailyEngagementRow, DbError, LabelCountRow, MonitorResultRow, OverviewRow,
    PostQuery, PostRow, SavedSearchRow, SearchPage, TermCountRow,
};
use postwatch_scraper::{activity_url, SearchRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::enrichment::{EnrichmentReport, Enricher, Scope};
use crate::ingest::{run_profile, run_query, search_source};
use crate::jobs::{IngestionRun, JobTracker, RunTarget};
use crate::sources::{LiveSources, SourceProvider};
use crate::PipelineError;

/// Everything the analytics view shows at once.
#[derive(Debug, Clone)]
pub struct AnalyticsReport {
    pub overview: OverviewRow,
    pub top_authors: Vec<AuthorStatRow>,
    pub trending_topics: Vec<TermCountRow>,
    pub hashtags: Vec<TermCountRow>,
    pub engagement_by_day: Vec<DailyEngagementRow>,
    pub sentiment: Vec<LabelCountRow>,
}

/// Cheap to clone; clones share the pool, the adapters and the job table.
#[derive(Clone)]
pub struct Postwatch {
    pub(crate) pool: PgPool,
    pub(crate) sources: Arc<dyn SourceProvider>,
    pub(crate) enricher: Arc<Enricher>,
    jobs: JobTracker,
}

impl Postwatch {
    #[must_use]
    pub fn new(pool: PgPool, sources: Arc<dyn SourceProvider>, enricher: Enricher) -> Self {
        Self {
            pool,
            sources,
            enricher: Arc::new(enricher),
            jobs: JobTracker::new(),
        }
    }

    /// Wire up live adapters and the page fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Scraper`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Result<Self, PipelineError> {
        let sources = LiveSources::from_config(config)?;
        let enricher = Enricher::from_app_config(config)?;
        Ok(Self::new(pool, Arc::new(sources), enricher))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn jobs(&self) -> &JobTracker {
        &self.jobs
    }

    // -----------------------------------------------------------------------
    // Ingestion runs
    // -----------------------------------------------------------------------

    /// Start collecting recent posts from one member's activity page.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AuthRequired`] when no login material is
    /// configured, or [`PipelineError::Credentials`] if it is unreadable.
    /// Nothing is launched in either case.
    pub fn launch_profile_ingestion(&self, target: &str, limit: usize) -> Result<Uuid, PipelineError> {
        let adapter = self.sources.authenticated()?.ok_or(PipelineError::AuthRequired)?;
        let profile_url = activity_url(target);
        let target = RunTarget::Profile {
            url: profile_url.clone(),
        };
        let service = self.clone();
        Ok(self.jobs.launch(target, limit, move |handle| {
            run_profile(service, handle, adapter, profile_url, limit)
        }))
    }

    /// Start a keyword search ingestion and return its run id immediately.
    pub fn launch_query_ingestion(&self, query: &str, filters: SearchFilters, limit: usize) -> Uuid {
        let target = RunTarget::Query {
            query: query.to_string(),
            filters: filters.clone(),
        };
        let request = SearchRequest {
            query: query.to_string(),
            filters,
            limit,
        };
        let service = self.clone();
        self.jobs
            .launch(target, limit, move |handle| run_query(service, handle, request))
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for an unknown run id.
    pub fn get_run(&self, run_id: Uuid) -> Result<IngestionRun, PipelineError> {
        self.jobs
            .get(run_id)
            .ok_or_else(|| PipelineError::NotFound(format!("run {run_id}")))
    }

    #[must_use]
    pub fn list_runs(&self) -> Vec<IngestionRun> {
        self.jobs.list_all()
    }

    // -----------------------------------------------------------------------
    // Corpus
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`PipelineError::Db`] if the query fails.
    pub async fn search(&self, query: &PostQuery) -> Result<SearchPage, PipelineError> {
        Ok(postwatch_db::search_posts(&self.pool, query).await?)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] if no post has `external_id`.
    pub async fn get_post(&self, external_id: &str) -> Result<PostRow, PipelineError> {
        postwatch_db::get_post_by_external_id(&self.pool, external_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("post {external_id}")))
    }

    /// Backfill a batch of truncated posts across the corpus, then analyze
    /// every post still lacking sentiment.
    pub async fn enrich_corpus(&self) -> EnrichmentReport {
        self.enricher.enrich(&self.pool, Scope::Corpus).await
    }

    // -----------------------------------------------------------------------
    // Saved searches
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`PipelineError::Db`] if the query fails.
    pub async fn list_saved_searches(&self) -> Result<Vec<SavedSearchRow>, PipelineError> {
        Ok(postwatch_db::list_saved_searches(&self.pool).await?)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the search is invalid, or
    /// [`PipelineError::Db`] if the insert fails (including a taken name).
    pub async fn create_saved_search(
        &self,
        search: &SavedSearchConfig,
    ) -> Result<SavedSearchRow, PipelineError> {
        search.validate()?;
        Ok(postwatch_db::create_saved_search(&self.pool, search).await?)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for an unknown id, or
    /// [`PipelineError::Db`] if the update fails.
    pub async fn update_saved_search(
        &self,
        id: i64,
        patch: &SavedSearchPatch,
    ) -> Result<SavedSearchRow, PipelineError> {
        postwatch_db::update_saved_search(&self.pool, id, patch)
            .await
            .map_err(|e| not_found(e, || format!("saved search {id}")))
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for an unknown id, or
    /// [`PipelineError::Db`] if the delete fails.
    pub async fn delete_saved_search(&self, id: i64) -> Result<(), PipelineError> {
        postwatch_db::delete_saved_search(&self.pool, id)
            .await
            .map_err(|e| not_found(e, || format!("saved search {id}")))
    }

    /// Execute one saved search right away, outside the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] for an unknown id, or whatever
    /// the execution itself fails with.
    pub async fn run_saved_search_now(&self, id: i64) -> Result<MonitorResultRow, PipelineError> {
        let search = postwatch_db::get_saved_search(&self.pool, id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("saved search {id}")))?;
        self.execute_saved_search(&search).await
    }

    /// Load saved searches from a YAML file, skipping names already stored.
    /// Returns the number inserted.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file is unreadable or
    /// invalid, or [`PipelineError::Db`] if the insert fails.
    pub async fn import_saved_searches(&self, path: &Path) -> Result<usize, PipelineError> {
        let file = load_saved_searches(path)?;
        Ok(postwatch_db::import_saved_searches(&self.pool, &file.searches).await?)
    }

    /// Search, save, enrich and record a monitor result for one saved search.
    ///
    /// Enrichment is best-effort. `last_run` advances only when the search
    /// and the save both succeed.
    pub(crate) async fn execute_saved_search(
        &self,
        search: &SavedSearchRow,
    ) -> Result<MonitorResultRow, PipelineError> {
        let run_id = Uuid::new_v4();
        let request = SearchRequest {
            query: search.query.clone(),
            filters: search.filters()?,
            limit: usize::try_from(search.max_posts).unwrap_or(0),
        };
        tracing::info!(
            search_id = search.id,
            name = %search.name,
            run_id = %run_id,
            "executing saved search"
        );

        let outcome = search_source(self.sources.as_ref(), &request, &|_| {}).await?;
        let inserted = postwatch_db::insert_new_posts(&self.pool, &outcome.posts, run_id).await?;
        self.enricher.enrich(&self.pool, Scope::Run(run_id)).await;

        let new_posts = i32::try_from(inserted).unwrap_or(i32::MAX);
        let result =
            postwatch_db::record_monitor_run(&self.pool, search.id, new_posts, run_id, Utc::now())
                .await?;
        tracing::info!(
            search_id = search.id,
            run_id = %run_id,
            adapter = outcome.adapter,
            found = outcome.posts.len(),
            new_posts,
            "saved search executed"
        );
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Monitoring
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`PipelineError::Db`] if the query fails.
    pub async fn list_monitor_results(&self, limit: i64) -> Result<Vec<MonitorResultRow>, PipelineError> {
        Ok(postwatch_db::list_monitor_results(&self.pool, limit).await?)
    }

    /// Total new posts found by saved searches in the last `hours` hours.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Db`] if the query fails.
    pub async fn unread_count_since(&self, hours: i64) -> Result<i64, PipelineError> {
        let since = Utc::now() - Duration::hours(hours);
        Ok(postwatch_db::unread_count_since(&self.pool, since).await?)
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`PipelineError::Db`] if any aggregate query fails.
    pub async fn analytics(
        &self,
        now: DateTime<Utc>,
        days: i64,
        limit: i64,
    ) -> Result<AnalyticsReport, PipelineError> {
        let pool = &self.pool;
        Ok(AnalyticsReport {
            overview: postwatch_db::overview(pool, now).await?,
            top_authors: postwatch_db::top_authors(pool, limit).await?,
            trending_topics: postwatch_db::trending_topics(pool, limit).await?,
            hashtags: postwatch_db::hashtag_frequency(pool, limit).await?,
            engagement_by_day: postwatch_db::engagement_over_time(pool, now - Duration::days(days))
                .await?,
            sentiment: postwatch_db::sentiment_distribution(pool).await?,
        })
    }
}

fn not_found(err: DbError, what: impl FnOnce() -> String) -> PipelineError {
    match err {
        DbError::NotFound => PipelineError::NotFound(what()),
        other => PipelineError::Db(other),
    }
}
