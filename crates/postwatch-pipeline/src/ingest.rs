//! Bodies of the ingestion workers launched through the job tracker.

use std::sync::Arc;

use postwatch_core::NormalizedPost;
use postwatch_db::insert_new_posts;
use postwatch_scraper::{
    search_with_fallback, AdapterError, Progress, SearchOutcome, SearchRequest, SourceAdapter,
};

use crate::enrichment::Scope;
use crate::jobs::RunHandle;
use crate::service::Postwatch;
use crate::sources::SourceProvider;

/// Search with the signed-in adapter when one is configured, falling back
/// to the anonymous adapter on any failure. Unreadable login material
/// counts as "not configured".
pub(crate) async fn search_source(
    sources: &dyn SourceProvider,
    request: &SearchRequest,
    progress: Progress<'_>,
) -> Result<SearchOutcome, AdapterError> {
    let preferred = match sources.authenticated() {
        Ok(adapter) => adapter,
        Err(e) => {
            tracing::warn!(error = %e, "login material unreadable; searching anonymously");
            None
        }
    };
    let anonymous = sources.anonymous();
    search_with_fallback(preferred.as_deref(), anonymous.as_ref(), request, progress).await
}

pub(crate) async fn run_query(service: Postwatch, handle: RunHandle, request: SearchRequest) {
    let run_id = handle.run_id();
    tracing::info!(run_id = %run_id, query = %request.query, limit = request.limit, "query ingestion started");

    let progress = |n: usize| handle.report_progress(n);
    match search_source(service.sources.as_ref(), &request, &progress).await {
        Ok(outcome) => {
            tracing::info!(
                run_id = %run_id,
                adapter = outcome.adapter,
                found = outcome.posts.len(),
                "search finished"
            );
            persist_and_enrich(&service, &handle, &outcome.posts).await;
        }
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "query ingestion failed");
            handle.fail(e.to_string());
        }
    }
}

pub(crate) async fn run_profile(
    service: Postwatch,
    handle: RunHandle,
    adapter: Arc<dyn SourceAdapter>,
    profile_url: String,
    limit: usize,
) {
    let run_id = handle.run_id();
    tracing::info!(run_id = %run_id, profile = %profile_url, limit, "profile ingestion started");

    let progress = |n: usize| handle.report_progress(n);
    match adapter.scrape_profile(&profile_url, limit, &progress).await {
        Ok(posts) => persist_and_enrich(&service, &handle, &posts).await,
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "profile ingestion failed");
            handle.fail(e.to_string());
        }
    }
}

/// Save `posts`, complete the run, then enrich the run's posts.
///
/// Completion is published before enrichment starts; enrichment problems
/// are logged and never change the run's status.
async fn persist_and_enrich(service: &Postwatch, handle: &RunHandle, posts: &[NormalizedPost]) {
    let run_id = handle.run_id();
    let inserted = match insert_new_posts(&service.pool, posts, run_id).await {
        Ok(n) => usize::try_from(n).unwrap_or(usize::MAX),
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "failed to save posts");
            handle.fail(e.to_string());
            return;
        }
    };

    handle.complete(posts.len());
    tracing::info!(run_id = %run_id, found = posts.len(), inserted, "ingestion run completed");

    service.enricher.enrich(&service.pool, Scope::Run(run_id)).await;
}
