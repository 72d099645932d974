//! The source-adapter seam and the authenticated-then-anonymous fallback.

use async_trait::async_trait;
use postwatch_core::{NormalizedPost, SearchFilters};

use crate::error::AdapterError;

/// Progress callback invoked with the running count of accepted posts.
pub type Progress<'a> = &'a (dyn Fn(usize) + Send + Sync);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    /// Number of accepted posts after which the adapter stops.
    pub limit: usize,
}

/// A strategy for pulling posts out of the source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs a keyword search, returning at most `request.limit` posts with
    /// distinct external ids.
    async fn search(
        &self,
        request: &SearchRequest,
        progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError>;

    /// Collects recent posts from one member's activity page.
    async fn scrape_profile(
        &self,
        _profile_url: &str,
        _limit: usize,
        _progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError> {
        Err(AdapterError::Unsupported {
            adapter: self.name(),
            operation: "profile scraping",
        })
    }
}

/// Posts returned by [`search_with_fallback`] and which adapter produced them.
#[derive(Debug)]
pub struct SearchOutcome {
    pub posts: Vec<NormalizedPost>,
    pub adapter: &'static str,
    /// Set when the preferred adapter failed and the fallback served the
    /// request instead.
    pub fallback_reason: Option<String>,
}

/// Searches with `preferred` when one is configured, switching to
/// `fallback` on any error from it.
///
/// The preferred adapter's failure is logged and recorded in
/// [`SearchOutcome::fallback_reason`]; it is never returned as an error.
///
/// # Errors
///
/// Returns the fallback adapter's [`AdapterError`] if it fails too.
pub async fn search_with_fallback(
    preferred: Option<&dyn SourceAdapter>,
    fallback: &dyn SourceAdapter,
    request: &SearchRequest,
    progress: Progress<'_>,
) -> Result<SearchOutcome, AdapterError> {
    let mut fallback_reason = None;

    if let Some(adapter) = preferred {
        match adapter.search(request, progress).await {
            Ok(posts) => {
                return Ok(SearchOutcome {
                    posts,
                    adapter: adapter.name(),
                    fallback_reason: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    adapter = adapter.name(),
                    fallback = fallback.name(),
                    query = %request.query,
                    error = %e,
                    "search adapter failed; falling back"
                );
                fallback_reason = Some(e.to_string());
            }
        }
    }

    let posts = fallback.search(request, progress).await?;
    Ok(SearchOutcome {
        posts,
        adapter: fallback.name(),
        fallback_reason,
    })
}
