//! Anonymous search through a web-search service's HTML endpoint.
//!
//! No source account is needed. The query is scoped to the source's content
//! paths with `site:` operators, and result pages are walked until enough
//! posts survive normalization.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use postwatch_core::{ContentType, NormalizedPost, SearchFilters, TimeRange};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::adapter::{Progress, SearchRequest, SourceAdapter};
use crate::error::{AdapterError, ScraperError};
use crate::location::{label_for, region_for};
use crate::normalize::{normalize, AnonymousResult, RawResult};

/// Result pages walked per search before giving up.
const MAX_PAGES: usize = 10;

/// Raw results requested per accepted post, to absorb normalizer rejects.
const OVERFETCH_FACTOR: usize = 3;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector")
}

static RESULT: LazyLock<Selector> = LazyLock::new(|| selector("div.result"));
static RESULT_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.result__a"));
static RESULT_SNIPPET: LazyLock<Selector> = LazyLock::new(|| selector(".result__snippet"));

pub struct AnonymousSearch {
    client: Client,
    base_url: String,
    fetch_cap: usize,
}

impl AnonymousSearch {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        fetch_cap: usize,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            fetch_cap,
        })
    }

    /// Number of raw results to consume for a target of `limit` posts.
    fn fetch_budget(&self, limit: usize) -> usize {
        limit.saturating_mul(OVERFETCH_FACTOR).min(self.fetch_cap)
    }

    async fn fetch_page(
        &self,
        query: &str,
        filters: &SearchFilters,
        offset: usize,
    ) -> Result<Vec<AnonymousResult>, ScraperError> {
        let mut params: Vec<(&str, String)> = vec![("q", query.to_string())];
        if let Some(df) = time_param(filters.time_range) {
            params.push(("df", df.to_string()));
        }
        if let Some(region) = region_for(&filters.location) {
            params.push(("kl", region.to_string()));
        }
        if offset > 0 {
            params.push(("s", offset.to_string()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                domain: response
                    .url()
                    .host_str()
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.base_url.clone(),
            });
        }
        let body = response.text().await?;
        Ok(parse_results_page(&body))
    }
}

#[async_trait]
impl SourceAdapter for AnonymousSearch {
    fn name(&self) -> &'static str {
        "anonymous"
    }

    /// Walks result pages until `request.limit` posts are accepted, the raw
    /// budget is spent, a page comes back empty, or [`MAX_PAGES`] is hit.
    ///
    /// A failure on the first page is returned; a failure on a later page
    /// ends the walk with what has been accepted so far.
    async fn search(
        &self,
        request: &SearchRequest,
        progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError> {
        let query = build_query(&request.query, &request.filters);
        let budget = self.fetch_budget(request.limit);
        let mut accepted: Vec<NormalizedPost> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut consumed = 0_usize;

        'pages: for page in 0..MAX_PAGES {
            if accepted.len() >= request.limit || consumed >= budget {
                break;
            }
            let results = match self.fetch_page(&query, &request.filters, consumed).await {
                Ok(results) => results,
                Err(e) if page == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(page, error = %e, "anonymous search: stopping early");
                    break;
                }
            };
            if results.is_empty() {
                break;
            }

            for result in results {
                if consumed >= budget {
                    break 'pages;
                }
                consumed += 1;
                let Some(post) = normalize(RawResult::Anonymous(result), Utc::now()) else {
                    continue;
                };
                if !seen.insert(post.external_id.clone()) {
                    continue;
                }
                accepted.push(post);
                progress(accepted.len());
                if accepted.len() >= request.limit {
                    break 'pages;
                }
            }
        }

        tracing::debug!(
            query = %request.query,
            consumed,
            accepted = accepted.len(),
            "anonymous search finished"
        );
        Ok(accepted)
    }
}

/// Builds the `site:`-scoped query string for the search service.
pub(crate) fn build_query(query: &str, filters: &SearchFilters) -> String {
    let location = label_for(&filters.location)
        .map(|label| format!(" \"{label}\""))
        .unwrap_or_default();
    let scope = match filters.content_type {
        ContentType::Posts => "site:linkedin.com/posts",
        ContentType::Articles => "site:linkedin.com/pulse",
        ContentType::All => "site:linkedin.com/posts OR site:linkedin.com/pulse",
    };
    format!("{scope} \"{query}\"{location}")
}

fn time_param(range: TimeRange) -> Option<&'static str> {
    match range {
        TimeRange::Any => None,
        TimeRange::Day => Some("d"),
        TimeRange::Week => Some("w"),
        TimeRange::Month => Some("m"),
        TimeRange::Year => Some("y"),
    }
}

/// Extracts organic results from a results page, skipping ads.
pub(crate) fn parse_results_page(html: &str) -> Vec<AnonymousResult> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT)
        .filter(|r| !r.value().classes().any(|c| c == "result--ad"))
        .filter_map(|r| {
            let link = r.select(&RESULT_LINK).next()?;
            let url = decode_result_href(link.value().attr("href")?)?;
            let title = collapse_text(link.text());
            let snippet = r
                .select(&RESULT_SNIPPET)
                .next()
                .map(|s| collapse_text(s.text()))
                .unwrap_or_default();
            Some(AnonymousResult {
                url,
                title,
                snippet,
            })
        })
        .collect()
}

fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves the service's redirect links (`//duckduckgo.com/l/?uddg=...`)
/// to the target URL.
pub(crate) fn decode_result_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = reqwest::Url::parse(&absolute).ok()?;
    if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }
    Some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_query_is_site_scoped_and_quoted() {
        let q = build_query("rust jobs", &SearchFilters::default());
        assert_eq!(q, r#"site:linkedin.com/posts "rust jobs""#);
    }

    #[test]
    fn articles_query_with_location() {
        let filters = SearchFilters {
            content_type: ContentType::Articles,
            time_range: TimeRange::Week,
            location: "new-york".to_owned(),
        };
        assert_eq!(
            build_query("fintech", &filters),
            r#"site:linkedin.com/pulse "fintech" "New York""#
        );
    }

    #[test]
    fn all_content_query_ors_both_scopes() {
        let filters = SearchFilters {
            content_type: ContentType::All,
            ..SearchFilters::default()
        };
        assert_eq!(
            build_query("ai", &filters),
            r#"site:linkedin.com/posts OR site:linkedin.com/pulse "ai""#
        );
    }

    #[test]
    fn time_ranges_map_to_service_codes() {
        assert_eq!(time_param(TimeRange::Any), None);
        assert_eq!(time_param(TimeRange::Day), Some("d"));
        assert_eq!(time_param(TimeRange::Year), Some("y"));
    }

    #[test]
    fn redirect_links_are_decoded() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.linkedin.com%2Fposts%2Fjane_x-activity-1&rut=abc";
        assert_eq!(
            decode_result_href(href).as_deref(),
            Some("https://www.linkedin.com/posts/jane_x-activity-1")
        );
    }

    #[test]
    fn direct_links_pass_through() {
        assert_eq!(
            decode_result_href("https://www.linkedin.com/pulse/x").as_deref(),
            Some("https://www.linkedin.com/pulse/x")
        );
        assert_eq!(decode_result_href("  "), None);
    }

    #[test]
    fn fetch_budget_is_three_times_target_capped() {
        let search = AnonymousSearch::new("http://localhost", 5, "test", 150).unwrap();
        assert_eq!(search.fetch_budget(20), 60);
        assert_eq!(search.fetch_budget(100), 150);
    }

    #[test]
    fn ads_are_skipped() {
        let html = r#"
            <div class="result result--ad"><a class="result__a" href="https://ads.example.com">Ad</a></div>
            <div class="result"><a class="result__a" href="https://www.linkedin.com/pulse/x">  Real
              title </a><a class="result__snippet">Snippet <b>bold</b> text</a></div>
        "#;
        let results = parse_results_page(html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Real title");
        assert_eq!(results[0].snippet, "Snippet bold text");
    }
}
