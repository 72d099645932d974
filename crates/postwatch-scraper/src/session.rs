//! Authenticated collection through a remote-controlled browser.
//!
//! A signed-in browser renders search or activity pages, which are scrolled
//! until enough posts appear or the page stops yielding new ones. Browser
//! control sits behind [`PageSession`] so the collection loop can run
//! against canned pages.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use postwatch_core::{NormalizedPost, SessionAuth, TimeRange};
use rand::Rng;
use thirtyfour::prelude::*;
use thirtyfour::{ChromiumLikeCapabilities, Cookie};

use crate::adapter::{Progress, SearchRequest, SourceAdapter};
use crate::error::AdapterError;
use crate::feed::parse_feed_blocks;
use crate::normalize::{normalize, RawResult, SITE_ORIGIN};

const READY_SELECTOR: &str = "#global-nav";
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";
const ACTIVITY_SUFFIX: &str = "/recent-activity/all/";

/// Pacing and stop conditions for one scroll-collect pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_scroll_attempts: u32,
    /// Consecutive rounds without a new post before giving up.
    pub max_idle_rounds: u32,
    /// Wait after the first navigation, before the first read.
    pub settle_delay: Duration,
    /// Base wait after each scroll; up to a quarter more is added at random.
    pub scroll_delay: Duration,
}

/// The browser operations the collection loop needs.
#[async_trait]
pub(crate) trait PageSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), AdapterError>;
    async fn page_source(&self) -> Result<String, AdapterError>;
    async fn scroll_to_bottom(&self) -> Result<(), AdapterError>;
}

/// Loads `url`, then alternates read-parse-scroll until `limit` posts are
/// collected, `max_scroll_attempts` scrolls are spent, or `max_idle_rounds`
/// reads in a row add nothing new.
pub(crate) async fn collect_rendered_posts(
    session: &dyn PageSession,
    url: &str,
    limit: usize,
    limits: &SessionLimits,
    progress: Progress<'_>,
) -> Result<Vec<NormalizedPost>, AdapterError> {
    session.goto(url).await?;
    tokio::time::sleep(limits.settle_delay).await;

    let mut seen: HashSet<String> = HashSet::new();
    let mut posts: Vec<NormalizedPost> = Vec::new();
    let mut scrolls = 0_u32;
    let mut idle_rounds = 0_u32;

    while posts.len() < limit
        && scrolls < limits.max_scroll_attempts
        && idle_rounds < limits.max_idle_rounds
    {
        let html = session.page_source().await?;
        let before = posts.len();
        for block in parse_feed_blocks(&html) {
            let Some(post) = normalize(RawResult::Rendered(block), Utc::now()) else {
                continue;
            };
            if !seen.insert(post.external_id.clone()) {
                continue;
            }
            posts.push(post);
            progress(posts.len());
            if posts.len() >= limit {
                break;
            }
        }

        if posts.len() == before {
            idle_rounds += 1;
        } else {
            idle_rounds = 0;
        }
        if posts.len() >= limit {
            break;
        }

        session.scroll_to_bottom().await?;
        tokio::time::sleep(jittered(limits.scroll_delay)).await;
        scrolls += 1;
    }

    tracing::debug!(url, scrolls, collected = posts.len(), "scroll collection finished");
    Ok(posts)
}

fn jittered(base: Duration) -> Duration {
    let max_extra = u64::try_from(base.as_millis() / 4).unwrap_or(u64::MAX);
    let extra = rand::rng().random_range(0..=max_extra);
    base + Duration::from_millis(extra)
}

// ---------------------------------------------------------------------------
// WebDriver-backed session
// ---------------------------------------------------------------------------

struct WebDriverSession {
    driver: WebDriver,
}

impl WebDriverSession {
    async fn start(webdriver_url: &str) -> Result<Self, AdapterError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless=new")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        let driver = WebDriver::new(webdriver_url, caps).await?;
        driver.set_window_rect(0, 0, 1920, 1080).await?;
        Ok(Self { driver })
    }

    /// Signs in with `auth` and waits for the signed-in navigation bar.
    async fn sign_in(&self, auth: &SessionAuth, timeout: Duration) -> Result<(), AdapterError> {
        match auth {
            SessionAuth::Credentials { email, password } => {
                self.driver.goto(format!("{SITE_ORIGIN}/login")).await?;
                let username = self
                    .driver
                    .query(By::Id("username"))
                    .wait(Duration::from_secs(10), Duration::from_millis(250))
                    .first()
                    .await?;
                username.clear().await?;
                username.send_keys(email).await?;
                let password_field = self.driver.find(By::Id("password")).await?;
                password_field.clear().await?;
                password_field.send_keys(password).await?;
                self.driver
                    .find(By::Css("button[type='submit']"))
                    .await?
                    .click()
                    .await?;
            }
            SessionAuth::CookieFile(path) => {
                self.driver.goto(SITE_ORIGIN).await?;
                for cookie in read_cookie_file(path)? {
                    if let Err(e) = self.driver.add_cookie(cookie).await {
                        tracing::debug!(error = %e, "session cookie rejected by browser");
                    }
                }
                self.driver.refresh().await?;
            }
        }

        self.driver
            .query(By::Css(READY_SELECTOR))
            .wait(timeout, Duration::from_millis(500))
            .first()
            .await
            .map_err(|_| AdapterError::AuthTimeout {
                timeout_secs: timeout.as_secs(),
            })?;
        Ok(())
    }

    async fn quit(self) {
        if let Err(e) = self.driver.quit().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), AdapterError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, AdapterError> {
        Ok(self.driver.source().await?)
    }

    async fn scroll_to_bottom(&self) -> Result<(), AdapterError> {
        self.driver.execute(SCROLL_SCRIPT, Vec::new()).await?;
        Ok(())
    }
}

/// Parses a Netscape-format cookie export into browser cookies.
fn read_cookie_file(path: &Path) -> Result<Vec<Cookie>, AdapterError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AdapterError::Cookies {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let cookies: Vec<Cookie> = parse_netscape_cookies(&raw)
        .into_iter()
        .map(|entry| {
            let mut cookie = Cookie::new(entry.name, entry.value);
            cookie.set_domain(entry.domain);
            cookie.set_path(entry.path);
            cookie
        })
        .collect();
    if cookies.is_empty() {
        return Err(AdapterError::Cookies {
            path: path.to_path_buf(),
            reason: "no cookies found".to_string(),
        });
    }
    Ok(cookies)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CookieEntry {
    pub domain: String,
    pub path: String,
    pub name: String,
    pub value: String,
}

/// Reads the tab-separated lines of a cookie export. `#HttpOnly_` domain
/// prefixes are stripped; other `#` lines and short lines are skipped.
pub(crate) fn parse_netscape_cookies(raw: &str) -> Vec<CookieEntry> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(CookieEntry {
                domain: fields[0].to_string(),
                path: fields[2].to_string(),
                name: fields[5].to_string(),
                value: fields[6].to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Signed-in search and profile collection.
pub struct SessionAdapter {
    webdriver_url: String,
    auth: SessionAuth,
    limits: SessionLimits,
    login_timeout: Duration,
}

impl SessionAdapter {
    #[must_use]
    pub fn new(
        webdriver_url: &str,
        auth: SessionAuth,
        limits: SessionLimits,
        login_timeout: Duration,
    ) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            auth,
            limits,
            login_timeout,
        }
    }

    /// Opens a browser, signs in, collects from `url`, and always closes
    /// the browser afterwards.
    async fn collect(
        &self,
        url: &str,
        limit: usize,
        progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError> {
        let session = WebDriverSession::start(&self.webdriver_url).await?;
        let result = match session.sign_in(&self.auth, self.login_timeout).await {
            Ok(()) => collect_rendered_posts(&session, url, limit, &self.limits, progress).await,
            Err(e) => Err(e),
        };
        session.quit().await;
        result
    }
}

#[async_trait]
impl SourceAdapter for SessionAdapter {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn search(
        &self,
        request: &SearchRequest,
        progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError> {
        let url = search_url(&request.query, request.filters.time_range);
        self.collect(&url, request.limit, progress).await
    }

    async fn scrape_profile(
        &self,
        profile_url: &str,
        limit: usize,
        progress: Progress<'_>,
    ) -> Result<Vec<NormalizedPost>, AdapterError> {
        let url = activity_url(profile_url);
        self.collect(&url, limit, progress).await
    }
}

/// The source's own content search, newest first.
pub(crate) fn search_url(query: &str, time_range: TimeRange) -> String {
    let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC);
    let mut url = format!(
        "{SITE_ORIGIN}/search/results/content/?keywords={encoded}&origin=FACETED_SEARCH&sortBy=date_posted"
    );
    let date_posted = match time_range {
        TimeRange::Day => Some("past-24h"),
        TimeRange::Week => Some("past-week"),
        TimeRange::Month => Some("past-month"),
        TimeRange::Year | TimeRange::Any => None,
    };
    if let Some(param) = date_posted {
        url.push_str("&datePosted=");
        url.push_str(param);
    }
    url
}

/// Points a profile URL at its full activity listing.
pub fn activity_url(profile_url: &str) -> String {
    if profile_url.contains("/recent-activity/") {
        profile_url.to_string()
    } else {
        format!("{}{ACTIVITY_SUFFIX}", profile_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
