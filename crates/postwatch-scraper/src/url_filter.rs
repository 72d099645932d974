use std::sync::LazyLock;

use regex::Regex;

const CONTENT_PATH_MARKERS: &[&str] = &["/posts/", "/pulse/", "/feed/update/"];

const BLOCKED_HOSTS: &[&str] = &[
    "business.linkedin.com",
    "training.linkedin.com",
    "news.linkedin.com",
    "engineering.linkedin.com",
    "learning.linkedin.com",
    "ads.linkedin.com",
    "developer.linkedin.com",
];

const BLOCKED_PATHS: &[&str] = &[
    "/advice/",
    "/help/",
    "/legal/",
    "/jobs/",
    "/company/",
    "/school/",
    "/events/",
    "/groups/",
    "/learning/",
    "/showcase/",
    "/newsletters/",
];

static BARE_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"linkedin\.com/?\?").expect("valid landing-page regex"));

/// Returns `true` when `url` points at member-authored content (a post, an
/// article, or a feed update) rather than a product, help or profile page.
#[must_use]
pub fn is_content_url(url: &str) -> bool {
    if !url.contains("linkedin.com") {
        return false;
    }
    if BLOCKED_HOSTS.iter().any(|host| url.contains(host)) {
        return false;
    }
    if BLOCKED_PATHS.iter().any(|path| url.contains(path)) {
        return false;
    }
    if BARE_QUERY_RE.is_match(url) {
        return false;
    }
    if url.contains("/in/")
        && !["/posts/", "/activity/", "/pulse/"]
            .iter()
            .any(|segment| url.contains(segment))
    {
        return false;
    }
    CONTENT_PATH_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
}
