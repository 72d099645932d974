//! Conversion of raw source output into [`NormalizedPost`] records.
//!
//! Both adapters funnel through [`normalize`]; a `None` return means the raw
//! result is not member-authored content (or is too malformed to identify)
//! and is dropped without further notice.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use postwatch_core::NormalizedPost;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::url_filter::is_content_url;

pub(crate) const SITE_ORIGIN: &str = "https://www.linkedin.com";

/// Activity ids below this are not snowflake values.
const MIN_ACTIVITY_ID: u64 = 1_000_000_000;
const SNOWFLAKE_TIMESTAMP_SHIFT: u32 = 22;
const POST_TIME_FORMAT: &str = "%b %d, %Y";

static ACTIVITY_URN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urn:li:activity:(\d+)").expect("valid activity urn regex"));
static POST_ACTIVITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"activity[_-](\d+)").expect("valid post activity regex"));
static POST_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"linkedin\.com/posts/([^_/?#]+)").expect("valid post slug regex")
});
static DATE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\w{3}\s+\d{1,2},\s+\d{4}|\d+\s+(?:hours?|days?|weeks?|months?|years?)\s+ago)\s*[·\-]\s*",
    )
    .expect("valid date prefix regex")
});

/// One hit from the anonymous web-search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// One content block read from a rendered, signed-in feed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPost {
    pub activity_id: Option<String>,
    pub detail_url: Option<String>,
    pub author_name: Option<String>,
    pub author_profile: Option<String>,
    pub author_title: Option<String>,
    pub post_time: Option<String>,
    pub content: Option<String>,
    pub reactions: i32,
    pub comments: i32,
    pub impressions: i32,
}

/// Source output awaiting normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    Anonymous(AnonymousResult),
    Rendered(RenderedPost),
}

/// Normalizes one raw result, stamping `now` as the collection time unless
/// the post's activity id carries its own timestamp.
#[must_use]
pub fn normalize(raw: RawResult, now: DateTime<Utc>) -> Option<NormalizedPost> {
    match raw {
        RawResult::Anonymous(result) => normalize_anonymous(result, now),
        RawResult::Rendered(post) => normalize_rendered(post, now),
    }
}

/// Identifier derived from a post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExternalId {
    pub value: String,
    /// `true` when `value` is an activity id taken from the URL rather than
    /// a hash of it.
    pub from_activity: bool,
}

pub(crate) fn derive_external_id(url: &str) -> ExternalId {
    let activity = ACTIVITY_URN_RE.captures(url).or_else(|| {
        if url.contains("/posts/") {
            POST_ACTIVITY_RE.captures(url)
        } else {
            None
        }
    });

    if let Some(id) = activity.and_then(|c| c.get(1)) {
        return ExternalId {
            value: id.as_str().to_string(),
            from_activity: true,
        };
    }

    let mut hex = format!("{:x}", Sha256::digest(url.as_bytes()));
    hex.truncate(16);
    ExternalId {
        value: hex,
        from_activity: false,
    }
}

/// Millisecond timestamp embedded in the upper bits of an activity id.
pub(crate) fn activity_timestamp(activity_id: &str) -> Option<DateTime<Utc>> {
    let id = activity_id.parse::<u64>().ok()?;
    if id < MIN_ACTIVITY_ID {
        return None;
    }
    let millis = i64::try_from(id >> SNOWFLAKE_TIMESTAMP_SHIFT).ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Removes a leading `"Jun 18, 2025 · "` or `"3 days ago · "` marker.
pub(crate) fn strip_date_prefix(text: &str) -> &str {
    match DATE_PREFIX_RE.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text,
    }
}

pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn join_title(title: &str, snippet: &str) -> String {
    if title.is_empty() {
        snippet.to_string()
    } else {
        format!("{title}\n{snippet}").trim().to_string()
    }
}

fn normalize_anonymous(result: AnonymousResult, now: DateTime<Utc>) -> Option<NormalizedPost> {
    let AnonymousResult {
        url,
        title,
        snippet,
    } = result;
    let url = url.trim().to_string();
    if url.is_empty() || !is_content_url(&url) {
        return None;
    }

    let mut author_name = String::new();
    let mut content = snippet.clone();

    if let Some((author, post_title)) = title.split_once(" on LinkedIn:") {
        author_name = author.trim().to_string();
        content = join_title(post_title.trim(), &snippet);
    } else if let Some((author, _)) = title.split_once(" posted on LinkedIn") {
        author_name = author.trim().to_string();
    } else if let Some((head, _)) = title.split_once(" | LinkedIn") {
        if url.contains("/pulse/") {
            content = join_title(head.trim(), &snippet);
        } else {
            author_name = head.trim().to_string();
        }
    }

    let slug = if url.contains("/posts/") {
        POST_SLUG_RE
            .captures(&url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    } else {
        None
    };
    if author_name.is_empty() {
        if let Some(slug) = &slug {
            author_name = title_case(&slug.replace('-', " "));
        }
    }
    let author_profile = slug.map(|s| format!("{SITE_ORIGIN}/in/{s}/"));

    if content.trim().is_empty() {
        content.clone_from(&title);
    }
    let content = strip_date_prefix(content.trim()).to_string();

    let id = derive_external_id(&url);
    let posted_at = if id.from_activity {
        activity_timestamp(&id.value)
    } else {
        None
    };

    Some(NormalizedPost {
        external_id: id.value,
        post_url: url,
        author_name: non_empty(&author_name),
        author_profile,
        author_title: None,
        post_time: posted_at.map(|t| t.format(POST_TIME_FORMAT).to_string()),
        content,
        reactions: 0,
        comments: 0,
        impressions: 0,
        collected_at: posted_at.unwrap_or(now),
    })
}

fn normalize_rendered(post: RenderedPost, now: DateTime<Utc>) -> Option<NormalizedPost> {
    let activity_id = post
        .activity_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))?
        .to_string();

    let post_url = post
        .detail_url
        .as_deref()
        .and_then(non_empty)
        .unwrap_or_else(|| format!("{SITE_ORIGIN}/feed/update/urn:li:activity:{activity_id}/"));

    let posted_at = activity_timestamp(&activity_id);
    let post_time = post
        .post_time
        .as_deref()
        .and_then(non_empty)
        .or_else(|| posted_at.map(|t| t.format(POST_TIME_FORMAT).to_string()));
    let content = post
        .content
        .as_deref()
        .map(|c| strip_date_prefix(c.trim()).to_string())
        .unwrap_or_default();

    Some(NormalizedPost {
        external_id: activity_id,
        post_url,
        author_name: post.author_name.as_deref().and_then(non_empty),
        author_profile: post.author_profile.as_deref().and_then(non_empty),
        author_title: post.author_title.as_deref().and_then(non_empty),
        post_time,
        content,
        reactions: post.reactions.max(0),
        comments: post.comments.max(0),
        impressions: post.impressions.max(0),
        collected_at: posted_at.unwrap_or(now),
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
