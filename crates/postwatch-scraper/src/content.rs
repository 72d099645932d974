//! Direct fetches of a post's public page to recover fuller content,
//! engagement counts and author details than search snippets carry.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::ScraperError;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector")
}

static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:description"]"#));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:title"]"#));
static META_AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[name="author"]"#));
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Fields recovered from a post page. Absent fields were not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub content: Option<String>,
    pub author_name: Option<String>,
    pub author_title: Option<String>,
    pub reactions: Option<i32>,
    pub comments: Option<i32>,
}

impl PageMetadata {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and extracts its metadata.
    ///
    /// Returns `Ok(None)` for non-200 responses and for pages that carry no
    /// usable metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on network or body-read failure.
    pub async fn fetch(&self, url: &str) -> Result<Option<PageMetadata>, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(url, status = response.status().as_u16(), "content fetch: non-200");
            return Ok(None);
        }
        let body = response.text().await?;
        let metadata = extract_page_metadata(&body);
        Ok((!metadata.is_empty()).then_some(metadata))
    }
}

/// Reads Open Graph tags, `<meta name="author">` and JSON-LD blocks.
///
/// Later sources override earlier ones for the author name; a JSON-LD
/// `articleBody` replaces the description only when it is longer.
#[must_use]
pub fn extract_page_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let mut meta = PageMetadata::default();

    let meta_content = |sel: &Selector| -> Option<String> {
        document
            .select(sel)
            .next()
            .and_then(|m| m.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    };

    meta.content = meta_content(&OG_DESCRIPTION);
    if let Some(title) = meta_content(&OG_TITLE) {
        if let Some((author, _)) = title.split_once(" on LinkedIn:") {
            meta.author_name = Some(author.trim().to_string());
        }
    }
    if let Some(author) = meta_content(&META_AUTHOR) {
        meta.author_name = Some(author);
    }

    for script in document.select(&JSON_LD) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        match value {
            Value::Object(_) => apply_json_ld(&value, &mut meta),
            Value::Array(items) => {
                for item in items.iter().filter(|i| i.is_object()) {
                    apply_json_ld(item, &mut meta);
                }
            }
            _ => {}
        }
    }

    meta
}

fn apply_json_ld(data: &Value, meta: &mut PageMetadata) {
    if let Some(author) = data.get("author").filter(|a| a.is_object()) {
        if let Some(name) = non_empty_str(author.get("name")) {
            meta.author_name = Some(name);
        }
        if let Some(title) = non_empty_str(author.get("jobTitle")) {
            meta.author_title = Some(title);
        }
    }

    if let Some(stats) = data.get("interactionStatistic").and_then(Value::as_array) {
        for stat in stats {
            let kind = match stat.get("interactionType") {
                Some(Value::String(s)) => s.as_str(),
                Some(Value::Object(o)) => o.get("@type").and_then(Value::as_str).unwrap_or(""),
                _ => "",
            };
            let Some(count) = stat.get("userInteractionCount").and_then(interaction_count)
            else {
                continue;
            };
            if kind.contains("Like") || kind.contains("React") {
                meta.reactions = Some(count);
            } else if kind.contains("Comment") {
                meta.comments = Some(count);
            }
        }
    }

    if let Some(body) = non_empty_str(data.get("articleBody")) {
        let current = meta.content.as_deref().map_or(0, |c| c.chars().count());
        if body.chars().count() > current {
            meta.content = Some(body);
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn interaction_count(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}
