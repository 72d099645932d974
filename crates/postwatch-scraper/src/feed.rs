//! Parsing of rendered feed pages captured from a signed-in browser.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::normalize::{RenderedPost, SITE_ORIGIN};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector")
}

static BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.feed-shared-update-v2"));
static DETAIL_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("a.update-components-mini-update-v2__link-to-details-page"));
static ACTOR_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector(".update-components-actor__title span[dir='ltr']"));
static ACTOR_LINK: LazyLock<Selector> =
    LazyLock::new(|| selector("a.update-components-actor__meta-link"));
static ACTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector(".update-components-actor__description"));
static ACTOR_TIME: LazyLock<Selector> =
    LazyLock::new(|| selector(".update-components-actor__sub-description"));
static CONTENT: LazyLock<Selector> = LazyLock::new(|| selector("div.update-components-text"));
static REACTIONS: LazyLock<Selector> =
    LazyLock::new(|| selector("li.social-details-social-counts__reactions button[aria-label]"));
static COMMENTS: LazyLock<Selector> =
    LazyLock::new(|| selector("li.social-details-social-counts__comments button[aria-label]"));
static IMPRESSIONS: LazyLock<Selector> =
    LazyLock::new(|| selector("span.analytics-entry-point"));

const ACTIVITY_URN_PREFIX: &str = "urn:li:activity:";

/// Extracts every post block on a rendered page, in document order.
///
/// Blocks without an activity id are skipped, as are repeats of an id
/// already seen earlier on the same page.
#[must_use]
pub fn parse_feed_blocks(html: &str) -> Vec<RenderedPost> {
    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut posts = Vec::new();

    for block in document.select(&BLOCK) {
        let detail_href = block
            .select(&DETAIL_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());

        let activity_id = detail_href
            .and_then(activity_from_urn)
            .or_else(|| block.value().attr("data-urn").and_then(activity_from_urn));
        let Some(activity_id) = activity_id else {
            continue;
        };
        if !seen.insert(activity_id.clone()) {
            continue;
        }

        let detail_url = detail_href.map(|href| {
            if href.starts_with("/feed/update/") {
                format!("{SITE_ORIGIN}{href}")
            } else {
                href.to_string()
            }
        });

        let author_profile = block
            .select(&ACTOR_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| {
                if href.starts_with("/in/") {
                    format!("{SITE_ORIGIN}{href}")
                } else {
                    href.to_string()
                }
            });

        posts.push(RenderedPost {
            activity_id: Some(activity_id),
            detail_url,
            author_name: first_text(block, &ACTOR_NAME, " "),
            author_profile,
            author_title: first_text(block, &ACTOR_TITLE, " "),
            post_time: first_text(block, &ACTOR_TIME, " "),
            content: first_text(block, &CONTENT, "\n"),
            reactions: aria_count(block, &REACTIONS),
            comments: aria_count(block, &COMMENTS),
            impressions: impressions(block),
        });
    }

    posts
}

fn activity_from_urn(value: &str) -> Option<String> {
    let (_, rest) = value.split_once(ACTIVITY_URN_PREFIX)?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Trimmed, non-empty text nodes of the first match joined by `separator`.
fn first_text(block: ElementRef<'_>, sel: &Selector, separator: &str) -> Option<String> {
    let element = block.select(sel).next()?;
    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    (!text.is_empty()).then_some(text)
}

fn aria_count(block: ElementRef<'_>, sel: &Selector) -> i32 {
    block
        .select(sel)
        .next()
        .and_then(|b| b.value().attr("aria-label"))
        .and_then(|label| label.split_whitespace().next())
        .map_or(0, parse_abbreviated_count)
}

fn impressions(block: ElementRef<'_>) -> i32 {
    let Some(text) = first_text(block, &IMPRESSIONS, " ") else {
        return 0;
    };
    let lowered = text.to_lowercase();
    if !lowered.contains("impressions") {
        return 0;
    }
    lowered
        .replace("impressions", "")
        .split_whitespace()
        .next()
        .map_or(0, parse_abbreviated_count)
}

/// Parses counts such as `"1,234"`, `"1.2K"` or `"3M"`. Anything
/// unparseable counts as zero.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_abbreviated_count(raw: &str) -> i32 {
    let cleaned = raw.trim().to_uppercase().replace(',', "");
    let (number, multiplier) = if let Some(n) = cleaned.strip_suffix('K') {
        (n, 1_000.0)
    } else if let Some(n) = cleaned.strip_suffix('M') {
        (n, 1_000_000.0)
    } else {
        return cleaned.parse::<i32>().unwrap_or(0);
    };
    number
        .parse::<f64>()
        .map(|n| (n * multiplier).clamp(0.0, f64::from(i32::MAX)) as i32)
        .unwrap_or(0)
}
