use chrono::TimeZone;

use super::*;

const ACTIVITY_ID: &str = "7201234567890123456";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap()
}

fn anonymous(url: &str, title: &str, snippet: &str) -> RawResult {
    RawResult::Anonymous(AnonymousResult {
        url: url.to_owned(),
        title: title.to_owned(),
        snippet: snippet.to_owned(),
    })
}

fn activity_instant() -> DateTime<Utc> {
    // 7201234567890123456 >> 22 = 1716908113453 ms
    Utc.timestamp_millis_opt(1_716_908_113_453).unwrap()
}

// -----------------------------------------------------------------------
// identifier derivation
// -----------------------------------------------------------------------

#[test]
fn urn_in_url_is_the_identifier() {
    let id = derive_external_id(&format!(
        "https://www.linkedin.com/feed/update/urn:li:activity:{ACTIVITY_ID}/"
    ));
    assert_eq!(id.value, ACTIVITY_ID);
    assert!(id.from_activity);
}

#[test]
fn urn_identifier_ignores_tracking_suffix() {
    let id = derive_external_id(&format!(
        "https://www.linkedin.com/feed/update/urn:li:activity:{ACTIVITY_ID}/?utm_source=share"
    ));
    assert_eq!(id.value, ACTIVITY_ID);
}

#[test]
fn post_slug_activity_is_the_identifier() {
    let id = derive_external_id(&format!(
        "https://www.linkedin.com/posts/jane-doe_rust-activity-{ACTIVITY_ID}-AbCd"
    ));
    assert_eq!(id.value, ACTIVITY_ID);
    assert!(id.from_activity);
}

#[test]
fn url_without_activity_falls_back_to_hash() {
    let id = derive_external_id("https://www.linkedin.com/pulse/rust-ownership-jane-doe");
    assert_eq!(id.value, "365fc56f1c5e751f");
    assert!(!id.from_activity);
}

#[test]
fn hash_fallback_is_deterministic() {
    let url = "https://www.linkedin.com/pulse/some-article";
    assert_eq!(derive_external_id(url), derive_external_id(url));
    assert_eq!(derive_external_id(url).value.len(), 16);
}

#[test]
fn activity_timestamp_decodes_snowflake() {
    assert_eq!(activity_timestamp(ACTIVITY_ID), Some(activity_instant()));
}

#[test]
fn small_or_non_numeric_ids_have_no_timestamp() {
    assert_eq!(activity_timestamp("12345"), None);
    assert_eq!(activity_timestamp("365fc56f1c5e751f"), None);
}

// -----------------------------------------------------------------------
// anonymous results
// -----------------------------------------------------------------------

#[test]
fn tracking_params_do_not_change_identity() {
    let a = normalize(
        anonymous(
            &format!("https://www.linkedin.com/posts/jane-doe_rust-activity-{ACTIVITY_ID}-AbCd"),
            "Jane Doe on LinkedIn: Rust tips",
            "Ownership matters.",
        ),
        now(),
    )
    .unwrap();
    let b = normalize(
        anonymous(
            &format!(
                "https://www.linkedin.com/posts/jane-doe_rust-activity-{ACTIVITY_ID}-AbCd?utm_source=share&utm_medium=member_desktop"
            ),
            "Jane Doe on LinkedIn: Rust tips",
            "Ownership matters.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(a.external_id, b.external_id);
    assert_eq!(a.collected_at, activity_instant());
    assert_eq!(a.post_time.as_deref(), Some("May 28, 2024"));
}

#[test]
fn on_linkedin_title_yields_author_and_title_prefix() {
    let post = normalize(
        anonymous(
            &format!("https://www.linkedin.com/posts/jane-doe_rust-activity-{ACTIVITY_ID}-AbCd"),
            "Jane Doe on LinkedIn: Rust tips for teams",
            "Ownership matters more than you think.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.author_name.as_deref(), Some("Jane Doe"));
    assert_eq!(
        post.content,
        "Rust tips for teams\nOwnership matters more than you think."
    );
    assert_eq!(
        post.author_profile.as_deref(),
        Some("https://www.linkedin.com/in/jane-doe/")
    );
}

#[test]
fn posted_on_linkedin_title_yields_author() {
    let post = normalize(
        anonymous(
            "https://www.linkedin.com/feed/update/urn:li:activity:7201234567890123456/",
            "John Smith posted on LinkedIn",
            "We are hiring.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.author_name.as_deref(), Some("John Smith"));
    assert_eq!(post.content, "We are hiring.");
    assert_eq!(post.author_profile, None);
}

#[test]
fn pipe_title_on_article_is_a_title() {
    let post = normalize(
        anonymous(
            "https://www.linkedin.com/pulse/rust-ownership-jane-doe",
            "Rust Ownership Explained | LinkedIn",
            "A deep dive.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.author_name, None);
    assert_eq!(post.content, "Rust Ownership Explained\nA deep dive.");
    assert_eq!(post.collected_at, now());
    assert_eq!(post.post_time, None);
}

#[test]
fn pipe_title_on_post_is_an_author() {
    let post = normalize(
        anonymous(
            &format!("https://www.linkedin.com/posts/jdoe_x-activity-{ACTIVITY_ID}-zz"),
            "Jane Doe | LinkedIn",
            "Hello.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.author_name.as_deref(), Some("Jane Doe"));
}

#[test]
fn author_falls_back_to_url_slug() {
    let post = normalize(
        anonymous(
            &format!("https://www.linkedin.com/posts/mary-ann-lee_ai-activity-{ACTIVITY_ID}-zz"),
            "Some unrelated headline",
            "Body text.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.author_name.as_deref(), Some("Mary Ann Lee"));
}

#[test]
fn absolute_date_prefix_is_stripped() {
    let post = normalize(
        anonymous(
            "https://www.linkedin.com/pulse/some-article",
            "",
            "Jun 18, 2025 · The actual content starts here.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.content, "The actual content starts here.");
}

#[test]
fn relative_date_prefix_is_stripped() {
    let post = normalize(
        anonymous(
            "https://www.linkedin.com/pulse/some-article",
            "",
            "3 days ago - Shipping update.",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.content, "Shipping update.");
}

#[test]
fn empty_snippet_uses_title() {
    let post = normalize(
        anonymous(
            "https://www.linkedin.com/pulse/some-article",
            "Untitled musings",
            "",
        ),
        now(),
    )
    .unwrap();
    assert_eq!(post.content, "Untitled musings");
}

#[test]
fn non_content_urls_are_rejected() {
    for url in [
        "https://www.linkedin.com/jobs/view/123",
        "https://www.linkedin.com/in/jane-doe",
        "https://www.linkedin.com/?trk=guest",
        "https://learning.linkedin.com/posts/course",
        "https://example.com/posts/abc",
        "",
    ] {
        assert!(
            normalize(anonymous(url, "t", "s"), now()).is_none(),
            "expected {url:?} to be rejected"
        );
    }
}

#[test]
fn title_case_matches_slug_style() {
    assert_eq!(title_case("john smith"), "John Smith");
    assert_eq!(title_case("mcDONALD"), "Mcdonald");
}

// -----------------------------------------------------------------------
// rendered results
// -----------------------------------------------------------------------

#[test]
fn rendered_post_without_activity_is_rejected() {
    let raw = RawResult::Rendered(RenderedPost {
        content: Some("text".to_owned()),
        ..RenderedPost::default()
    });
    assert!(normalize(raw, now()).is_none());
}

#[test]
fn rendered_post_keeps_engagement_and_page_time() {
    let raw = RawResult::Rendered(RenderedPost {
        activity_id: Some(ACTIVITY_ID.to_owned()),
        detail_url: None,
        author_name: Some(" Jane Doe ".to_owned()),
        author_profile: Some("https://www.linkedin.com/in/jane-doe".to_owned()),
        author_title: Some("Staff Engineer".to_owned()),
        post_time: Some("3d".to_owned()),
        content: Some("Big news today.".to_owned()),
        reactions: 1200,
        comments: 45,
        impressions: 0,
    });
    let post = normalize(raw, now()).unwrap();
    assert_eq!(post.external_id, ACTIVITY_ID);
    assert_eq!(
        post.post_url,
        format!("https://www.linkedin.com/feed/update/urn:li:activity:{ACTIVITY_ID}/")
    );
    assert_eq!(post.author_name.as_deref(), Some("Jane Doe"));
    assert_eq!(post.author_title.as_deref(), Some("Staff Engineer"));
    assert_eq!(post.post_time.as_deref(), Some("3d"));
    assert_eq!(post.reactions, 1200);
    assert_eq!(post.comments, 45);
    assert_eq!(post.collected_at, activity_instant());
}
