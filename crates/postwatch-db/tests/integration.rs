//! Offline tests for postwatch-db pool configuration, row types and query
//! helpers. These tests do not require a live database connection.

use std::path::PathBuf;

use postwatch_core::{AppConfig, Environment, SavedSearchConfig, SortOrder, TimeRange};
use postwatch_db::{
    build_tsquery, effective_sort, BackfillPatch, PoolConfig, PostQuery, SavedSearchRow,
};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        search_base_url: "https://html.duckduckgo.com/html/".to_string(),
        search_fetch_cap: 150,
        http_timeout_secs: 10,
        user_agent: "ua".to_string(),
        webdriver_url: "http://localhost:9515".to_string(),
        login_timeout_secs: 20,
        page_settle_ms: 5000,
        scroll_delay_ms: 4000,
        max_scroll_attempts: 40,
        max_idle_rounds: 3,
        fetch_delay_ms: 1500,
        backfill_min_chars: 400,
        backfill_batch: 50,
        scheduler_tick_secs: 60,
        credentials_path: PathBuf::from("data/credentials.json"),
        cookies_path: PathBuf::from("data/cookies.txt"),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn saved_search_row_parses_stored_filters() {
    let row = SavedSearchRow {
        id: 1,
        name: "rust".to_string(),
        query: "rust ownership".to_string(),
        content_type: "articles".to_string(),
        time_range: "month".to_string(),
        location: "germany".to_string(),
        max_posts: 20,
        schedule_hours: 24,
        enabled: true,
        last_run: None,
        created_at: chrono::Utc::now(),
    };
    let filters = row.filters().expect("stored filters should parse");
    assert_eq!(filters.time_range, TimeRange::Month);
    assert_eq!(filters.location, "germany");
}

#[test]
fn saved_search_row_rejects_unknown_filter() {
    let row = SavedSearchRow {
        id: 1,
        name: "x".to_string(),
        query: "x".to_string(),
        content_type: "videos".to_string(),
        time_range: "week".to_string(),
        location: "any".to_string(),
        max_posts: 20,
        schedule_hours: 24,
        enabled: true,
        last_run: None,
        created_at: chrono::Utc::now(),
    };
    assert!(row.filters().is_err());
}

#[test]
fn empty_backfill_patch_is_detected() {
    assert!(BackfillPatch::default().is_empty());
    let patch = BackfillPatch {
        reactions: Some(3),
        ..BackfillPatch::default()
    };
    assert!(!patch.is_empty());
}

#[test]
fn post_query_defaults_to_date_sort() {
    let query = PostQuery::default();
    assert_eq!(query.sort, SortOrder::Date);
    assert!(query.run_id.is_none());
}

#[test]
fn query_helpers_are_exported() {
    assert_eq!(build_tsquery("a b").as_deref(), Some("'a' & 'b'"));
    assert_eq!(
        effective_sort(true, false, SortOrder::Date),
        SortOrder::Relevance
    );
    let _ = SavedSearchConfig::new("n", "q");
}
