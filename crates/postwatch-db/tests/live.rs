//! Live integration tests for postwatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/postwatch-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{Duration, TimeZone, Utc};
use postwatch_core::{NormalizedPost, SavedSearchConfig, SavedSearchPatch, SortOrder, TimeRange};
use postwatch_db::{
    advance_last_run, apply_backfill, create_saved_search, delete_saved_search,
    get_post_by_external_id, get_saved_search, hashtag_frequency, import_saved_searches,
    insert_new_posts, list_enabled_saved_searches, list_monitor_results, list_saved_searches,
    max_weighted_engagement, overview, record_monitor_run, search_posts,
    select_backfill_candidates, select_unanalyzed, sentiment_distribution, top_authors,
    trending_topics, unread_count_since, update_analysis, update_saved_search, BackfillPatch,
    DbError, PostAnalysis, PostQuery,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_post(external_id: &str, author: &str, content: &str) -> NormalizedPost {
    NormalizedPost {
        external_id: external_id.to_string(),
        post_url: format!("https://www.linkedin.com/feed/update/urn:li:activity:{external_id}/"),
        author_name: Some(author.to_string()),
        author_profile: None,
        author_title: None,
        post_time: None,
        content: content.to_string(),
        reactions: 0,
        comments: 0,
        impressions: 0,
        collected_at: Utc::now(),
    }
}

fn page(text: Option<&str>, author: Option<&str>, sort: SortOrder) -> PostQuery {
    PostQuery {
        text: text.map(str::to_string),
        author: author.map(str::to_string),
        sort,
        page: 1,
        per_page: 20,
        run_id: None,
    }
}

async fn post_count(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .expect("count posts")
}

// ---------------------------------------------------------------------------
// Section 1: Dedup insert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn reingesting_the_same_posts_is_a_noop(pool: sqlx::PgPool) {
    let posts = vec![
        make_post("1001", "Jane Doe", "First post about rust"),
        make_post("1002", "John Roe", "Second post about go"),
    ];

    let first = insert_new_posts(&pool, &posts, Uuid::new_v4()).await.unwrap();
    let second = insert_new_posts(&pool, &posts, Uuid::new_v4()).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(post_count(&pool).await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_ids_within_one_batch_store_once(pool: sqlx::PgPool) {
    let mut a = make_post("7201234567890123456", "Jane Doe", "Hello");
    a.post_url = "https://www.linkedin.com/posts/jane_x-activity-7201234567890123456-ab?utm=1".into();
    let mut b = a.clone();
    b.post_url = "https://www.linkedin.com/posts/jane_x-activity-7201234567890123456-ab?utm=2".into();

    let inserted = insert_new_posts(&pool, &[a, b], Uuid::new_v4()).await.unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(post_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_overlapping_batches_in_opposite_order_both_succeed(pool: sqlx::PgPool) {
    let forward: Vec<NormalizedPost> = (0..300)
        .map(|i| make_post(&format!("{}", 8_000_000 + i), "Jane Doe", "overlap"))
        .collect();
    let reversed: Vec<NormalizedPost> = forward.iter().rev().cloned().collect();

    for round in 0..5 {
        sqlx::query("DELETE FROM posts")
            .execute(&pool)
            .await
            .expect("clear posts");

        let (a, b) = tokio::join!(
            insert_new_posts(&pool, &forward, Uuid::new_v4()),
            insert_new_posts(&pool, &reversed, Uuid::new_v4()),
        );
        let a = a.unwrap_or_else(|e| panic!("round {round} forward batch: {e}"));
        let b = b.unwrap_or_else(|e| panic!("round {round} reversed batch: {e}"));

        assert_eq!(a + b, 300, "round {round}");
        assert_eq!(post_count(&pool).await, 300);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn existing_post_keeps_its_original_run(pool: sqlx::PgPool) {
    let run_a = Uuid::new_v4();
    let post = make_post("2001", "Jane Doe", "Body");
    insert_new_posts(&pool, &[post.clone()], run_a).await.unwrap();
    insert_new_posts(&pool, &[post], Uuid::new_v4()).await.unwrap();

    let row = get_post_by_external_id(&pool, "2001").await.unwrap().unwrap();
    assert_eq!(row.run_id, Some(run_a));
    assert!(row.sentiment.is_none());
    assert!(get_post_by_external_id(&pool, "missing").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Section 2: Search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn text_search_matches_content_and_counts(pool: sqlx::PgPool) {
    let mut popular = make_post("3001", "Jane Doe", "Rust ownership explained simply");
    popular.reactions = 50;
    let posts = vec![
        popular,
        make_post("3002", "John Roe", "Ownership in rust is about borrowing rules"),
        make_post("3003", "Ann Poe", "Python decorators"),
    ];
    insert_new_posts(&pool, &posts, Uuid::new_v4()).await.unwrap();

    let result = search_posts(&pool, &page(Some("rust ownership"), None, SortOrder::Date))
        .await
        .unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.posts.len(), 2);

    let by_reactions = search_posts(&pool, &page(Some("rust"), None, SortOrder::Reactions))
        .await
        .unwrap();
    assert_eq!(by_reactions.posts[0].external_id, "3001");
}

#[sqlx::test(migrations = "../../migrations")]
async fn author_filter_applies_to_both_paths(pool: sqlx::PgPool) {
    let posts = vec![
        make_post("4001", "Jane Doe", "Rust tips"),
        make_post("4002", "John Roe", "Rust tricks"),
    ];
    insert_new_posts(&pool, &posts, Uuid::new_v4()).await.unwrap();

    let with_text = search_posts(&pool, &page(Some("rust"), Some("jane"), SortOrder::Date))
        .await
        .unwrap();
    assert_eq!(with_text.total, 1);
    assert_eq!(with_text.posts[0].external_id, "4001");

    let without_text = search_posts(&pool, &page(None, Some("ROE"), SortOrder::Date))
        .await
        .unwrap();
    assert_eq!(without_text.total, 1);
    assert_eq!(without_text.posts[0].external_id, "4002");
}

#[sqlx::test(migrations = "../../migrations")]
async fn special_characters_do_not_break_text_search(pool: sqlx::PgPool) {
    insert_new_posts(&pool, &[make_post("5001", "Jane", "C++ and Rust")], Uuid::new_v4())
        .await
        .unwrap();

    let result = search_posts(
        &pool,
        &page(Some(r#"rust: (c++ & "o'neil" | !"#), None, SortOrder::Date),
    )
    .await;
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_scope_ignores_text_and_paginates(pool: sqlx::PgPool) {
    let run = Uuid::new_v4();
    let posts: Vec<_> = (0..5)
        .map(|i| {
            let mut p = make_post(&format!("600{i}"), "Jane", "unrelated words");
            p.comments = i;
            p
        })
        .collect();
    insert_new_posts(&pool, &posts, run).await.unwrap();
    insert_new_posts(&pool, &[make_post("6999", "Jane", "other run")], Uuid::new_v4())
        .await
        .unwrap();

    let mut query = page(Some("nothing matches this"), None, SortOrder::Comments);
    query.run_id = Some(run);
    query.per_page = 2;
    query.page = 2;
    let result = search_posts(&pool, &query).await.unwrap();

    assert_eq!(result.total, 5);
    let ids: Vec<_> = result.posts.iter().map(|p| p.external_id.as_str()).collect();
    assert_eq!(ids, vec!["6002", "6001"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn backfilled_content_becomes_searchable(pool: sqlx::PgPool) {
    insert_new_posts(&pool, &[make_post("7001", "Jane", "short")], Uuid::new_v4())
        .await
        .unwrap();
    let row = get_post_by_external_id(&pool, "7001").await.unwrap().unwrap();

    let patch = BackfillPatch {
        content: Some("A much longer body mentioning kubernetes operators".to_string()),
        ..BackfillPatch::default()
    };
    assert!(apply_backfill(&pool, row.id, &patch).await.unwrap());

    let result = search_posts(&pool, &page(Some("kubernetes"), None, SortOrder::Date))
        .await
        .unwrap();
    assert_eq!(result.total, 1);
}

// ---------------------------------------------------------------------------
// Section 3: Enrichment selection and updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn backfill_candidates_need_short_content_or_zero_engagement(pool: sqlx::PgPool) {
    let run = Uuid::new_v4();
    let long = "x".repeat(450);
    let mut complete = make_post("8001", "Jane", &long);
    complete.reactions = 3;
    let mut zero_engagement = make_post("8002", "Jane", &long);
    zero_engagement.reactions = 0;
    let mut short = make_post("8003", "Jane", "tiny");
    short.reactions = 10;
    insert_new_posts(&pool, &[complete, zero_engagement, short], run)
        .await
        .unwrap();

    let candidates = select_backfill_candidates(&pool, Some(run), 400, None)
        .await
        .unwrap();
    let urls: Vec<_> = candidates.iter().map(|c| c.post_url.clone()).collect();
    assert_eq!(candidates.len(), 2);
    assert!(urls.iter().any(|u| u.contains("8002")));
    assert!(urls.iter().any(|u| u.contains("8003")));

    let limited = select_backfill_candidates(&pool, None, 400, Some(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_marks_posts_as_analyzed(pool: sqlx::PgPool) {
    let run = Uuid::new_v4();
    let mut p = make_post("9001", "Jane", "Great news #rust");
    p.reactions = 10;
    p.comments = 5;
    insert_new_posts(&pool, &[p, make_post("9002", "Jane", "Meh")], run)
        .await
        .unwrap();

    assert_eq!(max_weighted_engagement(&pool, Some(run)).await.unwrap(), 20);
    assert_eq!(max_weighted_engagement(&pool, Some(Uuid::new_v4())).await.unwrap(), 0);

    let pending = select_unanalyzed(&pool, Some(run)).await.unwrap();
    assert_eq!(pending.len(), 2);

    let analysis = PostAnalysis {
        sentiment: 0.8,
        sentiment_label: "positive".to_string(),
        topics: vec!["great news".to_string()],
        hashtags: vec!["rust".to_string()],
        engagement: 100.0,
    };
    update_analysis(&pool, pending[0].id, &analysis).await.unwrap();

    let remaining = select_unanalyzed(&pool, None).await.unwrap();
    assert_eq!(remaining.len(), 1);

    let err = update_analysis(&pool, -1, &analysis).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn out_of_range_engagement_is_rejected(pool: sqlx::PgPool) {
    insert_new_posts(&pool, &[make_post("9101", "Jane", "x")], Uuid::new_v4())
        .await
        .unwrap();
    let row = get_post_by_external_id(&pool, "9101").await.unwrap().unwrap();
    let analysis = PostAnalysis {
        sentiment: 0.0,
        sentiment_label: "neutral".to_string(),
        topics: vec![],
        hashtags: vec![],
        engagement: 150.0,
    };
    assert!(update_analysis(&pool, row.id, &analysis).await.is_err());
}

// ---------------------------------------------------------------------------
// Section 4: Saved searches and monitor results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn saved_search_crud_round_trip(pool: sqlx::PgPool) {
    let created = create_saved_search(&pool, &SavedSearchConfig::new("rust", "rust jobs"))
        .await
        .unwrap();
    assert_eq!(created.time_range, "week");
    assert_eq!(created.max_posts, 20);
    assert!(created.last_run.is_none());

    let patch = SavedSearchPatch {
        time_range: Some(TimeRange::Day),
        enabled: Some(false),
        ..SavedSearchPatch::default()
    };
    let updated = update_saved_search(&pool, created.id, &patch).await.unwrap();
    assert_eq!(updated.time_range, "day");
    assert_eq!(updated.query, "rust jobs");
    assert!(!updated.enabled);

    assert!(list_enabled_saved_searches(&pool).await.unwrap().is_empty());
    assert_eq!(list_saved_searches(&pool).await.unwrap().len(), 1);

    delete_saved_search(&pool, created.id).await.unwrap();
    assert!(get_saved_search(&pool, created.id).await.unwrap().is_none());
    assert!(matches!(
        delete_saved_search(&pool, created.id).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(
        update_saved_search(&pool, created.id, &patch).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn last_run_only_moves_forward(pool: sqlx::PgPool) {
    let search = create_saved_search(&pool, &SavedSearchConfig::new("a", "q"))
        .await
        .unwrap();
    let later = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();
    let earlier = later - Duration::hours(5);

    advance_last_run(&pool, search.id, later).await.unwrap();
    advance_last_run(&pool, search.id, earlier).await.unwrap();

    let row = get_saved_search(&pool, search.id).await.unwrap().unwrap();
    assert_eq!(row.last_run, Some(later));
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_skips_existing_names(pool: sqlx::PgPool) {
    create_saved_search(&pool, &SavedSearchConfig::new("rust", "old query"))
        .await
        .unwrap();
    let imported = import_saved_searches(
        &pool,
        &[
            SavedSearchConfig::new("rust", "new query"),
            SavedSearchConfig::new("go", "golang"),
        ],
    )
    .await
    .unwrap();
    assert_eq!(imported, 1);

    let all = list_saved_searches(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    let rust = all.iter().find(|s| s.name == "rust").unwrap();
    assert_eq!(rust.query, "old query");
}

#[sqlx::test(migrations = "../../migrations")]
async fn monitor_runs_are_recorded_and_counted(pool: sqlx::PgPool) {
    let search = create_saved_search(&pool, &SavedSearchConfig::new("a", "q"))
        .await
        .unwrap();
    let now = Utc::now();
    record_monitor_run(&pool, search.id, 4, Uuid::new_v4(), now - Duration::hours(30))
        .await
        .unwrap();
    let latest = record_monitor_run(&pool, search.id, 3, Uuid::new_v4(), now)
        .await
        .unwrap();

    let results = list_monitor_results(&pool, 10).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, latest.id);

    assert_eq!(
        unread_count_since(&pool, now - Duration::hours(24)).await.unwrap(),
        3
    );
    assert_eq!(
        unread_count_since(&pool, now - Duration::hours(48)).await.unwrap(),
        7
    );

    let row = get_saved_search(&pool, search.id).await.unwrap().unwrap();
    assert_eq!(row.last_run.map(|t| t.timestamp()), Some(now.timestamp()));
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_a_saved_search_removes_its_results(pool: sqlx::PgPool) {
    let search = create_saved_search(&pool, &SavedSearchConfig::new("a", "q"))
        .await
        .unwrap();
    record_monitor_run(&pool, search.id, 1, Uuid::new_v4(), Utc::now())
        .await
        .unwrap();
    delete_saved_search(&pool, search.id).await.unwrap();
    assert!(list_monitor_results(&pool, 10).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 5: Analytics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn analytics_aggregate_enriched_posts(pool: sqlx::PgPool) {
    let posts = vec![
        make_post("10001", "Jane Doe", "a"),
        make_post("10002", "Jane Doe", "b"),
        make_post("10003", "John Roe", "c"),
    ];
    insert_new_posts(&pool, &posts, Uuid::new_v4()).await.unwrap();

    for (i, candidate) in select_unanalyzed(&pool, None).await.unwrap().iter().enumerate() {
        let analysis = PostAnalysis {
            sentiment: if i == 0 { 0.5 } else { 0.0 },
            sentiment_label: if i == 0 { "positive" } else { "neutral" }.to_string(),
            topics: vec!["rust".to_string()],
            hashtags: vec!["rust".to_string(), "rust".to_string()],
            engagement: 30.0,
        };
        update_analysis(&pool, candidate.id, &analysis).await.unwrap();
    }

    let stats = overview(&pool, Utc::now()).await.unwrap();
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.total_authors, 2);
    assert!((stats.avg_engagement - 30.0).abs() < f64::EPSILON);
    assert_eq!(stats.posts_today, 3);
    assert_eq!(stats.posts_this_week, 3);

    let authors = top_authors(&pool, 10).await.unwrap();
    assert_eq!(authors[0].author_name, "Jane Doe");
    assert_eq!(authors[0].post_count, 2);

    let topics = trending_topics(&pool, 10).await.unwrap();
    assert_eq!(topics[0].term, "rust");
    assert_eq!(topics[0].count, 3);

    let tags = hashtag_frequency(&pool, 10).await.unwrap();
    assert_eq!(tags[0].count, 6);

    let labels = sentiment_distribution(&pool).await.unwrap();
    assert_eq!(labels[0].label, "neutral");
    assert_eq!(labels[0].count, 2);
}
