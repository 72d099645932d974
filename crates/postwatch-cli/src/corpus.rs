//! Read-side commands over the stored corpus, plus corpus-wide enrichment.

use chrono::Utc;
use postwatch_db::PostQuery;
use postwatch_pipeline::Postwatch;

use crate::{fmt_time, truncate};

const SNIPPET_CHARS: usize = 60;

pub(crate) async fn run_search(service: &Postwatch, query: &PostQuery) -> anyhow::Result<()> {
    let page = service.search(query).await?;

    if page.posts.is_empty() {
        println!("no posts matched (total {})", page.total);
        return Ok(());
    }

    println!(
        "{:<22}{:<24}{:>6}{:>6}  CONTENT",
        "EXTERNAL ID", "AUTHOR", "REACT", "COMM"
    );
    for post in &page.posts {
        println!(
            "{:<22}{:<24}{:>6}{:>6}  {}",
            post.external_id,
            truncate(post.author_name.as_deref().unwrap_or("\u{2014}"), 20),
            post.reactions,
            post.comments,
            truncate(&post.content, SNIPPET_CHARS)
        );
    }
    println!();
    println!(
        "page {} \u{b7} {} of {} post(s)",
        query.page.max(1),
        page.posts.len(),
        page.total
    );
    Ok(())
}

pub(crate) async fn run_show_post(service: &Postwatch, external_id: &str) -> anyhow::Result<()> {
    let post = service.get_post(external_id).await?;

    println!("Post: {}", post.external_id);
    println!("URL: {}", post.post_url);
    println!(
        "Author: {}{}",
        post.author_name.as_deref().unwrap_or("\u{2014}"),
        post.author_title
            .as_deref()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default()
    );
    println!("Posted: {}", post.post_time.as_deref().unwrap_or("\u{2014}"));
    println!("Collected: {}", fmt_time(Some(post.collected_at)));
    println!(
        "Reactions: {}  Comments: {}  Impressions: {}",
        post.reactions, post.comments, post.impressions
    );
    if let (Some(score), Some(label)) = (post.sentiment, post.sentiment_label.as_deref()) {
        println!("Sentiment: {label} ({score:.3})");
    }
    if let Some(engagement) = post.engagement {
        println!("Engagement: {engagement:.1}");
    }
    if let Some(topics) = post.topics.as_ref().filter(|t| !t.is_empty()) {
        println!("Topics: {}", topics.join(", "));
    }
    if let Some(tags) = post.hashtags.as_ref().filter(|t| !t.is_empty()) {
        println!("Hashtags: {}", tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" "));
    }
    println!();
    println!("{}", post.content);
    Ok(())
}

pub(crate) async fn run_enrich(service: &Postwatch) -> anyhow::Result<()> {
    let report = service.enrich_corpus().await;
    println!(
        "backfilled {} of {} candidate post(s); analyzed {} post(s)",
        report.backfilled, report.backfill_candidates, report.analyzed
    );
    Ok(())
}

pub(crate) async fn run_analytics(service: &Postwatch, days: i64, limit: i64) -> anyhow::Result<()> {
    let report = service.analytics(Utc::now(), days, limit).await?;
    let overview = &report.overview;

    println!("# Corpus Analytics");
    println!();
    println!("Posts: {}  Authors: {}", overview.total_posts, overview.total_authors);
    println!(
        "Today: {}  This week: {}  Avg engagement: {:.1}",
        overview.posts_today, overview.posts_this_week, overview.avg_engagement
    );

    println!();
    println!("## Top authors");
    println!("{:<32}{:>7}{:>10}", "AUTHOR", "POSTS", "AVG ENG");
    for author in &report.top_authors {
        println!(
            "{:<32}{:>7}{:>10.1}",
            truncate(&author.author_name, 30),
            author.post_count,
            author.avg_engagement
        );
    }

    println!();
    println!("## Trending topics");
    for term in &report.trending_topics {
        println!("{:>5}  {}", term.count, term.term);
    }

    println!();
    println!("## Hashtags");
    for term in &report.hashtags {
        println!("{:>5}  #{}", term.count, term.term);
    }

    println!();
    println!("## Engagement by day (last {days} days)");
    for day in &report.engagement_by_day {
        println!(
            "{}  {:>5} post(s)  avg {:.1}",
            day.day.format("%Y-%m-%d"),
            day.post_count,
            day.avg_engagement
        );
    }

    println!();
    println!("## Sentiment");
    for label in &report.sentiment {
        println!("{:<10}{:>6}", label.label, label.count);
    }
    Ok(())
}
