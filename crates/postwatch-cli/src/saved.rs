//! Saved-search management commands.

use std::path::PathBuf;

use clap::Subcommand;
use postwatch_core::{ContentType, SavedSearchConfig, SavedSearchPatch, TimeRange};
use postwatch_pipeline::Postwatch;

use crate::{fmt_time, truncate};

/// Sub-commands available under `saved`.
#[derive(Debug, Subcommand)]
pub enum SavedCommands {
    /// List saved searches, newest first
    List,
    /// Create a saved search
    Create {
        name: String,
        query: String,
        #[arg(long, default_value = "posts")]
        content_type: ContentType,
        #[arg(long, default_value = "week")]
        time_range: TimeRange,
        #[arg(long, default_value = "any")]
        location: String,
        #[arg(long, default_value = "20")]
        max_posts: i32,
        /// Hours between scheduled runs
        #[arg(long, default_value = "24")]
        schedule_hours: i32,
        /// Create without scheduling it
        #[arg(long)]
        disabled: bool,
    },
    /// Change fields of a saved search
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        content_type: Option<ContentType>,
        #[arg(long)]
        time_range: Option<TimeRange>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        max_posts: Option<i32>,
        #[arg(long)]
        schedule_hours: Option<i32>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete a saved search and its monitor results
    Delete { id: i64 },
    /// Execute a saved search now
    Run { id: i64 },
    /// Import saved searches from a YAML file, skipping existing names
    Import {
        #[arg(default_value = "config/saved_searches.yaml")]
        path: PathBuf,
    },
}

pub(crate) async fn run_saved(service: &Postwatch, command: SavedCommands) -> anyhow::Result<()> {
    match command {
        SavedCommands::List => list(service).await,
        SavedCommands::Create {
            name,
            query,
            content_type,
            time_range,
            location,
            max_posts,
            schedule_hours,
            disabled,
        } => {
            let config = SavedSearchConfig {
                name,
                query,
                content_type,
                time_range,
                location,
                max_posts,
                schedule_hours,
                enabled: !disabled,
            };
            let row = service.create_saved_search(&config).await?;
            println!("created saved search {} ({})", row.id, row.name);
            Ok(())
        }
        SavedCommands::Update {
            id,
            name,
            query,
            content_type,
            time_range,
            location,
            max_posts,
            schedule_hours,
            enabled,
        } => {
            let patch = SavedSearchPatch {
                name,
                query,
                content_type,
                time_range,
                location,
                max_posts,
                schedule_hours,
                enabled,
            };
            let row = service.update_saved_search(id, &patch).await?;
            println!("updated saved search {} ({})", row.id, row.name);
            Ok(())
        }
        SavedCommands::Delete { id } => {
            service.delete_saved_search(id).await?;
            println!("deleted saved search {id}");
            Ok(())
        }
        SavedCommands::Run { id } => {
            let result = service.run_saved_search_now(id).await?;
            println!(
                "saved search {id} found {} new post(s) (run {})",
                result.new_posts_count,
                result
                    .run_id
                    .map_or_else(|| "\u{2014}".to_string(), |r| r.to_string())
            );
            Ok(())
        }
        SavedCommands::Import { path } => {
            let inserted = service.import_saved_searches(&path).await?;
            println!("imported {inserted} saved search(es) from {}", path.display());
            Ok(())
        }
    }
}

async fn list(service: &Postwatch) -> anyhow::Result<()> {
    let searches = service.list_saved_searches().await?;
    if searches.is_empty() {
        println!("no saved searches; create one with `saved create` or `saved import`");
        return Ok(());
    }

    println!(
        "{:<6}{:<24}{:<30}{:<8}{:>6}{:>7}  {:<18}ENABLED",
        "ID", "NAME", "QUERY", "RANGE", "MAX", "EVERY", "LAST RUN"
    );
    for s in &searches {
        println!(
            "{:<6}{:<24}{:<30}{:<8}{:>6}{:>6}h  {:<18}{}",
            s.id,
            truncate(&s.name, 20),
            truncate(&s.query, 26),
            s.time_range,
            s.max_posts,
            s.schedule_hours,
            fmt_time(s.last_run),
            if s.enabled { "yes" } else { "no" }
        );
    }
    Ok(())
}
