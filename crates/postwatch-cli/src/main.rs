mod corpus;
mod ingest;
mod monitor;
mod saved;

use anyhow::Context;
use clap::{Parser, Subcommand};
use postwatch_core::SortOrder;
use postwatch_pipeline::Postwatch;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::ingest::IngestCommands;
use crate::monitor::MonitorCommands;
use crate::saved::SavedCommands;

#[derive(Debug, Parser)]
#[command(name = "postwatch")]
#[command(about = "Collect, enrich and monitor professional-network posts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Collect posts into the corpus
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// Search the stored corpus
    Search {
        /// Full-text query; omit to list by sort order
        text: Option<String>,
        /// Case-insensitive author name substring
        #[arg(long)]
        author: Option<String>,
        /// relevance, reactions, comments or date
        #[arg(long, default_value = "date")]
        sort: SortOrder,
        #[arg(long, default_value = "1")]
        page: i64,
        #[arg(long, default_value = "20")]
        per_page: i64,
        /// Only posts first stored by this ingestion run
        #[arg(long)]
        run: Option<Uuid>,
    },
    /// Show one stored post by its external id
    Post { external_id: String },
    /// Manage saved searches
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
    /// Monitor results and the saved-search scheduler
    Monitor {
        #[command(subcommand)]
        command: MonitorCommands,
    },
    /// Backfill truncated posts and analyze unscored posts across the corpus
    Enrich,
    /// Print corpus analytics
    Analytics {
        /// Days of per-day engagement to show
        #[arg(long, default_value = "30")]
        days: i64,
        /// Rows per ranked list
        #[arg(long, default_value = "10")]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("postwatch ready; run with --help to list commands");
        return Ok(());
    };

    let config = postwatch_core::load_app_config_from_env().context("failed to load configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = postwatch_db::PoolConfig::from_app_config(&config);
    let pool = postwatch_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to database")?;

    let service = Postwatch::from_config(&config, pool)?;
    dispatch(&service, &config, command).await
}

async fn dispatch(
    service: &Postwatch,
    config: &postwatch_core::AppConfig,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            postwatch_db::health_check(service.pool()).await?;
            println!("database ok");
            Ok(())
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = postwatch_db::run_migrations(service.pool())
                .await
                .context("failed to run migrations")?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Commands::Ingest { command } => ingest::run_ingest(service, command).await,
        Commands::Search {
            text,
            author,
            sort,
            page,
            per_page,
            run,
        } => {
            let query = postwatch_db::PostQuery {
                text,
                author,
                sort,
                page,
                per_page,
                run_id: run,
            };
            corpus::run_search(service, &query).await
        }
        Commands::Post { external_id } => corpus::run_show_post(service, &external_id).await,
        Commands::Saved { command } => saved::run_saved(service, command).await,
        Commands::Monitor { command } => monitor::run_monitor(service, config, command).await,
        Commands::Enrich => corpus::run_enrich(service).await,
        Commands::Analytics { days, limit } => corpus::run_analytics(service, days, limit).await,
    }
}

/// Shorten `text` to `max` characters for a table cell.
fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max {
        format!("{}...", flat.chars().take(max).collect::<String>())
    } else {
        flat
    }
}

fn fmt_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map_or_else(
        || "\u{2014}".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests;
