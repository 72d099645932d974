//! `ingest` command handlers: launch a run, follow its progress, and wait for
//! its enrichment to finish before exiting.

use std::time::Duration;

use clap::Subcommand;
use postwatch_core::{ContentType, SearchFilters, TimeRange};
use postwatch_pipeline::{IngestionRun, Postwatch, RunStatus};
use uuid::Uuid;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Sub-commands available under `ingest`.
#[derive(Debug, Subcommand)]
pub enum IngestCommands {
    /// Search the source for posts matching a query
    Query {
        query: String,
        /// posts, articles or all
        #[arg(long, default_value = "posts")]
        content_type: ContentType,
        /// any, day, week, month or year
        #[arg(long, default_value = "week")]
        time_range: TimeRange,
        /// Location slug such as `new-york` or `germany`
        #[arg(long, default_value = "any")]
        location: String,
        /// Stop after this many posts
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Collect recent posts from one member's activity page (requires login)
    Profile {
        /// Profile URL, e.g. https://www.linkedin.com/in/someone
        url: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Launch the requested run and block until it and its enrichment finish.
///
/// # Errors
///
/// Returns an error if the run cannot be launched or ends in `failed`.
pub(crate) async fn run_ingest(service: &Postwatch, command: IngestCommands) -> anyhow::Result<()> {
    let run_id = match command {
        IngestCommands::Query {
            query,
            content_type,
            time_range,
            location,
            limit,
        } => {
            let filters = SearchFilters {
                content_type,
                time_range,
                location,
            };
            service.launch_query_ingestion(&query, filters, limit)
        }
        IngestCommands::Profile { url, limit } => service.launch_profile_ingestion(&url, limit)?,
    };
    println!("run {run_id} started");

    let run = follow_run(service, run_id).await?;
    match run.status {
        RunStatus::Failed => {
            anyhow::bail!(
                "run {run_id} failed: {}",
                run.error.as_deref().unwrap_or("unknown error")
            );
        }
        _ => println!("run {run_id} completed: {} post(s) discovered", run.discovered),
    }

    println!("enriching new posts...");
    service.jobs().join_all().await;
    println!("done; `postwatch search --run {run_id}` lists this run's new posts");
    Ok(())
}

/// Poll the job table until the run is terminal, printing progress changes.
async fn follow_run(service: &Postwatch, run_id: Uuid) -> anyhow::Result<IngestionRun> {
    let mut last_seen = 0usize;
    loop {
        let run = service.get_run(run_id)?;
        if run.discovered > last_seen {
            last_seen = run.discovered;
            println!("  {last_seen} post(s) so far");
        }
        if run.status.is_terminal() {
            return Ok(run);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
