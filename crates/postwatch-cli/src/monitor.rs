use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use postwatch_core::AppConfig;
use postwatch_pipeline::{run_due_searches, Postwatch, Scheduler};

use crate::fmt_time;

/// Sub-commands available under `monitor`.
#[derive(Debug, Subcommand)]
pub enum MonitorCommands {
    /// Show the most recent saved-search executions
    Results {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Count new posts found by saved searches in a recent window
    Unread {
        #[arg(long, default_value = "24")]
        hours: i64,
    },
    /// Run due saved searches on a timer until interrupted
    Watch {
        /// Evaluate due searches once and exit
        #[arg(long)]
        once: bool,
    },
}

pub(crate) async fn run_monitor(
    service: &Postwatch,
    config: &AppConfig,
    command: MonitorCommands,
) -> anyhow::Result<()> {
    match command {
        MonitorCommands::Results { limit } => {
            let results = service.list_monitor_results(limit).await?;
            if results.is_empty() {
                println!("no saved-search executions recorded yet");
                return Ok(());
            }
            println!("{:<8}{:<8}{:<18}{:>6}  RUN", "ID", "SEARCH", "RUN AT", "NEW");
            for r in &results {
                println!(
                    "{:<8}{:<8}{:<18}{:>6}  {}",
                    r.id,
                    r.saved_search_id,
                    fmt_time(Some(r.run_at)),
                    r.new_posts_count,
                    r.run_id
                        .map_or_else(|| "\u{2014}".to_string(), |id| id.to_string())
                );
            }
            Ok(())
        }
        MonitorCommands::Unread { hours } => {
            let count = service.unread_count_since(hours).await?;
            println!("{count} new post(s) in the last {hours}h");
            Ok(())
        }
        MonitorCommands::Watch { once: true } => {
            let report = run_due_searches(service, Utc::now()).await;
            println!(
                "evaluated {} saved search(es): {} executed, {} failed",
                report.evaluated, report.executed, report.failed
            );
            Ok(())
        }
        MonitorCommands::Watch { once: false } => {
            let scheduler =
                Scheduler::new(service.clone(), Duration::from_secs(config.scheduler_tick_secs));
            scheduler.start();
            shutdown_signal().await;
            scheduler.stop().await;
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
