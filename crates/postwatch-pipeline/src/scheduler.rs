//! Periodic execution of due saved searches.
//!
//! One background task per started scheduler. Each tick lists the enabled
//! saved searches and runs the due ones one after another. Stopping cancels
//! the loop between ticks; a tick already executing runs to completion.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use postwatch_core::is_due;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::service::Postwatch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evaluated: usize,
    pub executed: usize,
    pub failed: usize,
}

struct Running {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

pub struct Scheduler {
    service: Postwatch,
    tick: Duration,
    running: Mutex<Option<Running>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(service: Postwatch, tick: Duration) -> Self {
        Self {
            service,
            tick,
            running: Mutex::new(None),
        }
    }

    /// Start ticking. Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return false;
        }
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run_loop(self.service.clone(), self.tick, shutdown.clone()));
        *running = Some(Running { shutdown, task });
        tracing::info!(tick_secs = self.tick.as_secs(), "scheduler started");
        true
    }

    /// Stop ticking and wait for an in-flight tick to finish. Returns
    /// `false` if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running { shutdown, task }) = running else {
            return false;
        };
        shutdown.cancel();
        if let Err(e) = task.await {
            tracing::error!(error = %e, "scheduler task ended abnormally");
        }
        tracing::info!("scheduler stopped");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

async fn run_loop(service: Postwatch, tick: Duration, shutdown: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if shutdown.is_cancelled() {
            break;
        }
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        run_due_searches(&service, Utc::now()).await;
    }
}

/// Execute every enabled saved search that is due at `now`, in id order.
///
/// A failing search is logged and counted; the rest still run.
pub async fn run_due_searches(service: &Postwatch, now: DateTime<Utc>) -> TickReport {
    let mut report = TickReport::default();

    let searches = match postwatch_db::list_enabled_saved_searches(service.pool()).await {
        Ok(searches) => searches,
        Err(e) => {
            tracing::error!(error = %e, "failed to list saved searches");
            return report;
        }
    };

    for search in searches {
        report.evaluated += 1;
        if !is_due(search.last_run, search.schedule_hours, now) {
            continue;
        }
        match service.execute_saved_search(&search).await {
            Ok(_) => report.executed += 1,
            Err(e) => {
                report.failed += 1;
                tracing::error!(
                    search_id = search.id,
                    name = %search.name,
                    error = %e,
                    "saved search execution failed"
                );
            }
        }
    }

    if report.executed > 0 || report.failed > 0 {
        tracing::info!(
            evaluated = report.evaluated,
            executed = report.executed,
            failed = report.failed,
            "scheduler tick finished"
        );
    }
    report
}
