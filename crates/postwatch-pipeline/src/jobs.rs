//! Process-wide registry of ingestion runs.
//!
//! A [`JobTracker`] is created once at startup and shared by cloning. Each
//! launched run gets a [`RunHandle`] that is the only writer for that run;
//! any number of callers may read the table concurrently. Nothing here is
//! persisted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use postwatch_core::SearchFilters;
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// What a run was launched to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Profile { url: String },
    Query { query: String, filters: SearchFilters },
}

#[derive(Debug, Clone)]
pub struct IngestionRun {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub discovered: usize,
    pub error: Option<String>,
    pub target: RunTarget,
    pub limit: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

type RunTable = Arc<RwLock<HashMap<Uuid, IngestionRun>>>;

/// Supervisor tasks still owned by the tracker. Finished ones are reaped on
/// every launch, so the set only holds runs that may still be going.
#[derive(Clone, Default)]
pub struct JobTracker {
    runs: RunTable,
    tasks: Arc<Mutex<JoinSet<()>>>,
}

fn log_supervisor_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "ingestion supervisor task failed");
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        log_supervisor_result(result);
    }
}

impl JobTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a `running` record and return the handle that owns it.
    #[must_use]
    pub fn register(&self, target: RunTarget, limit: usize) -> RunHandle {
        let run_id = Uuid::new_v4();
        let run = IngestionRun {
            run_id,
            status: RunStatus::Running,
            discovered: 0,
            error: None,
            target,
            limit,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id, run);
        RunHandle {
            run_id,
            runs: Arc::clone(&self.runs),
        }
    }

    /// Register a run and execute `work` on a separate task, returning the
    /// run id immediately.
    ///
    /// If the worker panics before reaching a terminal status, the run is
    /// marked failed.
    pub fn launch<F, Fut>(&self, target: RunTarget, limit: usize, work: F) -> Uuid
    where
        F: FnOnce(RunHandle) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = self.register(target, limit);
        let run_id = handle.run_id();
        let worker = tokio::spawn(work(handle.clone()));

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        reap_finished(&mut tasks);
        tasks.spawn(async move {
            if let Err(e) = worker.await {
                tracing::error!(run_id = %run_id, error = %e, "ingestion worker aborted");
                handle.fail(format!("worker aborted: {e}"));
            }
        });
        run_id
    }

    #[must_use]
    pub fn get(&self, run_id: Uuid) -> Option<IngestionRun> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&run_id)
            .cloned()
    }

    /// Every known run, oldest first.
    #[must_use]
    pub fn list_all(&self) -> Vec<IngestionRun> {
        let mut runs: Vec<IngestionRun> = self
            .runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.started_at);
        runs
    }

    /// Number of supervisor tasks not yet finished, after reaping the rest.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        reap_finished(&mut tasks);
        tasks.len()
    }

    /// Wait for every worker launched so far, including its enrichment tail.
    pub async fn join_all(&self) {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(result) = tasks.join_next().await {
            log_supervisor_result(result);
        }
    }
}

/// Write access to a single run's record.
#[derive(Clone)]
pub struct RunHandle {
    run_id: Uuid,
    runs: RunTable,
}

impl RunHandle {
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn update<R>(&self, f: impl FnOnce(&mut IngestionRun) -> R) -> Option<R> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        runs.get_mut(&self.run_id).map(f)
    }

    /// Raise the discovered count while the run is still going. The count
    /// never decreases.
    pub fn report_progress(&self, discovered: usize) {
        self.update(|run| {
            if run.status == RunStatus::Running {
                run.discovered = run.discovered.max(discovered);
            }
        });
    }

    /// Mark the run completed with the number of posts it actually
    /// collected. That count replaces any progress reported by an adapter
    /// that later failed over. Returns `false` if it had already finished.
    pub fn complete(&self, discovered: usize) -> bool {
        self.update(|run| {
            if run.status.is_terminal() {
                return false;
            }
            run.status = RunStatus::Completed;
            run.discovered = discovered;
            run.finished_at = Some(Utc::now());
            true
        })
        .unwrap_or(false)
    }

    /// Mark the run failed. Returns `false` if it had already finished.
    pub fn fail(&self, error: impl Into<String>) -> bool {
        let error = error.into();
        self.update(|run| {
            if run.status.is_terminal() {
                return false;
            }
            run.status = RunStatus::Failed;
            run.error = Some(error);
            run.finished_at = Some(Utc::now());
            true
        })
        .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
