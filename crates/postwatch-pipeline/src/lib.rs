//! Orchestration for postwatch: ingestion runs tracked in memory, two-pass
//! enrichment, the saved-search scheduler, and the [`Postwatch`] facade that
//! front ends call.

pub mod enrichment;
pub mod error;
pub mod jobs;
pub mod scheduler;
pub mod service;
pub mod sources;

mod ingest;

pub use enrichment::{
    analyze_post, analyze_scope, merge_if_better, Enricher, EnrichmentReport, EnrichmentSettings,
    Scope,
};
pub use error::PipelineError;
pub use jobs::{IngestionRun, JobTracker, RunHandle, RunStatus, RunTarget};
pub use scheduler::{run_due_searches, Scheduler, TickReport};
pub use service::{AnalyticsReport, Postwatch};
pub use sources::{LiveSources, SourceProvider};
