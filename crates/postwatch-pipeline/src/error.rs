use postwatch_core::{ConfigError, CoreError, CredentialError};
use postwatch_db::DbError;
use postwatch_scraper::{AdapterError, ScraperError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("source adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("failed to build HTTP client: {0}")]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stored filters are invalid: {0}")]
    InvalidFilters(#[from] CoreError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("profile ingestion requires stored credentials or session cookies")]
    AuthRequired,
}
