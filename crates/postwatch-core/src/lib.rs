pub mod app_config;
pub mod config;
pub mod credentials;
pub mod filters;
pub mod post;
pub mod saved_search;
pub mod schedule;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{CredentialError, CredentialStore, FileCredentialStore, SessionAuth};
pub use filters::{ContentType, SearchFilters, SortOrder, TimeRange};
pub use post::NormalizedPost;
pub use saved_search::{
    load_saved_searches, SavedSearchConfig, SavedSearchPatch, SavedSearchesFile,
};
pub use schedule::is_due;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read saved searches file {path}: {source}")]
    SavedSearchesIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse saved searches file: {0}")]
    SavedSearchesParse(#[source] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),
}
