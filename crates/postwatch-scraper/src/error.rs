use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain}")]
    RateLimited { domain: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

/// Failures of a source adapter as a whole.
///
/// Search callers treat every variant as a reason to fall back to the
/// anonymous adapter; profile scrapes have no fallback and surface it as a
/// failed run.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Network(#[from] ScraperError),

    #[error("login failed: navigation did not become ready within {timeout_secs}s")]
    AuthTimeout { timeout_secs: u64 },

    #[error("no credentials or session cookies are configured")]
    MissingAuth,

    #[error(transparent)]
    Credentials(#[from] postwatch_core::CredentialError),

    #[error("failed to load session cookies from {path}: {reason}")]
    Cookies { path: PathBuf, reason: String },

    #[error("browser session error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("{adapter} adapter does not support {operation}")]
    Unsupported {
        adapter: &'static str,
        operation: &'static str,
    },
}
