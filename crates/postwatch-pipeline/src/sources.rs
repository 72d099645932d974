use std::sync::Arc;
use std::time::Duration;

use postwatch_core::{AppConfig, CredentialError, CredentialStore, FileCredentialStore};
use postwatch_scraper::{AnonymousSearch, SessionAdapter, SessionLimits, SourceAdapter};

use crate::PipelineError;

/// Hands out the adapters an ingestion may use.
pub trait SourceProvider: Send + Sync {
    /// The adapter that always exists and needs no account.
    fn anonymous(&self) -> Arc<dyn SourceAdapter>;

    /// The signed-in adapter, or `None` when no login material is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if configured login material is unreadable.
    fn authenticated(&self) -> Result<Option<Arc<dyn SourceAdapter>>, CredentialError>;
}

/// Adapters backed by the real search service and a WebDriver browser.
pub struct LiveSources {
    anonymous: Arc<AnonymousSearch>,
    credentials: Box<dyn CredentialStore>,
    webdriver_url: String,
    limits: SessionLimits,
    login_timeout: Duration,
}

impl LiveSources {
    /// # Errors
    ///
    /// Returns [`PipelineError::Scraper`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let anonymous = AnonymousSearch::new(
            &config.search_base_url,
            config.http_timeout_secs,
            &config.user_agent,
            config.search_fetch_cap,
        )?;
        let credentials =
            FileCredentialStore::new(&config.credentials_path, &config.cookies_path);
        Ok(Self {
            anonymous: Arc::new(anonymous),
            credentials: Box::new(credentials),
            webdriver_url: config.webdriver_url.clone(),
            limits: session_limits(config),
            login_timeout: Duration::from_secs(config.login_timeout_secs),
        })
    }
}

fn session_limits(config: &AppConfig) -> SessionLimits {
    SessionLimits {
        max_scroll_attempts: config.max_scroll_attempts,
        max_idle_rounds: config.max_idle_rounds,
        settle_delay: Duration::from_millis(config.page_settle_ms),
        scroll_delay: Duration::from_millis(config.scroll_delay_ms),
    }
}

impl SourceProvider for LiveSources {
    fn anonymous(&self) -> Arc<dyn SourceAdapter> {
        Arc::clone(&self.anonymous) as Arc<dyn SourceAdapter>
    }

    fn authenticated(&self) -> Result<Option<Arc<dyn SourceAdapter>>, CredentialError> {
        if !self.credentials.has_auth() {
            return Ok(None);
        }
        let Some(auth) = self.credentials.lookup()? else {
            return Ok(None);
        };
        let adapter = SessionAdapter::new(&self.webdriver_url, auth, self.limits, self.login_timeout);
        Ok(Some(Arc::new(adapter)))
    }
}
