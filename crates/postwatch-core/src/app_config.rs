use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// HTML endpoint of the anonymous web-search service.
    pub search_base_url: String,
    /// Upper bound on raw results requested per anonymous search.
    pub search_fetch_cap: usize,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub webdriver_url: String,
    pub login_timeout_secs: u64,
    pub page_settle_ms: u64,
    pub scroll_delay_ms: u64,
    pub max_scroll_attempts: u32,
    pub max_idle_rounds: u32,
    /// Pause after every enrichment page fetch, successful or not.
    pub fetch_delay_ms: u64,
    pub backfill_min_chars: usize,
    pub backfill_batch: i64,
    pub scheduler_tick_secs: u64,
    pub credentials_path: PathBuf,
    pub cookies_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("search_base_url", &self.search_base_url)
            .field("search_fetch_cap", &self.search_fetch_cap)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("webdriver_url", &self.webdriver_url)
            .field("login_timeout_secs", &self.login_timeout_secs)
            .field("page_settle_ms", &self.page_settle_ms)
            .field("scroll_delay_ms", &self.scroll_delay_ms)
            .field("max_scroll_attempts", &self.max_scroll_attempts)
            .field("max_idle_rounds", &self.max_idle_rounds)
            .field("fetch_delay_ms", &self.fetch_delay_ms)
            .field("backfill_min_chars", &self.backfill_min_chars)
            .field("backfill_batch", &self.backfill_batch)
            .field("scheduler_tick_secs", &self.scheduler_tick_secs)
            .field("credentials_path", &self.credentials_path)
            .field("cookies_path", &self.cookies_path)
            .finish()
    }
}
