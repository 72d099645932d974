use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from variables already in the process
/// environment, without reading `.env`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn parse_number<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Build configuration from an arbitrary env-var lookup so tests can feed a
/// plain map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("POSTWATCH_ENV", "development"));
    let log_level = or_default("POSTWATCH_LOG_LEVEL", "info");

    let db_max_connections = parse_number(
        "POSTWATCH_DB_MAX_CONNECTIONS",
        &or_default("POSTWATCH_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections = parse_number(
        "POSTWATCH_DB_MIN_CONNECTIONS",
        &or_default("POSTWATCH_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs = parse_number(
        "POSTWATCH_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("POSTWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let search_base_url = or_default(
        "POSTWATCH_SEARCH_BASE_URL",
        "https://html.duckduckgo.com/html/",
    );
    let search_fetch_cap = parse_number(
        "POSTWATCH_SEARCH_FETCH_CAP",
        &or_default("POSTWATCH_SEARCH_FETCH_CAP", "150"),
    )?;
    let http_timeout_secs = parse_number(
        "POSTWATCH_HTTP_TIMEOUT_SECS",
        &or_default("POSTWATCH_HTTP_TIMEOUT_SECS", "10"),
    )?;
    let user_agent = or_default("POSTWATCH_USER_AGENT", DEFAULT_USER_AGENT);

    let webdriver_url = or_default("POSTWATCH_WEBDRIVER_URL", "http://localhost:9515");
    let login_timeout_secs = parse_number(
        "POSTWATCH_LOGIN_TIMEOUT_SECS",
        &or_default("POSTWATCH_LOGIN_TIMEOUT_SECS", "20"),
    )?;
    let page_settle_ms = parse_number(
        "POSTWATCH_PAGE_SETTLE_MS",
        &or_default("POSTWATCH_PAGE_SETTLE_MS", "5000"),
    )?;
    let scroll_delay_ms = parse_number(
        "POSTWATCH_SCROLL_DELAY_MS",
        &or_default("POSTWATCH_SCROLL_DELAY_MS", "4000"),
    )?;
    let max_scroll_attempts = parse_number(
        "POSTWATCH_MAX_SCROLL_ATTEMPTS",
        &or_default("POSTWATCH_MAX_SCROLL_ATTEMPTS", "40"),
    )?;
    let max_idle_rounds = parse_number(
        "POSTWATCH_MAX_IDLE_ROUNDS",
        &or_default("POSTWATCH_MAX_IDLE_ROUNDS", "3"),
    )?;

    let fetch_delay_ms = parse_number(
        "POSTWATCH_FETCH_DELAY_MS",
        &or_default("POSTWATCH_FETCH_DELAY_MS", "1500"),
    )?;
    let backfill_min_chars = parse_number(
        "POSTWATCH_BACKFILL_MIN_CHARS",
        &or_default("POSTWATCH_BACKFILL_MIN_CHARS", "400"),
    )?;
    let backfill_batch = parse_number(
        "POSTWATCH_BACKFILL_BATCH",
        &or_default("POSTWATCH_BACKFILL_BATCH", "50"),
    )?;
    let scheduler_tick_secs = parse_number(
        "POSTWATCH_SCHEDULER_TICK_SECS",
        &or_default("POSTWATCH_SCHEDULER_TICK_SECS", "60"),
    )?;
    if scheduler_tick_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTWATCH_SCHEDULER_TICK_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let credentials_path = PathBuf::from(or_default(
        "POSTWATCH_CREDENTIALS_PATH",
        "data/credentials.json",
    ));
    let cookies_path = PathBuf::from(or_default("POSTWATCH_COOKIES_PATH", "data/cookies.txt"));

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        search_base_url,
        search_fetch_cap,
        http_timeout_secs,
        user_agent,
        webdriver_url,
        login_timeout_secs,
        page_settle_ms,
        scroll_delay_ms,
        max_scroll_attempts,
        max_idle_rounds,
        fetch_delay_ms,
        backfill_min_chars,
        backfill_batch,
        scheduler_tick_secs,
        credentials_path,
        cookies_path,
    })
}

/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
