use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::filters::{ContentType, TimeRange};
use crate::ConfigError;

const DEFAULT_MAX_POSTS: i32 = 20;
const DEFAULT_SCHEDULE_HOURS: i32 = 24;

fn default_time_range() -> TimeRange {
    TimeRange::Week
}

fn default_location() -> String {
    "any".to_string()
}

fn default_max_posts() -> i32 {
    DEFAULT_MAX_POSTS
}

fn default_schedule_hours() -> i32 {
    DEFAULT_SCHEDULE_HOURS
}

fn default_enabled() -> bool {
    true
}

/// A recurring query definition, as created by callers or read from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSearchConfig {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default = "default_time_range")]
    pub time_range: TimeRange,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_max_posts")]
    pub max_posts: i32,
    #[serde(default = "default_schedule_hours")]
    pub schedule_hours: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SavedSearchConfig {
    /// A config with every optional field at its default.
    #[must_use]
    pub fn new(name: &str, query: &str) -> Self {
        Self {
            name: name.to_string(),
            query: query.to_string(),
            content_type: ContentType::default(),
            time_range: default_time_range(),
            location: default_location(),
            max_posts: DEFAULT_MAX_POSTS,
            schedule_hours: DEFAULT_SCHEDULE_HOURS,
            enabled: true,
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a blank name or query, or a
    /// non-positive cap or interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "saved search name must be non-empty".to_string(),
            ));
        }
        if self.query.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "saved search '{}' has an empty query",
                self.name
            )));
        }
        if self.max_posts <= 0 {
            return Err(ConfigError::Validation(format!(
                "saved search '{}' has invalid max_posts {}; must be positive",
                self.name, self.max_posts
            )));
        }
        if self.schedule_hours <= 0 {
            return Err(ConfigError::Validation(format!(
                "saved search '{}' has invalid schedule_hours {}; must be positive",
                self.name, self.schedule_hours
            )));
        }
        Ok(())
    }
}

/// Partial update of a saved search; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSearchPatch {
    pub name: Option<String>,
    pub query: Option<String>,
    pub content_type: Option<ContentType>,
    pub time_range: Option<TimeRange>,
    pub location: Option<String>,
    pub max_posts: Option<i32>,
    pub schedule_hours: Option<i32>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SavedSearchesFile {
    pub searches: Vec<SavedSearchConfig>,
}

/// Load and validate saved searches from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_saved_searches(path: &Path) -> Result<SavedSearchesFile, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::SavedSearchesIo {
            path: path.display().to_string(),
            source: e,
        })?;
    let file: SavedSearchesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SavedSearchesParse)?;

    let mut seen = HashSet::new();
    for search in &file.searches {
        search.validate()?;
        if !seen.insert(search.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate saved search name: '{}'",
                search.name
            )));
        }
    }
    Ok(file)
}
