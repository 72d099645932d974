//! Logical search filters shared by the source adapters, saved searches and
//! the query engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Which kind of source content a search is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Posts,
    Articles,
    All,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Articles => "articles",
            Self::All => "all",
        }
    }
}

impl FromStr for ContentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "articles" => Ok(Self::Articles),
            "all" => Ok(Self::All),
            other => Err(CoreError::InvalidContentType(other.to_string())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recency window applied by the source, not by the local corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Any,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl FromStr for TimeRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(CoreError::InvalidTimeRange(other.to_string())),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters handed to a source adapter alongside the query text.
///
/// `location` is a slug (`"any"`, a US state such as `"new-york"`, or a
/// country such as `"germany"`). Unknown slugs are passed through as
/// free-text keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    "any".to_string()
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            content_type: ContentType::default(),
            time_range: TimeRange::default(),
            location: default_location(),
        }
    }
}

/// Requested ordering of corpus search results.
///
/// `Date` is the default; with a text query and no author filter it is
/// promoted to `Relevance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Relevance,
    Reactions,
    Comments,
    #[default]
    Date,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "reactions" => Ok(Self::Reactions),
            "comments" => Ok(Self::Comments),
            "date" => Ok(Self::Date),
            other => Err(CoreError::InvalidSortOrder(other.to_string())),
        }
    }
}
