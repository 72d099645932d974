use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as produced by the normalizer, before it reaches the corpus.
///
/// `external_id` is either the numeric activity id embedded in the source
/// URL or a 16-hex-character hash of the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub external_id: String,
    pub post_url: String,
    pub author_name: Option<String>,
    pub author_profile: Option<String>,
    pub author_title: Option<String>,
    /// Human-readable post date as shown by the source (e.g. `"May 28, 2024"`).
    pub post_time: Option<String>,
    pub content: String,
    pub reactions: i32,
    pub comments: i32,
    pub impressions: i32,
    pub collected_at: DateTime<Utc>,
}
