//! Text analysis for collected posts.
//!
//! Everything here is pure and synchronous: polarity scoring against a small
//! lexicon, TF-IDF topic ranking over sentence segments, hashtag extraction,
//! and engagement normalization against a comparison scope.

pub mod engagement;
pub mod hashtags;
pub mod polarity;
pub mod topics;

mod stopwords;

pub use engagement::{engagement_score, weighted_engagement};
pub use hashtags::extract_hashtags;
pub use polarity::{polarity, SentimentLabel};
pub use topics::{extract_topics, DEFAULT_TOPIC_COUNT};

/// Result of analyzing one post body.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAnalysis {
    pub sentiment: f64,
    pub label: SentimentLabel,
    pub topics: Vec<String>,
    pub hashtags: Vec<String>,
}

/// Runs polarity, topic and hashtag extraction over `text`.
///
/// Returns `None` for empty or whitespace-only text.
#[must_use]
pub fn analyze_text(text: &str) -> Option<TextAnalysis> {
    if text.trim().is_empty() {
        return None;
    }
    let sentiment = polarity(text);
    Some(TextAnalysis {
        sentiment,
        label: SentimentLabel::from_score(sentiment),
        topics: extract_topics(text, DEFAULT_TOPIC_COUNT),
        hashtags: extract_hashtags(text),
    })
}
