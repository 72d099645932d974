//! TF-IDF topic ranking over the sentences of a single post.
//!
//! Each sentence is treated as a document. Terms are unigrams and bigrams of
//! the stop-word-filtered tokens; the vocabulary is capped at the most
//! frequent [`MAX_FEATURES`] terms. Per-sentence vectors are L2-normalized
//! and summed, and the highest-scoring terms are returned.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::stopwords::is_stop_word;

pub const DEFAULT_TOPIC_COUNT: usize = 5;

const MAX_FEATURES: usize = 50;

/// Sentences at or below this many characters are ignored.
const MIN_SENTENCE_CHARS: usize = 10;

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?\n]+").expect("valid sentence regex"));
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

fn sentence_terms(sentence: &str) -> Vec<String> {
    let lowered = sentence.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

/// Returns up to `top_n` terms ranked by summed TF-IDF weight.
///
/// Text with no usable sentence, or whose sentences contain only stop
/// words, yields an empty list.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn extract_topics(text: &str, top_n: usize) -> Vec<String> {
    let documents: Vec<Vec<String>> = SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(sentence_terms)
        .collect();
    if documents.is_empty() || top_n == 0 {
        return Vec::new();
    }

    // term -> (total occurrences, document frequency)
    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    for doc in &documents {
        let mut seen: Vec<&str> = Vec::new();
        for term in doc {
            let entry = stats.entry(term.as_str()).or_insert((0, 0));
            entry.0 += 1;
            if !seen.contains(&term.as_str()) {
                entry.1 += 1;
                seen.push(term.as_str());
            }
        }
    }
    if stats.is_empty() {
        return Vec::new();
    }

    let mut vocabulary: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .map(|(term, (count, df))| (term, count, df))
        .collect();
    vocabulary.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    vocabulary.truncate(MAX_FEATURES);

    let n_docs = documents.len() as f64;
    let idf: HashMap<&str, f64> = vocabulary
        .iter()
        .map(|&(term, _, df)| (term, ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0))
        .collect();

    let mut scores: HashMap<&str, f64> = HashMap::new();
    for doc in &documents {
        let mut weights: HashMap<&str, f64> = HashMap::new();
        for term in doc {
            if let Some(w) = idf.get(term.as_str()) {
                *weights.entry(term.as_str()).or_insert(0.0) += w;
            }
        }
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm <= 0.0 {
            continue;
        }
        for (term, w) in weights {
            *scores.entry(term).or_insert(0.0) += w / norm;
        }
    }

    let mut ranked: Vec<(&str, f64)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(term, _)| term.to_string())
        .collect()
}
