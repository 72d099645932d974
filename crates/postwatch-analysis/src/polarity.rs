//! Lexicon polarity scorer for short professional posts.

use serde::{Deserialize, Serialize};

/// Word polarities in `[-1.0, 1.0]`. Keys are lowercase single words.
const LEXICON: &[(&str, f64)] = &[
    // Positive
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("celebrate", 0.5),
    ("congratulations", 0.6),
    ("delighted", 0.7),
    ("easy", 0.43),
    ("effective", 0.6),
    ("excellent", 1.0),
    ("excited", 0.4),
    ("exciting", 0.3),
    ("fantastic", 0.4),
    ("fun", 0.3),
    ("good", 0.7),
    ("grateful", 0.6),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("honored", 0.6),
    ("impressive", 1.0),
    ("incredible", 0.9),
    ("inspiring", 0.5),
    ("interesting", 0.5),
    ("love", 0.5),
    ("loved", 0.7),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleased", 0.5),
    ("positive", 0.23),
    ("proud", 0.8),
    ("recommend", 0.4),
    ("success", 0.3),
    ("successful", 0.75),
    ("thank", 0.4),
    ("thanks", 0.4),
    ("thrilled", 0.6),
    ("valuable", 0.5),
    ("win", 0.8),
    ("wonderful", 1.0),
    // Negative
    ("angry", -0.5),
    ("annoying", -0.8),
    ("awful", -1.0),
    ("bad", -0.7),
    ("broken", -0.4),
    ("crisis", -0.5),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disaster", -0.8),
    ("fail", -0.5),
    ("failed", -0.5),
    ("failure", -0.3),
    ("frustrated", -0.7),
    ("frustrating", -0.4),
    ("hard", -0.3),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("layoffs", -0.5),
    ("poor", -0.4),
    ("problem", -0.3),
    ("sad", -0.5),
    ("scary", -0.5),
    ("stressful", -0.6),
    ("terrible", -1.0),
    ("toxic", -0.6),
    ("ugly", -0.7),
    ("unfortunately", -0.5),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

/// Multipliers applied to the next sentiment-bearing word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.4),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("incredibly", 1.5),
    ("really", 1.3),
    ("super", 1.3),
    ("truly", 1.2),
    ("very", 1.3),
];

const NEGATORS: &[&str] = &[
    "aren't", "can't", "cannot", "didn't", "doesn't", "don't", "hardly", "isn't", "never", "no",
    "not", "wasn't", "won't",
];

/// Negated words flip sign and lose half their weight.
const NEGATION_FACTOR: f64 = -0.5;

/// How many preceding tokens are inspected for a negator.
const NEGATION_WINDOW: usize = 2;

/// Discrete sentiment bucket derived from a polarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// `> 0.1` is positive, `< -0.1` is negative, everything else (both
    /// boundaries included) is neutral.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            Self::Positive
        } else if score < -0.1 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

fn lookup(table: &[(&str, f64)], word: &str) -> Option<f64> {
    table
        .iter()
        .find_map(|&(w, weight)| (w == word).then_some(weight))
}

fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphabetic() && c != '\'')
        .trim_matches('\'')
        .replace('\u{2019}', "'")
        .to_lowercase()
}

/// Mean polarity of the sentiment-bearing words in `text`, clamped to
/// `[-1.0, 1.0]`. Text without any lexicon word scores `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polarity(text: &str) -> f64 {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();

    let mut hits: Vec<f64> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(mut weight) = lookup(LEXICON, token) else {
            continue;
        };
        if i > 0 {
            if let Some(boost) = lookup(INTENSIFIERS, &tokens[i - 1]) {
                weight *= boost;
            }
        }
        let window_start = i.saturating_sub(NEGATION_WINDOW);
        if tokens[window_start..i]
            .iter()
            .any(|t| NEGATORS.contains(&t.as_str()))
        {
            weight *= NEGATION_FACTOR;
        }
        hits.push(weight.clamp(-1.0, 1.0));
    }

    if hits.is_empty() {
        return 0.0;
    }
    let mean = hits.iter().sum::<f64>() / hits.len() as f64;
    mean.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        assert!(polarity("").abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_words_score_zero() {
        assert!(polarity("quarterly roadmap sync").abs() < f64::EPSILON);
    }

    #[test]
    fn positive_word_scores_positive() {
        assert!(polarity("What a great launch!") > 0.1);
    }

    #[test]
    fn negative_word_scores_negative() {
        assert!(polarity("The outage was terrible.") < -0.1);
    }

    #[test]
    fn negation_flips_and_dampens() {
        let score = polarity("this is not good");
        assert!((score - (-0.35)).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn intensifier_boosts_weight() {
        assert!(polarity("very good") > polarity("good"));
    }

    #[test]
    fn boosted_weight_is_capped() {
        assert!((polarity("absolutely perfect") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_text_averages() {
        // great (0.8) and terrible (-1.0)
        let score = polarity("great team, terrible timing");
        assert!((score - (-0.1)).abs() < 1e-9, "got {score}");
        assert_eq!(SentimentLabel::from_score(score), SentimentLabel::Neutral);
    }

    #[test]
    fn curly_apostrophe_negation_is_recognized() {
        assert!(polarity("I don\u{2019}t love it") < 0.0);
    }

    #[test]
    fn label_boundaries_are_neutral() {
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn label_just_past_boundaries() {
        assert_eq!(SentimentLabel::from_score(0.100_001), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.100_001), SentimentLabel::Negative);
    }

    #[test]
    fn label_strings() {
        assert_eq!(SentimentLabel::Positive.as_str(), "positive");
        assert_eq!(SentimentLabel::Negative.as_str(), "negative");
    }
}
