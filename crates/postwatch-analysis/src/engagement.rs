/// Reactions plus comments weighted double.
#[must_use]
pub fn weighted_engagement(reactions: i32, comments: i32) -> i64 {
    i64::from(reactions) + 2 * i64::from(comments)
}

/// Scales a post's weighted engagement against the maximum observed in its
/// comparison scope, giving a value in `[0, 100]` rounded to one decimal.
///
/// A non-positive `max_observed` yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_score(reactions: i32, comments: i32, max_observed: i64) -> f64 {
    if max_observed <= 0 {
        return 0.0;
    }
    let raw = weighted_engagement(reactions, comments).max(0) as f64;
    let pct = (raw / max_observed as f64 * 1000.0).round() / 10.0;
    pct.min(100.0)
}
