use chrono::{DateTime, Duration, Utc};

/// Returns `true` when a recurring search should run at `now`.
///
/// A search that has never run is always due. Otherwise it is due once at
/// least `schedule_hours` have elapsed since `last_run`.
#[must_use]
pub fn is_due(last_run: Option<DateTime<Utc>>, schedule_hours: i32, now: DateTime<Utc>) -> bool {
    match last_run {
        None => true,
        Some(last) => now - last >= Duration::hours(i64::from(schedule_hours)),
    }
}
