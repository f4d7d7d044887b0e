use chrono::{DateTime, FixedOffset, TimeZone};

/// Format a number of seconds as a GitLab duration literal (`1h30m`).
///
/// Hours and minutes are each dropped when zero and leftover seconds are
/// discarded, so anything under a minute formats as an empty string.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    let mut formatted = String::new();
    if hours > 0 {
        formatted.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        formatted.push_str(&format!("{minutes}m"));
    }
    formatted
}

/// Return `spent_at` unless it lies after `now`.
/// GitLab rejects timelogs dated in the future.
pub fn past_or_present<Tz: TimeZone>(
    spent_at: DateTime<FixedOffset>,
    now: &DateTime<Tz>,
) -> Option<DateTime<FixedOffset>> {
    if spent_at.timestamp() <= now.timestamp() {
        Some(spent_at)
    } else {
        None
    }
}
