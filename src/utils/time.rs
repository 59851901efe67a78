use chrono::{DateTime, Duration, FixedOffset, Timelike};

/// Ticks per second used by the record file format (7 fractional digits).
const TICK_NANOS: u32 = 100;

/// Formats a duration for display.
///
/// Longer than a day gives `1d 01:00:00`, longer than an hour gives `1:01:01`,
/// anything else gives `1:01`. Sub-second parts are dropped and negative
/// durations are prefixed with `-`.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::zero() {
        return format!("-{}", format_duration(-duration));
    }

    let total_seconds = duration.num_seconds();
    let seconds = total_seconds % 60;

    if duration > Duration::days(1) {
        format!(
            "{}d {:02}:{:02}:{:02}",
            duration.num_days(),
            duration.num_hours() % 24,
            duration.num_minutes() % 60,
            seconds
        )
    } else if duration > Duration::hours(1) {
        format!(
            "{}:{:02}:{:02}",
            duration.num_hours(),
            duration.num_minutes() % 60,
            seconds
        )
    } else {
        format!("{}:{:02}", duration.num_minutes(), seconds)
    }
}

/// Formats a timestamp the way record files store it: `2020-01-01T10:00:00.0000000+02:00`.
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    // chrono has no 7 digit fraction specifier, so ticks are written by hand.
    let ticks = (time.nanosecond() % 1_000_000_000) / TICK_NANOS;
    format!(
        "{}.{:07}{}",
        time.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        time.format("%:z")
    )
}

/// Parses a stored timestamp. Accepts any RFC 3339 value, so fraction length and `Z` vs `+00:00`
/// don't matter.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
}
