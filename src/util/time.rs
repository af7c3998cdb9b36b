use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const ABSOLUTE_FORMAT: &str = "%d %b %Y, %I:%M %p";

/// "N units ago", using the coarsest unit that fits.
///
/// Thresholds: under 60 seconds, 60 minutes, 24 hours, 30 days, 12 months;
/// anything older is reported in years. Future timestamps read as 0 seconds.
pub fn time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds().max(0);
    if seconds < 60 {
        return format!("{} seconds ago", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} minutes ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hours ago", hours);
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{} days ago", days);
    }
    let months = days / 30;
    if months < 12 {
        return format!("{} months ago", months);
    }
    format!("{} years ago", months / 12)
}

/// Absolute timestamp for display, e.g. `01 Mar 2025, 10:00 AM`.
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format(ABSOLUTE_FORMAT).to_string()
}

/// Relative when within two days of `now`, absolute otherwise.
pub fn format_timestamp(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if now - ts > Duration::days(2) {
        format_date(ts)
    } else {
        time_ago(ts, now)
    }
}

/// Parse a user-supplied date/time.
///
/// Accepts RFC 3339 (`2025-06-01T09:00:00Z`), `YYYY-MM-DD HH:MM` or
/// `YYYY-MM-DDTHH:MM` (UTC), a bare `YYYY-MM-DD` (end of that day, UTC), and
/// offsets from `now` such as `+30m`, `+4h`, `+2d`, `+1w`.
pub fn parse_datetime(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let s = input.trim();
    if let Some(offset) = s.strip_prefix('+') {
        return parse_offset(offset)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| bad_date(input));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(23, 59, 59)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| bad_date(input));
    }
    Err(bad_date(input))
}

fn parse_offset(s: &str) -> Option<Duration> {
    let unit = s.chars().last()?;
    let amount: i64 = s[..s.len() - unit.len_utf8()].parse().ok()?;
    match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        'w' => Duration::try_weeks(amount),
        _ => None,
    }
}

fn bad_date(input: &str) -> String {
    format!(
        "invalid date '{}' (expected RFC 3339, YYYY-MM-DD[ HH:MM], or +N[m|h|d|w])",
        input
    )
}
