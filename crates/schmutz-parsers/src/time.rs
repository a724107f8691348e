//! Time parsing utilities for scheduler output.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::time::Duration;

/// Timestamp layouts emitted by squeue/sacct, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Placeholders SLURM prints for timestamps that are not known yet.
const TIMESTAMP_PLACEHOLDERS: &[&str] = &["Unknown", "None", "N/A"];

/// Placeholders SLURM prints instead of a time limit.
const NO_LIMIT: &[&str] = &["UNLIMITED", "INFINITE", "INVALID", "NOT_SET", "Partition_Limit"];

/// Parse a SLURM timestamp, interpreted in the local time zone.
///
/// Returns None for empty strings or placeholder values like "N/A", "Unknown", "None".
pub fn parse_slurm_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() || TIMESTAMP_PLACEHOLDERS.contains(&s) {
        return None;
    }

    let parsed = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok());

    match parsed {
        Some(dt) => Local
            .from_local_datetime(&dt)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        None => {
            tracing::warn!("Could not parse datetime: {}", s);
            None
        }
    }
}

/// Parse a SLURM duration.
///
/// Supports:
/// - DD-HH:MM:SS
/// - HH:MM:SS
/// - MM:SS
/// - SS
///
/// The seconds group may carry a fraction ("01:23.456"). Empty input is zero;
/// malformed or out-of-range input is logged and treated as zero.
pub fn parse_duration(s: &str) -> Duration {
    let s = s.trim();
    if s.is_empty() {
        return Duration::ZERO;
    }

    match try_parse_duration(s) {
        Some(d) => d,
        None => {
            tracing::warn!("Could not parse time value: {}", s);
            Duration::ZERO
        }
    }
}

fn try_parse_duration(s: &str) -> Option<Duration> {
    let (days, time_part) = match s.split_once('-') {
        Some((days, rest)) => (parse_group(days)?, rest),
        None => (0, s),
    };

    let groups: Vec<&str> = time_part.split(':').collect();
    let (leading, last) = groups.split_at(groups.len() - 1);
    let leading = match leading {
        [h, m] => parse_group(h)?
            .checked_mul(3600)?
            .checked_add(parse_group(m)?.checked_mul(60)?)?,
        [m] => parse_group(m)?.checked_mul(60)?,
        [] => 0,
        _ => return None,
    };
    let (secs, nanos) = parse_seconds(last[0])?;

    let total = days
        .checked_mul(86400)?
        .checked_add(leading)?
        .checked_add(secs)?;
    Some(Duration::new(total, nanos))
}

/// A run of ASCII digits as an integer; None on anything else or overflow.
fn parse_group(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Seconds group with an optional decimal fraction, as (whole, nanos).
fn parse_seconds(s: &str) -> Option<(u64, u32)> {
    let Some((whole, frac)) = s.split_once('.') else {
        return Some((parse_group(s)?, 0));
    };
    let whole = parse_group(whole)?;
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
    Some((whole, digits.parse().ok()?))
}

/// Parse a time limit or remaining-time field.
///
/// Returns None when SLURM reports no limit ("UNLIMITED", "INVALID", ...) or the
/// field is empty.
pub fn parse_time_limit(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() || NO_LIMIT.contains(&s) {
        return None;
    }
    Some(parse_duration(s))
}

/// Parse exit code from SLURM format (exit_code:signal).
///
/// Returns None if the field is empty or not numeric.
pub fn parse_exit_code(s: &str) -> Option<i32> {
    s.split(':').next().and_then(|v| v.trim().parse().ok())
}

/// Format seconds as human-readable duration (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        let days = hours / 24;
        let hours = hours % 24;
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format seconds as at most three units (e.g., "1d 2h 30m", "5m 3s", "42s").
pub fn format_duration_compact(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 || hours > 0 || days > 0 {
        parts.push(format!("{}m", mins));
    }
    parts.push(format!("{}s", secs));

    parts.truncate(3);
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slurm_timestamp() {
        let dt = parse_slurm_timestamp("2024-01-15T10:30:00").unwrap();
        assert_eq!(
            dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            "2024-01-15 10:30"
        );

        assert!(parse_slurm_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_slurm_timestamp("2024-01-15T10:30:00.250").is_some());

        assert!(parse_slurm_timestamp("N/A").is_none());
        assert!(parse_slurm_timestamp("Unknown").is_none());
        assert!(parse_slurm_timestamp("None").is_none());
        assert!(parse_slurm_timestamp("").is_none());
        assert!(parse_slurm_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("02:30:45"), Duration::from_secs(9045));
        assert_eq!(parse_duration("1-12:30:00"), Duration::from_secs(131400));
        assert_eq!(parse_duration("45:30"), Duration::from_secs(2730));
        assert_eq!(parse_duration("3600"), Duration::from_secs(3600));
        assert_eq!(parse_duration(""), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_fractional() {
        assert_eq!(parse_duration("01:23.500"), Duration::from_millis(83_500));
        assert_eq!(parse_duration("00:00:01.25"), Duration::from_millis(1_250));
    }

    #[test]
    fn test_parse_duration_malformed() {
        assert_eq!(parse_duration("UNLIMITED"), Duration::ZERO);
        assert_eq!(parse_duration("x-01:00:00"), Duration::ZERO);
        assert_eq!(parse_duration("1:2:3:4"), Duration::ZERO);
        assert_eq!(parse_duration("aa:bb"), Duration::ZERO);
        assert_eq!(parse_duration("1.5:00"), Duration::ZERO);
        assert_eq!(parse_duration("00:10."), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        assert_eq!(parse_duration("1e30"), Duration::ZERO);
        assert_eq!(parse_duration("inf"), Duration::ZERO);
        assert_eq!(parse_duration("NaN"), Duration::ZERO);
        assert_eq!(parse_duration("999999999999999999-00:00:00"), Duration::ZERO);
        assert_eq!(parse_duration("99999999999999999999"), Duration::ZERO);
        assert_eq!(parse_duration("-01:00:00"), Duration::ZERO);
        assert_eq!(parse_duration("01:-5:00"), Duration::ZERO);
        assert_eq!(
            parse_duration("18446744073709551615"),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_parse_time_limit() {
        assert_eq!(parse_time_limit("1:00:00"), Some(Duration::from_secs(3600)));
        assert_eq!(
            parse_time_limit("1-00:00:00"),
            Some(Duration::from_secs(86400))
        );
        assert!(parse_time_limit("UNLIMITED").is_none());
        assert!(parse_time_limit("INVALID").is_none());
        assert!(parse_time_limit("").is_none());
    }

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("0:0"), Some(0));
        assert_eq!(parse_exit_code("1:0"), Some(1));
        assert_eq!(parse_exit_code("137:9"), Some(137));
        assert_eq!(parse_exit_code(""), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(330), "05:30");
        assert_eq!(format_duration(5400), "01:30:00");
        assert_eq!(format_duration(95400), "1d 02:30:00");
    }

    #[test]
    fn test_format_duration_compact() {
        assert_eq!(format_duration_compact(42), "42s");
        assert_eq!(format_duration_compact(303), "5m 3s");
        assert_eq!(format_duration_compact(3600), "1h 0m 0s");
        assert_eq!(format_duration_compact(95400), "1d 2h 30m");
    }
}
