//! Field-level parsing for the collision feed.
//!
//! Every parser returns `None` for blank or malformed input so a bad cell
//! nulls its field instead of failing the row.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

/// Trims a cell and returns it, or `None` when blank.
#[must_use]
pub fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Parses a crash date, dropping any time-of-day component.
///
/// Accepts the feed's `MM/DD/YYYY` form as well as ISO 8601 dates and
/// datetimes.
#[must_use]
pub fn parse_crash_date(s: &str) -> Option<NaiveDate> {
    let s = non_empty(s)?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a crash time such as `"2:39"` or `"14:05:00"`.
#[must_use]
pub fn parse_crash_time(s: &str) -> Option<NaiveTime> {
    let s = non_empty(s)?;
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parses a non-negative count. Whole-number floats such as `"1.0"` are
/// accepted; negatives and fractions are not.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(s: &str) -> Option<u32> {
    let s = non_empty(s)?;
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        Some(f as u32)
    } else {
        None
    }
}

/// Parses a longitude or latitude. Zero is kept; the `(0.0, 0.0)` pair is
/// dropped later by the location filter.
#[must_use]
pub fn parse_coordinate(s: &str) -> Option<f64> {
    non_empty(s)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn parses_feed_date() {
        let d = parse_crash_date("09/11/2021").unwrap();
        assert_eq!(d.to_string(), "2021-09-11");
    }

    #[test]
    fn truncates_datetime_to_date() {
        let d = parse_crash_date("2021-09-11T23:59:00.000").unwrap();
        assert_eq!(d.to_string(), "2021-09-11");
        let d = parse_crash_date("09/11/2021 11:15:00 PM").unwrap();
        assert_eq!(d.to_string(), "2021-09-11");
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_crash_date("not-a-date").is_none());
        assert!(parse_crash_date("13/45/2021").is_none());
        assert!(parse_crash_date("  ").is_none());
    }

    #[test]
    fn parses_single_digit_hour() {
        let t = parse_crash_time("2:39").unwrap();
        assert_eq!(t.hour(), 2);
        assert_eq!(t.minute(), 39);
        assert_eq!(parse_crash_time("23:05:10").unwrap().hour(), 23);
    }

    #[test]
    fn rejects_invalid_time() {
        assert!(parse_crash_time("25:00").is_none());
        assert!(parse_crash_time("noon").is_none());
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count(" 1.0 "), Some(1));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn parses_coordinates() {
        assert_eq!(parse_coordinate("40.7128"), Some(40.7128));
        assert_eq!(parse_coordinate("0.0"), Some(0.0));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("NaN"), None);
    }
}
