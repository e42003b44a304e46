//! Timestamp parsing for collected CSV files.
//!
//! Collectors have written timestamps in several shapes over time (RFC 3339,
//! naive `YYYY-MM-DD HH:MM:SS`, bare dates, epoch seconds/millis). Naive values
//! are interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sentiment_core::{AnalysisError, Result};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parses a timestamp in any of the supported shapes.
///
/// # Errors
/// Returns `MalformedTimestamp` when no format matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AnalysisError::malformed_timestamp(raw));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&naive));
            }
        }
    }

    if let Ok(epoch) = value.parse::<i64>() {
        let parsed = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(AnalysisError::malformed_timestamp(raw))
}

/// Formats a timestamp the way collected files store it.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(parse_timestamp("2025-01-29T12:30:00Z").unwrap(), expected());
        assert_eq!(parse_timestamp("2025-01-29T14:30:00+02:00").unwrap(), expected());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        assert_eq!(parse_timestamp("2025-01-29 12:30:00").unwrap(), expected());
        assert_eq!(parse_timestamp("2025-01-29 12:30:00.000").unwrap(), expected());
        assert_eq!(parse_timestamp("2025-01-29T12:30:00").unwrap(), expected());
    }

    #[test]
    fn test_parse_space_separated_offset() {
        assert_eq!(parse_timestamp("2025-01-29 12:30:00+00:00").unwrap(), expected());
    }

    #[test]
    fn test_parse_dates() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 29, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-29").unwrap(), midnight);
        assert_eq!(parse_timestamp("January 29, 2025").unwrap(), midnight);
        assert_eq!(parse_timestamp("29 Jan 2025").unwrap(), midnight);
    }

    #[test]
    fn test_parse_epoch() {
        let ts = expected();
        assert_eq!(parse_timestamp(&ts.timestamp().to_string()).unwrap(), ts);
        assert_eq!(parse_timestamp(&ts.timestamp_millis().to_string()).unwrap(), ts);
    }

    #[test]
    fn test_malformed_timestamp() {
        let err = parse_timestamp("last tuesday").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedTimestamp { .. }));
        assert!(parse_timestamp("  ").is_err());
    }

    #[test]
    fn test_format_roundtrip() {
        let ts = expected();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }
}
