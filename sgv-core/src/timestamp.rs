//! Reading timestamp parsing.
//!
//! Sources are inconsistent about how they serialize time: some emit RFC3339
//! text, others an epoch-millisecond integer (often as a string). Both the
//! reconciliation step and the high-water mark go through [`parse_reading_time`]
//! so a stored entry and a freshly observed reading compare on the same
//! instant regardless of how either was written.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A single reading timestamp could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Neither RFC3339 nor an integer.
    #[error("unrecognized timestamp: {text:?}")]
    Unrecognized {
        /// The offending text.
        text: String,
    },

    /// An integer that does not fit the supported date range.
    #[error("epoch milliseconds out of range: {millis}")]
    OutOfRange {
        /// The offending value.
        millis: i64,
    },
}

/// Parse a reading timestamp.
///
/// RFC3339 is tried first; on failure the text is read as an integer count of
/// milliseconds since the Unix epoch.
pub fn parse_reading_time(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let millis: i64 = text
        .trim()
        .parse()
        .map_err(|_| TimestampError::Unrecognized {
            text: text.to_string(),
        })?;

    DateTime::from_timestamp_millis(millis).ok_or(TimestampError::OutOfRange { millis })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let t = parse_reading_time("2024-01-01T00:05:00Z").unwrap();
        assert_eq!(t.timestamp_millis(), 1_704_067_500_000);
    }

    #[test]
    fn parses_rfc3339_with_offset_and_fraction() {
        let t = parse_reading_time("2024-01-01T01:05:00.250+01:00").unwrap();
        assert_eq!(t.timestamp_millis(), 1_704_067_500_250);
    }

    #[test]
    fn epoch_millis_matches_rfc3339_encoding() {
        let from_millis = parse_reading_time("1700000000000").unwrap();
        let from_text = parse_reading_time("2023-11-14T22:13:20Z").unwrap();

        assert_eq!(from_millis, from_text);
        assert_eq!(from_millis.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_reading_time("yesterday"),
            Err(TimestampError::Unrecognized {
                text: "yesterday".into()
            })
        );
        assert!(parse_reading_time("").is_err());
        assert!(parse_reading_time("1700000000000ms").is_err());
    }

    #[test]
    fn rejects_out_of_range_millis() {
        assert_eq!(
            parse_reading_time(&i64::MAX.to_string()),
            Err(TimestampError::OutOfRange { millis: i64::MAX })
        );
    }
}
