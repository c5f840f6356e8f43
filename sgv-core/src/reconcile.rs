//! Reconciliation of local readings against the destination's high-water mark.
//!
//! The destination's most recent entry is the only record of what has been
//! delivered. A reading is new exactly when its parsed instant is strictly
//! after that entry's instant. Comparison happens on parsed time, never on
//! the raw text, so the same instant serialized two different ways is still
//! recognized as already delivered.

use chrono::{DateTime, Utc};
use sgv_types::{LedgerEntry, Reading};

use crate::timestamp::{parse_reading_time, TimestampError};

/// Instant of a stored entry, used as the dedup boundary.
///
/// The entry's `dateString` goes through the reading parser first so that
/// both sides of the comparison are interpreted identically. Entries whose
/// text is missing or unparseable fall back to their `date` field. An entry
/// with neither (`date` absent decodes as 0) has no usable instant.
pub fn high_water_mark(entry: &LedgerEntry) -> Option<DateTime<Utc>> {
    parse_reading_time(&entry.timestamp_text).ok().or_else(|| {
        if entry.epoch_millis == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(entry.epoch_millis)
    })
}

/// A reading dropped because its timestamp could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedReading {
    /// The reading's original timestamp text.
    pub timestamp: String,
    /// Why it was rejected.
    pub error: TimestampError,
}

/// Outcome of reconciling one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Entries to write, in input order.
    pub entries: Vec<LedgerEntry>,
    /// Readings with malformed timestamps.
    pub skipped: Vec<SkippedReading>,
    /// Readings at or before the high-water mark.
    pub already_present: usize,
}

impl Reconciliation {
    /// True when no write is needed.
    pub fn is_noop(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Select the readings the destination does not have yet.
///
/// With no mark (empty destination) every parseable reading is kept.
pub fn reconcile(readings: &[Reading], mark: Option<DateTime<Utc>>) -> Reconciliation {
    let mut result = Reconciliation::default();

    for reading in readings {
        let at = match parse_reading_time(&reading.timestamp) {
            Ok(at) => at,
            Err(error) => {
                result.skipped.push(SkippedReading {
                    timestamp: reading.timestamp.clone(),
                    error,
                });
                continue;
            }
        };

        if mark.is_some_and(|mark| at <= mark) {
            result.already_present += 1;
            continue;
        }

        result.entries.push(LedgerEntry::sgv(
            reading.value,
            at.timestamp_millis(),
            reading.timestamp.clone(),
        ));
    }

    result
}
