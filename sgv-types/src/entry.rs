//! Destination store records.

use serde::{Deserialize, Serialize};

/// Entry type tag for sensor glucose values.
pub const SGV_KIND: &str = "sgv";

/// One record as stored in (or sent to) the destination `entries` API.
///
/// Decoding is lenient: the destination keeps other entry types and extra
/// fields (`_id`, `device`, `direction`, ...) which are ignored here, and
/// missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry type tag, [`SGV_KIND`] for everything this crate writes.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Glucose value in mg/dL.
    #[serde(rename = "sgv", default)]
    pub value: f64,
    /// Epoch milliseconds; the canonical comparison key.
    #[serde(rename = "date", default)]
    pub epoch_millis: i64,
    /// The source timestamp, verbatim.
    #[serde(rename = "dateString", default)]
    pub timestamp_text: String,
}

impl LedgerEntry {
    /// Build a sensor glucose entry.
    pub fn sgv(value: f64, epoch_millis: i64, timestamp_text: impl Into<String>) -> Self {
        Self {
            kind: SGV_KIND.to_string(),
            value,
            epoch_millis,
            timestamp_text: timestamp_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_wire_field_names() {
        let entry = LedgerEntry::sgv(120.0, 1_704_067_500_000, "2024-01-01T00:05:00Z");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["type"], "sgv");
        assert_eq!(json["sgv"], 120.0);
        assert_eq!(json["date"], 1_704_067_500_000i64);
        assert_eq!(json["dateString"], "2024-01-01T00:05:00Z");
    }

    #[test]
    fn decodes_destination_record_with_extra_fields() {
        let body = r#"{
            "_id": "65920f0e",
            "type": "sgv",
            "sgv": 104,
            "date": 1704067200000,
            "dateString": "2024-01-01T00:00:00.000Z",
            "direction": "Flat",
            "device": "xDrip"
        }"#;

        let entry: LedgerEntry = serde_json::from_str(body).unwrap();
        assert_eq!(entry.kind, SGV_KIND);
        assert_eq!(entry.value, 104.0);
        assert_eq!(entry.epoch_millis, 1_704_067_200_000);
    }

    #[test]
    fn missing_fields_default() {
        let entry: LedgerEntry = serde_json::from_str(r#"{"type":"mbg"}"#).unwrap();
        assert_eq!(entry.kind, "mbg");
        assert_eq!(entry.epoch_millis, 0);
        assert!(entry.timestamp_text.is_empty());
    }
}
