//! Raw readings as produced by a glucose source.

use serde::{Deserialize, Deserializer, Serialize};

/// One raw glucose measurement from the source provider.
///
/// The timestamp is kept exactly as the producer wrote it. Producers emit
/// either RFC3339 text or an epoch-millisecond integer; JSON integers are
/// stored as their decimal text so both shapes flow through the same parser.
/// Any other JSON value is kept as text the parser will reject, so one bad
/// timestamp drops that reading instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Producer-defined timestamp (RFC3339 or epoch milliseconds).
    #[serde(deserialize_with = "timestamp_text")]
    pub timestamp: String,
    /// Glucose value in mg/dL.
    pub value: f64,
}

impl Reading {
    /// Create a reading from a timestamp and a mg/dL value.
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Fractional(f64),
    Other(serde::de::IgnoredAny),
}

fn timestamp_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => text,
        RawTimestamp::Millis(ms) => ms.to_string(),
        RawTimestamp::Fractional(f) => format!("{f:?}"),
        RawTimestamp::Other(_) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_text_timestamp() {
        let reading: Reading =
            serde_json::from_str(r#"{"timestamp":"2024-01-01T00:05:00Z","value":110}"#).unwrap();
        assert_eq!(reading.timestamp, "2024-01-01T00:05:00Z");
        assert_eq!(reading.value, 110.0);
    }

    #[test]
    fn integer_timestamp_becomes_decimal_text() {
        let reading: Reading =
            serde_json::from_str(r#"{"timestamp":1700000000000,"value":98.5}"#).unwrap();
        assert_eq!(reading.timestamp, "1700000000000");
    }

    #[test]
    fn float_timestamp_keeps_its_fraction() {
        let reading: Reading =
            serde_json::from_str(r#"{"timestamp":1704067500000.0,"value":101}"#).unwrap();
        assert_eq!(reading.timestamp, "1704067500000.0");
    }

    #[test]
    fn other_timestamp_values_become_empty_text() {
        for raw in [r#"null"#, r#"true"#, r#"[1]"#, r#"{"ms":1}"#] {
            let json = format!(r#"{{"timestamp":{raw},"value":1}}"#);
            let reading: Reading = serde_json::from_str(&json).unwrap();
            assert_eq!(reading.timestamp, "", "timestamp {raw}");
        }
    }

    #[test]
    fn missing_value_is_still_an_error() {
        let result = serde_json::from_str::<Reading>(r#"{"timestamp":"2024-01-01T00:00:00Z"}"#);
        assert!(result.is_err());
    }
}
