//! Stored timestamps are RFC 3339 UTC with nanosecond precision, so their
//! text always has the same width and sorts in time order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Timestamp as a document patch value
pub fn to_value(at: DateTime<Utc>) -> Value {
    Value::String(format(&at))
}

pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    DateTime::<Utc>::deserialize(deserializer)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(at: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => serializer.serialize_some(&super::format(at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<DateTime<Utc>>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_width_is_fixed() {
        let whole = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let micro = whole + Duration::microseconds(1);
        assert_eq!(format(&whole), "2025-03-01T12:00:00.000000000Z");
        assert_eq!(format(&micro), "2025-03-01T12:00:00.000001000Z");
        assert!(format(&whole) < format(&micro));
    }

    #[test]
    fn test_reads_other_precisions() {
        let parsed: DateTime<Utc> = serde_json::from_value(Value::from("2025-03-01T12:00:00.5Z")).unwrap();
        assert_eq!(format(&parsed), "2025-03-01T12:00:00.500000000Z");
    }
}
