//! Lenient timestamp parsing and serde adapters
//!
//! The backend emits RFC 3339 strings, but some payloads carry SQL-style
//! `YYYY-MM-DD HH:MM:SS` strings or epoch milliseconds. All of them end up as
//! `DateTime<Utc>`; output is always RFC 3339 with millisecond precision.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

impl RawTimestamp {
    fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Text(s) => parse(&s),
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(ms).single(),
        }
    }
}

/// Parse a timestamp string in any of the accepted spellings
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }

    None
}

/// Format a timestamp the way it is sent back to the backend
pub fn to_wire(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize a required timestamp
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_wire(ts))
}

/// Deserialize a required timestamp
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = RawTimestamp::deserialize(deserializer)?;
    raw.resolve()
        .ok_or_else(|| serde::de::Error::custom("unrecognized timestamp format"))
}

/// Adapters for optional timestamps; unparseable values become `None`
pub mod option {
    use super::*;

    /// Serialize an optional timestamp
    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&to_wire(ts)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional timestamp
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
        Ok(raw.and_then(RawTimestamp::resolve))
    }
}
