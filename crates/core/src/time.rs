use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// A caller-supplied instant, accepted either as an RFC3339 string or as
/// epoch milliseconds. Git hooks send strings; some SDK exporters send
/// numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Stamp {
    Text(String),
    Millis(i64),
}

impl Stamp {
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            Stamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| PulseError::Parse(format!("invalid timestamp {s}: {e}"))),
            Stamp::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| PulseError::Parse(format!("timestamp out of range: {ms}"))),
        }
    }
}

pub fn unix_seconds_to_dt(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| PulseError::Parse(format!("unix timestamp out of range: {secs}")))
}

pub fn nanos_to_dt(nanos: u64) -> DateTime<Utc> {
    let secs = (nanos / 1_000_000_000) as i64;
    let subnanos = (nanos % 1_000_000_000) as u32;
    Utc.timestamp_opt(secs, subnanos)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| PulseError::Parse(format!("invalid duration {input}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_parses_rfc3339() {
        let ts = Stamp::Text("2026-03-01T12:00:00Z".into()).to_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn stamp_parses_millis() {
        let ts = Stamp::Millis(1_700_000_000_000).to_utc().unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn stamp_rejects_garbage() {
        assert!(Stamp::Text("not-a-time".into()).to_utc().is_err());
    }

    #[test]
    fn stamp_deserializes_both_shapes() {
        let text: Stamp = serde_json::from_str("\"2026-03-01T12:00:00Z\"").unwrap();
        let num: Stamp = serde_json::from_str("1700000000000").unwrap();
        assert!(matches!(text, Stamp::Text(_)));
        assert!(matches!(num, Stamp::Millis(1_700_000_000_000)));
    }

    #[test]
    fn unix_seconds_converts() {
        let ts = unix_seconds_to_dt(1_700_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn nanos_converts() {
        let ts = nanos_to_dt(1_700_000_000_500_000_000);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }
}
