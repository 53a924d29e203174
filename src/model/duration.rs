// ABOUTME: Serde helpers for durations written as seconds or humantime strings
// ABOUTME: Used by retry delays and task timeouts in process definitions

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

impl RawDuration {
    fn into_duration(self) -> Result<Duration, String> {
        match self {
            RawDuration::Seconds(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|e| format!("invalid duration: {} seconds ({})", secs, e)),
            RawDuration::Text(text) => match text.trim().parse::<f64>() {
                Ok(secs) => RawDuration::Seconds(secs).into_duration(),
                Err(_) => humantime::parse_duration(text.trim()).map_err(|e| e.to_string()),
            },
        }
    }
}

/// `Duration` as a number of seconds.
pub mod seconds {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawDuration::deserialize(deserializer)?
            .into_duration()
            .map_err(serde::de::Error::custom)
    }
}

/// `Option<Duration>` as an optional number of seconds.
pub mod option_seconds {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawDuration>::deserialize(deserializer)? {
            Some(raw) => raw
                .into_duration()
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
