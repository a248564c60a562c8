// libs/shared/models/src/clock.rs
//! Clock times arrive as `HH:MM` or `HH:MM:SS`.
use chrono::NaiveTime;
use serde::{de, Deserialize, Deserializer};

pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// `deserialize_with` target for request bodies.
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_clock_time(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid time '{}', expected HH:MM or HH:MM:SS", raw)))
}
