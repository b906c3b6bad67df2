//! Wall-clock conversion between a fixed set of zones.
//!
//! Offsets are fixed standard-time offsets; daylight saving is not
//! modelled. Conversion is done in whole minutes and wraps around
//! midnight, so the result is always a time of day in `00:00`-`23:59`.

use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{CalcError, CalcResult};

const MINUTES_PER_DAY: i32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub key: &'static str,
    pub label: &'static str,
    /// Offset from UTC in minutes
    pub offset_minutes: i32,
}

const fn zone(key: &'static str, label: &'static str, offset_minutes: i32) -> Zone {
    Zone {
        key,
        label,
        offset_minutes,
    }
}

pub static ZONES: [Zone; 14] = [
    zone("UTC", "UTC", 0),
    zone("America/New_York", "New York (EST/EDT)", -5 * 60),
    zone("America/Los_Angeles", "Los Angeles (PST/PDT)", -8 * 60),
    zone("America/Chicago", "Chicago (CST/CDT)", -6 * 60),
    zone("Europe/London", "London (GMT/BST)", 0),
    zone("Europe/Paris", "Paris (CET/CEST)", 60),
    zone("Europe/Berlin", "Berlin (CET/CEST)", 60),
    zone("Asia/Tokyo", "Tokyo (JST)", 9 * 60),
    zone("Asia/Shanghai", "Shanghai (CST)", 8 * 60),
    zone("Asia/Dubai", "Dubai (GST)", 4 * 60),
    zone("Asia/Kolkata", "India (IST)", 5 * 60 + 30),
    zone("Asia/Singapore", "Singapore (SGT)", 8 * 60),
    zone("Australia/Sydney", "Sydney (AEST/AEDT)", 10 * 60),
    zone("Pacific/Auckland", "Auckland (NZST/NZDT)", 12 * 60),
];

pub const DEFAULT_FROM_ZONE: &str = "UTC";
pub const DEFAULT_TO_ZONE: &str = "Asia/Kolkata";

static ZONE_INDEX: Lazy<HashMap<String, &'static Zone>> = Lazy::new(|| {
    ZONES
        .iter()
        .map(|z| (z.key.to_lowercase(), z))
        .collect()
});

/// Look a zone up by key, case-insensitively
pub fn find_zone(key: &str) -> CalcResult<&'static Zone> {
    ZONE_INDEX
        .get(&key.trim().to_lowercase())
        .copied()
        .ok_or_else(|| CalcError::unknown_unit("time zone", key))
}

/// Parse `"HH:MM"` (24-hour)
pub fn parse_clock(text: &str) -> CalcResult<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|e| CalcError::invalid_input("time", text, e.to_string()))
}

/// Convert a wall-clock time from one zone to another
pub fn try_convert_time(time: NaiveTime, from: &str, to: &str) -> CalcResult<NaiveTime> {
    let from = find_zone(from)?;
    let to = find_zone(to)?;
    let minutes = (time.hour() * 60 + time.minute()) as i32 - from.offset_minutes + to.offset_minutes;
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY) as u32;
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0)
        .ok_or_else(|| CalcError::Internal {
            message: format!("minute {} out of range", wrapped),
        })
}

/// Text front door: `"HH:MM"` in, `"HH:MM"` out, empty string when the
/// input or either zone is not recognised.
pub fn convert_time(input: &str, from: &str, to: &str) -> String {
    parse_clock(input)
        .and_then(|time| try_convert_time(time, from, to))
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Converter selection, mirrors [`crate::units::ConverterState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePair {
    pub from: String,
    pub to: String,
}

impl Default for ZonePair {
    fn default() -> Self {
        ZonePair {
            from: DEFAULT_FROM_ZONE.to_string(),
            to: DEFAULT_TO_ZONE.to_string(),
        }
    }
}

impl ZonePair {
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    pub fn convert(&self, input: &str) -> String {
        convert_time(input, &self.from, &self.to)
    }
}
