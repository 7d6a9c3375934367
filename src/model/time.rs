//! Time-of-day parsing
//!
//! The backend sends times of day as strings (`"09:00"`, sometimes with
//! seconds). Filters and sort keys compare them as minutes since midnight.

use regex::Regex;
use std::sync::OnceLock;

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("time-of-day pattern is valid")
    })
}

/// Parse `HH:MM` (or `HH:MM:SS`) into minutes since midnight.
///
/// Returns `None` for anything that is not a valid time of day.
pub fn parse_minutes(value: &str) -> Option<u32> {
    let caps = time_pattern().captures(value.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;

    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(hours * 60 + minutes)
}
