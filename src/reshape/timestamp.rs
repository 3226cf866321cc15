//! Hour parsing and timestamp compression.
//!
//! The source delivers UTC hour boundaries in a few shapes (`2019-01-01T00:00`,
//! `2019-01-01T00:00:00`, `2019-01-01T00:00:00Z`). Everything is parsed into a
//! `NaiveDateTime` in UTC first; compression only happens when series are built.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

use crate::domain::{SeriesTime, TimestampMode};
use crate::error::PipelineError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a source hour string into a UTC hour boundary.
pub fn parse_hour(raw: &str) -> Result<NaiveDateTime, PipelineError> {
    let trimmed = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        })
        .ok_or_else(|| invalid(raw, "expected YYYY-MM-DDTHH:MM[:SS][Z|offset]"))?;

    if parsed.minute() != 0 || parsed.second() != 0 || parsed.nanosecond() != 0 {
        return Err(invalid(raw, "not an hour boundary"));
    }
    if !(0..=9999).contains(&parsed.year()) {
        return Err(invalid(raw, "year out of range"));
    }
    Ok(parsed)
}

/// Fixed-width `YYMMDDHH` encoding of an hour.
///
/// Numeric order equals chronological order for hours within one century.
pub fn compact(hour: NaiveDateTime) -> u32 {
    let yy = hour.year().rem_euclid(100) as u32;
    yy * 1_000_000 + hour.month() * 10_000 + hour.day() * 100 + hour.hour()
}

/// `compress("2019-01-01T00:00:00Z") == 19010100`.
pub fn compress(raw: &str) -> Result<u32, PipelineError> {
    parse_hour(raw).map(compact)
}

/// Full ISO form used when compression is switched off.
pub fn iso(hour: NaiveDateTime) -> String {
    hour.format("%Y-%m-%dT%H:00:00Z").to_string()
}

pub fn series_time(hour: NaiveDateTime, mode: TimestampMode) -> SeriesTime {
    match mode {
        TimestampMode::Compact => SeriesTime::Compact(compact(hour)),
        TimestampMode::Iso => SeriesTime::Iso(iso(hour)),
    }
}

fn invalid(raw: &str, reason: &str) -> PipelineError {
    PipelineError::InvalidTimestamp {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}
