//! Date text forms.
//!
//! Dates are written in one canonical pattern and read back by trying a
//! list of candidate patterns in order. The canonical pattern carries
//! milliseconds, so parsed dates are truncated to milliseconds too. Callers
//! may rely on `parse_date(&format_date(d)) == d` for any date with
//! millisecond precision, not on which candidate matched.

use crate::error::{CodecError, CodecResult};
use crate::types::TypeTag;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};

/// The pattern used when writing dates.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Offset-carrying patterns tried after RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    CANONICAL_DATE_FORMAT,
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Patterns without an offset; the result is taken as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Formats a date in the canonical pattern.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Drops everything below the millisecond.
pub fn truncate_date(date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    date.trunc_subsecs(3)
}

/// Parses a date, trying every known pattern.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] if no pattern matches.
pub fn parse_date(text: &str) -> CodecResult<DateTime<FixedOffset>> {
    parse_any(text.trim()).map(truncate_date)
}

fn parse_any(text: &str) -> CodecResult<DateTime<FixedOffset>> {

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date);
    }
    for format in ZONED_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(utc(naive));
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(utc(midnight));
        }
    }

    Err(CodecError::value_format(
        TypeTag::Date,
        text,
        "no known date pattern matches",
    ))
}

fn utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}
