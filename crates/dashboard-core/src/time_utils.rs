use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Naive patterns seen in order exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Ambiguous slash dates read month first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a timestamp cell into a naive date-time.
///
/// Accepts RFC 3339 (the offset is dropped after converting to UTC), the
/// common `strftime` patterns in [`DATETIME_FORMATS`], and bare dates
/// (midnight). Returns `None` for empty or unrecognised input.
///
/// # Examples
///
/// ```
/// use dashboard_core::time_utils::parse_timestamp;
///
/// let ts = parse_timestamp("2017-10-02 10:56:33").unwrap();
/// assert_eq!(ts.to_string(), "2017-10-02 10:56:33");
/// assert!(parse_timestamp("2017-10-02").is_some());
/// assert!(parse_timestamp("").is_none());
/// assert!(parse_timestamp("not a date").is_none());
/// ```
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(start_of_day(date));
        }
    }

    debug!("could not parse timestamp \"{}\"", s);
    None
}

/// Parse an optional timestamp cell; missing cells stay `None`.
pub fn parse_optional(s: Option<&str>) -> Option<NaiveDateTime> {
    s.and_then(parse_timestamp)
}

/// Which side of a range a user-supplied bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Start,
    End,
}

/// Parse a `--start` / `--end` value.
///
/// A bare date means the whole day: midnight for a start bound, the last
/// representable instant of the day for an end bound.
pub fn parse_range_bound(s: &str, bound: RangeBound) -> Result<NaiveDateTime> {
    let trimmed = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(match bound {
                RangeBound::Start => start_of_day(date),
                RangeBound::End => end_of_day(date),
            });
        }
    }
    parse_timestamp(trimmed).ok_or_else(|| DashboardError::TimestampParse(trimmed.to_string()))
}

// ── Day arithmetic ────────────────────────────────────────────────────────────

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable instant of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
}

/// Move `ts` by `days` whole days (negative moves backwards).
pub fn shift_days(ts: NaiveDateTime, days: i64) -> NaiveDateTime {
    ts + Duration::days(days)
}

/// Whole calendar days from `earlier` to `later` (negative if reversed).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

// ── Display ───────────────────────────────────────────────────────────────────

/// `YYYY-MM-DD`.
pub fn format_date(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
