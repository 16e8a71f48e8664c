// Time-range resolution for GET /monitor: parse, normalize to the reference offset, validate.
// Nothing here touches storage; a rejected range never reaches the repo.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};

pub const START_FIELD: &str = "start_time";
pub const END_FIELD: &str = "end_time";

/// Inclusive range, both ends in the reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("{field} is required when the other time bound is given")]
    Missing { field: &'static str },
    #[error("invalid {field}: {detail}")]
    Invalid { field: &'static str, detail: String },
    #[error("start_time ({start}) is after end_time ({end})")]
    Inverted {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
}

impl TimeRange {
    /// The calendar day containing `now`, in `offset`: midnight through midnight + 24h - 1us.
    pub fn day_of(now: DateTime<FixedOffset>, offset: FixedOffset) -> Self {
        let midnight = now
            .with_timezone(&offset)
            .date_naive()
            .and_time(NaiveTime::MIN);
        let midnight_utc = midnight - TimeDelta::seconds(offset.local_minus_utc() as i64);
        let start = DateTime::from_naive_utc_and_offset(midnight_utc, offset);
        let end = start + TimeDelta::days(1) - TimeDelta::microseconds(1);
        Self { start, end }
    }
}

/// Resolve raw query parameters into a validated range.
///
/// Both absent (or empty): the current day in `offset`. Otherwise both must be RFC 3339.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    offset: FixedOffset,
    now: DateTime<FixedOffset>,
) -> Result<TimeRange, RangeError> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());

    if start.is_none() && end.is_none() {
        return Ok(TimeRange::day_of(now, offset));
    }

    let start = parse_bound(START_FIELD, start, offset)?;
    let end = parse_bound(END_FIELD, end, offset)?;
    if start > end {
        return Err(RangeError::Inverted { start, end });
    }
    Ok(TimeRange { start, end })
}

fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, RangeError> {
    let raw = raw.ok_or(RangeError::Missing { field })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&offset))
        .map_err(|e| RangeError::Invalid {
            field,
            detail: format!("{raw:?} is not an RFC 3339 timestamp ({e})"),
        })
}
