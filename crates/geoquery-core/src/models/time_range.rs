//! Time bounds of a query.
//!
//! A missing bound means the range is open in that direction: it extends to the
//! first or last record of the dataset.

use chrono::{
    DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use serde_json::{json, Value};

use crate::error::{Result, ValidationError};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A caller supplied instant, which may or may not carry a timezone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instant {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Instant {
    fn from(datetime: DateTime<Tz>) -> Self {
        Instant::Aware(datetime.fixed_offset())
    }
}

impl From<NaiveDateTime> for Instant {
    fn from(datetime: NaiveDateTime) -> Self {
        Instant::Naive(datetime)
    }
}

impl Instant {
    /// Parse an ISO 8601 timestamp; text without an offset becomes a naive instant
    pub fn parse(text: &str) -> Result<Self> {
        if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
            return Ok(Instant::Aware(aware));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(Instant::Naive)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: text.to_string(),
                reason: "expected ISO 8601, e.g. 2020-01-01T00:00:00+00:00".to_string(),
            })
    }

    fn require_timezone(self, bound: &'static str) -> Result<DateTime<FixedOffset>> {
        match self {
            Instant::Aware(datetime) => Ok(datetime),
            Instant::Naive(_) => Err(ValidationError::TimeZoneUndefined { bound }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_time: Option<DateTime<FixedOffset>>,
    max_time: Option<DateTime<FixedOffset>>,
}

/// Validated time bounds
///
/// `TimeRange::default()` is the undefined range and fails `validate`/`build`
/// with [`ValidationError::TimeRangeUndefined`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeRange {
    bounds: Option<Bounds>,
}

impl TimeRange {
    /// Create a time range from instants
    ///
    /// Every present bound must carry a timezone; this is checked before ordering.
    pub fn from_datetimes(min_time: Option<Instant>, max_time: Option<Instant>) -> Result<Self> {
        let min_time = min_time.map(|t| t.require_timezone("min_time")).transpose()?;
        let max_time = max_time.map(|t| t.require_timezone("max_time")).transpose()?;

        let range = Self {
            bounds: Some(Bounds { min_time, max_time }),
        };
        range.validate()?;
        Ok(range)
    }

    /// Create a time range from ISO 8601 strings
    pub fn from_strings(min_time: Option<&str>, max_time: Option<&str>) -> Result<Self> {
        let min_time = min_time.map(Instant::parse).transpose()?;
        let max_time = max_time.map(Instant::parse).transpose()?;
        Self::from_datetimes(min_time, max_time)
    }

    /// Create a time range from Unix epoch milliseconds, expressed in `tz`
    pub fn from_millis(min_time: Option<i64>, max_time: Option<i64>, tz: FixedOffset) -> Result<Self> {
        let to_instant = |millis: i64| -> Result<Instant> {
            tz.timestamp_millis_opt(millis)
                .single()
                .map(Instant::Aware)
                .ok_or_else(|| ValidationError::InvalidTimestamp {
                    value: millis.to_string(),
                    reason: "milliseconds out of range".to_string(),
                })
        };

        let min_time = min_time.map(to_instant).transpose()?;
        let max_time = max_time.map(to_instant).transpose()?;
        Self::from_datetimes(min_time, max_time)
    }

    /// [`TimeRange::from_millis`] in UTC
    pub fn from_millis_utc(min_time: Option<i64>, max_time: Option<i64>) -> Result<Self> {
        Self::from_millis(min_time, max_time, Utc.fix())
    }

    pub fn min_time(&self) -> Option<DateTime<FixedOffset>> {
        self.bounds.and_then(|b| b.min_time)
    }

    pub fn max_time(&self) -> Option<DateTime<FixedOffset>> {
        self.bounds.and_then(|b| b.max_time)
    }

    pub fn is_defined(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = self.bounds.ok_or(ValidationError::TimeRangeUndefined)?;

        if let (Some(min_time), Some(max_time)) = (bounds.min_time, bounds.max_time) {
            if min_time > max_time {
                return Err(ValidationError::TimeRangeMismatch {
                    min_time: format_instant(&min_time),
                    max_time: format_instant(&max_time),
                });
            }
        }

        Ok(())
    }

    /// `{"minTime": iso-string|null, "maxTime": iso-string|null}`
    pub fn build(&self) -> Result<Value> {
        self.validate()?;
        Ok(json!({
            "minTime": self.min_time().as_ref().map(format_instant),
            "maxTime": self.max_time().as_ref().map(format_instant),
        }))
    }
}

fn format_instant(datetime: &DateTime<FixedOffset>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
