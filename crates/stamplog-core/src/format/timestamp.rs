//! Timestamp normalization
//!
//! Turns the date-like things people pass to a logger (structured dates,
//! UNIX epochs in unknown units, ISO strings, nothing at all) into one
//! canonical `YYYY-MM-DDTHH:MM:SS[.mmm]` string in the display time zone.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Roughly 2100-01-01 expressed in seconds since the epoch.
///
/// Numeric inputs below this are taken as seconds. Above it they are taken as
/// milliseconds, divided down by 1000 (at most twice) while they still exceed
/// the threshold in milliseconds. This is a heuristic: values near the
/// boundaries are ambiguous.
pub const UNIT_THRESHOLD: f64 = 4_102_512_345.0;

static UTC_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d{1,3})?Z$")
        .expect("valid UTC ISO regex")
});

static DATE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid numeric regex"));

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Errors produced while normalizing a date
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type TimestampResult<T> = Result<T, TimestampError>;

/// Time zone used when rendering timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The host's local time zone
    #[default]
    Local,
    Utc,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
}

/// A date-like input to the normalizer
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// The current instant
    Now,
    Date(DateTime<Utc>),
    /// UNIX epoch value in seconds, milliseconds, microseconds or nanoseconds
    Epoch(f64),
    Text(String),
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<f64> for DateInput {
    fn from(n: f64) -> Self {
        DateInput::Epoch(n)
    }
}

impl From<i64> for DateInput {
    fn from(n: i64) -> Self {
        DateInput::Epoch(n as f64)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(date: DateTime<Tz>) -> Self {
        DateInput::Date(date.with_timezone(&Utc))
    }
}

impl<T: Into<DateInput>> From<Option<T>> for DateInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DateInput::Now)
    }
}

/// Rendering settings for timestamps and date values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimestampFormat {
    pub zone: DisplayZone,
    pub show_millis: bool,
}

impl TimestampFormat {
    pub fn new(zone: DisplayZone, show_millis: bool) -> Self {
        Self { zone, show_millis }
    }

    /// Normalize any date-like input into `YYYY-MM-DDTHH:MM:SS[.mmm]`.
    ///
    /// A bare `YYYY-MM-DD` is returned unchanged, and feeding the output
    /// back in yields the same string.
    pub fn normalize(&self, input: impl Into<DateInput>) -> TimestampResult<String> {
        match input.into() {
            DateInput::Now => Ok(self.format_instant(Utc::now())),
            DateInput::Date(date) => Ok(self.format_instant(date)),
            DateInput::Epoch(value) => self.from_epoch(value),
            DateInput::Text(text) => self.from_text(text.trim()),
        }
    }

    /// The current time as a bracketed prefix, e.g. `[2024-01-31 12:00:00]`
    pub fn bracketed_now(&self) -> String {
        let now = self.format_instant(Utc::now());
        format!("[{}]", now.replacen('T', " ", 1))
    }

    /// Render an instant in the display zone
    pub fn format_instant(&self, date: DateTime<Utc>) -> String {
        let fmt = if self.show_millis {
            "%Y-%m-%dT%H:%M:%S%.3f"
        } else {
            "%Y-%m-%dT%H:%M:%S"
        };

        match self.zone {
            DisplayZone::Local => date.with_timezone(&Local).format(fmt).to_string(),
            DisplayZone::Utc => date.format(fmt).to_string(),
            DisplayZone::Fixed(offset) => date.with_timezone(&offset).format(fmt).to_string(),
        }
    }

    fn from_text(&self, text: &str) -> TimestampResult<String> {
        if text.is_empty() {
            return self.normalize(DateInput::Now);
        }

        if UTC_ISO.is_match(text) {
            let date = DateTime::parse_from_rfc3339(&text.replacen(' ', "T", 1))
                .map_err(|_| TimestampError::InvalidDate(text.to_string()))?;
            return self.normalize(date);
        }

        if DATE_ONLY.is_match(text) {
            return Ok(text.to_string());
        }

        if NUMERIC.is_match(text) {
            let value: f64 = text
                .parse()
                .map_err(|_| TimestampError::InvalidDate(text.to_string()))?;
            return self.from_epoch(value);
        }

        let date = self.parse_text(text)?;
        Ok(self.format_instant(date))
    }

    fn from_epoch(&self, value: f64) -> TimestampResult<String> {
        if !value.is_finite() {
            return Err(TimestampError::InvalidDate(value.to_string()));
        }

        let millis = infer_epoch_millis(value).round() as i64;
        let date = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| TimestampError::InvalidDate(value.to_string()))?;
        Ok(self.format_instant(date))
    }

    /// Parse free-form date text. Text without an offset is read in the
    /// display zone, which is what makes the normalizer idempotent.
    fn parse_text(&self, text: &str) -> TimestampResult<DateTime<Utc>> {
        if let Ok(date) = DateTime::parse_from_rfc3339(text) {
            return Ok(date.with_timezone(&Utc));
        }
        if let Ok(date) = DateTime::parse_from_rfc2822(text) {
            return Ok(date.with_timezone(&Utc));
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .ok_or_else(|| TimestampError::InvalidDate(text.to_string()))?;

        let resolved = match self.zone {
            DisplayZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|d| d.with_timezone(&Utc)),
            DisplayZone::Utc => Some(Utc.from_utc_datetime(&naive)),
            DisplayZone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|d| d.with_timezone(&Utc)),
        };

        resolved.ok_or_else(|| TimestampError::InvalidDate(text.to_string()))
    }
}

/// Guess the unit of a numeric epoch value and convert it to milliseconds
pub fn infer_epoch_millis(value: f64) -> f64 {
    if value < UNIT_THRESHOLD {
        return value * 1000.0;
    }

    let mut millis = value;
    for _ in 0..2 {
        if millis > UNIT_THRESHOLD * 1000.0 {
            millis /= 1000.0;
        }
    }
    millis
}
