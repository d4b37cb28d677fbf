//! Date and time parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::value::ShapedValue;

/// Which temporal type a processor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TemporalKind {
    /// Calendar date, default format `%Y-%m-%d`.
    Date,
    /// Wall clock time, default format `%H:%M:%S`.
    Time,
    /// Instant with offset, RFC 3339 by default.
    #[strum(serialize = "datetime")]
    DateTime,
}

impl TemporalKind {
    /// Name used in diagnostics and declarations.
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }
}

/// Options for a date/time processor.
///
/// ## Examples
///
/// ```rust
/// use contour::{ShapedValue, TemporalKind, TemporalOptions};
/// use serde_json::json;
///
/// let birthday = TemporalOptions::new(TemporalKind::Date).with_format("%d/%m/%Y");
/// let parsed = birthday.parse(&json!("10/12/1815")).unwrap();
/// assert_eq!(parsed.into_json(), json!("1815-12-10"));
///
/// let lenient = TemporalOptions::new(TemporalKind::Date).with_on_error(ShapedValue::Null);
/// assert_eq!(lenient.parse(&json!("not a date")), Ok(ShapedValue::Null));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalOptions {
    /// The produced type.
    pub kind: TemporalKind,
    /// `chrono` format string; the kind's default when absent.
    pub format: Option<String>,
    /// Value returned instead of failing when parsing fails.
    pub on_error: Option<ShapedValue>,
}

impl TemporalOptions {
    /// Options with the kind's default format and no fallback.
    pub fn new(kind: TemporalKind) -> Self {
        Self {
            kind,
            format: None,
            on_error: None,
        }
    }

    /// Sets the format string.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the fallback value used when parsing fails.
    #[must_use]
    pub fn with_on_error(mut self, fallback: ShapedValue) -> Self {
        self.on_error = Some(fallback);
        self
    }

    /// Parses a raw value, returning the fallback on failure when one is configured.
    ///
    /// ## Errors
    ///
    /// Returns the parse failure reason when no fallback is configured.
    pub fn parse(&self, value: &Value) -> Result<ShapedValue, String> {
        match (self.parse_strict(value), &self.on_error) {
            (Ok(parsed), _) => Ok(parsed),
            (Err(_), Some(fallback)) => Ok(fallback.clone()),
            (Err(reason), None) => Err(reason),
        }
    }

    fn parse_strict(&self, value: &Value) -> Result<ShapedValue, String> {
        if self.kind == TemporalKind::DateTime {
            if let Some(seconds) = value.as_i64() {
                return DateTime::from_timestamp(seconds, 0)
                    .map(|dt| ShapedValue::DateTime(dt.fixed_offset()))
                    .ok_or_else(|| format!("timestamp {seconds} is out of range"));
            }
        }

        let Some(text) = value.as_str() else {
            return Err(format!("expected a {} string, got {value}", self.kind.name()));
        };
        let format = self.format.as_deref();

        let parsed = match self.kind {
            TemporalKind::Date => match format {
                Some(fmt) => NaiveDate::parse_from_str(text, fmt),
                None => NaiveDate::parse_from_str(text, "%Y-%m-%d").or_else(|err| {
                    DateTime::parse_from_rfc3339(text)
                        .map(|dt| dt.date_naive())
                        .map_err(|_| err)
                }),
            }
            .map(ShapedValue::Date),
            TemporalKind::Time => NaiveTime::parse_from_str(text, format.unwrap_or("%H:%M:%S"))
                .map(ShapedValue::Time),
            TemporalKind::DateTime => match format {
                None => DateTime::parse_from_rfc3339(text),
                Some(fmt) => DateTime::parse_from_str(text, fmt).or_else(|err| {
                    NaiveDateTime::parse_from_str(text, fmt)
                        .map(|naive| naive.and_utc().fixed_offset())
                        .map_err(|_| err)
                }),
            }
            .map(ShapedValue::DateTime),
        };
        parsed.map_err(|err| format!("{text:?} is not a valid {}: {err}", self.kind.name()))
    }
}
