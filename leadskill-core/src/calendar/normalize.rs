//! Time-axis normalization.
//!
//! Accepts an axis in whatever form the caller holds it (calendar dates,
//! chrono datetimes, date strings, bare year numbers) and produces one
//! canonical [`TimeSeries`].

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Calendar, CalendarDate, TimeSeries};
use crate::error::{Result, VerifyError};

/// The values of a not-yet-normalized time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeValues {
    /// Already canonical; passed through untouched.
    Calendar(TimeSeries),
    DateTimes(Vec<NaiveDateTime>),
    /// `YYYY-MM-DD`, optionally followed by a time of day.
    Text(Vec<String>),
    /// Bare years.
    Integers(Vec<i64>),
    /// Bare years; fractional parts are truncated.
    Floats(Vec<f64>),
}

/// A caller-supplied time axis plus its declared calendar, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimeAxis {
    pub values: TimeValues,
    #[serde(default)]
    pub calendar: Option<Calendar>,
}

impl RawTimeAxis {
    pub fn new(values: TimeValues) -> Self {
        Self {
            values,
            calendar: None,
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn years(years: impl IntoIterator<Item = i64>) -> Self {
        Self::new(TimeValues::Integers(years.into_iter().collect()))
    }

    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(TimeValues::Text(values.into_iter().map(Into::into).collect()))
    }

    pub fn len(&self) -> usize {
        match &self.values {
            TimeValues::Calendar(series) => series.len(),
            TimeValues::DateTimes(v) => v.len(),
            TimeValues::Text(v) => v.len(),
            TimeValues::Integers(v) => v.len(),
            TimeValues::Floats(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<TimeSeries> for RawTimeAxis {
    fn from(series: TimeSeries) -> Self {
        Self::new(TimeValues::Calendar(series))
    }
}

/// Result of normalizing one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAxis {
    pub series: TimeSeries,
    /// True when bare numbers were read as years.
    pub assumed_annual: bool,
}

/// Normalize `axis` into a canonical series. `name` labels the axis in
/// diagnostics (`init`, `time`).
pub fn normalize(axis: &RawTimeAxis, name: &str) -> Result<NormalizedAxis> {
    let calendar = axis.calendar.unwrap_or_default();
    let invalid = |reason: String| VerifyError::InvalidTimeAxis {
        axis: name.to_string(),
        reason,
    };

    let (triples, assumed_annual): (Vec<(i64, u32, u32)>, bool) = match &axis.values {
        TimeValues::Calendar(series) => {
            return Ok(NormalizedAxis {
                series: series.clone(),
                assumed_annual: false,
            });
        }
        TimeValues::DateTimes(values) => (
            values
                .iter()
                .map(|dt| (dt.year() as i64, dt.month(), dt.day()))
                .collect(),
            false,
        ),
        TimeValues::Text(values) => (
            values
                .iter()
                .map(|s| parse_date_text(s).ok_or_else(|| invalid(format!("'{s}' is not a date"))))
                .collect::<Result<_>>()?,
            false,
        ),
        TimeValues::Integers(years) => {
            warn_annual(name);
            (years.iter().map(|&y| (y, 1, 1)).collect(), true)
        }
        TimeValues::Floats(years) => {
            if let Some(bad) = years.iter().find(|y| !y.is_finite()) {
                return Err(invalid(format!("{bad} is not a year")));
            }
            warn_annual(name);
            (years.iter().map(|&y| (y.trunc() as i64, 1, 1)).collect(), true)
        }
    };

    let dates = triples
        .into_iter()
        .map(|(y, m, d)| {
            i32::try_from(y)
                .ok()
                .and_then(|y| CalendarDate::new(y, m, d, calendar))
                .ok_or_else(|| invalid(format!("{y:04}-{m:02}-{d:02} does not exist in calendar {calendar}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NormalizedAxis {
        series: TimeSeries::new(name, calendar, dates)?,
        assumed_annual,
    })
}

fn warn_annual(name: &str) {
    warn!(
        axis = name,
        "assuming annual resolution due to numeric {name}; change {name} to a datetime if it is another resolution"
    );
}

/// Split `YYYY-MM-DD[ HH:MM:SS]` into its date parts. The time of day is
/// dropped. Years may carry a leading minus sign.
fn parse_date_text(s: &str) -> Option<(i64, u32, u32)> {
    let date = s.trim().split(|c: char| c == ' ' || c == 'T').next()?;
    let (negative, body) = match date.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, date),
    };
    let mut parts = body.split('-');
    let year: i64 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((if negative { -year } else { year }, month, day))
}
