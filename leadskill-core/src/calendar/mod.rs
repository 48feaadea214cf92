//! Calendar-aware dates and time series.
//!
//! Forecast initializations and observation times are compared as
//! `CalendarDate`s rather than raw numbers, so lead arithmetic can respect
//! month lengths and non-standard model calendars.

pub mod normalize;
pub mod shift;

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

pub use normalize::{normalize, NormalizedAxis, RawTimeAxis, TimeValues};
pub use shift::{shift_dates, ShiftFrequency};

/// Supported year range. Shifts that leave it fail with `CalendarArithmetic`.
pub const MIN_YEAR: i32 = -200_000;
pub const MAX_YEAR: i32 = 200_000;

const NOLEAP_MONTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const ALL_LEAP_MONTHS: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Calendar system a time axis is expressed in.
///
/// Deserialized through [`Calendar::from_name`], so unknown names surface as
/// `UnknownCalendar`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Calendar {
    #[default]
    #[serde(rename = "proleptic_gregorian")]
    ProlepticGregorian,
    #[serde(rename = "noleap")]
    NoLeap,
    #[serde(rename = "all_leap")]
    AllLeap,
    #[serde(rename = "360_day")]
    Day360,
}

impl Calendar {
    pub const ALL: [Calendar; 4] = [
        Calendar::ProlepticGregorian,
        Calendar::NoLeap,
        Calendar::AllLeap,
        Calendar::Day360,
    ];

    /// Canonical name, as written in dataset metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }

    /// Parse a calendar name, accepting the common `365_day`/`366_day` aliases.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(VerifyError::UnknownCalendar {
                name: other.to_string(),
                valid: Self::ALL.iter().map(|c| c.name().to_string()).collect(),
            }),
        }
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        match self {
            Self::ProlepticGregorian => (year % 4 == 0 && year % 100 != 0) || year % 400 == 0,
            Self::NoLeap | Self::Day360 => false,
            Self::AllLeap => true,
        }
    }

    /// Number of days in `month` (1-based) of `year`.
    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Self::Day360 => 30,
            Self::NoLeap => NOLEAP_MONTHS[idx],
            Self::AllLeap => ALL_LEAP_MONTHS[idx],
            Self::ProlepticGregorian => {
                if month == 2 && self.is_leap_year(year) {
                    29
                } else {
                    NOLEAP_MONTHS[idx]
                }
            }
        }
    }

    /// Fixed year length, for calendars that have one.
    fn fixed_year_length(&self) -> Option<i64> {
        match self {
            Self::ProlepticGregorian => None,
            Self::NoLeap => Some(365),
            Self::AllLeap => Some(366),
            Self::Day360 => Some(360),
        }
    }
}

impl TryFrom<String> for Calendar {
    type Error = VerifyError;

    fn try_from(name: String) -> Result<Self> {
        Self::from_name(&name)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A (year, month, day) triple under an explicit calendar.
///
/// Ordering is chronological within one calendar. Dates from different
/// calendars never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCalendarDate")]
pub struct CalendarDate {
    year: i32,
    month: u32,
    day: u32,
    calendar: Calendar,
}

impl CalendarDate {
    /// Build a date, returning `None` when it does not exist in `calendar`.
    pub fn new(year: i32, month: u32, day: u32, calendar: Calendar) -> Option<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        if day == 0 || day > calendar.days_in_month(year, month) {
            return None;
        }
        Some(Self {
            year,
            month,
            day,
            calendar,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Days elapsed since the calendar's own epoch.
    pub fn day_number(&self) -> i64 {
        match self.calendar.fixed_year_length() {
            Some(year_len) => {
                let before: u32 = (1..self.month)
                    .map(|m| self.calendar.days_in_month(self.year, m))
                    .sum();
                self.year as i64 * year_len + (before + self.day - 1) as i64
            }
            None => NaiveDate::from_ymd_opt(self.year, self.month, self.day)
                .map(|d| d.num_days_from_ce() as i64)
                .unwrap_or_default(),
        }
    }

    /// Inverse of [`CalendarDate::day_number`].
    pub fn from_day_number(n: i64, calendar: Calendar) -> Option<Self> {
        match calendar.fixed_year_length() {
            Some(year_len) => {
                let year = i32::try_from(n.div_euclid(year_len)).ok()?;
                let mut rem = n.rem_euclid(year_len) as u32;
                let mut month = 1;
                while month < 12 {
                    let len = calendar.days_in_month(year, month);
                    if rem < len {
                        break;
                    }
                    rem -= len;
                    month += 1;
                }
                Self::new(year, month, rem + 1, calendar)
            }
            None => {
                let date = NaiveDate::from_num_days_from_ce_opt(i32::try_from(n).ok()?)?;
                Self::new(date.year(), date.month(), date.day(), calendar)
            }
        }
    }
}

/// Unchecked serde shape of a [`CalendarDate`].
#[derive(Deserialize)]
struct RawCalendarDate {
    year: i32,
    month: u32,
    day: u32,
    calendar: Calendar,
}

impl TryFrom<RawCalendarDate> for CalendarDate {
    type Error = String;

    fn try_from(raw: RawCalendarDate) -> std::result::Result<Self, String> {
        Self::new(raw.year, raw.month, raw.day, raw.calendar).ok_or_else(|| {
            format!(
                "{:04}-{:02}-{:02} does not exist in calendar {}",
                raw.year, raw.month, raw.day, raw.calendar
            )
        })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Strictly increasing sequence of dates sharing one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    calendar: Calendar,
    dates: Vec<CalendarDate>,
}

impl TimeSeries {
    /// Validate and wrap `dates`. `axis` names the axis in error messages.
    pub fn new(axis: &str, calendar: Calendar, dates: Vec<CalendarDate>) -> Result<Self> {
        if let Some(other) = dates.iter().find(|d| d.calendar != calendar) {
            return Err(VerifyError::InvalidTimeAxis {
                axis: axis.to_string(),
                reason: format!("{other} uses calendar {} instead of {calendar}", other.calendar),
            });
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(VerifyError::InvalidTimeAxis {
                axis: axis.to_string(),
                reason: format!(
                    "timestamps must be strictly increasing ({} followed by {})",
                    pair[0], pair[1]
                ),
            });
        }
        Ok(Self { calendar, dates })
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn dates(&self) -> &[CalendarDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Index of `date` on this axis.
    pub fn position(&self, date: &CalendarDate) -> Option<usize> {
        self.dates.binary_search(date).ok()
    }

    pub fn contains(&self, date: &CalendarDate) -> bool {
        self.position(date).is_some()
    }
}

/// Unchecked serde shape of a [`TimeSeries`].
#[derive(Deserialize)]
struct RawTimeSeries {
    calendar: Calendar,
    dates: Vec<CalendarDate>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = VerifyError;

    fn try_from(raw: RawTimeSeries) -> Result<Self> {
        Self::new("time", raw.calendar, raw.dates)
    }
}
