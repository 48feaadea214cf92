//! Anchored date offsets: year-start, month-start and day shifts.
//!
//! Anchored offsets roll forward: shifting an off-anchor date by `n > 0`
//! lands on the `n`-th anchor after it, and `n = 0` moves it to the next
//! anchor. Shifting an on-anchor date by zero is the identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CalendarDate;
use crate::error::{Result, VerifyError};

/// Offset frequency used for lead arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftFrequency {
    #[serde(rename = "YS")]
    YearStart,
    #[serde(rename = "MS")]
    MonthStart,
    #[serde(rename = "D")]
    Day,
}

impl fmt::Display for ShiftFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::YearStart => "YS",
            Self::MonthStart => "MS",
            Self::Day => "D",
        })
    }
}

impl CalendarDate {
    /// Shift by `n` units of `freq`. `None` when the result leaves the
    /// supported year range.
    pub fn shift(&self, n: i64, freq: ShiftFrequency) -> Option<CalendarDate> {
        let calendar = self.calendar();
        match freq {
            ShiftFrequency::YearStart => {
                let on_anchor = self.month() == 1 && self.day() == 1;
                let years = if n <= 0 && !on_anchor { n.checked_add(1)? } else { n };
                let year = i32::try_from((self.year() as i64).checked_add(years)?).ok()?;
                CalendarDate::new(year, 1, 1, calendar)
            }
            ShiftFrequency::MonthStart => {
                let months = if n <= 0 && self.day() > 1 { n.checked_add(1)? } else { n };
                let total = (self.year() as i64 * 12 + self.month() as i64 - 1).checked_add(months)?;
                let year = i32::try_from(total.div_euclid(12)).ok()?;
                let month = total.rem_euclid(12) as u32 + 1;
                CalendarDate::new(year, month, 1, calendar)
            }
            ShiftFrequency::Day => {
                CalendarDate::from_day_number(self.day_number().checked_add(n)?, calendar)
            }
        }
    }

    /// Like [`CalendarDate::shift`], failing with `CalendarArithmetic`.
    pub fn try_shift(&self, n: i64, freq: ShiftFrequency) -> Result<CalendarDate> {
        self.shift(n, freq).ok_or(VerifyError::CalendarArithmetic {
            date: *self,
            amount: n,
            frequency: freq,
        })
    }
}

/// Shift every date by the same offset. The first failure aborts the batch.
pub fn shift_dates(dates: &[CalendarDate], n: i64, freq: ShiftFrequency) -> Result<Vec<CalendarDate>> {
    dates.iter().map(|d| d.try_shift(n, freq)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Calendar, MAX_YEAR};

    fn greg(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::new(y, m, d, Calendar::ProlepticGregorian).unwrap()
    }

    #[test]
    fn year_start_on_anchor() {
        assert_eq!(greg(2000, 1, 1).shift(3, ShiftFrequency::YearStart), Some(greg(2003, 1, 1)));
        assert_eq!(greg(2000, 1, 1).shift(0, ShiftFrequency::YearStart), Some(greg(2000, 1, 1)));
    }

    #[test]
    fn year_start_rolls_forward_off_anchor() {
        assert_eq!(greg(2000, 3, 15).shift(1, ShiftFrequency::YearStart), Some(greg(2001, 1, 1)));
        assert_eq!(greg(2000, 3, 15).shift(0, ShiftFrequency::YearStart), Some(greg(2001, 1, 1)));
    }

    #[test]
    fn month_start_crosses_year_boundary() {
        assert_eq!(greg(2000, 11, 1).shift(3, ShiftFrequency::MonthStart), Some(greg(2001, 2, 1)));
        assert_eq!(greg(2000, 11, 20).shift(0, ShiftFrequency::MonthStart), Some(greg(2000, 12, 1)));
    }

    #[test]
    fn day_shift_respects_calendar() {
        let noleap = CalendarDate::new(2000, 2, 28, Calendar::NoLeap).unwrap();
        let next = noleap.shift(1, ShiftFrequency::Day).unwrap();
        assert_eq!((next.month(), next.day()), (3, 1));

        let greg_next = greg(2000, 2, 28).shift(1, ShiftFrequency::Day).unwrap();
        assert_eq!((greg_next.month(), greg_next.day()), (2, 29));

        let d360 = CalendarDate::new(2000, 1, 30, Calendar::Day360).unwrap();
        let next = d360.shift(1, ShiftFrequency::Day).unwrap();
        assert_eq!((next.month(), next.day()), (2, 1));
    }

    #[test]
    fn weeks_of_days_cross_months() {
        assert_eq!(greg(2000, 1, 29).shift(21, ShiftFrequency::Day), Some(greg(2000, 2, 19)));
    }

    #[test]
    fn out_of_range_fails_with_calendar_arithmetic() {
        let last = greg(MAX_YEAR, 1, 1);
        assert!(last.shift(1, ShiftFrequency::YearStart).is_none());
        let err = last.try_shift(1, ShiftFrequency::YearStart).unwrap_err();
        assert!(matches!(err, VerifyError::CalendarArithmetic { amount: 1, .. }));
    }

    #[test]
    fn shift_dates_preserves_order() {
        let shifted = shift_dates(&[greg(2000, 1, 1), greg(2001, 1, 1)], 2, ShiftFrequency::YearStart).unwrap();
        assert_eq!(shifted, vec![greg(2002, 1, 1), greg(2003, 1, 1)]);
    }
}
