//! Init × lead matrix of candidate verification dates.

use crate::calendar::{shift_dates, CalendarDate, TimeSeries};
use crate::error::Result;
use crate::lead::LeadShifts;

/// For every lead, the date each init would verify at.
///
/// Rows follow the declared lead order, columns the init axis. Nothing is
/// dropped here; validity is decided by the alignment policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitLeadMatrix {
    rows: Vec<Vec<CalendarDate>>,
}

impl InitLeadMatrix {
    /// Shift every init by every lead. The first failing shift aborts the build.
    pub fn build(inits: &TimeSeries, shifts: &LeadShifts) -> Result<Self> {
        let rows = shifts
            .amounts
            .iter()
            .map(|&n| shift_dates(inits.dates(), n, shifts.frequency))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    /// Candidate verification dates for one lead, one per init.
    pub fn row(&self, lead_idx: usize) -> &[CalendarDate] {
        &self.rows[lead_idx]
    }

    pub fn get(&self, lead_idx: usize, init_idx: usize) -> CalendarDate {
        self.rows[lead_idx][init_idx]
    }

    pub fn n_leads(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Calendar;
    use crate::lead::{resolve_all, LeadUnit};

    fn ymd(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::new(y, m, d, Calendar::ProlepticGregorian).unwrap()
    }

    #[test]
    fn rows_follow_lead_order() {
        let inits = TimeSeries::new(
            "init",
            Calendar::ProlepticGregorian,
            vec![ymd(2000, 1, 1), ymd(2000, 2, 1)],
        )
        .unwrap();
        let leads = [3, 1];
        let matrix = InitLeadMatrix::build(&inits, &resolve_all(&leads, LeadUnit::Months)).unwrap();
        assert_eq!(matrix.n_leads(), 2);
        assert_eq!(matrix.row(0), &[ymd(2000, 4, 1), ymd(2000, 5, 1)]);
        assert_eq!(matrix.get(1, 1), ymd(2000, 3, 1));
    }

    #[test]
    fn seasons_shift_three_months() {
        let inits = TimeSeries::new("init", Calendar::NoLeap, vec![
            CalendarDate::new(1990, 11, 1, Calendar::NoLeap).unwrap(),
        ])
        .unwrap();
        let matrix = InitLeadMatrix::build(&inits, &resolve_all(&[1], LeadUnit::Seasons)).unwrap();
        assert_eq!(matrix.n_leads(), 1);
        assert_eq!(matrix.get(0, 0), CalendarDate::new(1991, 2, 1, Calendar::NoLeap).unwrap());
    }
}
