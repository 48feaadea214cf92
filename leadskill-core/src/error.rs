//! Error taxonomy for the verification core.
//!
//! Every variant is fatal for the run that raised it. The one soft state,
//! a lead with no valid initializations, is not an error: it surfaces as an
//! empty selection and is carried through to the score result.

use thiserror::Error;

use crate::calendar::{Calendar, CalendarDate, ShiftFrequency};

/// Errors raised by normalization, broadcasting and alignment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerifyError {
    #[error("invalid `{axis}` time axis: {reason}")]
    InvalidTimeAxis { axis: String, reason: String },

    #[error("unknown calendar '{name}'; valid calendars: {valid:?}")]
    UnknownCalendar { name: String, valid: Vec<String> },

    #[error("calendar mismatch: initializations use {inits}, verification uses {verifs}")]
    CalendarMismatch { inits: Calendar, verifs: Calendar },

    #[error("unknown lead unit '{unit}'; valid units: {valid:?}")]
    UnknownLeadUnit { unit: String, valid: Vec<String> },

    #[error("{keyword} not valid keyword from {valid:?}")]
    UnknownComparison { keyword: String, valid: Vec<String> },

    #[error("{keyword} not valid keyword from {valid:?}")]
    UnknownAlignment { keyword: String, valid: Vec<String> },

    #[error("unknown reference forecast '{keyword}'; valid references: {valid:?}")]
    UnknownReference { keyword: String, valid: Vec<String> },

    #[error("forecast type '{0}' was requested but is not in the configured reference set")]
    ReferenceNotConfigured(String),

    #[error("reference forecast '{reference}' cannot be scored with comparison '{comparison}'")]
    IncompatibleReference {
        reference: String,
        comparison: String,
    },

    #[error("cannot shift {date} by {amount} {frequency}: result outside the supported calendar range")]
    CalendarArithmetic {
        date: CalendarDate,
        amount: i64,
        frequency: ShiftFrequency,
    },

    #[error("shape mismatch for {what}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate {axis} label '{label}'")]
    DuplicateLabel { axis: String, label: String },

    #[error("comparison '{0}' requires a `member` axis on the initialized forecast")]
    MissingMemberAxis(String),

    #[error("member '{0}' not found in the initialized forecast")]
    UnknownMember(String),

    #[error("withholding {withheld} of {total} members leaves no ensemble to score")]
    EmptyEnsemble { withheld: usize, total: usize },

    #[error("keyword table: {0}")]
    KeywordTable(String),
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_errors_list_valid_keywords() {
        let err = VerifyError::UnknownComparison {
            keyword: "x2y".into(),
            valid: vec!["e2o".into(), "m2o".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("x2y"));
        assert!(msg.contains("e2o"));
        assert!(msg.contains("m2o"));
    }

    #[test]
    fn calendar_arithmetic_names_the_date() {
        let date = CalendarDate::new(2000, 1, 1, Calendar::ProlepticGregorian).unwrap();
        let err = VerifyError::CalendarArithmetic {
            date,
            amount: 3,
            frequency: ShiftFrequency::MonthStart,
        };
        assert!(err.to_string().contains("2000-01-01"));
        assert!(err.to_string().contains("MS"));
    }
}
