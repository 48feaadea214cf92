//! Leadskill Core: calendars, lead arithmetic, comparisons and lead alignment.
//!
//! This crate holds the pure stages of a forecast verification run:
//! - Calendar-aware dates and time-axis normalization
//! - Lead units and their anchored shift arithmetic
//! - Comparison broadcast (ensemble mean, member, withheld member)
//! - Lead alignment state machine producing per-lead selections
//! - Keyword tables mapping configuration strings to strategy variants
//!
//! Metrics and result assembly live in `leadskill-runner`.

pub mod alignment;
pub mod calendar;
pub mod comparison;
pub mod domain;
pub mod error;
pub mod keywords;
pub mod lead;
pub mod reference;

pub use alignment::{AlignmentPolicy, LeadAlignment, ScoringSelection, VerificationDates};
pub use calendar::{Calendar, CalendarDate, TimeSeries};
pub use comparison::{Broadcast, Comparison, Verification, WithheldMembers};
pub use domain::{InitializedForecast, Observation, Slab};
pub use error::{Result, VerifyError};
pub use keywords::KeywordTable;
pub use lead::LeadUnit;
pub use reference::{ForecastType, ReferenceSet};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: run data can be shared with worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<InitializedForecast>();
        require_sync::<InitializedForecast>();
        require_send::<Observation>();
        require_sync::<Observation>();
        require_send::<Slab>();
        require_sync::<Slab>();
        require_send::<Broadcast>();
        require_sync::<Broadcast>();
        require_send::<ScoringSelection>();
        require_sync::<ScoringSelection>();
        require_send::<KeywordTable<Comparison>>();
        require_sync::<KeywordTable<Comparison>>();
        require_send::<KeywordTable<AlignmentPolicy>>();
        require_sync::<KeywordTable<AlignmentPolicy>>();
        require_send::<VerifyError>();
        require_sync::<VerifyError>();
    }
}
