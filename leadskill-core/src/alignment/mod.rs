//! Lead alignment: which initializations verify at which dates.
//!
//! Alignment runs as a small typed state machine:
//!
//! ```text
//! LeadAlignment<Uninitialized> --build_init_lead_matrix()--> LeadAlignment<MatrixBuilt>
//! LeadAlignment<MatrixBuilt>   --resolve(policy, ..)------> ScoringSelection
//! ```
//!
//! Each transition consumes the previous state, so a matrix is never resolved
//! twice and a selection never outlives the run that produced it.

pub mod matrix;
pub mod selection;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::TimeSeries;
use crate::error::{Result, VerifyError};
use crate::keywords::{KeywordEntry, KeywordTable};
use crate::lead::{resolve_all, LeadUnit};
use crate::reference::ReferenceSet;

pub use matrix::InitLeadMatrix;
pub use selection::{LeadSelection, ScoringSelection};

// ─── Policy ─────────────────────────────────────────────────────────

/// Rule selecting the (init, verif) pairs scored at each lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// One set of inits, valid at every lead, used for every lead.
    SameInits,
}

impl AlignmentPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SameInits => "same_inits",
        }
    }

    /// Whether a persistence reference narrows the candidate inits to those
    /// observed at their own init date.
    pub fn default_persistence_restriction(&self) -> bool {
        match self {
            Self::SameInits => true,
        }
    }

    /// The built-in keyword table.
    pub fn default_table() -> KeywordTable<AlignmentPolicy> {
        KeywordTable::builtin(vec![KeywordEntry::new(
            Self::SameInits,
            &["same_inits", "same_init"],
        )])
    }

    /// Resolve `keyword` through `table`.
    pub fn from_keyword(table: &KeywordTable<AlignmentPolicy>, keyword: &str) -> Result<Self> {
        table
            .lookup(keyword)
            .ok_or_else(|| VerifyError::UnknownAlignment {
                keyword: keyword.to_string(),
                valid: table.keywords(),
            })
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where verification dates come from.
#[derive(Debug, Clone, Copy)]
pub enum VerificationDates<'a> {
    /// An observation record: an init verifies only where its target date
    /// is observed.
    Observed(&'a TimeSeries),
    /// A withheld member indexed like the forecast: every init verifies
    /// itself at every lead.
    Withheld,
}

// ─── State machine ──────────────────────────────────────────────────

/// No matrix yet.
#[derive(Debug, Clone, Copy)]
pub struct Uninitialized;

/// Matrix built, ready to resolve.
#[derive(Debug, Clone)]
pub struct MatrixBuilt {
    matrix: InitLeadMatrix,
}

/// Alignment of one forecast's inits and leads against a verification axis.
#[derive(Debug, Clone)]
pub struct LeadAlignment<'a, S> {
    inits: &'a TimeSeries,
    leads: &'a [u32],
    unit: LeadUnit,
    state: S,
}

impl<'a> LeadAlignment<'a, Uninitialized> {
    pub fn new(inits: &'a TimeSeries, leads: &'a [u32], unit: LeadUnit) -> Self {
        Self {
            inits,
            leads,
            unit,
            state: Uninitialized,
        }
    }

    /// Shift every init by every lead.
    pub fn build_init_lead_matrix(self) -> Result<LeadAlignment<'a, MatrixBuilt>> {
        let shifts = resolve_all(self.leads, self.unit);
        let matrix = InitLeadMatrix::build(self.inits, &shifts)?;
        debug!(
            inits = self.inits.len(),
            leads = self.leads.len(),
            frequency = %shifts.frequency,
            "init/lead matrix built"
        );
        Ok(LeadAlignment {
            inits: self.inits,
            leads: self.leads,
            unit: self.unit,
            state: MatrixBuilt { matrix },
        })
    }
}

impl<'a> LeadAlignment<'a, MatrixBuilt> {
    pub fn matrix(&self) -> &InitLeadMatrix {
        &self.state.matrix
    }

    pub fn unit(&self) -> LeadUnit {
        self.unit
    }

    /// Decide the valid inits and verification dates for every lead.
    ///
    /// `persistence_restriction` applies only when `references` asks for
    /// persistence and the verification is an observation record.
    pub fn resolve(
        self,
        policy: AlignmentPolicy,
        verification: VerificationDates<'_>,
        references: &ReferenceSet,
        persistence_restriction: bool,
    ) -> Result<ScoringSelection> {
        let selection = match (policy, verification) {
            (_, VerificationDates::Withheld) => self.every_init(),
            (AlignmentPolicy::SameInits, VerificationDates::Observed(verifs)) => {
                if verifs.calendar() != self.inits.calendar() {
                    return Err(VerifyError::CalendarMismatch {
                        inits: self.inits.calendar(),
                        verifs: verifs.calendar(),
                    });
                }
                let restrict = persistence_restriction && references.scores_persistence();
                self.same_inits(verifs, restrict)
            }
        };
        for lead in selection.leads() {
            if lead.is_empty() {
                debug!(lead = lead.lead(), %policy, "no valid inits at lead");
            }
        }
        Ok(selection)
    }

    fn same_inits(&self, verifs: &TimeSeries, restrict_to_observed_inits: bool) -> ScoringSelection {
        let matrix = &self.state.matrix;
        let valid: Vec<usize> = (0..self.inits.len())
            .filter(|&i| !restrict_to_observed_inits || verifs.contains(&self.inits.dates()[i]))
            .filter(|&i| (0..matrix.n_leads()).all(|l| verifs.contains(&matrix.get(l, i))))
            .collect();
        debug!(
            candidates = self.inits.len(),
            valid = valid.len(),
            restricted = restrict_to_observed_inits,
            "same_inits resolved"
        );
        self.select(&valid)
    }

    fn every_init(&self) -> ScoringSelection {
        let all: Vec<usize> = (0..self.inits.len()).collect();
        self.select(&all)
    }

    fn select(&self, valid: &[usize]) -> ScoringSelection {
        let matrix = &self.state.matrix;
        let inits: Vec<_> = valid.iter().map(|&i| self.inits.dates()[i]).collect();
        let leads = self
            .leads
            .iter()
            .enumerate()
            .map(|(l, &lead)| {
                let row = matrix.row(l);
                let verifs = valid.iter().map(|&i| row[i]).collect();
                LeadSelection::new(lead, valid.to_vec(), inits.clone(), verifs)
            })
            .collect();
        ScoringSelection::new(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Calendar, CalendarDate, MAX_YEAR};

    fn annual(years: impl IntoIterator<Item = i32>, axis: &str) -> TimeSeries {
        let dates = years
            .into_iter()
            .map(|y| CalendarDate::new(y, 1, 1, Calendar::ProlepticGregorian).unwrap())
            .collect();
        TimeSeries::new(axis, Calendar::ProlepticGregorian, dates).unwrap()
    }

    fn resolve(
        inits: &TimeSeries,
        leads: &[u32],
        verifs: &TimeSeries,
        references: &ReferenceSet,
    ) -> Result<ScoringSelection> {
        LeadAlignment::new(inits, leads, LeadUnit::Years)
            .build_init_lead_matrix()?
            .resolve(
                AlignmentPolicy::SameInits,
                VerificationDates::Observed(verifs),
                references,
                true,
            )
    }

    fn years(dates: &[CalendarDate]) -> Vec<i32> {
        dates.iter().map(CalendarDate::year).collect()
    }

    #[test]
    fn all_inits_valid_when_every_target_is_observed() {
        let inits = annual(2000..=2003, "init");
        let obs = annual(2001..=2005, "time");
        let sel = resolve(&inits, &[1, 2], &obs, &ReferenceSet::new()).unwrap();
        for lead in sel.leads() {
            assert_eq!(years(lead.inits()), vec![2000, 2001, 2002, 2003]);
        }
        assert_eq!(years(sel.get(1).unwrap().verifs()), vec![2001, 2002, 2003, 2004]);
        assert_eq!(years(sel.get(2).unwrap().verifs()), vec![2002, 2003, 2004, 2005]);
    }

    #[test]
    fn inits_must_verify_at_every_lead() {
        let inits = annual(2000..=2003, "init");
        let obs = annual(2001..=2004, "time");
        let sel = resolve(&inits, &[1, 2], &obs, &ReferenceSet::new()).unwrap();
        // 2003 + 2 = 2005 is not observed, so 2003 drops at lead 1 as well.
        assert_eq!(years(sel.get(1).unwrap().inits()), vec![2000, 2001, 2002]);
        assert_eq!(sel.get(2).unwrap().init_indices(), &[0, 1, 2]);
    }

    #[test]
    fn persistence_restricts_to_observed_inits() {
        let inits = annual(2000..=2003, "init");
        let obs = annual(2001..=2005, "time");
        let refs = ReferenceSet::parse(&["persistence"]).unwrap();
        let sel = resolve(&inits, &[1, 2], &obs, &refs).unwrap();
        assert_eq!(years(sel.get(1).unwrap().inits()), vec![2001, 2002, 2003]);
        assert_eq!(years(sel.get(2).unwrap().verifs()), vec![2003, 2004, 2005]);
    }

    #[test]
    fn restriction_can_be_disabled() {
        let inits = annual(2000..=2003, "init");
        let obs = annual(2001..=2005, "time");
        let refs = ReferenceSet::parse(&["persistence"]).unwrap();
        let sel = LeadAlignment::new(&inits, &[1], LeadUnit::Years)
            .build_init_lead_matrix()
            .unwrap()
            .resolve(AlignmentPolicy::SameInits, VerificationDates::Observed(&obs), &refs, false)
            .unwrap();
        assert_eq!(sel.get(1).unwrap().len(), 4);
    }

    #[test]
    fn far_lead_gives_empty_selection() {
        let inits = annual(2000..=2003, "init");
        let obs = annual(2001..=2005, "time");
        let sel = resolve(&inits, &[10], &obs, &ReferenceSet::new()).unwrap();
        let lead = sel.get(10).unwrap();
        assert!(lead.is_empty());
        assert!(lead.verifs().is_empty());
        assert!(sel.is_empty());
    }

    #[test]
    fn withheld_verification_keeps_every_init() {
        let inits = annual(2000..=2002, "init");
        let sel = LeadAlignment::new(&inits, &[1, 3], LeadUnit::Years)
            .build_init_lead_matrix()
            .unwrap()
            .resolve(
                AlignmentPolicy::SameInits,
                VerificationDates::Withheld,
                &ReferenceSet::new(),
                true,
            )
            .unwrap();
        assert_eq!(sel.get(3).unwrap().init_indices(), &[0, 1, 2]);
        assert_eq!(years(sel.get(3).unwrap().verifs()), vec![2003, 2004, 2005]);
    }

    #[test]
    fn calendar_mismatch_is_rejected() {
        let inits = annual(2000..=2001, "init");
        let noleap = TimeSeries::new(
            "time",
            Calendar::NoLeap,
            vec![CalendarDate::new(2001, 1, 1, Calendar::NoLeap).unwrap()],
        )
        .unwrap();
        let err = resolve(&inits, &[1], &noleap, &ReferenceSet::new()).unwrap_err();
        assert!(matches!(err, VerifyError::CalendarMismatch { .. }));
    }

    #[test]
    fn shift_overflow_is_fatal() {
        let inits = annual([MAX_YEAR], "init");
        let obs = annual([MAX_YEAR], "time");
        let err = resolve(&inits, &[1], &obs, &ReferenceSet::new()).unwrap_err();
        assert!(matches!(err, VerifyError::CalendarArithmetic { .. }));
    }

    #[test]
    fn alignment_keywords() {
        let table = AlignmentPolicy::default_table();
        assert_eq!(
            AlignmentPolicy::from_keyword(&table, "same_init").unwrap(),
            AlignmentPolicy::SameInits
        );
        let err = AlignmentPolicy::from_keyword(&table, "maximize").unwrap_err();
        assert!(err.to_string().contains("same_inits"));
        assert!(matches!(err, VerifyError::UnknownAlignment { .. }));
    }
}
