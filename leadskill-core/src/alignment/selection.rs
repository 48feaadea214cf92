//! Per-lead (init, verification date) selections.

use crate::calendar::CalendarDate;

/// Valid inits at one lead and the dates they verify at.
///
/// `init_indices`, `inits` and `verifs` always have the same length; entry
/// `i` of each describes the same (init, verif) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSelection {
    lead: u32,
    init_indices: Vec<usize>,
    inits: Vec<CalendarDate>,
    verifs: Vec<CalendarDate>,
}

impl LeadSelection {
    pub(crate) fn new(
        lead: u32,
        init_indices: Vec<usize>,
        inits: Vec<CalendarDate>,
        verifs: Vec<CalendarDate>,
    ) -> Self {
        debug_assert_eq!(init_indices.len(), inits.len());
        debug_assert_eq!(inits.len(), verifs.len());
        Self {
            lead,
            init_indices,
            inits,
            verifs,
        }
    }

    pub fn lead(&self) -> u32 {
        self.lead
    }

    /// Positions of the valid inits on the forecast's init axis.
    pub fn init_indices(&self) -> &[usize] {
        &self.init_indices
    }

    pub fn inits(&self) -> &[CalendarDate] {
        &self.inits
    }

    pub fn verifs(&self) -> &[CalendarDate] {
        &self.verifs
    }

    pub fn len(&self) -> usize {
        self.inits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inits.is_empty()
    }

}

/// Resolved alignment: one selection per lead, in declared lead order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringSelection {
    leads: Vec<LeadSelection>,
}

impl ScoringSelection {
    pub(crate) fn new(leads: Vec<LeadSelection>) -> Self {
        Self { leads }
    }

    pub fn leads(&self) -> &[LeadSelection] {
        &self.leads
    }

    pub fn get(&self, lead: u32) -> Option<&LeadSelection> {
        self.leads.iter().find(|s| s.lead == lead)
    }

    /// True when no lead has a single valid init.
    pub fn is_empty(&self) -> bool {
        self.leads.iter().all(LeadSelection::is_empty)
    }
}
