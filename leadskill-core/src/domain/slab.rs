//! Slab: a time-labelled selection handed to a metric.

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDate;

/// time × [member] × space values sharing one time coordinate.
///
/// Prediction and truth slabs for the same score cell always carry the same
/// `times`, whatever dates they were selected from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    times: Vec<CalendarDate>,
    members: Option<Vec<String>>,
    space: usize,
    values: Vec<f64>,
}

impl Slab {
    /// Stack one `[member][space]` block per time.
    ///
    /// Callers guarantee `blocks.len() == times.len()` and that each block has
    /// the member × space width.
    pub fn from_blocks<'a>(
        times: Vec<CalendarDate>,
        members: Option<Vec<String>>,
        space: usize,
        blocks: impl IntoIterator<Item = &'a [f64]>,
    ) -> Self {
        let values = blocks.into_iter().flatten().copied().collect();
        Self {
            times,
            members,
            space,
            values,
        }
    }

    pub fn times(&self) -> &[CalendarDate] {
        &self.times
    }

    pub fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
    }

    pub fn n_time(&self) -> usize {
        self.times.len()
    }

    pub fn n_members(&self) -> usize {
        self.members.as_ref().map_or(1, Vec::len)
    }

    pub fn space(&self) -> usize {
        self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn get(&self, t: usize, member: usize, s: usize) -> f64 {
        self.values[(t * self.n_members() + member) * self.space + s]
    }

    /// Values along time for one (member, space) point.
    pub fn series(&self, member: usize, s: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.n_time()).map(move |t| self.get(t, member, s))
    }
}
