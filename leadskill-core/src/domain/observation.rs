//! Observation record: time × [member] × space.

use serde::{Deserialize, Serialize};

use super::forecast::check_unique;
use crate::calendar::{normalize, RawTimeAxis, TimeSeries};
use crate::error::{Result, VerifyError};

/// Anything that can hand the core an observation record, laid out
/// `[time][space]`.
pub trait ObservationSource {
    fn time_axis(&self) -> &RawTimeAxis;
    fn space(&self) -> usize;
    fn values(&self) -> &[f64];
}

/// Plain owned observation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationInput {
    pub time: RawTimeAxis,
    #[serde(default = "default_space")]
    pub space: usize,
    pub values: Vec<f64>,
}

fn default_space() -> usize {
    1
}

impl ObservationSource for ObservationInput {
    fn time_axis(&self) -> &RawTimeAxis {
        &self.time
    }

    fn space(&self) -> usize {
        self.space
    }

    fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A normalized, run-owned observation record.
///
/// Ingested observations never carry members; a member axis only appears
/// when a comparison broadcasts one onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    times: TimeSeries,
    members: Option<Vec<String>>,
    space: usize,
    values: Vec<f64>,
}

impl Observation {
    /// Copy and normalize an observation from its source.
    pub fn ingest(source: &impl ObservationSource) -> Result<Self> {
        let time = normalize(source.time_axis(), "time")?;
        Self::from_parts(time.series, source.space(), source.values().to_vec())
    }

    pub fn from_parts(times: TimeSeries, space: usize, values: Vec<f64>) -> Result<Self> {
        if space == 0 {
            return Err(VerifyError::ShapeMismatch {
                what: "observation space extent".into(),
                expected: 1,
                actual: 0,
            });
        }
        let expected = times.len() * space;
        if values.len() != expected {
            return Err(VerifyError::ShapeMismatch {
                what: "observation".into(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            times,
            members: None,
            space,
            values,
        })
    }

    pub fn times(&self) -> &TimeSeries {
        &self.times
    }

    pub fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
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

    /// The `[member][space]` block at time index `t`.
    pub fn row(&self, t: usize) -> &[f64] {
        let width = self.n_members() * self.space;
        &self.values[t * width..(t + 1) * width]
    }

    /// Repeat every row across a new member axis labelled `members`.
    pub fn expand_members(self, members: Vec<String>) -> Result<Self> {
        check_unique("member", members.iter().cloned())?;
        let n = members.len();
        let width = self.n_members() * self.space;
        let values = self
            .values
            .chunks(width)
            .flat_map(|row| std::iter::repeat(row).take(n).flatten().copied())
            .collect();
        Ok(Self {
            members: Some(members),
            values,
            ..self
        })
    }
}
