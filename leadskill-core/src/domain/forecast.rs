//! Initialized forecast: init × lead × [member] × space.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calendar::{normalize, RawTimeAxis, TimeSeries};
use crate::error::{Result, VerifyError};
use crate::lead::LeadUnit;

/// Anything that can hand the core an initialized forecast.
///
/// Values are laid out init-major: `[init][lead][member][space]`. Without a
/// member axis the member extent is 1.
pub trait ForecastSource {
    fn init_axis(&self) -> &RawTimeAxis;
    fn leads(&self) -> &[u32];
    fn lead_unit(&self) -> &str;
    fn members(&self) -> Option<&[String]>;
    /// Flattened extent of the non-time axes (1 for a scalar field).
    fn space(&self) -> usize;
    fn values(&self) -> &[f64];
}

/// Plain owned forecast input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInput {
    pub init: RawTimeAxis,
    pub leads: Vec<u32>,
    pub lead_unit: String,
    #[serde(default)]
    pub members: Option<Vec<String>>,
    #[serde(default = "default_space")]
    pub space: usize,
    pub values: Vec<f64>,
}

fn default_space() -> usize {
    1
}

impl ForecastSource for ForecastInput {
    fn init_axis(&self) -> &RawTimeAxis {
        &self.init
    }

    fn leads(&self) -> &[u32] {
        &self.leads
    }

    fn lead_unit(&self) -> &str {
        &self.lead_unit
    }

    fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
    }

    fn space(&self) -> usize {
        self.space
    }

    fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A normalized, run-owned initialized forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializedForecast {
    inits: TimeSeries,
    leads: Vec<u32>,
    lead_unit: LeadUnit,
    members: Option<Vec<String>>,
    space: usize,
    values: Vec<f64>,
}

impl InitializedForecast {
    /// Copy and normalize a forecast from its source.
    ///
    /// Numeric init axes are read as years, and the lead unit is then forced
    /// to `years` whatever the source declared.
    pub fn ingest(source: &impl ForecastSource) -> Result<Self> {
        let init = normalize(source.init_axis(), "init")?;
        let lead_unit = if init.assumed_annual {
            if source.lead_unit() != LeadUnit::Years.name() {
                warn!(
                    declared = source.lead_unit(),
                    "numeric inits imply annual leads; forcing lead unit to years"
                );
            }
            LeadUnit::Years
        } else {
            LeadUnit::parse(source.lead_unit())?
        };
        Self::from_parts(
            init.series,
            source.leads().to_vec(),
            lead_unit,
            source.members().map(<[String]>::to_vec),
            source.space(),
            source.values().to_vec(),
        )
    }

    /// Assemble from already-normalized parts, validating labels and shape.
    pub fn from_parts(
        inits: TimeSeries,
        leads: Vec<u32>,
        lead_unit: LeadUnit,
        members: Option<Vec<String>>,
        space: usize,
        values: Vec<f64>,
    ) -> Result<Self> {
        check_unique("lead", leads.iter().map(|l| l.to_string()))?;
        if let Some(members) = &members {
            if members.is_empty() {
                return Err(VerifyError::ShapeMismatch {
                    what: "member axis".into(),
                    expected: 1,
                    actual: 0,
                });
            }
            check_unique("member", members.iter().cloned())?;
        }
        if space == 0 {
            return Err(VerifyError::ShapeMismatch {
                what: "forecast space extent".into(),
                expected: 1,
                actual: 0,
            });
        }
        let n_members = members.as_ref().map_or(1, Vec::len);
        let expected = inits.len() * leads.len() * n_members * space;
        if values.len() != expected {
            return Err(VerifyError::ShapeMismatch {
                what: "initialized forecast".into(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            inits,
            leads,
            lead_unit,
            members,
            space,
            values,
        })
    }

    pub fn inits(&self) -> &TimeSeries {
        &self.inits
    }

    pub fn leads(&self) -> &[u32] {
        &self.leads
    }

    pub fn lead_unit(&self) -> LeadUnit {
        self.lead_unit
    }

    pub fn members(&self) -> Option<&[String]> {
        self.members.as_deref()
    }

    /// Member extent, 1 when there is no member axis.
    pub fn n_members(&self) -> usize {
        self.members.as_ref().map_or(1, Vec::len)
    }

    pub fn space(&self) -> usize {
        self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The `[member][space]` block for one (init, lead) cell.
    pub fn block(&self, init_idx: usize, lead_idx: usize) -> &[f64] {
        let width = self.n_members() * self.space;
        let start = (init_idx * self.leads.len() + lead_idx) * width;
        &self.values[start..start + width]
    }

    /// Collapse the member axis by its mean. A no-op without members.
    pub fn ensemble_mean(self) -> Self {
        if self.members.is_none() {
            return self;
        }
        let n_members = self.n_members();
        let space = self.space;
        let values = self
            .values
            .chunks(n_members * space)
            .flat_map(|block| {
                (0..space).map(move |s| {
                    (0..n_members).map(|m| block[m * space + s]).sum::<f64>() / n_members as f64
                })
            })
            .collect();
        Self {
            members: None,
            values,
            ..self
        }
    }

    /// Keep only the members at `keep` (in that order). With `squeeze` and a
    /// single kept member, the member axis is dropped.
    pub fn select_members(&self, keep: &[usize], squeeze: bool) -> Self {
        let n_members = self.n_members();
        let space = self.space;
        let values = self
            .values
            .chunks(n_members * space)
            .flat_map(|block| {
                keep.iter()
                    .flat_map(move |&m| block[m * space..(m + 1) * space].iter().copied())
            })
            .collect();
        let members = match &self.members {
            Some(_) if squeeze && keep.len() == 1 => None,
            Some(names) => Some(keep.iter().map(|&m| names[m].clone()).collect()),
            None => None,
        };
        Self {
            inits: self.inits.clone(),
            leads: self.leads.clone(),
            lead_unit: self.lead_unit,
            members,
            space,
            values,
        }
    }
}

pub(crate) fn check_unique(axis: &str, labels: impl Iterator<Item = String>) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.clone()) {
            return Err(VerifyError::DuplicateLabel {
                axis: axis.to_string(),
                label,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(members: Option<Vec<&str>>, values: Vec<f64>) -> ForecastInput {
        ForecastInput {
            init: RawTimeAxis::years([2000, 2001]),
            leads: vec![1, 2],
            lead_unit: "months".into(),
            members: members.map(|m| m.into_iter().map(String::from).collect()),
            space: 1,
            values,
        }
    }

    #[test]
    fn numeric_inits_force_years() {
        let fc = InitializedForecast::ingest(&input(None, vec![0.0; 4])).unwrap();
        assert_eq!(fc.lead_unit(), LeadUnit::Years);
    }

    #[test]
    fn unknown_unit_fails_for_dated_inits() {
        let mut src = input(None, vec![0.0; 4]);
        src.init = RawTimeAxis::text(["2000-01-01", "2000-02-01"]);
        src.lead_unit = "fortnights".into();
        let err = InitializedForecast::ingest(&src).unwrap_err();
        assert!(matches!(err, VerifyError::UnknownLeadUnit { .. }));
    }

    #[test]
    fn shape_is_checked() {
        let err = InitializedForecast::ingest(&input(Some(vec!["a", "b"]), vec![0.0; 4])).unwrap_err();
        assert!(matches!(err, VerifyError::ShapeMismatch { expected: 8, actual: 4, .. }));
    }

    #[test]
    fn duplicate_leads_rejected() {
        let mut src = input(None, vec![0.0; 4]);
        src.leads = vec![1, 1];
        let err = InitializedForecast::ingest(&src).unwrap_err();
        assert!(matches!(err, VerifyError::DuplicateLabel { .. }));
    }

    #[test]
    fn ensemble_mean_averages_members() {
        // init × lead × member: values are member index + 10 * cell
        let values = (0..4)
            .flat_map(|cell| [10.0 * cell as f64, 10.0 * cell as f64 + 2.0])
            .collect();
        let fc = InitializedForecast::ingest(&input(Some(vec!["a", "b"]), values)).unwrap();
        let mean = fc.ensemble_mean();
        assert!(mean.members().is_none());
        assert_eq!(mean.values(), &[1.0, 11.0, 21.0, 31.0]);
    }

    #[test]
    fn select_members_squeezes_single() {
        let values = (0..12).map(f64::from).collect();
        let fc = InitializedForecast::ingest(&input(Some(vec!["a", "b", "c"]), values)).unwrap();
        let one = fc.select_members(&[1], true);
        assert!(one.members().is_none());
        assert_eq!(one.values(), &[1.0, 4.0, 7.0, 10.0]);

        let two = fc.select_members(&[0, 2], false);
        assert_eq!(two.members().unwrap(), &["a".to_string(), "c".to_string()]);
        assert_eq!(two.block(1, 1), &[9.0, 11.0]);
    }

    #[test]
    fn ingest_copies_source() {
        let src = input(None, vec![1.0, 2.0, 3.0, 4.0]);
        let fc = InitializedForecast::ingest(&src).unwrap();
        drop(fc.ensemble_mean());
        assert_eq!(src.values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
