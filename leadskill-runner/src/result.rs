//! Score result: one cell per (lead, forecast type).

use serde::{Deserialize, Serialize};

use leadskill_core::alignment::AlignmentPolicy;
use leadskill_core::comparison::Comparison;
use leadskill_core::lead::LeadUnit;
use leadskill_core::reference::ForecastType;

use crate::config::RunId;

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// The metric applied to one (lead, forecast type) selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreCell {
    /// Lead label as declared on the forecast.
    pub lead: u32,
    pub forecast_type: ForecastType,
    /// Number of (init, verif) pairs the metric saw. Zero marks an empty
    /// selection.
    pub n_samples: usize,
    /// Metric output, one value per space point. Non-finite values are
    /// written as JSON `null` and read back as NaN.
    #[serde(with = "nan_as_null")]
    pub value: Vec<f64>,
}

impl ScoreCell {
    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }
}

/// Complete result of one scoring run.
///
/// Cells are grouped by forecast type in request order (`init` first), and
/// within a type follow the forecast's declared lead order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub comparison: Comparison,
    pub alignment: AlignmentPolicy,
    pub lead_unit: LeadUnit,
    pub leads: Vec<u32>,
    pub forecast_types: Vec<ForecastType>,
    pub metric: String,
    pub time_label: String,
    pub cells: Vec<ScoreCell>,
}

impl ScoreResult {
    pub fn get(&self, lead: u32, forecast_type: ForecastType) -> Option<&ScoreCell> {
        self.cells
            .iter()
            .find(|c| c.lead == lead && c.forecast_type == forecast_type)
    }

    /// Cells of one forecast type, in lead order.
    pub fn column(&self, forecast_type: ForecastType) -> impl Iterator<Item = &ScoreCell> + '_ {
        self.cells
            .iter()
            .filter(move |c| c.forecast_type == forecast_type)
    }

    /// True when any cell was scored over an empty selection.
    pub fn has_empty_cells(&self) -> bool {
        self.cells.iter().any(ScoreCell::is_empty)
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(d)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(lead: u32, forecast_type: ForecastType, n: usize) -> ScoreCell {
        ScoreCell {
            lead,
            forecast_type,
            n_samples: n,
            value: vec![n as f64],
        }
    }

    fn sample() -> ScoreResult {
        ScoreResult {
            schema_version: SCHEMA_VERSION,
            run_id: "abc".into(),
            comparison: Comparison::EnsembleMeanToObservation,
            alignment: AlignmentPolicy::SameInits,
            lead_unit: LeadUnit::Years,
            leads: vec![2, 1],
            forecast_types: vec![ForecastType::Init, ForecastType::Persistence],
            metric: "rmse".into(),
            time_label: "time".into(),
            cells: vec![
                cell(2, ForecastType::Init, 4),
                cell(1, ForecastType::Init, 4),
                cell(2, ForecastType::Persistence, 3),
                cell(1, ForecastType::Persistence, 0),
            ],
        }
    }

    #[test]
    fn lookup_by_lead_and_type() {
        let r = sample();
        assert_eq!(r.get(1, ForecastType::Persistence).unwrap().n_samples, 0);
        assert!(r.get(3, ForecastType::Init).is_none());
        let leads: Vec<u32> = r.column(ForecastType::Init).map(|c| c.lead).collect();
        assert_eq!(leads, vec![2, 1]);
        assert!(r.has_empty_cells());
    }

    #[test]
    fn missing_schema_version_defaults() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("schema_version");
        let r: ScoreResult = serde_json::from_value(json).unwrap();
        assert_eq!(r.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn nan_values_survive_json() {
        let mut r = sample();
        r.cells[3].value = vec![f64::NAN, 1.5];
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("null"));
        let back: ScoreResult = serde_json::from_str(&json).unwrap();
        assert!(back.cells[3].value[0].is_nan());
        assert_eq!(back.cells[3].value[1], 1.5);
    }
}
