//! Scoring engine: ingest, broadcast, align, then apply the metric per cell.
//!
//! One engine is built per configuration. Keywords are resolved once in
//! [`ScoringEngine::new`]; every call to `score` then runs the linear
//! pipeline on its own copies of the inputs:
//!
//! ```text
//! ingest ─► broadcast ─► align ─► (forecast type × lead) cells ─► ScoreResult
//! ```

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use leadskill_core::alignment::{
    AlignmentPolicy, LeadAlignment, LeadSelection, VerificationDates,
};
use leadskill_core::comparison::{Broadcast, Comparison, Verification, WithheldMembers};
use leadskill_core::domain::{
    ForecastSource, InitializedForecast, Observation, ObservationSource, Slab,
};
use leadskill_core::reference::{ForecastType, ReferenceSet};
use leadskill_core::VerifyError;

use crate::config::{ConfigError, KeywordTables, RunId, ScoringConfig};
use crate::result::{ScoreCell, ScoreResult, SCHEMA_VERSION};

/// Errors from a scoring run.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// ─── Metric ──────────────────────────────────────────────────────────

/// A skill metric applied to one (prediction, truth) pair.
///
/// Both slabs share the same time coordinate. Empty selections are passed
/// through as well; what an empty slab scores is the metric's decision.
pub trait Metric: Sync {
    /// Name recorded on the result.
    fn name(&self) -> &str {
        "metric"
    }

    /// One value per space point.
    fn compute(&self, prediction: &Slab, truth: &Slab, time_label: &str) -> Vec<f64>;
}

impl<F> Metric for F
where
    F: Fn(&Slab, &Slab, &str) -> Vec<f64> + Sync,
{
    fn compute(&self, prediction: &Slab, truth: &Slab, time_label: &str) -> Vec<f64> {
        self(prediction, truth, time_label)
    }
}

/// A metric function with a name.
pub struct NamedMetric<F> {
    name: String,
    f: F,
}

impl<F> NamedMetric<F>
where
    F: Fn(&Slab, &Slab, &str) -> Vec<f64> + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Metric for NamedMetric<F>
where
    F: Fn(&Slab, &Slab, &str) -> Vec<f64> + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, prediction: &Slab, truth: &Slab, time_label: &str) -> Vec<f64> {
        (self.f)(prediction, truth, time_label)
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// A configured scoring pipeline.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    comparison: Comparison,
    alignment: AlignmentPolicy,
    references: ReferenceSet,
    withheld: WithheldMembers,
    persistence_restriction: bool,
    run_id: RunId,
}

impl ScoringEngine {
    /// Resolve every keyword in `config` against `tables`.
    pub fn new(tables: &KeywordTables, config: ScoringConfig) -> Result<Self, ScoreError> {
        let comparison = Comparison::from_keyword(&tables.comparisons, &config.comparison)?;
        let alignment = AlignmentPolicy::from_keyword(&tables.alignments, &config.alignment)?;
        let references = ReferenceSet::parse(&config.reference)?;
        if references.scores_persistence() && !comparison.is_hindcast() {
            return Err(VerifyError::IncompatibleReference {
                reference: ForecastType::Persistence.name().to_string(),
                comparison: comparison.name().to_string(),
            }
            .into());
        }
        let persistence_restriction = config
            .persistence_restriction
            .unwrap_or_else(|| alignment.default_persistence_restriction());
        let run_id = config.run_id()?;
        debug!(
            %comparison,
            %alignment,
            references = ?references.types(),
            persistence_restriction,
            run_id = %run_id,
            "scoring engine configured"
        );
        Ok(Self {
            withheld: config.withheld(),
            config,
            comparison,
            alignment,
            references,
            persistence_restriction,
            run_id,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn alignment(&self) -> AlignmentPolicy {
        self.alignment
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Score `init` and every configured reference.
    pub fn score(
        &self,
        forecast: &impl ForecastSource,
        observation: &impl ObservationSource,
        metric: &impl Metric,
    ) -> Result<ScoreResult, ScoreError> {
        let types = self.references.forecast_types();
        self.run(forecast, observation, metric, types)
    }

    /// Score an explicit list of forecast types, in the given order.
    ///
    /// Every non-`init` type must be in the configured reference set.
    pub fn score_types<S: AsRef<str>>(
        &self,
        forecast: &impl ForecastSource,
        observation: &impl ObservationSource,
        metric: &impl Metric,
        forecast_types: &[S],
    ) -> Result<ScoreResult, ScoreError> {
        let mut types = Vec::with_capacity(forecast_types.len());
        for keyword in forecast_types {
            let ty = ForecastType::parse(keyword.as_ref())?;
            if ty != ForecastType::Init && !self.references.contains(ty) {
                return Err(VerifyError::ReferenceNotConfigured(ty.name().to_string()).into());
            }
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        self.run(forecast, observation, metric, types)
    }

    fn run(
        &self,
        forecast: &impl ForecastSource,
        observation: &impl ObservationSource,
        metric: &impl Metric,
        forecast_types: Vec<ForecastType>,
    ) -> Result<ScoreResult, ScoreError> {
        let initialized = InitializedForecast::ingest(forecast)?;
        let observation = Observation::ingest(observation)?;
        debug!(
            inits = initialized.inits().len(),
            leads = initialized.leads().len(),
            members = initialized.n_members(),
            times = observation.times().len(),
            "inputs ingested"
        );

        let Broadcast {
            initialized,
            verification,
        } = self
            .comparison
            .broadcast(initialized, observation, &self.withheld)?;

        let verification_dates = match &verification {
            Verification::Observed(obs) => VerificationDates::Observed(obs.times()),
            Verification::Withheld(_) => VerificationDates::Withheld,
        };
        let selection = LeadAlignment::new(
            initialized.inits(),
            initialized.leads(),
            initialized.lead_unit(),
        )
        .build_init_lead_matrix()?
        .resolve(
            self.alignment,
            verification_dates,
            &self.references,
            self.persistence_restriction,
        )?;

        let pairings = forecast_types
            .iter()
            .map(|&forecast_type| Pairing::new(forecast_type, &verification))
            .collect::<Result<Vec<_>, _>>()?;
        let jobs: Vec<Job<'_>> = pairings
            .iter()
            .flat_map(|&pairing| {
                selection
                    .leads()
                    .iter()
                    .enumerate()
                    .map(move |(lead_idx, lead)| Job {
                        pairing,
                        lead_idx,
                        lead,
                    })
            })
            .collect();

        let inputs = CellInputs {
            initialized: &initialized,
            time_label: &self.config.time_label,
        };
        let cells: Vec<ScoreCell> = if self.config.parallel {
            jobs.par_iter().map(|job| inputs.score(job, metric)).collect()
        } else {
            jobs.iter().map(|job| inputs.score(job, metric)).collect()
        };

        info!(
            cells = cells.len(),
            empty = cells.iter().filter(|c| c.is_empty()).count(),
            metric = metric.name(),
            "scoring complete"
        );
        Ok(ScoreResult {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id.clone(),
            comparison: self.comparison,
            alignment: self.alignment,
            lead_unit: initialized.lead_unit(),
            leads: initialized.leads().to_vec(),
            forecast_types,
            metric: metric.name().to_string(),
            time_label: self.config.time_label.clone(),
            cells,
        })
    }
}

// ─── Cells ───────────────────────────────────────────────────────────

/// What a forecast type is scored against.
#[derive(Clone, Copy)]
enum Pairing<'a> {
    /// Forecast against the observation record.
    InitObserved(&'a Observation),
    /// Forecast against the withheld members.
    InitWithheld(&'a InitializedForecast),
    /// Observation at the init date against the observation at the verif date.
    Persistence(&'a Observation),
}

impl<'a> Pairing<'a> {
    fn new(forecast_type: ForecastType, verification: &'a Verification) -> Result<Self, VerifyError> {
        match (forecast_type, verification) {
            (ForecastType::Init, Verification::Observed(obs)) => Ok(Self::InitObserved(obs)),
            (ForecastType::Init, Verification::Withheld(control)) => Ok(Self::InitWithheld(control)),
            (ForecastType::Persistence, Verification::Observed(obs)) => Ok(Self::Persistence(obs)),
            (ForecastType::Persistence, Verification::Withheld(_)) => {
                Err(VerifyError::IncompatibleReference {
                    reference: ForecastType::Persistence.name().to_string(),
                    comparison: Comparison::MemberToWithheldMember.name().to_string(),
                })
            }
        }
    }

    fn forecast_type(&self) -> ForecastType {
        match self {
            Self::InitObserved(_) | Self::InitWithheld(_) => ForecastType::Init,
            Self::Persistence(_) => ForecastType::Persistence,
        }
    }
}

struct Job<'a> {
    pairing: Pairing<'a>,
    lead_idx: usize,
    lead: &'a LeadSelection,
}

/// Read-only run state shared by every cell.
struct CellInputs<'a> {
    initialized: &'a InitializedForecast,
    time_label: &'a str,
}

impl CellInputs<'_> {
    fn score(&self, job: &Job<'_>, metric: &impl Metric) -> ScoreCell {
        let (prediction, truth) = self.slabs(job);
        let n_samples = prediction.n_time();
        if n_samples == 0 {
            debug!(
                lead = job.lead.lead(),
                forecast_type = %job.pairing.forecast_type(),
                "scoring empty selection"
            );
        }
        ScoreCell {
            lead: job.lead.lead(),
            forecast_type: job.pairing.forecast_type(),
            n_samples,
            value: metric.compute(&prediction, &truth, self.time_label),
        }
    }

    /// Prediction and truth for one cell, both labelled with the verif dates.
    fn slabs(&self, job: &Job<'_>) -> (Slab, Slab) {
        let lead = job.lead;
        let fc = self.initialized;
        let member_labels = |members: Option<&[String]>| members.map(<[String]>::to_vec);

        match job.pairing {
            Pairing::InitObserved(obs) => {
                let rows: Vec<(usize, usize, _)> = lead
                    .init_indices()
                    .iter()
                    .zip(lead.verifs())
                    .filter_map(|(&i, v)| obs.times().position(v).map(|t| (i, t, *v)))
                    .collect();
                (
                    Slab::from_blocks(
                        rows.iter().map(|r| r.2).collect(),
                        member_labels(fc.members()),
                        fc.space(),
                        rows.iter().map(|&(i, _, _)| fc.block(i, job.lead_idx)),
                    ),
                    Slab::from_blocks(
                        rows.iter().map(|r| r.2).collect(),
                        member_labels(obs.members()),
                        obs.space(),
                        rows.iter().map(|&(_, t, _)| obs.row(t)),
                    ),
                )
            }
            Pairing::InitWithheld(control) => (
                Slab::from_blocks(
                    lead.verifs().to_vec(),
                    member_labels(fc.members()),
                    fc.space(),
                    lead.init_indices().iter().map(|&i| fc.block(i, job.lead_idx)),
                ),
                Slab::from_blocks(
                    lead.verifs().to_vec(),
                    member_labels(control.members()),
                    control.space(),
                    lead.init_indices().iter().map(|&i| control.block(i, job.lead_idx)),
                ),
            ),
            Pairing::Persistence(obs) => {
                // Pairs whose init date is unobserved have no persistence
                // prediction and drop out here.
                let rows: Vec<(usize, usize, _)> = lead
                    .inits()
                    .iter()
                    .zip(lead.verifs())
                    .filter_map(|(init, v)| {
                        let at_init = obs.times().position(init)?;
                        let at_verif = obs.times().position(v)?;
                        Some((at_init, at_verif, *v))
                    })
                    .collect();
                let members = member_labels(obs.members());
                (
                    Slab::from_blocks(
                        rows.iter().map(|r| r.2).collect(),
                        members.clone(),
                        obs.space(),
                        rows.iter().map(|&(p, _, _)| obs.row(p)),
                    ),
                    Slab::from_blocks(
                        rows.iter().map(|r| r.2).collect(),
                        members,
                        obs.space(),
                        rows.iter().map(|&(_, t, _)| obs.row(t)),
                    ),
                )
            }
        }
    }
}
