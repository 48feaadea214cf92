//! Comparison strategies: how the ensemble is laid against its truth.
//!
//! Three variants:
//! - ensemble mean vs. observation (`e2o`)
//! - every member vs. observation (`m2o`)
//! - every remaining member vs. a withheld member (`m2c`)

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::forecast::check_unique;
use crate::domain::{InitializedForecast, Observation};
use crate::error::{Result, VerifyError};
use crate::keywords::{KeywordEntry, KeywordTable};

/// Comparison variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    EnsembleMeanToObservation,
    MemberToObservation,
    MemberToWithheldMember,
}

impl Comparison {
    /// Short name used in logs and results.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnsembleMeanToObservation => "e2o",
            Self::MemberToObservation => "m2o",
            Self::MemberToWithheldMember => "m2c",
        }
    }

    /// Whether the metric sees individual members rather than a mean.
    pub fn is_probabilistic(&self) -> bool {
        !matches!(self, Self::EnsembleMeanToObservation)
    }

    /// Whether the truth is an external observation record.
    pub fn is_hindcast(&self) -> bool {
        !matches!(self, Self::MemberToWithheldMember)
    }

    /// The built-in keyword table.
    pub fn default_table() -> KeywordTable<Comparison> {
        KeywordTable::builtin(vec![
            KeywordEntry::new(Self::EnsembleMeanToObservation, &["e2o", "e2r"]),
            KeywordEntry::new(Self::MemberToObservation, &["m2o", "m2r"]),
            KeywordEntry::new(Self::MemberToWithheldMember, &["m2c"]),
        ])
    }

    /// Resolve `keyword` through `table`.
    pub fn from_keyword(table: &KeywordTable<Comparison>, keyword: &str) -> Result<Self> {
        table
            .lookup(keyword)
            .ok_or_else(|| VerifyError::UnknownComparison {
                keyword: keyword.to_string(),
                valid: table.keywords(),
            })
    }

    /// Reshape forecast and observation into comparable structures.
    pub fn broadcast(
        &self,
        initialized: InitializedForecast,
        observation: Observation,
        withheld: &WithheldMembers,
    ) -> Result<Broadcast> {
        let out = match self {
            Self::EnsembleMeanToObservation => Broadcast {
                initialized: initialized.ensemble_mean(),
                verification: Verification::Observed(observation),
            },
            Self::MemberToObservation => {
                let members = initialized
                    .members()
                    .ok_or(VerifyError::MissingMemberAxis(self.name().into()))?
                    .to_vec();
                Broadcast {
                    initialized,
                    verification: Verification::Observed(observation.expand_members(members)?),
                }
            }
            Self::MemberToWithheldMember => withhold(initialized, withheld)?,
        };
        debug!(
            comparison = self.name(),
            members = out.initialized.members().map_or(0, <[String]>::len),
            "broadcast complete"
        );
        Ok(out)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which members to withhold as truth under `m2c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithheldMembers {
    /// The first declared member.
    #[default]
    First,
    Named(Vec<String>),
}

/// Truth side of a broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// An observation record indexed by time.
    Observed(Observation),
    /// Withheld members, indexed like the forecast (init × lead).
    Withheld(InitializedForecast),
}

/// Output of [`Comparison::broadcast`].
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub initialized: InitializedForecast,
    pub verification: Verification,
}

fn withhold(initialized: InitializedForecast, withheld: &WithheldMembers) -> Result<Broadcast> {
    let members = initialized
        .members()
        .ok_or(VerifyError::MissingMemberAxis("m2c".into()))?;
    let control: Vec<usize> = match withheld {
        WithheldMembers::First => vec![0],
        WithheldMembers::Named(names) => {
            check_unique("member", names.iter().cloned())?;
            names
                .iter()
                .map(|name| {
                    members
                        .iter()
                        .position(|m| m == name)
                        .ok_or_else(|| VerifyError::UnknownMember(name.clone()))
                })
                .collect::<Result<_>>()?
        }
    };
    let remaining: Vec<usize> = (0..members.len()).filter(|i| !control.contains(i)).collect();
    if remaining.is_empty() || control.is_empty() {
        return Err(VerifyError::EmptyEnsemble {
            withheld: control.len(),
            total: members.len(),
        });
    }
    Ok(Broadcast {
        verification: Verification::Withheld(initialized.select_members(&control, true)),
        initialized: initialized.select_members(&remaining, false),
    })
}
