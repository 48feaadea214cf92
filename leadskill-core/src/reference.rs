//! Forecast types: the initialized forecast and its reference baselines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// One column of a score result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastType {
    /// The initialized forecast itself.
    Init,
    /// Observation at init time, carried forward unchanged.
    Persistence,
}

impl ForecastType {
    pub const REFERENCES: [ForecastType; 1] = [ForecastType::Persistence];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Persistence => "persistence",
        }
    }

    pub fn parse(keyword: &str) -> Result<Self> {
        match keyword {
            "init" => Ok(Self::Init),
            "persistence" => Ok(Self::Persistence),
            other => Err(VerifyError::UnknownReference {
                keyword: other.to_string(),
                valid: vec!["init".into(), "persistence".into()],
            }),
        }
    }
}

impl fmt::Display for ForecastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference forecasts requested alongside `init`, in request order and
/// without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSet {
    types: Vec<ForecastType>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse reference keywords. `init` is not a reference and is rejected.
    pub fn parse<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let mut types = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let keyword = keyword.as_ref();
            let ty = match ForecastType::parse(keyword)? {
                ForecastType::Init => {
                    return Err(VerifyError::UnknownReference {
                        keyword: keyword.to_string(),
                        valid: ForecastType::REFERENCES.iter().map(|t| t.name().to_string()).collect(),
                    })
                }
                ty => ty,
            };
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        Ok(Self { types })
    }

    pub fn contains(&self, ty: ForecastType) -> bool {
        self.types.contains(&ty)
    }

    pub fn scores_persistence(&self) -> bool {
        self.contains(ForecastType::Persistence)
    }

    pub fn types(&self) -> &[ForecastType] {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `init` followed by every reference, in request order.
    pub fn forecast_types(&self) -> Vec<ForecastType> {
        std::iter::once(ForecastType::Init)
            .chain(self.types.iter().copied())
            .collect()
    }
}
