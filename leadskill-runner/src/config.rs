//! Serializable scoring configuration and keyword tables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadskill_core::alignment::AlignmentPolicy;
use leadskill_core::comparison::{Comparison, WithheldMembers};
use leadskill_core::keywords::KeywordTable;

/// Content hash identifying a scoring configuration.
pub type RunId = String;

/// Errors loading or fingerprinting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Scoring configuration ───────────────────────────────────────────

/// Everything needed to reproduce one scoring run, apart from the data and
/// the metric.
///
/// Strategy fields hold raw keywords; they are resolved through the
/// [`KeywordTables`] handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Comparison keyword (`e2o`, `m2o`, `m2c`, ...).
    pub comparison: String,
    /// Alignment keyword.
    #[serde(default = "default_alignment")]
    pub alignment: String,
    /// Reference forecasts scored alongside `init`.
    #[serde(default)]
    pub reference: Vec<String>,
    /// Members withheld as truth under `m2c`. `None` withholds the first.
    #[serde(default)]
    pub withheld_members: Option<Vec<String>>,
    /// Override the alignment policy's persistence restriction.
    #[serde(default)]
    pub persistence_restriction: Option<bool>,
    /// Score (lead, forecast type) cells on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    /// Name of the common time coordinate passed to the metric.
    #[serde(default = "default_time_label")]
    pub time_label: String,
}

fn default_alignment() -> String {
    AlignmentPolicy::SameInits.name().to_string()
}

fn default_time_label() -> String {
    "time".to_string()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            comparison: Comparison::EnsembleMeanToObservation.name().to_string(),
            alignment: default_alignment(),
            reference: Vec::new(),
            withheld_members: None,
            persistence_restriction: None,
            parallel: false,
            time_label: default_time_label(),
        }
    }
}

impl ScoringConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Deterministic hash of this configuration.
    ///
    /// `parallel` only changes scheduling, so it is left out: sequential and
    /// parallel runs of the same config share an id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let canonical = Self {
            parallel: false,
            ..self.clone()
        };
        let json = serde_json::to_string(&canonical)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn withheld(&self) -> WithheldMembers {
        match &self.withheld_members {
            Some(names) => WithheldMembers::Named(names.clone()),
            None => WithheldMembers::First,
        }
    }
}

// ─── Keyword tables ──────────────────────────────────────────────────

/// The comparison and alignment keyword tables a run resolves against.
///
/// ```toml
/// [[comparisons.entries]]
/// variant = "member_to_observation"
/// keywords = ["m2o", "m2r", "members"]
/// ```
///
/// A table missing from the file falls back to the built-in one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordTables {
    #[serde(default = "Comparison::default_table")]
    pub comparisons: KeywordTable<Comparison>,
    #[serde(default = "AlignmentPolicy::default_table")]
    pub alignments: KeywordTable<AlignmentPolicy>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            comparisons: Comparison::default_table(),
            alignments: AlignmentPolicy::default_table(),
        }
    }
}

impl KeywordTables {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ScoringConfig::from_toml(r#"comparison = "m2o""#).unwrap();
        assert_eq!(config.alignment, "same_inits");
        assert!(config.reference.is_empty());
        assert_eq!(config.time_label, "time");
        assert_eq!(config.withheld(), WithheldMembers::First);
        assert!(!config.parallel);
    }

    #[test]
    fn full_config_parses() {
        let config = ScoringConfig::from_toml(
            r#"
            comparison = "m2c"
            alignment = "same_init"
            reference = ["persistence"]
            withheld_members = ["r1", "r2"]
            persistence_restriction = false
            parallel = true
            time_label = "valid_time"
            "#,
        )
        .unwrap();
        assert_eq!(config.reference, vec!["persistence".to_string()]);
        assert_eq!(config.persistence_restriction, Some(false));
        assert_eq!(
            config.withheld(),
            WithheldMembers::Named(vec!["r1".into(), "r2".into()])
        );
    }

    #[test]
    fn run_id_deterministic() {
        let config = ScoringConfig::default();
        let id = config.run_id().unwrap();
        assert_eq!(id, config.clone().run_id().unwrap());
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn run_id_changes_with_strategy_but_not_scheduling() {
        let base = ScoringConfig::default();
        let other = ScoringConfig {
            comparison: "m2o".into(),
            ..base.clone()
        };
        let parallel = ScoringConfig {
            parallel: true,
            ..base.clone()
        };
        assert_ne!(base.run_id().unwrap(), other.run_id().unwrap());
        assert_eq!(base.run_id().unwrap(), parallel.run_id().unwrap());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ScoringConfig::from_file(Path::new("/nonexistent/scoring.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scoring.toml"));
    }

    #[test]
    fn keyword_tables_extend_aliases() {
        let tables = KeywordTables::from_toml(
            r#"
            [[comparisons.entries]]
            variant = "member_to_observation"
            keywords = ["m2o", "members"]
            "#,
        )
        .unwrap();
        assert_eq!(
            tables.comparisons.lookup("members"),
            Some(Comparison::MemberToObservation)
        );
        assert_eq!(tables.comparisons.lookup("e2o"), None);
        assert_eq!(
            tables.alignments.lookup("same_inits"),
            Some(AlignmentPolicy::SameInits)
        );
    }

    #[test]
    fn keyword_tables_toml_roundtrip() {
        let tables = KeywordTables::default();
        let text = tables.to_toml().unwrap();
        assert_eq!(KeywordTables::from_toml(&text).unwrap(), tables);
    }
}
