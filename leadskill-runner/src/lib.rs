//! Leadskill Runner: scoring pipeline, configuration, results and export.
//!
//! This crate builds on `leadskill-core` to provide:
//! - `ScoringEngine`, which threads one run through ingest, broadcast,
//!   alignment and metric application
//! - TOML scoring configuration and keyword tables, fingerprinted with blake3
//! - `ScoreResult`, indexed by (lead, forecast type)
//! - JSON and CSV export

pub mod config;
pub mod engine;
pub mod export;
pub mod result;

pub use config::{ConfigError, KeywordTables, RunId, ScoringConfig};
pub use engine::{Metric, NamedMetric, ScoreError, ScoringEngine};
pub use export::{export_csv, export_json, import_json, load_result, save_result};
pub use result::{ScoreCell, ScoreResult, SCHEMA_VERSION};
