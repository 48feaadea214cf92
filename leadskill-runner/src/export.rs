//! Writing score results to disk and reading them back.
//!
//! JSON keeps everything a `ScoreResult` holds and is the format `load_result`
//! reads. CSV flattens the cells to one row per space point for dataframe
//! tools. A result stamped with a newer `schema_version` than this build knows
//! is refused.

use std::path::Path;

use anyhow::{ensure, Context, Result};

use crate::result::{ScoreResult, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

/// Pretty JSON. Non-finite scores come out as `null`.
pub fn export_json(result: &ScoreResult) -> Result<String> {
    serde_json::to_string_pretty(result)
        .with_context(|| format!("encoding score result {}", result.run_id))
}

/// Parse a score result, checking its schema version and that it holds one
/// cell per (forecast type, lead).
pub fn import_json(json: &str) -> Result<ScoreResult> {
    let result: ScoreResult = serde_json::from_str(json).context("decoding score result JSON")?;
    ensure!(
        result.schema_version <= SCHEMA_VERSION,
        "unsupported schema version {} (this build reads up to {})",
        result.schema_version,
        SCHEMA_VERSION
    );
    let expected = result.leads.len() * result.forecast_types.len();
    ensure!(
        result.cells.len() == expected,
        "score result {} has {} cells for {} leads and {} forecast types",
        result.run_id,
        result.cells.len(),
        result.leads.len(),
        result.forecast_types.len()
    );
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export score cells as CSV.
///
/// Columns: lead, forecast_type, n_samples, space_index, value. NaN values
/// are written as `NaN`.
pub fn export_csv(result: &ScoreResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["lead", "forecast_type", "n_samples", "space_index", "value"])?;

    for cell in &result.cells {
        for (s, value) in cell.value.iter().enumerate() {
            wtr.write_record([
                cell.lead.to_string().as_str(),
                cell.forecast_type.name(),
                cell.n_samples.to_string().as_str(),
                s.to_string().as_str(),
                value.to_string().as_str(),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Files ──────────────────────────────────────────────────────────

/// Write `result.json` and `result.csv` into `dir`, creating it if needed.
pub fn save_result(result: &ScoreResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    std::fs::write(dir.join("result.json"), export_json(result)?)
        .with_context(|| format!("failed to write result.json in {}", dir.display()))?;
    std::fs::write(dir.join("result.csv"), export_csv(result)?)
        .with_context(|| format!("failed to write result.csv in {}", dir.display()))?;
    Ok(())
}

/// Load a `ScoreResult` from a directory written by [`save_result`].
pub fn load_result(dir: &Path) -> Result<ScoreResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
