use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::stats::ComparisonMetrics;
use crate::error::{Error, Result};
use crate::types::ValidationRoutine;

/// Result file of `routine` under `output_dir`:
/// `<output_dir>/validation_<name>/comparison_metrics_<name>.json`.
pub fn metrics_path(output_dir: &Path, routine: ValidationRoutine) -> PathBuf {
    output_dir
        .join(routine.output_subdir())
        .join(routine.output_file_name())
}

/// Serialize `metrics` as pretty JSON to the routine's result file.
///
/// The file is written to a scratch file beside the target and renamed into
/// place, so readers never observe a half-written document. NaN means are
/// written as `null`.
pub fn write_metrics(
    output_dir: &Path,
    routine: ValidationRoutine,
    metrics: &ComparisonMetrics,
) -> Result<PathBuf> {
    let path = metrics_path(output_dir, routine);
    let dir = path
        .parent()
        .ok_or_else(|| Error::config(format!("invalid output path {}", path.display())))?;
    fs::create_dir_all(dir)?;

    let json_string = serde_json::to_string_pretty(metrics)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json_string.as_bytes())?;
    tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

    info!("Wrote comparison metrics: {:?}", path);
    Ok(path)
}
