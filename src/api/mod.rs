//! High-level library API: pair scene lists, run a validation routine and
//! write its comparison metrics. Prefer these entry points over the `core`
//! building blocks when integrating radval.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::pairing::{ScenePair, search_pairs_l8, search_pairs_l8_s2, search_pairs_s2};
use crate::core::params::{ValidationParams, ValidationPlan};
use crate::core::routine::run_routine;
use crate::core::stats::ComparisonMetrics;
use crate::error::{Error, Result};
use crate::io::scene_list::load_scene_ids;
use crate::io::writers::metrics::write_metrics;
use crate::types::{Sensor, ValidationRoutine};

/// Summary of one validation run.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub routine: ValidationRoutine,
    pub output_path: PathBuf,
    pub metrics: ComparisonMetrics,
    /// Number of pairs whose metrics were recorded.
    pub evaluated: usize,
    /// Pairs skipped under `continue_on_error`, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Candidate pairs of the scenes in `scene_ids` (and `second_ids` for
/// cross-sensor routines) under the routine's pairing rule.
pub fn find_pairs<A: AsRef<str>, B: AsRef<str>>(
    routine: ValidationRoutine,
    scene_ids: &[A],
    second_ids: &[B],
    day_difference: i64,
) -> Result<Vec<ScenePair>> {
    let pairs = if routine.is_cross_sensor() {
        search_pairs_l8_s2(scene_ids, second_ids, day_difference)?
    } else {
        if !second_ids.is_empty() {
            return Err(Error::config(format!(
                "{} pairs scenes of a single list; got a second list of {} ids",
                routine,
                second_ids.len()
            )));
        }
        match routine.left_family().sensor() {
            Sensor::L8 => search_pairs_l8(scene_ids, day_difference)?,
            Sensor::S2 => search_pairs_s2(scene_ids, day_difference)?,
        }
    };
    info!("{}: {} candidate pairs within {} days", routine, pairs.len(), day_difference);
    Ok(pairs)
}

/// Run a checked plan over `pairs` and write the metrics file.
pub fn validate_pairs(plan: &ValidationPlan, pairs: &[ScenePair]) -> Result<ValidationReport> {
    if pairs.is_empty() {
        warn!("{}: no pairs to validate", plan.routine);
    }
    let outcome = run_routine(plan, pairs)?;
    let output_path = write_metrics(&plan.output_dir, plan.routine, &outcome.metrics)?;
    Ok(ValidationReport {
        routine: plan.routine,
        output_path,
        metrics: outcome.metrics,
        evaluated: outcome.evaluated.len(),
        failed: outcome.failed,
    })
}

/// Validate parameters, pair the scene ids and run the routine end to end.
pub fn run_validation<A: AsRef<str>, B: AsRef<str>>(
    params: &ValidationParams,
    scene_ids: &[A],
    second_ids: &[B],
) -> Result<ValidationReport> {
    let plan = params.validate()?;
    let pairs = find_pairs(plan.routine, scene_ids, second_ids, plan.day_difference)?;
    validate_pairs(&plan, &pairs)
}

/// [`run_validation`] with parameters and scene lists read from files.
pub fn run_validation_from_files(
    config: &Path,
    scenes: &Path,
    second_scenes: Option<&Path>,
) -> Result<ValidationReport> {
    let params = ValidationParams::from_json_file(config)?;
    let scene_ids = load_scene_ids(scenes)?;
    let second_ids = match second_scenes {
        Some(path) => load_scene_ids(path)?,
        None => Vec::new(),
    };
    run_validation(&params, &scene_ids, &second_ids)
}
