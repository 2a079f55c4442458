//! The comparison routine shared by every product family combination.
//!
//! For each pair the combined validity mask is built once per comparison
//! resolution and reused across bands. Each band is aligned, masked, rescaled
//! when the plan says so, and compared.
use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::core::align::{self, intersect};
use crate::core::masking::{MaskBuilder, ValidityMask};
use crate::core::pairing::ScenePair;
use crate::core::params::ValidationPlan;
use crate::core::raster::RasterSource;
use crate::core::stats::{BandMetrics, ComparisonMetrics, calc_all_pairs, compare, rescale_landsat_c2};
use crate::error::Result;
use crate::io::gdal::GdalRaster;
use crate::io::layout::CloudPathResolver;
use crate::types::ResolutionPolicy;

/// Outcome of running a plan over a list of pairs.
#[derive(Debug, Clone, Default)]
pub struct RoutineOutcome {
    pub metrics: ComparisonMetrics,
    /// Keys of pairs whose every band was compared.
    pub evaluated: Vec<String>,
    /// Keys and error messages of skipped pairs.
    pub failed: Vec<(String, String)>,
}

/// Compare every configured band of every pair, then add the `all_pairs` summary.
///
/// The first failing pair aborts the run unless `plan.continue_on_error` is set,
/// in which case the pair is logged, recorded and left out of the metrics.
pub fn run_routine(plan: &ValidationPlan, pairs: &[ScenePair]) -> Result<RoutineOutcome> {
    info!(
        "Running {} over {} pairs ({} bands)",
        plan.routine,
        pairs.len(),
        plan.bands.len()
    );
    let mut outcome = RoutineOutcome::default();

    for pair in pairs {
        let key = pair.key();
        match compare_pair(plan, pair) {
            Ok(results) => {
                for (band, metrics) in results {
                    outcome.metrics.add_comparison(&key, &band, metrics);
                }
                outcome.evaluated.push(key);
            }
            Err(e) if plan.continue_on_error => {
                warn!("Skipping pair {}: {}", pair, e);
                outcome.failed.push((key, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    calc_all_pairs(&mut outcome.metrics, &plan.band_names(), &outcome.evaluated);
    info!(
        "{}: {} pairs evaluated, {} failed",
        plan.routine,
        outcome.evaluated.len(),
        outcome.failed.len()
    );
    Ok(outcome)
}

/// Metrics of every band of one pair, in plan order.
pub fn compare_pair(plan: &ValidationPlan, pair: &ScenePair) -> Result<Vec<(String, BandMetrics)>> {
    let (left_id, right_id) = (pair.left.raw_id.as_str(), pair.right.raw_id.as_str());
    let mut masks: HashMap<Option<u32>, ValidityMask> = HashMap::new();
    let mut results = Vec::with_capacity(plan.bands.len());

    for band in &plan.bands {
        info!("Comparing pair {} band {}", pair, band.name);
        let (left_path, left_res) = plan.left_bands.resolve(left_id, &band.left)?;
        let (right_path, _) = plan.right_bands.resolve(right_id, &band.right)?;

        let target = match plan.resolution {
            ResolutionPolicy::Native => None,
            ResolutionPolicy::BandNative => Some(left_res),
            ResolutionPolicy::Fixed(res) => Some(res),
        };
        if !masks.contains_key(&target) {
            let mask = combined_mask(&plan.left_cloud, &plan.right_cloud, pair, target)?;
            masks.insert(target, mask);
        }

        let left = open_at(&left_path, target)?;
        let right = open_at(&right_path, target)?;
        let (mut arr1, mut arr2) = intersect(&*left, &*right)?;
        drop((left, right));

        if let Some(mask) = masks.get(&target) {
            mask.apply(&mut arr1)?;
            mask.apply(&mut arr2)?;
        }
        if plan.rescale_left {
            rescale_landsat_c2(&mut arr1);
        }
        if plan.rescale_right {
            rescale_landsat_c2(&mut arr2);
        }

        let metrics = compare(arr1, arr2)?;
        debug!(
            "{} {}: abs_dif_mean={} rel_abs_perc_mean={}",
            pair.key(),
            band.name,
            metrics.abs_dif_mean,
            metrics.rel_abs_perc_mean
        );
        results.push((band.name.clone(), metrics));
    }
    Ok(results)
}

/// OR of both scenes' cloud masks over their overlap, on the `target` grid.
fn combined_mask(
    left: &CloudPathResolver,
    right: &CloudPathResolver,
    pair: &ScenePair,
    target: Option<u32>,
) -> Result<ValidityMask> {
    let (left_path, _) = left.resolve(&pair.left.raw_id)?;
    let (right_path, _) = right.resolve(&pair.right.raw_id)?;
    let left_raster = open_at(&left_path, target)?;
    let right_raster = open_at(&right_path, target)?;
    let (raw1, raw2): (Array2<f64>, Array2<f64>) = intersect(&*left_raster, &*right_raster)?;

    let mask1 = MaskBuilder::for_product(left.product).build(&raw1);
    let mask2 = MaskBuilder::for_product(right.product).build(&raw2);
    let mask = mask1.union(&mask2)?;
    debug!(
        "Mask for {} at {:?} m excludes {} of {} pixels",
        pair,
        target,
        mask.excluded_count(),
        raw1.len()
    );
    Ok(mask)
}

/// Open a raster, resampled to `target` metres when its pixel size differs.
fn open_at(path: &Path, target: Option<u32>) -> Result<Box<dyn RasterSource>> {
    let raster = GdalRaster::open(path)?;
    match target {
        Some(res) if !has_resolution(&raster, res) => {
            Ok(Box::new(align::resample(&raster, f64::from(res))?))
        }
        _ => Ok(Box::new(raster)),
    }
}

fn has_resolution(raster: &dyn RasterSource, res: u32) -> bool {
    let (x, y) = raster.meta().resolution();
    let res = f64::from(res);
    (x - res).abs() < 1e-9 && (y - res).abs() < 1e-9
}
