use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::layout::{BandPathResolver, CloudPathResolver, native_resolution};
use crate::types::{ProductFamily, ResolutionPolicy, ValidationRoutine};

/// Parameters of one validation run, suitable for JSON config files.
///
/// For same-sensor routines the `right_*` directories default to the `left_*`
/// ones. Cross-sensor routines compare `bands[i]` (Landsat naming) against
/// `bands_s2[i]` and key their metrics by the Landsat band name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationParams {
    pub routine: ValidationRoutine,
    pub left_input_dir: PathBuf,
    pub left_cloud_dir: PathBuf,
    #[serde(default)]
    pub right_input_dir: Option<PathBuf>,
    #[serde(default)]
    pub right_cloud_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub bands: Vec<String>,
    #[serde(default)]
    pub bands10m: Vec<String>,
    #[serde(default)]
    pub bands20m: Vec<String>,
    #[serde(default)]
    pub bands_s2: Vec<String>,
    /// Pairing threshold in days; the routine default when unset.
    #[serde(default)]
    pub day_difference: Option<i64>,
    /// `None` rescales only the Landsat side of cross-sensor SR routines.
    #[serde(default)]
    pub rescale: Option<bool>,
    #[serde(default)]
    pub continue_on_error: bool,
}

/// One band comparison: left and right file band names, and the metrics key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandEntry {
    pub name: String,
    pub left: String,
    pub right: String,
}

/// Checked, ready-to-run form of [`ValidationParams`].
#[derive(Debug, Clone)]
pub struct ValidationPlan {
    pub routine: ValidationRoutine,
    pub left_bands: BandPathResolver,
    pub left_cloud: CloudPathResolver,
    pub right_bands: BandPathResolver,
    pub right_cloud: CloudPathResolver,
    pub output_dir: PathBuf,
    pub bands: Vec<BandEntry>,
    pub day_difference: i64,
    pub rescale_left: bool,
    pub rescale_right: bool,
    pub continue_on_error: bool,
    pub resolution: ResolutionPolicy,
}

impl ValidationPlan {
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }
}

impl ValidationParams {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let params: ValidationParams = serde_json::from_str(&text)?;
        debug!("Loaded {} parameters from {:?}", params.routine, path.as_ref());
        Ok(params)
    }

    /// Check directories and band lists once, before any pair is processed.
    pub fn validate(&self) -> Result<ValidationPlan> {
        let routine = self.routine;
        let (left_family, right_family) = (routine.left_family(), routine.right_family());

        require_dir("left_input_dir", &self.left_input_dir)?;
        require_dir("left_cloud_dir", &self.left_cloud_dir)?;
        let right_input_dir = self.right_dir("right_input_dir", &self.right_input_dir, &self.left_input_dir)?;
        let right_cloud_dir = self.right_dir("right_cloud_dir", &self.right_cloud_dir, &self.left_cloud_dir)?;
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(Error::config(format!(
                "output_dir {} is not a directory",
                self.output_dir.display()
            )));
        }

        let bands = self.band_entries(left_family, right_family)?;

        let day_difference = self
            .day_difference
            .unwrap_or_else(|| routine.default_day_difference());
        if day_difference <= 0 {
            return Err(Error::config(format!(
                "day_difference must be positive, got {}",
                day_difference
            )));
        }

        Ok(ValidationPlan {
            routine,
            left_bands: BandPathResolver::new(left_family, &self.left_input_dir),
            left_cloud: CloudPathResolver::new(left_family.cloud_product(), &self.left_cloud_dir),
            right_bands: BandPathResolver::new(right_family, right_input_dir),
            right_cloud: CloudPathResolver::new(right_family.cloud_product(), right_cloud_dir),
            output_dir: self.output_dir.clone(),
            bands,
            day_difference,
            rescale_left: self.rescales(left_family),
            rescale_right: !routine.is_cross_sensor() && self.rescales(right_family),
            continue_on_error: self.continue_on_error,
            resolution: routine.resolution_policy(),
        })
    }

    fn right_dir(&self, field: &str, value: &Option<PathBuf>, left: &Path) -> Result<PathBuf> {
        match value {
            Some(dir) => {
                require_dir(field, dir)?;
                Ok(dir.clone())
            }
            None if self.routine.is_cross_sensor() => Err(Error::config(format!(
                "{} is required for cross-sensor routine {}",
                field, self.routine
            ))),
            None => Ok(left.to_path_buf()),
        }
    }

    fn rescales(&self, family: ProductFamily) -> bool {
        if family != ProductFamily::LandsatSr {
            return false;
        }
        self.rescale.unwrap_or(self.routine.is_cross_sensor())
    }

    fn band_entries(&self, left: ProductFamily, right: ProductFamily) -> Result<Vec<BandEntry>> {
        let entries: Vec<BandEntry> = if self.routine.is_cross_sensor() {
            if self.bands.len() != self.bands_s2.len() {
                return Err(Error::config(format!(
                    "bands ({}) and bands_s2 ({}) must have the same length",
                    self.bands.len(),
                    self.bands_s2.len()
                )));
            }
            self.bands
                .iter()
                .zip(&self.bands_s2)
                .map(|(l8, s2)| BandEntry {
                    name: l8.clone(),
                    left: l8.clone(),
                    right: s2.clone(),
                })
                .collect()
        } else if !self.bands10m.is_empty() || !self.bands20m.is_empty() {
            check_resolution(left, &self.bands10m, 10)?;
            check_resolution(left, &self.bands20m, 20)?;
            self.bands10m
                .iter()
                .chain(&self.bands20m)
                .map(same_band)
                .collect()
        } else {
            self.bands.iter().map(same_band).collect()
        };

        if entries.is_empty() {
            return Err(Error::config(format!("no bands configured for {}", self.routine)));
        }
        for entry in &entries {
            if native_resolution(left, &entry.left).is_none() {
                return Err(Error::config(format!("band {} is not a {} band", entry.left, left)));
            }
            if native_resolution(right, &entry.right).is_none() {
                return Err(Error::config(format!("band {} is not a {} band", entry.right, right)));
            }
        }
        Ok(entries)
    }
}

fn same_band(band: &String) -> BandEntry {
    BandEntry {
        name: band.clone(),
        left: band.clone(),
        right: band.clone(),
    }
}

fn check_resolution(family: ProductFamily, bands: &[String], res: u32) -> Result<()> {
    for band in bands {
        match native_resolution(family, band) {
            Some(native) if native == res => {}
            Some(native) => {
                return Err(Error::config(format!(
                    "band {} is a {} m band, listed under bands{}m",
                    band, native, res
                )));
            }
            None => return Err(Error::config(format!("band {} is not a {} band", band, family))),
        }
    }
    Ok(())
}

fn require_dir(field: &str, dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::config(format!("{} {} is not a directory", field, dir.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(routine: ValidationRoutine, dir: &Path) -> ValidationParams {
        ValidationParams {
            routine,
            left_input_dir: dir.to_path_buf(),
            left_cloud_dir: dir.to_path_buf(),
            right_input_dir: None,
            right_cloud_dir: None,
            output_dir: dir.join("out"),
            bands: vec!["B4".into(), "B5".into()],
            bands10m: vec![],
            bands20m: vec![],
            bands_s2: vec![],
            day_difference: None,
            rescale: None,
            continue_on_error: false,
        }
    }

    #[test]
    fn landsat_plan_uses_routine_defaults() {
        let dir = tempdir().unwrap();
        let plan = params(ValidationRoutine::SrL8, dir.path()).validate().unwrap();
        assert_eq!(plan.day_difference, 10);
        assert_eq!(plan.band_names(), vec!["B4", "B5"]);
        assert!(!plan.rescale_left && !plan.rescale_right);
        assert_eq!(plan.right_bands.base_dir, dir.path());
        assert_eq!(plan.resolution, ResolutionPolicy::Native);
    }

    #[test]
    fn explicit_rescale_applies_to_both_landsat_sides() {
        let dir = tempdir().unwrap();
        let mut p = params(ValidationRoutine::SrL8, dir.path());
        p.rescale = Some(true);
        let plan = p.validate().unwrap();
        assert!(plan.rescale_left && plan.rescale_right);

        p.routine = ValidationRoutine::NbarL8;
        let plan = p.validate().unwrap();
        assert!(!plan.rescale_left && !plan.rescale_right);
    }

    #[test]
    fn missing_input_directory_is_rejected_eagerly() {
        let dir = tempdir().unwrap();
        let mut p = params(ValidationRoutine::SrL8, dir.path());
        p.left_cloud_dir = dir.path().join("nope");
        assert!(matches!(p.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn cross_sensor_requires_second_directories_and_matching_bands() {
        let dir = tempdir().unwrap();
        let mut p = params(ValidationRoutine::SrL8S2Lasrc, dir.path());
        p.bands_s2 = vec!["B04".into(), "B8A".into()];
        assert!(p.validate().is_err());

        p.right_input_dir = Some(dir.path().to_path_buf());
        p.right_cloud_dir = Some(dir.path().to_path_buf());
        let plan = p.validate().unwrap();
        assert_eq!(plan.day_difference, 5);
        assert!(plan.rescale_left);
        assert!(!plan.rescale_right);
        assert_eq!(plan.bands[1], BandEntry { name: "B5".into(), left: "B5".into(), right: "B8A".into() });

        p.bands_s2.pop();
        assert!(matches!(p.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn sen2cor_band_lists_must_match_native_resolution() {
        let dir = tempdir().unwrap();
        let mut p = params(ValidationRoutine::SrS2Sen2cor, dir.path());
        p.bands = vec![];
        p.bands10m = vec!["B02".into(), "B04".into()];
        p.bands20m = vec!["B11".into()];
        assert_eq!(p.validate().unwrap().band_names(), vec!["B02", "B04", "B11"]);

        p.bands20m.push("B03".into());
        assert!(matches!(p.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn empty_band_list_and_bad_threshold_are_rejected() {
        let dir = tempdir().unwrap();
        let mut p = params(ValidationRoutine::NbarS2Lasrc, dir.path());
        p.bands.clear();
        assert!(p.validate().is_err());

        let mut p = params(ValidationRoutine::NbarS2Lasrc, dir.path());
        p.day_difference = Some(0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn params_load_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let json = format!(
            r#"{{"routine":"nbar_s2_sen2cor","left_input_dir":{0:?},"left_cloud_dir":{0:?},
                "output_dir":{0:?},"bands10m":["B02"],"day_difference":3}}"#,
            dir.path().display().to_string()
        );
        fs::write(&path, json).unwrap();
        let p = ValidationParams::from_json_file(&path).unwrap();
        assert_eq!(p.routine, ValidationRoutine::NbarS2Sen2cor);
        assert_eq!(p.day_difference, Some(3));
        assert!(!p.continue_on_error);
        assert_eq!(p.validate().unwrap().day_difference, 3);
    }
}
