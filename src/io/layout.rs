//! Directory and file naming conventions of each processing chain's output.
//!
//! - Landsat SR: `<base>/<id>/<id>_SR_<band>.TIF`
//! - Landsat NBAR: `<base>/<id>_NBAR/<id>_NBAR_<band>.tif`
//! - Sen2Cor SR: `<base>/<L2A>/GRANULE/<granule>/IMG_DATA/R<res>m/<tile>_<stamp>_<band>_<res>m.jp2`
//! - Sen2Cor NBAR: `<base>/<L2A>/<tile>_<stamp>_<band>_<res>m.tif`
//! - LaSRC SR: `<base>/<id>/<id>_<band>.tif`
//! - LaSRC NBAR: `<base>/<id>_NBAR/<id>_<band>.tif`
//!
//! `<L2A>` is the Sen2Cor output directory of an L1C scene, located by prefix.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{
    COMMON_RESOLUTION, CloudProduct, LANDSAT_RESOLUTION, ProductFamily, S2_BANDS_10M,
    S2_BANDS_20M, S2_BANDS_60M,
};

const SAFE_SUFFIX: &str = ".SAFE";
const SEN2COR_BASELINE: &str = "N9999";

/// Maps `(scene id, band)` to a raster path and its native resolution.
#[derive(Debug, Clone)]
pub struct BandPathResolver {
    pub family: ProductFamily,
    pub base_dir: PathBuf,
}

impl BandPathResolver {
    pub fn new<P: Into<PathBuf>>(family: ProductFamily, base_dir: P) -> Self {
        Self {
            family,
            base_dir: base_dir.into(),
        }
    }

    /// Path of `band` for `scene_id` and the band's native resolution in metres.
    pub fn resolve(&self, scene_id: &str, band: &str) -> Result<(PathBuf, u32)> {
        let res = native_resolution(self.family, band).ok_or_else(|| {
            self.failure(scene_id, band, format!("unknown band for {}", self.family))
        })?;
        let base = &self.base_dir;
        let path = match self.family {
            ProductFamily::LandsatSr => base
                .join(scene_id)
                .join(format!("{}_SR_{}.TIF", scene_id, band)),
            ProductFamily::LandsatNbar => base
                .join(format!("{}_NBAR", scene_id))
                .join(format!("{}_NBAR_{}.tif", scene_id, band)),
            ProductFamily::Sentinel2LasrcSr => {
                let id = strip_safe(scene_id);
                base.join(id).join(format!("{}_{}.tif", id, band))
            }
            ProductFamily::Sentinel2LasrcNbar => {
                let id = strip_safe(scene_id);
                base.join(format!("{}_NBAR", id))
                    .join(format!("{}_{}.tif", id, band))
            }
            ProductFamily::Sentinel2Sen2corSr => {
                let l2a = find_l2a_dir(base, scene_id)?;
                granule_img_dir(&l2a, scene_id)?
                    .join(format!("R{}m", res))
                    .join(sen2cor_file_name(scene_id, band, res, "jp2")?)
            }
            ProductFamily::Sentinel2Sen2corNbar => {
                let l2a = find_l2a_dir(base, scene_id)?;
                l2a.join(sen2cor_file_name(scene_id, band, res, "tif")?)
            }
        };
        if !path.is_file() {
            return Err(self.failure(scene_id, band, format!("{} does not exist", path.display())));
        }
        debug!("{} {} -> {} ({} m)", scene_id, band, path.display(), res);
        Ok((path, res))
    }

    fn failure(&self, scene_id: &str, band: &str, reason: String) -> Error {
        Error::PathResolution {
            what: format!("band {}", band),
            scene_id: scene_id.to_string(),
            base: self.base_dir.display().to_string(),
            reason,
        }
    }
}

/// Maps a scene id to its cloud product raster.
#[derive(Debug, Clone)]
pub struct CloudPathResolver {
    pub product: CloudProduct,
    pub base_dir: PathBuf,
}

impl CloudPathResolver {
    pub fn new<P: Into<PathBuf>>(product: CloudProduct, base_dir: P) -> Self {
        Self {
            product,
            base_dir: base_dir.into(),
        }
    }

    /// Cloud raster path and its native resolution.
    pub fn resolve(&self, scene_id: &str) -> Result<(PathBuf, u32)> {
        let (path, res) = match self.product {
            CloudProduct::LandsatQa => (
                self.base_dir
                    .join(scene_id)
                    .join(format!("{}_QA_PIXEL.TIF", scene_id)),
                LANDSAT_RESOLUTION,
            ),
            CloudProduct::SceneClassification => {
                let l2a = find_l2a_dir(&self.base_dir, scene_id)?;
                let tokens = s2_tokens(scene_id)?;
                (
                    granule_img_dir(&l2a, scene_id)?
                        .join("R20m")
                        .join(format!("{}_{}_SCL_20m.jp2", tokens[5], tokens[2])),
                    20,
                )
            }
        };
        if !path.is_file() {
            return Err(Error::PathResolution {
                what: "cloud mask".to_string(),
                scene_id: scene_id.to_string(),
                base: self.base_dir.display().to_string(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        Ok((path, res))
    }
}

/// Native pixel size of `band` in products of `family`; `None` for unknown bands.
pub fn native_resolution(family: ProductFamily, band: &str) -> Option<u32> {
    match family {
        ProductFamily::LandsatSr | ProductFamily::LandsatNbar => Some(LANDSAT_RESOLUTION),
        ProductFamily::Sentinel2LasrcSr | ProductFamily::Sentinel2LasrcNbar => {
            Some(COMMON_RESOLUTION)
        }
        ProductFamily::Sentinel2Sen2corSr | ProductFamily::Sentinel2Sen2corNbar => {
            if S2_BANDS_10M.contains(&band) {
                Some(10)
            } else if S2_BANDS_20M.contains(&band) {
                Some(20)
            } else if S2_BANDS_60M.contains(&band) {
                Some(60)
            } else {
                None
            }
        }
    }
}

fn strip_safe(scene_id: &str) -> &str {
    scene_id.strip_suffix(SAFE_SUFFIX).unwrap_or(scene_id)
}

fn s2_tokens(scene_id: &str) -> Result<Vec<&str>> {
    let tokens: Vec<&str> = strip_safe(scene_id).split('_').collect();
    if tokens.len() < 7 {
        return Err(Error::malformed(scene_id, "not a Sentinel-2 product name"));
    }
    Ok(tokens)
}

/// `<tile>_<stamp>_<band>_<res>m.<ext>`
fn sen2cor_file_name(scene_id: &str, band: &str, res: u32, ext: &str) -> Result<String> {
    let tokens = s2_tokens(scene_id)?;
    Ok(format!("{}_{}_{}_{}m.{}", tokens[5], tokens[2], band, res, ext))
}

/// Directory-name prefix of the Sen2Cor output for an L1C scene: level
/// switched to L2A, processing baseline set to `N9999`, discriminator dropped.
pub fn l2a_prefix(scene_id: &str) -> Result<String> {
    let l2a_name = strip_safe(scene_id).replace("L1C", "L2A");
    let mut tokens: Vec<&str> = l2a_name.split('_').collect();
    if tokens.len() < 7 {
        return Err(Error::malformed(scene_id, "not a Sentinel-2 product name"));
    }
    tokens[3] = SEN2COR_BASELINE;
    tokens.pop();
    Ok(tokens.join("_"))
}

fn find_l2a_dir(base: &Path, scene_id: &str) -> Result<PathBuf> {
    let prefix = l2a_prefix(scene_id)?;
    single_entry(base, scene_id, "Sen2Cor L2A directory", |name| {
        name.starts_with(&prefix)
    })
}

fn granule_img_dir(l2a_dir: &Path, scene_id: &str) -> Result<PathBuf> {
    let granule = single_entry(&l2a_dir.join("GRANULE"), scene_id, "granule", |_| true)?;
    Ok(granule.join("IMG_DATA"))
}

/// The one entry of `dir` whose name satisfies `accept`.
fn single_entry<F: Fn(&str) -> bool>(
    dir: &Path,
    scene_id: &str,
    what: &str,
    accept: F,
) -> Result<PathBuf> {
    let failure = |reason: String| Error::PathResolution {
        what: what.to_string(),
        scene_id: scene_id.to_string(),
        base: dir.display().to_string(),
        reason,
    };
    let entries = fs::read_dir(dir).map_err(|e| failure(e.to_string()))?;
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| failure(e.to_string()))?;
        if entry.file_name().to_str().is_some_and(|name| accept(name)) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    match matches.len() {
        0 => Err(failure("no matching entry".to_string())),
        1 => Ok(matches.remove(0)),
        n => Err(failure(format!("{} ambiguous matches: {:?}", n, matches))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const L8: &str = "LC08_L2SP_220069_20190707_20200827_02_T1";
    const S2: &str = "S2A_MSIL1C_20190707T131251_N0207_R138_T23KMQ_20190707T145006";
    const L2A: &str = "S2A_MSIL2A_20190707T131251_N9999_R138_T23KMQ_20210315T101010.SAFE";

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn landsat_sr_and_nbar_paths() {
        let dir = tempdir().unwrap();
        let sr = dir.path().join(L8).join(format!("{}_SR_B4.TIF", L8));
        let nbar = dir.path().join(format!("{}_NBAR", L8)).join(format!("{}_NBAR_B4.tif", L8));
        touch(&sr);
        touch(&nbar);

        let (path, res) = BandPathResolver::new(ProductFamily::LandsatSr, dir.path())
            .resolve(L8, "B4")
            .unwrap();
        assert_eq!(path, sr);
        assert_eq!(res, 30);
        let (path, _) = BandPathResolver::new(ProductFamily::LandsatNbar, dir.path())
            .resolve(L8, "B4")
            .unwrap();
        assert_eq!(path, nbar);
    }

    #[test]
    fn l2a_prefix_switches_level_and_baseline() {
        assert_eq!(
            l2a_prefix(S2).unwrap(),
            "S2A_MSIL2A_20190707T131251_N9999_R138_T23KMQ"
        );
        assert_eq!(l2a_prefix(&format!("{}.SAFE", S2)).unwrap(), l2a_prefix(S2).unwrap());
    }

    #[test]
    fn sen2cor_sr_band_lives_under_granule_at_native_resolution() {
        let dir = tempdir().unwrap();
        let img = dir.path().join(L2A).join("GRANULE").join("L2A_T23KMQ_A011").join("IMG_DATA");
        let b04 = img.join("R10m").join("T23KMQ_20190707T131251_B04_10m.jp2");
        let b11 = img.join("R20m").join("T23KMQ_20190707T131251_B11_20m.jp2");
        let scl = img.join("R20m").join("T23KMQ_20190707T131251_SCL_20m.jp2");
        touch(&b04);
        touch(&b11);
        touch(&scl);

        let resolver = BandPathResolver::new(ProductFamily::Sentinel2Sen2corSr, dir.path());
        assert_eq!(resolver.resolve(S2, "B04").unwrap(), (b04, 10));
        assert_eq!(resolver.resolve(S2, "B11").unwrap(), (b11, 20));

        let cloud = CloudPathResolver::new(CloudProduct::SceneClassification, dir.path());
        assert_eq!(cloud.resolve(S2).unwrap(), (scl, 20));
    }

    #[test]
    fn sen2cor_nbar_sits_in_the_l2a_directory() {
        let dir = tempdir().unwrap();
        let b8a = dir.path().join(L2A).join("T23KMQ_20190707T131251_B8A_20m.tif");
        touch(&b8a);
        let resolver = BandPathResolver::new(ProductFamily::Sentinel2Sen2corNbar, dir.path());
        assert_eq!(resolver.resolve(S2, "B8A").unwrap(), (b8a, 20));
    }

    #[test]
    fn lasrc_paths_drop_the_safe_suffix() {
        let dir = tempdir().unwrap();
        let sr = dir.path().join(S2).join(format!("{}_B02.tif", S2));
        let nbar = dir.path().join(format!("{}_NBAR", S2)).join(format!("{}_B02.tif", S2));
        touch(&sr);
        touch(&nbar);
        let safe = format!("{}.SAFE", S2);
        let sr_res = BandPathResolver::new(ProductFamily::Sentinel2LasrcSr, dir.path());
        let nbar_res = BandPathResolver::new(ProductFamily::Sentinel2LasrcNbar, dir.path());
        assert_eq!(sr_res.resolve(&safe, "B02").unwrap(), (sr, 10));
        assert_eq!(nbar_res.resolve(S2, "B02").unwrap(), (nbar, 10));
    }

    #[test]
    fn missing_or_ambiguous_l2a_directories_fail() {
        let dir = tempdir().unwrap();
        let resolver = BandPathResolver::new(ProductFamily::Sentinel2Sen2corNbar, dir.path());
        assert!(matches!(resolver.resolve(S2, "B04"), Err(Error::PathResolution { .. })));

        fs::create_dir_all(dir.path().join(L2A)).unwrap();
        fs::create_dir_all(
            dir.path()
                .join("S2A_MSIL2A_20190707T131251_N9999_R138_T23KMQ_20220101T000000.SAFE"),
        )
        .unwrap();
        let err = resolver.resolve(S2, "B04").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn unknown_sentinel2_band_fails() {
        let dir = tempdir().unwrap();
        let resolver = BandPathResolver::new(ProductFamily::Sentinel2Sen2corSr, dir.path());
        assert!(matches!(resolver.resolve(S2, "B99"), Err(Error::PathResolution { .. })));
        assert_eq!(native_resolution(ProductFamily::Sentinel2Sen2corSr, "B01"), Some(60));
    }

    #[test]
    fn landsat_cloud_path() {
        let dir = tempdir().unwrap();
        let qa = dir.path().join(L8).join(format!("{}_QA_PIXEL.TIF", L8));
        touch(&qa);
        let cloud = CloudPathResolver::new(CloudProduct::LandsatQa, dir.path());
        assert_eq!(cloud.resolve(L8).unwrap(), (qa, 30));
        assert!(cloud.resolve("LC08_L2SP_220070_20190707_20200827_02_T1").is_err());
    }
}
