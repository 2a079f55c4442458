//! Validity masks from cloud products. `true` marks an excluded pixel.
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::CloudProduct;

/// Landsat Collection-2 `QA_PIXEL` bits excluded by default.
pub const DEFAULT_QA_FLAGS: &[(&str, u32)] = &[
    ("fill", 1 << 0),
    ("dilated_cloud", 1 << 1),
    ("cirrus", 1 << 2),
    ("cloud", 1 << 3),
    ("shadow", 1 << 4),
    ("snow", 1 << 5),
];

/// Sentinel-2 SCL classes excluded by default. Vegetation (4), not vegetated (5)
/// and water (6) are kept.
pub const DEFAULT_SCL_LABELS: &[(&str, u32)] = &[
    ("nodata", 0),
    ("saturated_or_defective", 1),
    ("dark_area_pixels", 2),
    ("cloud_shadows", 3),
    ("unclassified", 7),
    ("cloud_medium_probability", 8),
    ("cloud_high_probability", 9),
    ("thin_cirrus", 10),
    ("snow", 11),
];

/// QA value marking fill pixels in Landsat `QA_PIXEL`.
pub const LANDSAT_QA_NODATA: i64 = 0;

/// Boolean exclusion mask aligned with a comparison window.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityMask(pub Array2<bool>);

impl ValidityMask {
    pub fn dim(&self) -> (usize, usize) {
        self.0.dim()
    }

    /// Pixel-wise OR: a pixel bad in either scene is excluded.
    pub fn union(&self, other: &ValidityMask) -> Result<ValidityMask> {
        if self.dim() != other.dim() {
            return Err(Error::Alignment(format!(
                "mask shapes differ: {:?} vs {:?}",
                self.dim(),
                other.dim()
            )));
        }
        Ok(ValidityMask(
            Zip::from(&self.0).and(&other.0).map_collect(|a, b| *a || *b),
        ))
    }

    /// Set every excluded pixel of `arr` to NaN.
    pub fn apply(&self, arr: &mut Array2<f64>) -> Result<()> {
        if self.dim() != arr.dim() {
            return Err(Error::Alignment(format!(
                "mask shape {:?} does not match raster window {:?}",
                self.dim(),
                arr.dim()
            )));
        }
        Zip::from(arr).and(&self.0).for_each(|v, &excluded| {
            if excluded {
                *v = f64::NAN;
            }
        });
        Ok(())
    }

    pub fn excluded_count(&self) -> usize {
        self.0.iter().filter(|&&m| m).count()
    }
}

/// Mark every pixel with any of `flags` set, plus pixels equal to `nodata`.
pub fn mask_bitwise(raw: &Array2<f64>, flags: &[(&str, u32)], nodata: Option<i64>) -> ValidityMask {
    let combined: u32 = flags.iter().fold(0, |acc, (_, bit)| acc | bit);
    ValidityMask(raw.mapv(|v| {
        let value = v as i64;
        nodata == Some(value) || (value & i64::from(combined)) != 0
    }))
}

/// Mark every pixel whose class equals one of `labels`.
pub fn mask_scl(raw: &Array2<f64>, labels: &[(&str, u32)]) -> ValidityMask {
    ValidityMask(raw.mapv(|v| {
        !v.is_nan() && labels.iter().any(|(_, label)| v == f64::from(*label))
    }))
}

/// Mask construction rule for one cloud product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaskBuilder {
    Bitwise {
        flags: Vec<(String, u32)>,
        nodata: Option<i64>,
    },
    Scl {
        labels: Vec<(String, u32)>,
    },
}

impl MaskBuilder {
    /// Default builder for a cloud product.
    pub fn for_product(product: CloudProduct) -> Self {
        match product {
            CloudProduct::LandsatQa => MaskBuilder::Bitwise {
                flags: owned(DEFAULT_QA_FLAGS),
                nodata: Some(LANDSAT_QA_NODATA),
            },
            CloudProduct::SceneClassification => MaskBuilder::Scl {
                labels: owned(DEFAULT_SCL_LABELS),
            },
        }
    }

    pub fn build(&self, raw: &Array2<f64>) -> ValidityMask {
        match self {
            MaskBuilder::Bitwise { flags, nodata } => mask_bitwise(raw, &borrowed(flags), *nodata),
            MaskBuilder::Scl { labels } => mask_scl(raw, &borrowed(labels)),
        }
    }
}

fn owned(table: &[(&str, u32)]) -> Vec<(String, u32)> {
    table.iter().map(|(n, v)| (n.to_string(), *v)).collect()
}

fn borrowed(table: &[(String, u32)]) -> Vec<(&str, u32)> {
    table.iter().map(|(n, v)| (n.as_str(), *v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn bitwise_nodata_is_excluded_regardless_of_bits() {
        let raw = array![[0.0, 64.0, 8.0, 66.0]];
        let mask = mask_bitwise(&raw, DEFAULT_QA_FLAGS, Some(0));
        assert_eq!(mask.0, array![[true, false, true, true]]);
    }

    #[test]
    fn bitwise_without_nodata_keeps_zero() {
        let raw = array![[0.0, 32.0, 128.0]];
        let mask = mask_bitwise(&raw, DEFAULT_QA_FLAGS, None);
        assert_eq!(mask.0, array![[false, true, false]]);
    }

    #[test]
    fn bitwise_honours_custom_flags() {
        let raw = array![[1.0, 8.0]];
        let mask = mask_bitwise(&raw, &[("cloud", 1 << 3)], None);
        assert_eq!(mask.0, array![[false, true]]);
    }

    #[test]
    fn scl_defaults_keep_vegetation() {
        let raw = array![[0.0, 4.0, 8.0]];
        let mask = mask_scl(&raw, DEFAULT_SCL_LABELS);
        assert_eq!(mask.0, array![[true, false, true]]);
    }

    #[test]
    fn scl_keeps_surface_classes() {
        let raw = array![[4.0, 5.0, 6.0, 11.0]];
        let mask = MaskBuilder::for_product(CloudProduct::SceneClassification).build(&raw);
        assert_eq!(mask.0, array![[false, false, false, true]]);
        assert_eq!(mask.excluded_count(), 1);
    }

    #[test]
    fn union_excludes_pixels_bad_in_either_scene() {
        let a = ValidityMask(array![[true, false, false]]);
        let b = ValidityMask(array![[false, false, true]]);
        assert_eq!(a.union(&b).unwrap().0, array![[true, false, true]]);
        assert!(a.union(&ValidityMask(array![[true]])).is_err());
    }

    #[test]
    fn apply_sets_excluded_pixels_to_nan() {
        let mask = ValidityMask(array![[true, false]]);
        let mut arr = array![[1.0, 2.0]];
        mask.apply(&mut arr).unwrap();
        assert!(arr[[0, 0]].is_nan());
        assert_eq!(arr[[0, 1]], 2.0);
    }
}
