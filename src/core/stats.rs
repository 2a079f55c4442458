//! Per-band difference statistics and their aggregation across pairs.
use std::collections::BTreeMap;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Key holding the cross-pair summary in the metrics document.
pub const ALL_PAIRS_KEY: &str = "all_pairs";

/// Landsat Collection-2 SR scale applied before comparing with Sentinel-2.
pub const LANDSAT_C2_SCALE: f64 = 0.275;
pub const LANDSAT_C2_OFFSET: f64 = -2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandMetrics {
    pub abs_dif_mean: f64,
    pub rel_abs_perc_mean: f64,
}

/// Metrics keyed by pair key then band, plus the `all_pairs` summary once finalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    #[serde(flatten)]
    pub pairs: BTreeMap<String, BTreeMap<String, BandMetrics>>,
    #[serde(rename = "all_pairs", default, skip_serializing_if = "Option::is_none")]
    pub all_pairs: Option<BTreeMap<String, BandMetrics>>,
}

impl ComparisonMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the metrics of one band of one pair, creating the pair entry if needed.
    pub fn add_comparison(&mut self, pair_key: &str, band: &str, metrics: BandMetrics) {
        self.pairs
            .entry(pair_key.to_string())
            .or_default()
            .insert(band.to_string(), metrics);
    }

    pub fn get(&self, pair_key: &str, band: &str) -> Option<&BandMetrics> {
        self.pairs.get(pair_key).and_then(|bands| bands.get(band))
    }
}

/// Null out pixels that are negative in either array, in both arrays.
pub fn screen_negatives(arr1: &mut Array2<f64>, arr2: &mut Array2<f64>) {
    Zip::from(arr1).and(arr2).for_each(|a, b| {
        if *a < 0.0 || *b < 0.0 {
            *a = f64::NAN;
            *b = f64::NAN;
        }
    });
}

/// Mean over the non-NaN values; NaN when there are none.
pub fn nanmean<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

/// Convert Landsat Collection-2 SR digital numbers in place.
pub fn rescale_landsat_c2(arr: &mut Array2<f64>) {
    arr.mapv_inplace(|v| v * LANDSAT_C2_SCALE + LANDSAT_C2_OFFSET);
}

/// Mean absolute difference and mean relative absolute difference (percent)
/// between two aligned arrays, after negative-value screening.
pub fn compare(mut arr1: Array2<f64>, mut arr2: Array2<f64>) -> Result<BandMetrics> {
    if arr1.dim() != arr2.dim() {
        return Err(Error::Alignment(format!(
            "cannot compare arrays of shape {:?} and {:?}",
            arr1.dim(),
            arr2.dim()
        )));
    }
    screen_negatives(&mut arr1, &mut arr2);

    let abs_dif = Zip::from(&arr1).and(&arr2).map_collect(|a, b| (a - b).abs());
    let abs_dif_mean = nanmean(abs_dif.iter());

    let relative = Zip::from(&abs_dif)
        .and(&arr1)
        .and(&arr2)
        .map_collect(|d, a, b| {
            let abs_sum = (a + b).abs();
            if abs_sum != 0.0 { 2.0 * d / abs_sum } else { 0.0 }
        });
    let rel_abs_perc_mean = nanmean(relative.iter()) * 100.0;

    Ok(BandMetrics {
        abs_dif_mean,
        rel_abs_perc_mean,
    })
}

/// Per band, the unweighted mean of each pair's means, stored under `all_pairs`.
///
/// Pairs or bands missing from `metrics` are left out of the mean.
pub fn calc_all_pairs<B: AsRef<str>, P: AsRef<str>>(
    metrics: &mut ComparisonMetrics,
    bands: &[B],
    pair_keys: &[P],
) {
    let mut summary = BTreeMap::new();
    for band in bands {
        let band = band.as_ref();
        let entries: Vec<BandMetrics> = pair_keys
            .iter()
            .filter_map(|key| metrics.get(key.as_ref(), band).copied())
            .collect();
        let abs: Vec<f64> = entries.iter().map(|m| m.abs_dif_mean).collect();
        let rel: Vec<f64> = entries.iter().map(|m| m.rel_abs_perc_mean).collect();
        summary.insert(
            band.to_string(),
            BandMetrics {
                abs_dif_mean: nanmean(abs.iter()),
                rel_abs_perc_mean: nanmean(rel.iter()),
            },
        );
    }
    info!("{}: {:?}", ALL_PAIRS_KEY, summary);
    metrics.all_pairs = Some(summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn identical_arrays_have_zero_difference() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let m = compare(a.clone(), a).unwrap();
        assert_eq!(m.abs_dif_mean, 0.0);
        assert_eq!(m.rel_abs_perc_mean, 0.0);
    }

    #[test]
    fn negatives_are_screened_in_both_arrays() {
        let mut a = array![[-1.0, 2.0, 3.0]];
        let mut b = array![[5.0, 6.0, 7.0]];
        screen_negatives(&mut a, &mut b);
        assert!(a[[0, 0]].is_nan());
        assert!(b[[0, 0]].is_nan());

        let m = compare(array![[-1.0, 2.0, 3.0]], array![[5.0, 6.0, 7.0]]).unwrap();
        assert_relative_eq!(m.abs_dif_mean, 4.0);
        let expected = (2.0 * 4.0 / 8.0 + 2.0 * 4.0 / 10.0) / 2.0 * 100.0;
        assert_relative_eq!(m.rel_abs_perc_mean, expected);
    }

    #[test]
    fn screening_applies_from_second_array_too() {
        let m = compare(array![[5.0, 6.0, 7.0]], array![[1.0, -2.0, 3.0]]).unwrap();
        assert_relative_eq!(m.abs_dif_mean, 4.0);
    }

    #[test]
    fn constant_offset_matches_reference_values() {
        let a = Array2::from_elem((3, 3), 100.0);
        let b = Array2::from_elem((3, 3), 110.0);
        let m = compare(a, b).unwrap();
        assert_relative_eq!(m.abs_dif_mean, 10.0);
        assert_relative_eq!(m.rel_abs_perc_mean, 2.0 * 10.0 / 210.0 * 100.0, epsilon = 1e-12);
        assert_relative_eq!(m.rel_abs_perc_mean, 9.5238, epsilon = 1e-4);
    }

    #[test]
    fn absolute_difference_is_commutative() {
        let a = array![[10.0, 20.0, 0.0], [5.0, 8.0, 1.0]];
        let b = array![[12.0, 15.0, 0.0], [9.0, 8.0, 3.0]];
        let ab = compare(a.clone(), b.clone()).unwrap();
        let ba = compare(b, a).unwrap();
        assert_relative_eq!(ab.abs_dif_mean, ba.abs_dif_mean);
    }

    #[test]
    fn zero_sum_pixels_count_as_zero_relative_difference() {
        let m = compare(array![[0.0, 10.0]], array![[0.0, 30.0]]).unwrap();
        assert_relative_eq!(m.abs_dif_mean, 10.0);
        assert_relative_eq!(m.rel_abs_perc_mean, (0.0 + 2.0 * 20.0 / 40.0) / 2.0 * 100.0);
    }

    #[test]
    fn masked_pixels_are_ignored() {
        let m = compare(array![[f64::NAN, 4.0]], array![[1.0, 2.0]]).unwrap();
        assert_relative_eq!(m.abs_dif_mean, 2.0);
        let m = compare(array![[f64::NAN]], array![[1.0]]).unwrap();
        assert!(m.abs_dif_mean.is_nan());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        assert!(compare(Array2::zeros((2, 2)), Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn landsat_rescale_uses_collection2_coefficients() {
        let mut a = array![[10000.0, f64::NAN]];
        rescale_landsat_c2(&mut a);
        assert_relative_eq!(a[[0, 0]], 750.0);
        assert!(a[[0, 1]].is_nan());
    }

    #[test]
    fn all_pairs_is_mean_of_means() {
        let mut metrics = ComparisonMetrics::new();
        metrics.add_comparison("a_x_b", "B1", BandMetrics { abs_dif_mean: 4.0, rel_abs_perc_mean: 1.0 });
        metrics.add_comparison("c_x_d", "B1", BandMetrics { abs_dif_mean: 6.0, rel_abs_perc_mean: 3.0 });
        calc_all_pairs(&mut metrics, &["B1"], &["a_x_b", "c_x_d"]);
        let all = metrics.all_pairs.as_ref().unwrap();
        assert_relative_eq!(all["B1"].abs_dif_mean, 5.0);
        assert_relative_eq!(all["B1"].rel_abs_perc_mean, 2.0);
    }

    #[test]
    fn all_pairs_skips_nan_pair_means() {
        let mut metrics = ComparisonMetrics::new();
        metrics.add_comparison("a_x_b", "B1", BandMetrics { abs_dif_mean: f64::NAN, rel_abs_perc_mean: f64::NAN });
        metrics.add_comparison("c_x_d", "B1", BandMetrics { abs_dif_mean: 6.0, rel_abs_perc_mean: 3.0 });
        calc_all_pairs(&mut metrics, &["B1"], &["a_x_b", "c_x_d"]);
        assert_relative_eq!(metrics.all_pairs.unwrap()["B1"].abs_dif_mean, 6.0);
    }

    #[test]
    fn metrics_serialize_as_nested_mapping() {
        let mut metrics = ComparisonMetrics::new();
        metrics.add_comparison("a_x_b", "B4", BandMetrics { abs_dif_mean: 1.5, rel_abs_perc_mean: 2.5 });
        calc_all_pairs(&mut metrics, &["B4"], &["a_x_b"]);
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["a_x_b"]["B4"]["abs_dif_mean"], 1.5);
        assert_eq!(value[ALL_PAIRS_KEY]["B4"]["rel_abs_perc_mean"], 2.5);
    }
}
