//! Temporal pairing of scenes.
//!
//! Same-sensor pairing only looks at neighbours in the date-sorted list and keeps
//! those acquired from a different orbit; cross-sensor pairing scans the full
//! product of both lists with no orbit constraint.
use serde::Serialize;
use tracing::debug;

use crate::core::scene::SceneIdentity;
use crate::error::Result;
use crate::types::{PairKind, Sensor};

/// Default threshold for Landsat-8 only pairing.
pub const L8_DAY_DIFFERENCE: i64 = 10;
/// Default threshold for Sentinel-2 only pairing.
pub const S2_DAY_DIFFERENCE: i64 = 5;
/// Default threshold for Landsat-8 x Sentinel-2 pairing.
pub const CROSS_SENSOR_DAY_DIFFERENCE: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenePair {
    pub left: SceneIdentity,
    pub right: SceneIdentity,
    pub kind: PairKind,
}

impl ScenePair {
    /// Key used for this pair in the comparison metrics.
    pub fn key(&self) -> String {
        format!("{}_x_{}", self.left.raw_id, self.right.raw_id)
    }
}

impl std::fmt::Display for ScenePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.left.raw_id, self.right.raw_id)
    }
}

/// Parse every id of a list with the layout of `sensor`.
pub fn parse_scene_ids<S: AsRef<str>>(ids: &[S], sensor: Sensor) -> Result<Vec<SceneIdentity>> {
    ids.iter()
        .map(|id| SceneIdentity::parse(id.as_ref(), sensor))
        .collect()
}

/// Stable ascending sort on sensing time.
pub fn sort_by_date(mut ids: Vec<SceneIdentity>) -> Vec<SceneIdentity> {
    ids.sort_by_key(|id| id.sensing_time);
    ids
}

pub fn pair_same_sensor(ids: &[SceneIdentity], day_diff: i64) -> Vec<ScenePair> {
    let sorted = sort_by_date(ids.to_vec());
    let mut pairs = Vec::new();
    for window in sorted.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if a.days_apart(b) < day_diff && a.orbit_or_tile != b.orbit_or_tile {
            debug!("Pairing {} with {}", a.raw_id, b.raw_id);
            pairs.push(ScenePair {
                left: a.clone(),
                right: b.clone(),
                kind: PairKind::SameSensor,
            });
        }
    }
    pairs
}

pub fn pair_cross_sensor(
    ids_a: &[SceneIdentity],
    ids_b: &[SceneIdentity],
    day_diff: i64,
) -> Vec<ScenePair> {
    let sorted_a = sort_by_date(ids_a.to_vec());
    let sorted_b = sort_by_date(ids_b.to_vec());
    let mut pairs = Vec::new();
    for a in &sorted_a {
        for b in &sorted_b {
            if a.days_apart(b) < day_diff {
                debug!("Pairing {} with {}", a.raw_id, b.raw_id);
                pairs.push(ScenePair {
                    left: a.clone(),
                    right: b.clone(),
                    kind: PairKind::CrossSensor,
                });
            }
        }
    }
    pairs
}

/// Parse and pair Landsat-8 ids.
pub fn search_pairs_l8<S: AsRef<str>>(ids: &[S], day_diff: i64) -> Result<Vec<ScenePair>> {
    let parsed = parse_scene_ids(ids, Sensor::L8)?;
    Ok(pair_same_sensor(&parsed, day_diff))
}

/// Parse and pair Sentinel-2 ids.
pub fn search_pairs_s2<S: AsRef<str>>(ids: &[S], day_diff: i64) -> Result<Vec<ScenePair>> {
    let parsed = parse_scene_ids(ids, Sensor::S2)?;
    Ok(pair_same_sensor(&parsed, day_diff))
}

/// Parse and pair Landsat-8 ids with Sentinel-2 ids.
pub fn search_pairs_l8_s2<A: AsRef<str>, B: AsRef<str>>(
    l8_ids: &[A],
    s2_ids: &[B],
    day_diff: i64,
) -> Result<Vec<ScenePair>> {
    let l8 = parse_scene_ids(l8_ids, Sensor::L8)?;
    let s2 = parse_scene_ids(s2_ids, Sensor::S2)?;
    Ok(pair_cross_sensor(&l8, &s2, day_diff))
}
