//! Scene identifier parsing.
//!
//! Landsat Collection-2 ids look like `LC08_L2SP_220069_20190707_20200827_02_T1`
//! (path/row in the 3rd token, sensing date in the 4th). Sentinel-2 ids look like
//! `S2A_MSIL1C_20190707T131251_N0207_R138_T23KMQ_20190707T145006[.SAFE]`
//! (sensing timestamp in the 3rd token, relative orbit in the 5th).
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::Sensor;

const LANDSAT_TOKENS: usize = 7;
const SENTINEL2_TOKENS: usize = 7;

/// Identity of a scene, derived purely from its id string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneIdentity {
    pub raw_id: String,
    /// Sensing time; Landsat scenes sit at midnight of their acquisition date.
    pub sensing_time: NaiveDateTime,
    /// WRS-2 path/row code (Landsat) or relative orbit number (Sentinel-2).
    pub orbit_or_tile: u32,
    pub sensor: Sensor,
}

impl SceneIdentity {
    /// Parse a scene id with the token layout of `sensor`.
    pub fn parse(raw_id: &str, sensor: Sensor) -> Result<Self> {
        match sensor {
            Sensor::L8 => parse_landsat(raw_id),
            Sensor::S2 => parse_sentinel2(raw_id),
        }
    }

    pub fn sensing_date(&self) -> NaiveDate {
        self.sensing_time.date()
    }

    /// Calendar days separating the sensing dates of two scenes.
    pub fn days_apart(&self, other: &SceneIdentity) -> i64 {
        (self.sensing_date() - other.sensing_date()).num_days().abs()
    }
}

impl std::fmt::Display for SceneIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw_id)
    }
}

fn tokens(raw_id: &str, expected: usize) -> Result<Vec<&str>> {
    let parts: Vec<&str> = raw_id.split('_').collect();
    if parts.len() != expected {
        return Err(Error::malformed(
            raw_id,
            format!("expected {} underscore-separated tokens, got {}", expected, parts.len()),
        ));
    }
    Ok(parts)
}

fn parse_number(raw_id: &str, token: &str, what: &str) -> Result<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::malformed(raw_id, format!("{} `{}` is not numeric", what, token)));
    }
    token
        .parse::<u32>()
        .map_err(|e| Error::malformed(raw_id, format!("{} `{}`: {}", what, token, e)))
}

fn parse_landsat(raw_id: &str) -> Result<SceneIdentity> {
    let parts = tokens(raw_id, LANDSAT_TOKENS)?;
    let orbit_or_tile = parse_number(raw_id, parts[2], "path/row")?;

    let date_token = parts[3];
    if date_token.len() != 8 || !date_token.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::malformed(raw_id, format!("`{}` is not a YYYYMMDD date", date_token)));
    }
    let date = NaiveDate::parse_from_str(date_token, "%Y%m%d")
        .map_err(|e| Error::malformed(raw_id, format!("date `{}`: {}", date_token, e)))?;
    let sensing_time = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::malformed(raw_id, "invalid midnight"))?;

    Ok(SceneIdentity {
        raw_id: raw_id.to_string(),
        sensing_time,
        orbit_or_tile,
        sensor: Sensor::L8,
    })
}

fn parse_sentinel2(raw_id: &str) -> Result<SceneIdentity> {
    let parts = tokens(raw_id, SENTINEL2_TOKENS)?;

    let stamp = parts[2];
    if stamp.len() != 15 {
        return Err(Error::malformed(
            raw_id,
            format!("`{}` is not a YYYYMMDDTHHMMSS timestamp", stamp),
        ));
    }
    let sensing_time = NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S")
        .map_err(|e| Error::malformed(raw_id, format!("timestamp `{}`: {}", stamp, e)))?;

    let orbit_token = parts[4];
    let mut chars = orbit_token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => {
            return Err(Error::malformed(
                raw_id,
                format!("relative orbit `{}` lacks its letter prefix", orbit_token),
            ));
        }
    }
    let orbit_or_tile = parse_number(raw_id, chars.as_str(), "relative orbit")?;

    Ok(SceneIdentity {
        raw_id: raw_id.to_string(),
        sensing_time,
        orbit_or_tile,
        sensor: Sensor::S2,
    })
}
