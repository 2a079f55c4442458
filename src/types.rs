//! Shared types and enums used across radval.
//! Includes `Sensor`, `PairKind`, `ProductFamily`, `CloudProduct`,
//! `ResolutionPolicy` and the `ValidationRoutine` catalogue.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sentinel-2 bands delivered at 10 m.
pub const S2_BANDS_10M: &[&str] = &["B02", "B03", "B04", "B08"];
/// Sentinel-2 bands delivered at 20 m.
pub const S2_BANDS_20M: &[&str] = &["B05", "B06", "B07", "B8A", "B11", "B12"];
/// Sentinel-2 bands delivered at 60 m.
pub const S2_BANDS_60M: &[&str] = &["B01", "B09"];

/// Landsat-8 OLI native pixel size in metres.
pub const LANDSAT_RESOLUTION: u32 = 30;
/// Common grid used for cross-sensor and LaSRC comparisons.
pub const COMMON_RESOLUTION: u32 = 10;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Sensor {
    L8,
    S2,
}

impl Sensor {
    /// Guess the sensor from the mission prefix of a scene id.
    pub fn detect(scene_id: &str) -> Option<Sensor> {
        if scene_id.starts_with("LC08") || scene_id.starts_with("LC8") {
            Some(Sensor::L8)
        } else if scene_id.starts_with("S2") {
            Some(Sensor::S2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::L8 => write!(f, "L8"),
            Sensor::S2 => write!(f, "S2"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairKind {
    SameSensor,
    CrossSensor,
}

/// Output layout of an external processing chain.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
    LandsatSr,
    LandsatNbar,
    Sentinel2Sen2corSr,
    Sentinel2Sen2corNbar,
    Sentinel2LasrcSr,
    Sentinel2LasrcNbar,
}

impl ProductFamily {
    pub fn sensor(self) -> Sensor {
        match self {
            ProductFamily::LandsatSr | ProductFamily::LandsatNbar => Sensor::L8,
            _ => Sensor::S2,
        }
    }

    /// Cloud product paired with scenes of this family.
    pub fn cloud_product(self) -> CloudProduct {
        match self.sensor() {
            Sensor::L8 => CloudProduct::LandsatQa,
            Sensor::S2 => CloudProduct::SceneClassification,
        }
    }
}

impl std::fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductFamily::LandsatSr => "Landsat SR",
            ProductFamily::LandsatNbar => "Landsat NBAR",
            ProductFamily::Sentinel2Sen2corSr => "Sentinel-2 Sen2Cor SR",
            ProductFamily::Sentinel2Sen2corNbar => "Sentinel-2 Sen2Cor NBAR",
            ProductFamily::Sentinel2LasrcSr => "Sentinel-2 LaSRC SR",
            ProductFamily::Sentinel2LasrcNbar => "Sentinel-2 LaSRC NBAR",
        };
        write!(f, "{}", s)
    }
}

/// Per-pixel quality product used to build a validity mask.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CloudProduct {
    /// Landsat Collection-2 `QA_PIXEL` bit flags.
    LandsatQa,
    /// Sentinel-2 L2A Scene Classification Layer (20 m).
    SceneClassification,
}

/// Grid on which a routine compares a band.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ResolutionPolicy {
    /// Keep the rasters on their native grids.
    Native,
    /// Use the native resolution of the band being compared.
    BandNative,
    /// Resample everything to a fixed pixel size.
    Fixed(u32),
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRoutine {
    SrL8,
    NbarL8,
    SrS2Sen2cor,
    NbarS2Sen2cor,
    SrS2Lasrc,
    NbarS2Lasrc,
    SrL8S2Sen2cor,
    SrL8S2Lasrc,
    NbarL8S2Sen2cor,
    NbarL8S2Lasrc,
}

impl ValidationRoutine {
    pub fn name(self) -> &'static str {
        match self {
            ValidationRoutine::SrL8 => "sr_l8",
            ValidationRoutine::NbarL8 => "nbar_l8",
            ValidationRoutine::SrS2Sen2cor => "sr_s2_sen2cor",
            ValidationRoutine::NbarS2Sen2cor => "nbar_s2_sen2cor",
            ValidationRoutine::SrS2Lasrc => "sr_s2_lasrc",
            ValidationRoutine::NbarS2Lasrc => "nbar_s2_lasrc",
            ValidationRoutine::SrL8S2Sen2cor => "sr_l8_s2_sen2cor",
            ValidationRoutine::SrL8S2Lasrc => "sr_l8_s2_lasrc",
            ValidationRoutine::NbarL8S2Sen2cor => "nbar_l8_s2_sen2cor",
            ValidationRoutine::NbarL8S2Lasrc => "nbar_l8_s2_lasrc",
        }
    }

    pub fn left_family(self) -> ProductFamily {
        match self {
            ValidationRoutine::SrL8
            | ValidationRoutine::SrL8S2Sen2cor
            | ValidationRoutine::SrL8S2Lasrc => ProductFamily::LandsatSr,
            ValidationRoutine::NbarL8
            | ValidationRoutine::NbarL8S2Sen2cor
            | ValidationRoutine::NbarL8S2Lasrc => ProductFamily::LandsatNbar,
            ValidationRoutine::SrS2Sen2cor => ProductFamily::Sentinel2Sen2corSr,
            ValidationRoutine::NbarS2Sen2cor => ProductFamily::Sentinel2Sen2corNbar,
            ValidationRoutine::SrS2Lasrc => ProductFamily::Sentinel2LasrcSr,
            ValidationRoutine::NbarS2Lasrc => ProductFamily::Sentinel2LasrcNbar,
        }
    }

    pub fn right_family(self) -> ProductFamily {
        match self {
            ValidationRoutine::SrL8S2Sen2cor => ProductFamily::Sentinel2Sen2corSr,
            ValidationRoutine::SrL8S2Lasrc => ProductFamily::Sentinel2LasrcSr,
            ValidationRoutine::NbarL8S2Sen2cor => ProductFamily::Sentinel2Sen2corNbar,
            ValidationRoutine::NbarL8S2Lasrc => ProductFamily::Sentinel2LasrcNbar,
            other => other.left_family(),
        }
    }

    pub fn is_cross_sensor(self) -> bool {
        self.left_family().sensor() != self.right_family().sensor()
    }

    pub fn pair_kind(self) -> PairKind {
        if self.is_cross_sensor() {
            PairKind::CrossSensor
        } else {
            PairKind::SameSensor
        }
    }

    /// Pairing threshold used when the configuration leaves it unset.
    pub fn default_day_difference(self) -> i64 {
        match self {
            ValidationRoutine::SrL8 | ValidationRoutine::NbarL8 => 10,
            _ => 5,
        }
    }

    pub fn resolution_policy(self) -> ResolutionPolicy {
        match self {
            ValidationRoutine::SrL8 | ValidationRoutine::NbarL8 => ResolutionPolicy::Native,
            ValidationRoutine::SrS2Sen2cor | ValidationRoutine::NbarS2Sen2cor => {
                ResolutionPolicy::BandNative
            }
            _ => ResolutionPolicy::Fixed(COMMON_RESOLUTION),
        }
    }

    /// Name of the subdirectory receiving this routine's results.
    pub fn output_subdir(self) -> String {
        format!("validation_{}", self.name())
    }

    pub fn output_file_name(self) -> String {
        format!("comparison_metrics_{}.json", self.name())
    }
}

impl std::fmt::Display for ValidationRoutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_serde_names_match_output_names() {
        for routine in ValidationRoutine::value_variants() {
            let json = serde_json::to_string(routine).unwrap();
            assert_eq!(json, format!("\"{}\"", routine.name()));
        }
    }

    #[test]
    fn cross_sensor_routines_pair_landsat_with_sentinel() {
        let r = ValidationRoutine::NbarL8S2Lasrc;
        assert!(r.is_cross_sensor());
        assert_eq!(r.left_family().sensor(), Sensor::L8);
        assert_eq!(r.right_family(), ProductFamily::Sentinel2LasrcNbar);
        assert_eq!(r.resolution_policy(), ResolutionPolicy::Fixed(10));
        assert!(!ValidationRoutine::SrS2Lasrc.is_cross_sensor());
    }

    #[test]
    fn landsat_only_routines_default_to_ten_days() {
        assert_eq!(ValidationRoutine::SrL8.default_day_difference(), 10);
        assert_eq!(ValidationRoutine::SrS2Sen2cor.default_day_difference(), 5);
        assert_eq!(ValidationRoutine::SrL8S2Lasrc.default_day_difference(), 5);
    }

    #[test]
    fn sensor_detection_uses_mission_prefix() {
        assert_eq!(Sensor::detect("LC08_L2SP_220069_20190707_20200827_02_T1"), Some(Sensor::L8));
        assert_eq!(
            Sensor::detect("S2A_MSIL1C_20190707T131251_N0207_R138_T23KMQ_20190707T145006"),
            Some(Sensor::S2)
        );
        assert_eq!(Sensor::detect("MOD09GA.A2019188"), None);
    }
}
