#![doc = r#"
radval - cross-sensor radiometric validation of Landsat-8 and Sentinel-2 products.

Given surface-reflectance or NBAR outputs of several processing chains (Landsat
Collection-2, Sen2Cor, LaSRC), radval pairs scenes acquired close in time, aligns
their rasters on the common footprint, removes cloudy and invalid pixels using the
sensors' quality layers, and reports per-band mean absolute and relative
differences for every pair plus an `all_pairs` summary.

Requirements
------------
- GDAL development headers and runtime (the `gdalwarp` executable is used when two
  rasters are in different coordinate systems).
- Rust 2024 edition toolchain.

Run a validation from a JSON configuration
------------------------------------------
```rust,no_run
use std::path::Path;

fn main() -> radval::Result<()> {
    let report = radval::run_validation_from_files(
        Path::new("/data/sr_l8.json"),
        Path::new("/data/l8_scenes.txt"),
        None,
    )?;
    println!("{} pairs -> {}", report.evaluated, report.output_path.display());
    Ok(())
}
```

Build parameters in code
------------------------
```rust,no_run
use std::path::PathBuf;
use radval::{ValidationParams, ValidationRoutine, run_validation};

fn main() -> radval::Result<()> {
    let params = ValidationParams {
        routine: ValidationRoutine::SrL8S2Lasrc,
        left_input_dir: PathBuf::from("/data/l8/sr"),
        left_cloud_dir: PathBuf::from("/data/l8/sr"),
        right_input_dir: Some(PathBuf::from("/data/s2/lasrc")),
        right_cloud_dir: Some(PathBuf::from("/data/s2/sen2cor")),
        output_dir: PathBuf::from("/out"),
        bands: vec!["B4".into(), "B5".into()],
        bands10m: vec![],
        bands20m: vec![],
        bands_s2: vec!["B04".into(), "B8A".into()],
        day_difference: None,
        rescale: None,
        continue_on_error: true,
    };
    let l8 = ["LC08_L2SP_220069_20190707_20200827_02_T1"];
    let s2 = ["S2A_MSIL1C_20190709T131251_N0207_R138_T23KMQ_20190709T145006"];
    let report = run_validation(&params, &l8, &s2)?;
    for (pair, reason) in &report.failed {
        eprintln!("skipped {pair}: {reason}");
    }
    Ok(())
}
```

Building blocks
---------------
```rust
use ndarray::array;
use radval::core::stats::compare;

let m = compare(array![[100.0, 100.0]], array![[110.0, 110.0]]).unwrap();
assert_eq!(m.abs_dif_mean, 10.0);
```

Error handling
--------------
All public functions return `radval::Result<T>`; match on `radval::Error` to tell a
malformed scene id, a data-layout mismatch, a raster read failure or a
configuration problem apart.

Useful modules
--------------
- [`api`] - high-level entry points.
- [`core`] - scene ids, pairing, alignment, masking, statistics.
- [`io`] - GDAL reader, warping, product layouts, writers.
- [`types`] - sensors, product families and the routine catalogue.
- [`error`] - crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Types
pub use crate::core::params::{BandEntry, ValidationParams, ValidationPlan};
pub use crate::core::scene::SceneIdentity;
pub use crate::core::pairing::ScenePair;
pub use crate::core::stats::{BandMetrics, ComparisonMetrics};
pub use crate::error::{Error, Result};
pub use crate::types::{PairKind, ProductFamily, Sensor, ValidationRoutine};

// Readers and layouts
pub use crate::io::gdal::{GdalRaster, RasterError};
pub use crate::io::layout::{BandPathResolver, CloudPathResolver};
pub use crate::io::scene_list::load_scene_ids;

// High-level API re-exports
pub use crate::api::{
    ValidationReport, find_pairs, run_validation, run_validation_from_files, validate_pairs,
};
