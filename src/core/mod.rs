//! Core validation building blocks: scene identity and pairing, raster
//! alignment, validity masks, comparison statistics and the generic routine
//! tying them together. These are consumed by the high-level `api` module.
pub mod align;
pub mod masking;
pub mod pairing;
pub mod params;
pub mod raster;
pub mod routine;
pub mod scene;
pub mod stats;
