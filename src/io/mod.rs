//! I/O layer: GDAL-backed raster reading and warping, the on-disk layout of
//! each processing chain, scene lists, and `writers` for GeoTIFF scratch
//! rasters and the comparison metrics file.
pub mod gdal;
pub use self::gdal::{GdalRaster, RasterError};

pub mod layout;
pub mod scene_list;
pub mod warp;
pub mod writers;
