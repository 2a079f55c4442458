use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::raster::{GeoTransform, GridMeta, RasterSource, Window};

/// Errors encountered while reading or warping rasters
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
    #[error("Window {window:?} exceeds raster of {width}x{height}")]
    WindowOutOfBounds {
        window: Window,
        width: usize,
        height: usize,
    },
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: GdalCrateError,
    },
    #[error("Warp failed: {0}")]
    Warp(String),
}

// Helper to extract EPSG code from WKT authority tag
pub(crate) fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

/// Normalize a projection string to `EPSG:XXXX` when possible
pub(crate) fn normalize_crs(proj: String) -> String {
    if proj.starts_with("EPSG:") {
        proj
    } else if let Some(code) = parse_epsg(&proj) {
        code
    } else {
        proj
    }
}

/// Single-band raster file opened through GDAL.
///
/// Only the georeferencing is read on open; pixels are read per window, so a
/// comparison never holds more than the intersection footprint in memory.
pub struct GdalRaster {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub meta: GridMeta,
}

impl GdalRaster {
    /// Open a GDAL-supported raster (GeoTIFF, JPEG2000, ...)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path = path.as_ref().to_path_buf();
        let dataset = Dataset::open(&path).map_err(|source| RasterError::Open {
            path: path.clone(),
            source,
        })?;
        let (width, height) = dataset.raster_size();
        if dataset.raster_count() == 0 {
            return Err(RasterError::UnsupportedFormat(format!(
                "No raster bands found in {}",
                path.display()
            )));
        }
        let geotransform = dataset.geo_transform()?;
        let transform = GeoTransform::from_gdal(geotransform);
        if !transform.is_north_up() {
            return Err(RasterError::UnsupportedFormat(format!(
                "{} is not a north-up raster",
                path.display()
            )));
        }
        let nodata = dataset.rasterband(1)?.no_data_value();
        let crs = normalize_crs(dataset.projection());
        debug!(
            "Opened {} ({}x{}, {}, res {:?})",
            path.display(),
            width,
            height,
            crs,
            transform.resolution()
        );
        Ok(GdalRaster {
            path,
            dataset,
            meta: GridMeta {
                width,
                height,
                transform,
                crs,
                nodata,
            },
        })
    }
}

impl RasterSource for GdalRaster {
    fn meta(&self) -> &GridMeta {
        &self.meta
    }

    fn read_window(&self, window: Window) -> Result<Array2<f64>, RasterError> {
        if !window.fits(&self.meta) {
            return Err(RasterError::WindowOutOfBounds {
                window,
                width: self.meta.width,
                height: self.meta.height,
            });
        }
        let band = self.dataset.rasterband(1)?;
        let size = (window.width, window.height);
        let buf = band.read_as::<f64>(
            (window.col_off as isize, window.row_off as isize),
            size,
            size,
            None,
        )?;
        let data_vec = buf.data().to_vec();
        let got = data_vec.len();
        Array2::from_shape_vec((window.height, window.width), data_vec).map_err(|_| {
            RasterError::DimensionMismatch(window.width, window.height, got, 1)
        })
    }
}
