//! In-memory raster grids and the `RasterSource` abstraction shared by the
//! GDAL reader and resampled/reprojected grids.
use ndarray::{Array2, s};

use crate::io::RasterError;

/// North-up affine geotransform.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height   (pixel_height < 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Build from GDAL order `[origin_x, pixel_width, rot, origin_y, rot, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Absolute pixel size as `(x, y)`.
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-10 && self.col_rotation.abs() < 1e-10 && self.pixel_height < 0.0
    }
}

/// Geographic footprint `(xmin, ymin, xmax, ymax)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    /// Overlap of two footprints, `None` when they only touch or are disjoint.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let b = Bounds {
            xmin: self.xmin.max(other.xmin),
            ymin: self.ymin.max(other.ymin),
            xmax: self.xmax.min(other.xmax),
            ymax: self.ymax.min(other.ymax),
        };
        if b.xmin < b.xmax && b.ymin < b.ymax {
            Some(b)
        } else {
            None
        }
    }
}

/// Georeferencing shared by every raster representation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMeta {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    /// `EPSG:XXXX` when an authority code is known, WKT otherwise.
    pub crs: String,
    pub nodata: Option<f64>,
}

impl GridMeta {
    pub fn bounds(&self) -> Bounds {
        let gt = &self.transform;
        let x0 = gt.origin_x;
        let x1 = gt.origin_x + self.width as f64 * gt.pixel_width;
        let y0 = gt.origin_y;
        let y1 = gt.origin_y + self.height as f64 * gt.pixel_height;
        Bounds {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        }
    }

    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    pub fn same_crs(&self, other: &GridMeta) -> bool {
        self.crs.eq_ignore_ascii_case(&other.crs)
    }
}

/// Pixel window `(col_off, row_off, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn full(meta: &GridMeta) -> Self {
        Window {
            col_off: 0,
            row_off: 0,
            width: meta.width,
            height: meta.height,
        }
    }

    pub fn fits(&self, meta: &GridMeta) -> bool {
        self.col_off + self.width <= meta.width && self.row_off + self.height <= meta.height
    }
}

/// Anything that can hand out georeferenced pixel windows as `f64`.
pub trait RasterSource {
    fn meta(&self) -> &GridMeta;

    /// Read `window` as a `(height, width)` array.
    fn read_window(&self, window: Window) -> Result<Array2<f64>, RasterError>;

    /// Materialize the whole raster in memory.
    fn load(&self) -> Result<RasterGrid, RasterError> {
        let meta = self.meta().clone();
        let data = self.read_window(Window::full(&meta))?;
        Ok(RasterGrid { data, meta })
    }
}

/// A raster fully held in memory; used for resampled and reprojected products.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub data: Array2<f64>,
    pub meta: GridMeta,
}

impl RasterGrid {
    pub fn new(
        data: Array2<f64>,
        transform: GeoTransform,
        crs: impl Into<String>,
        nodata: Option<f64>,
    ) -> Self {
        let (height, width) = data.dim();
        RasterGrid {
            data,
            meta: GridMeta {
                width,
                height,
                transform,
                crs: crs.into(),
                nodata,
            },
        }
    }
}

impl RasterSource for RasterGrid {
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
        Ok(self
            .data
            .slice(s![
                window.row_off..window.row_off + window.height,
                window.col_off..window.col_off + window.width
            ])
            .to_owned())
    }

    fn load(&self) -> Result<RasterGrid, RasterError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounds_of_north_up_grid() {
        let grid = RasterGrid::new(
            Array2::zeros((4, 5)),
            GeoTransform::new(100.0, 200.0, 10.0, -10.0),
            "EPSG:32723",
            None,
        );
        let b = grid.meta.bounds();
        assert_relative_eq!(b.xmin, 100.0);
        assert_relative_eq!(b.xmax, 150.0);
        assert_relative_eq!(b.ymin, 160.0);
        assert_relative_eq!(b.ymax, 200.0);
        assert!(grid.meta.transform.is_north_up());
    }

    #[test]
    fn gdal_coefficients_roundtrip() {
        let coeffs = [300000.0, 30.0, 0.0, 7800000.0, 0.0, -30.0];
        assert_eq!(GeoTransform::from_gdal(coeffs).to_gdal(), coeffs);
    }

    #[test]
    fn window_reads_are_bounded() {
        let data = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f64);
        let grid = RasterGrid::new(data, GeoTransform::new(0.0, 3.0, 1.0, -1.0), "EPSG:4326", None);
        let win = grid
            .read_window(Window { col_off: 1, row_off: 1, width: 2, height: 2 })
            .unwrap();
        assert_eq!(win, ndarray::array![[4.0, 5.0], [7.0, 8.0]]);
        assert!(grid
            .read_window(Window { col_off: 2, row_off: 0, width: 2, height: 1 })
            .is_err());
    }

    #[test]
    fn touching_footprints_do_not_intersect() {
        let a = Bounds { xmin: 0.0, ymin: 0.0, xmax: 10.0, ymax: 10.0 };
        let b = Bounds { xmin: 10.0, ymin: 0.0, xmax: 20.0, ymax: 10.0 };
        assert!(a.intersection(&b).is_none());
    }
}
