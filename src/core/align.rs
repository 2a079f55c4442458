//! Raster alignment: overlap windows between two grids and nearest-neighbour
//! resampling onto a new pixel size.
use ndarray::Array2;
use tracing::debug;

use crate::core::raster::{Bounds, GeoTransform, GridMeta, RasterGrid, RasterSource, Window};
use crate::error::{Error, Result};
use crate::io::warp;

/// Read the geographic overlap of two rasters as same-shape `f64` arrays.
///
/// `raster2` is warped onto `raster1`'s grid first when the two CRSs differ.
/// When only the pixel sizes differ, `raster2` is sampled (nearest neighbour)
/// at the centres of `raster1`'s overlap window, so both arrays come out at
/// `raster1`'s resolution.
pub fn intersect<A, B>(raster1: &A, raster2: &B) -> Result<(Array2<f64>, Array2<f64>)>
where
    A: RasterSource + ?Sized,
    B: RasterSource + ?Sized,
{
    let meta1 = raster1.meta();
    if !meta1.same_crs(raster2.meta()) {
        let warped = warp::reproject(raster2, meta1)?;
        return intersect_same_crs(raster1, &warped);
    }
    intersect_same_crs(raster1, raster2)
}

fn intersect_same_crs<A, B>(raster1: &A, raster2: &B) -> Result<(Array2<f64>, Array2<f64>)>
where
    A: RasterSource + ?Sized,
    B: RasterSource + ?Sized,
{
    let (meta1, meta2) = (raster1.meta(), raster2.meta());
    let overlap = meta1.bounds().intersection(&meta2.bounds()).ok_or_else(|| {
        Error::Alignment(format!(
            "rasters do not overlap: {:?} vs {:?}",
            meta1.bounds(),
            meta2.bounds()
        ))
    })?;

    let win1 = window_for(meta1, &overlap)?;
    if !same_resolution(meta1, meta2) {
        debug!(
            "Sampling {:?} raster onto {:?} window {:?}",
            meta2.resolution(),
            meta1.resolution(),
            win1
        );
        let arr1 = raster1.read_window(win1)?;
        let arr2 = sample_window(raster2, meta1, win1)?;
        return Ok((arr1, arr2));
    }

    let win2 = window_for(meta2, &overlap)?;
    debug!("Intersection windows {:?} / {:?}", win1, win2);
    if (win1.width, win1.height) != (win2.width, win2.height) {
        return Err(Error::Alignment(format!(
            "overlap windows differ in shape ({}x{} vs {}x{})",
            win1.width, win1.height, win2.width, win2.height
        )));
    }

    let arr1 = raster1.read_window(win1)?;
    let arr2 = raster2.read_window(win2)?;
    Ok((arr1, arr2))
}

fn same_resolution(a: &GridMeta, b: &GridMeta) -> bool {
    let ((ax, ay), (bx, by)) = (a.resolution(), b.resolution());
    (ax - bx).abs() < 1e-9 && (ay - by).abs() < 1e-9
}

/// Values of `src` at the pixel centres of `window` on the `target` grid.
fn sample_window<S: RasterSource + ?Sized>(
    src: &S,
    target: &GridMeta,
    window: Window,
) -> Result<Array2<f64>> {
    let source = src.load()?;
    let fill = source.meta.nodata.unwrap_or(f64::NAN);
    let gt = &target.transform;
    Ok(Array2::from_shape_fn((window.height, window.width), |(row, col)| {
        let x = gt.origin_x + ((window.col_off + col) as f64 + 0.5) * gt.pixel_width;
        let y = gt.origin_y + ((window.row_off + row) as f64 + 0.5) * gt.pixel_height;
        nearest(&source, x, y, fill)
    }))
}

/// Source value of the pixel containing `(x, y)`, `fill` outside the raster.
fn nearest(source: &RasterGrid, x: f64, y: f64, fill: f64) -> f64 {
    let gt = &source.meta.transform;
    let col = ((x - gt.origin_x) / gt.pixel_width).floor();
    let row = ((y - gt.origin_y) / gt.pixel_height).floor();
    if col < 0.0 || row < 0.0 {
        return fill;
    }
    source
        .data
        .get((row as usize, col as usize))
        .copied()
        .unwrap_or(fill)
}

/// Pixel window of `meta` covering `overlap`.
///
/// The overlap corners are moved half a pixel inwards before being converted
/// to row/column so that edges falling on pixel boundaries round stably.
pub fn window_for(meta: &GridMeta, overlap: &Bounds) -> Result<Window> {
    let (res_x, res_y) = meta.resolution();
    let full = meta.bounds();

    let p1x = overlap.xmin + res_x / 2.0;
    let p1y = overlap.ymax - res_y / 2.0;
    let p2x = overlap.xmax - res_x / 2.0;
    let p2y = overlap.ymin + res_y / 2.0;

    let col1 = ((p1x - full.xmin) / res_x).floor();
    let row1 = ((full.ymax - p1y) / res_y).floor();
    let col2 = ((p2x - full.xmin) / res_x).floor();
    let row2 = ((full.ymax - p2y) / res_y).floor();

    if col1 < 0.0 || row1 < 0.0 || col2 < col1 || row2 < row1 {
        return Err(Error::Alignment(format!(
            "overlap {:?} is smaller than one {}x{} pixel",
            overlap, res_x, res_y
        )));
    }
    let window = Window {
        col_off: col1 as usize,
        row_off: row1 as usize,
        width: (col2 - col1) as usize + 1,
        height: (row2 - row1) as usize + 1,
    };
    if !window.fits(meta) {
        return Err(Error::Alignment(format!(
            "window {:?} exceeds raster of {}x{}",
            window, meta.width, meta.height
        )));
    }
    Ok(window)
}

/// Resample `src` onto a `target_resolution` grid in its own CRS (nearest neighbour).
///
/// The output keeps the source footprint: origin at the upper-left corner and
/// dimensions rounded up. Cells falling outside the source get its nodata
/// value, or NaN when it has none.
pub fn resample<S: RasterSource + ?Sized>(src: &S, target_resolution: f64) -> Result<RasterGrid> {
    if target_resolution.is_nan() || target_resolution <= 0.0 {
        return Err(Error::config(format!(
            "target resolution must be positive, got {}",
            target_resolution
        )));
    }
    let meta = src.meta();
    let (res_x, res_y) = meta.resolution();
    if (res_x - target_resolution).abs() < 1e-9 && (res_y - target_resolution).abs() < 1e-9 {
        return Ok(src.load()?);
    }

    let source = src.load()?;
    let bounds = meta.bounds();
    let width = cells(bounds.xmax - bounds.xmin, target_resolution);
    let height = cells(bounds.ymax - bounds.ymin, target_resolution);
    let fill = meta.nodata.unwrap_or(f64::NAN);
    debug!(
        "Resampling {}x{} @ {} -> {}x{} @ {}",
        meta.width, meta.height, res_x, width, height, target_resolution
    );

    let data = Array2::from_shape_fn((height, width), |(row, col)| {
        let x = bounds.xmin + (col as f64 + 0.5) * target_resolution;
        let y = bounds.ymax - (row as f64 + 0.5) * target_resolution;
        nearest(&source, x, y, fill)
    });

    Ok(RasterGrid::new(
        data,
        GeoTransform::new(bounds.xmin, bounds.ymax, target_resolution, -target_resolution),
        meta.crs.clone(),
        meta.nodata,
    ))
}

fn cells(extent: f64, resolution: f64) -> usize {
    ((extent / resolution) - 1e-9).ceil().max(1.0) as usize
}
