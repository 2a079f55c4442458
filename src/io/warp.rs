use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::core::raster::{GridMeta, RasterGrid, RasterSource};
use crate::io::RasterError;
use crate::io::gdal::GdalRaster;
use crate::io::writers::tiff::write_grid_tiff;

/// Reproject `src` onto the `target` grid (CRS, pixel size and extent) with
/// nearest neighbour resampling, by running `gdalwarp` on scratch GeoTIFFs.
///
/// The output shares the target's origin, so its pixels line up one to one
/// with the target's. Cells not covered by `src` get its nodata value, or NaN.
pub fn reproject<S: RasterSource + ?Sized>(src: &S, target: &GridMeta) -> Result<RasterGrid, RasterError> {
    let meta = src.meta();
    if meta.same_crs(target) {
        debug!("Source already in {}; skipping warp", target.crs);
        return src.load();
    }
    info!("Warping {} raster onto {} grid", meta.crs, target.crs);

    let scratch = tempfile::Builder::new()
        .prefix("radval_warp_")
        .tempdir()
        .map_err(|e| RasterError::Warp(format!("tempdir error: {}", e)))?;
    let tmp_in = scratch.path().join("source.tif");
    let tmp_out = scratch.path().join("warped.tif");

    {
        let grid = src.load()?;
        write_grid_tiff(&tmp_in, &grid)?;
    }
    run_gdalwarp(&tmp_in, &tmp_out, target, meta.nodata)?;

    let warped = GdalRaster::open(&tmp_out)?;
    warped.load()
}

fn run_gdalwarp(
    src: &Path,
    dst: &Path,
    target: &GridMeta,
    nodata: Option<f64>,
) -> Result<(), RasterError> {
    let args = gdalwarp_args(src, dst, target, nodata);
    let status = Command::new("gdalwarp")
        .args(args.iter().map(|s| s.as_str()))
        .status()
        .map_err(|e| RasterError::Warp(format!("gdalwarp exec error: {}", e)))?;
    if !status.success() {
        return Err(RasterError::Warp(format!("gdalwarp exited with {}", status)));
    }
    Ok(())
}

fn gdalwarp_args(src: &Path, dst: &Path, target: &GridMeta, nodata: Option<f64>) -> Vec<String> {
    let (res_x, res_y) = target.resolution();
    let extent = target.bounds();
    let mut args: Vec<String> = vec![
        "-q".into(),
        "-of".into(),
        "GTiff".into(),
        "-overwrite".into(),
        "-r".into(),
        "near".into(),
        "-t_srs".into(),
        target.crs.clone(),
        "-te".into(),
        extent.xmin.to_string(),
        extent.ymin.to_string(),
        extent.xmax.to_string(),
        extent.ymax.to_string(),
        "-tr".into(),
        res_x.to_string(),
        res_y.to_string(),
    ];
    if let Some(nd) = nodata {
        args.push("-srcnodata".into());
        args.push(nd.to_string());
    }
    args.push("-dstnodata".into());
    args.push(nodata.map_or_else(|| "nan".to_string(), |nd| nd.to_string()));
    args.push(src.to_string_lossy().into_owned());
    args.push(dst.to_string_lossy().into_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use ndarray::Array2;

    #[test]
    fn same_crs_is_returned_without_warping() {
        let grid = RasterGrid::new(
            Array2::from_elem((2, 2), 3.0),
            GeoTransform::new(0.0, 20.0, 10.0, -10.0),
            "EPSG:32723",
            None,
        );
        let mut target = grid.meta.clone();
        target.crs = "epsg:32723".into();
        let out = reproject(&grid, &target).unwrap();
        assert_eq!(out, grid);
    }

    #[test]
    fn warp_output_is_pinned_to_target_grid() {
        let target = RasterGrid::new(
            Array2::zeros((3, 4)),
            GeoTransform::new(300_005.0, 7_800_015.0, 10.0, -10.0),
            "EPSG:32723",
            None,
        )
        .meta;
        let args = gdalwarp_args(Path::new("in.tif"), Path::new("out.tif"), &target, None);
        let te = args.iter().position(|a| a == "-te").unwrap();
        assert_eq!(args[te + 1..te + 5], ["300005", "7799985", "300045", "7800015"]);
        let tr = args.iter().position(|a| a == "-tr").unwrap();
        assert_eq!(args[tr + 1..tr + 3], ["10", "10"]);
        let dst_nodata = args.iter().position(|a| a == "-dstnodata").unwrap();
        assert_eq!(args[dst_nodata + 1], "nan");
        assert!(!args.iter().any(|a| a == "-srcnodata"));
        assert_eq!(args.last().unwrap(), "out.tif");
    }
}
