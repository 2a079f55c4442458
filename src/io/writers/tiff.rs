use gdal::Dataset;
use gdal::DriverManager;
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use std::path::Path;

use crate::core::raster::RasterGrid;
use crate::io::RasterError;

/// Write a single-band `f64` GeoTIFF carrying the grid's georeferencing.
pub fn write_grid_tiff(output: &Path, grid: &RasterGrid) -> Result<Dataset, RasterError> {
    let (rows, cols) = grid.data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f64, _>(output, cols, rows, 1)?;
    ds.set_geo_transform(&grid.meta.transform.to_gdal())?;
    if !grid.meta.crs.is_empty() {
        let srs = SpatialRef::from_definition(&grid.meta.crs)?;
        ds.set_projection(&srs.to_wkt()?)?;
    }

    {
        let mut band = ds.rasterband(1)?;
        if let Some(nodata) = grid.meta.nodata {
            band.set_no_data_value(Some(nodata))?;
        }
        let values: Vec<f64> = grid.data.iter().copied().collect();
        let mut buf = Buffer::new((cols, rows), values);
        band.write((0, 0), (cols, rows), &mut buf)?;
    }
    Ok(ds)
}
