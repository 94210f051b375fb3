/*
 * Copyright © 2024, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

pub mod errors;
pub mod warp;
pub mod geoloc;
pub mod mdim;

use std::{collections::HashMap, ffi::{CStr, c_char}, path::Path, sync::Mutex};
use lazy_static::lazy_static;

// we re-export these so that other crates don't have to use a direct gdal depedency to import.
// this is to ensure we run bindgen for new GDAL versions that don't yet have pre-computed bindings in gdal-sys
pub use gdal::{self, Driver, DriverManager, Metadata, Dataset, errors::GdalError};
pub use gdal::raster::{Buffer, RasterBand, RasterCreationOptions};

use odin_common::fs::extension;
use crate::errors::{Result, OdinGdalError, misc_error};

lazy_static! {
    // note that we can't automatically populate this by iterating over DriverManager since some
    // drivers use the same file extension
    static ref EXT_MAP: HashMap<&'static str, &'static str> = HashMap::from( [ // file extension -> driver short name
        ("tif", "GTiff"),
        ("tiff", "GTiff"),
        ("vrt", "VRT"),
        ("nc", "netCDF"),

        ("json", "GeoJSON"),
        ("geojson", "GeoJSON"),
        ("csv", "CSV"),
    ]);
}

/// use this to protect non-threadsafe GDAL operations
static GLOB_GDAL_MUTEX: Mutex<usize> = Mutex::new(0);

/// Note that filename extension has to be lower case
pub fn get_driver_name_from_filename (path: impl AsRef<Path>) -> Option<&'static str> {
    extension( &path.as_ref()).and_then( |ext| EXT_MAP.get( ext)).map(|v| &**v)
}

pub fn pc_char_to_string (pc_char: *const c_char) -> String {
    if pc_char.is_null() {
        String::new()
    } else {
        let cstr = unsafe { CStr::from_ptr(pc_char) };
        String::from_utf8_lossy(cstr.to_bytes()).to_string()
    }
}

/// run the provided closure with the global GDAL error handler disabled. Note this does not
/// change the return value but prevents GDAL from printing errors and warnings to the console
pub fn run_quiet<T,F> (f: F)->Result<T> where F: Fn()->Result<T> {
    let _lock = GLOB_GDAL_MUTEX.lock().map_err(|_| misc_error("poisoned GDAL lock"))?;
    unsafe { gdal_sys::CPLPushErrorHandler( Some(gdal_sys::CPLQuietErrorHandler)); }
    let result = f();
    unsafe { gdal_sys::CPLPopErrorHandler(); }
    result
}

/// the GDAL dataset name of a NetCDF variable, e.g. `NETCDF:"/data/geodetic_in.nc":longitude_in`
pub fn nc_subdataset_name (nc_path: impl AsRef<Path>, var_name: &str)->Result<String> {
    let nc_path = nc_path.as_ref();
    let p = nc_path.to_str().ok_or( OdinGdalError::InvalidPath( format!("{:?}", nc_path)))?;
    Ok( format!("NETCDF:\"{}\":{}", p, var_name) )
}

// Sentinel-3 NetCDF files cause warnings about non-conforming CF attributes. If the dataset still works
// correctly use this function to open it without annoying console output
pub fn quiet_nc_dataset( nc_path: impl AsRef<Path>, var_name: &str) -> Result<Dataset> {
    let path = nc_subdataset_name( nc_path, var_name)?;
    run_quiet( || Ok( Dataset::open(&path)? ) )
}

/// value of a dataset metadata item in the default domain (e.g. "NC_GLOBAL#start_time")
pub fn metadata_value (ds: &Dataset, key: &str)->Option<String> {
    ds.metadata_item( key, "")
}

pub fn compress_create_opts ()->Result<RasterCreationOptions> {
    let mut co = RasterCreationOptions::new();
    co.add_name_value("COMPRESS", "DEFLATE")?;
    co.add_name_value("PREDICTOR", "2")?;
    Ok(co)
}

/* #region linear rescaling ***********************************************************************************/

/// a fixed linear transformation `v * scale + offset` to turn encoded integer values into physical units
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct LinearScaling {
    pub scale: f64,
    pub offset: f64,
}

impl LinearScaling {
    pub const fn new (scale: f64, offset: f64)->Self { LinearScaling { scale, offset } }

    #[inline]
    pub fn apply (&self, v: f64)->f64 { v * self.scale + self.offset }
}

/// read the whole band and apply the scaling. No-data values of the source become NaN.
/// Returns ((x_size,y_size), values)
pub fn read_scaled_band (ds: &Dataset, band_index: usize, scaling: &LinearScaling)->Result<((usize,usize),Vec<f32>)> {
    let band = ds.rasterband(band_index)?;
    let size = band.size();
    let no_data = band.no_data_value();
    let buf: Buffer<f64> = band.read_as::<f64>( (0,0), size, size, None)?;

    let values: Vec<f32> = buf.data().iter().map( |v| {
        if no_data.map( |nd| nd == *v).unwrap_or(false) || v.is_nan() {
            f32::NAN
        } else {
            scaling.apply(*v) as f32
        }
    }).collect();

    Ok( (size, values) )
}

/// write a single band Float32 raster with NaN as no-data value. Driver is derived from the path extension
pub fn write_f32_raster (path: impl AsRef<Path>, size: (usize,usize), values: Vec<f32>)->Result<()> {
    let path = path.as_ref();
    if values.len() != size.0 * size.1 {
        return Err( OdinGdalError::DimensionMismatch( format!("{} values for {}x{} raster", values.len(), size.0, size.1)))
    }

    let driver_name = get_driver_name_from_filename(path).unwrap_or("GTiff");
    let driver = DriverManager::get_driver_by_name( driver_name)?;
    let opts = compress_create_opts()?;
    let ds = driver.create_with_band_type_with_options::<f32,_>( path, size.0, size.1, 1, &opts)?;

    let mut band = ds.rasterband(1)?;
    band.set_no_data_value( Some(f64::NAN))?;
    let mut buf = Buffer::new( size, values);
    band.write( (0,0), size, &mut buf)?;

    Ok(())
}

/// rescale band 1 of `src_ds` into a new Float32 raster at `tgt_path`, returning the raster size
pub fn rescale_to_raster (src_ds: &Dataset, scaling: &LinearScaling, tgt_path: impl AsRef<Path>)->Result<(usize,usize)> {
    let (size, values) = read_scaled_band( src_ds, 1, scaling)?;
    write_f32_raster( tgt_path, size, values)?;
    Ok(size)
}

/* #endregion linear rescaling */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling() {
        let bt = LinearScaling::new( 0.01, 283.73);
        assert!( (bt.apply(1000.0) - 293.73).abs() < 1e-9);

        let geo = LinearScaling::new( 1.0e-6, 0.0);
        assert!( (geo.apply(-98_123_456.0) - -98.123456).abs() < 1e-9);
    }

    #[test]
    fn test_driver_names() {
        assert_eq!( get_driver_name_from_filename("/tmp/F1_BT_fn.tif"), Some("GTiff"));
        assert_eq!( get_driver_name_from_filename("x.geojson"), Some("GeoJSON"));
        assert_eq!( get_driver_name_from_filename("x.unknown"), None);
    }
}
