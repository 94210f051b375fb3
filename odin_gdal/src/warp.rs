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

//! a thin builder around the GDALWarp() utility function (the library version of `gdalwarp`)

use std::{ffi::{CString, c_char, c_int}, path::{Path,PathBuf}, ptr::null_mut};
use gdal::{Dataset, cpl::CslStringList};

use crate::errors::{Result, OdinGdalError, last_gdal_error};

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum ResampleAlg { NearestNeighbour, Bilinear, Cubic, Average }

impl ResampleAlg {
    fn gdal_name (&self)->&'static str {
        match self {
            ResampleAlg::NearestNeighbour => "near",
            ResampleAlg::Bilinear => "bilinear",
            ResampleAlg::Cubic => "cubic",
            ResampleAlg::Average => "average",
        }
    }
}

/// collects gdalwarp options for a single source dataset. Nothing is executed before [`SimpleWarpBuilder::exec`]
pub struct SimpleWarpBuilder<'a> {
    src_ds: &'a Dataset,
    tgt_path: PathBuf,

    src_srs: Option<String>,
    tgt_srs: Option<String>,
    tgt_format: Option<String>,
    tgt_res: Option<(f64,f64)>,
    tgt_nodata: Option<f64>,
    resample_alg: Option<ResampleAlg>,
    use_geoloc: bool,
    overwrite: bool,
    create_options: Vec<(String,String)>,
}

impl<'a> SimpleWarpBuilder<'a> {
    pub fn new (src_ds: &'a Dataset, tgt_path: impl AsRef<Path>)->Result<Self> {
        let tgt_path = tgt_path.as_ref().to_path_buf();
        if tgt_path.to_str().is_none() {
            return Err( OdinGdalError::InvalidPath( format!("{:?}", tgt_path)))
        }

        Ok( SimpleWarpBuilder {
            src_ds, tgt_path,
            src_srs: None, tgt_srs: None, tgt_format: None, tgt_res: None, tgt_nodata: None, resample_alg: None,
            use_geoloc: false, overwrite: true,
            create_options: Vec::new()
        })
    }

    /// SRS definition as accepted by OGRSpatialReference::SetFromUserInput (e.g. "EPSG:4326")
    pub fn set_src_srs (&mut self, srs_def: &str)->&mut Self { self.src_srs = Some(srs_def.to_string()); self }
    pub fn set_tgt_srs (&mut self, srs_def: &str)->&mut Self { self.tgt_srs = Some(srs_def.to_string()); self }
    pub fn set_tgt_format (&mut self, driver_name: &str)->&mut Self { self.tgt_format = Some(driver_name.to_string()); self }
    pub fn set_tgt_resolution (&mut self, x_res: f64, y_res: f64)->&mut Self { self.tgt_res = Some((x_res,y_res)); self }
    pub fn set_tgt_nodata (&mut self, nodata: f64)->&mut Self { self.tgt_nodata = Some(nodata); self }
    pub fn set_resample_alg (&mut self, alg: ResampleAlg)->&mut Self { self.resample_alg = Some(alg); self }

    /// force use of geolocation arrays (GEOLOCATION metadata domain) of the source
    pub fn set_use_geoloc (&mut self, use_geoloc: bool)->&mut Self { self.use_geoloc = use_geoloc; self }
    pub fn set_overwrite (&mut self, overwrite: bool)->&mut Self { self.overwrite = overwrite; self }

    pub fn add_create_option (&mut self, key: &str, value: &str)->&mut Self {
        self.create_options.push( (key.to_string(), value.to_string()));
        self
    }

    /// the gdalwarp command line arguments this builder translates into
    pub fn args (&self)->Vec<String> {
        let mut args: Vec<String> = Vec::new();

        if let Some(fmt) = &self.tgt_format { args.push("-of".into()); args.push(fmt.clone()); }
        if let Some(srs) = &self.src_srs { args.push("-s_srs".into()); args.push(srs.clone()); }
        if let Some(srs) = &self.tgt_srs { args.push("-t_srs".into()); args.push(srs.clone()); }
        if let Some((x,y)) = self.tgt_res {
            args.push("-tr".into()); args.push(x.to_string()); args.push(y.to_string());
        }
        if let Some(nd) = self.tgt_nodata {
            args.push("-dstnodata".into());
            args.push( if nd.is_nan() { "nan".to_string() } else { nd.to_string() });
        }
        if let Some(alg) = self.resample_alg { args.push("-r".into()); args.push(alg.gdal_name().into()); }
        if self.use_geoloc { args.push("-geoloc".into()); }
        if self.overwrite { args.push("-overwrite".into()); }
        for (k,v) in &self.create_options {
            args.push("-co".into());
            args.push(format!("{k}={v}"));
        }

        args
    }

    pub fn exec (&self)->Result<()> {
        let mut argv = CslStringList::new();
        for a in self.args() {
            argv.add_string( a.as_str())?;
        }

        // checked in ctor
        let tgt = self.tgt_path.to_str().ok_or( OdinGdalError::InvalidPath( format!("{:?}", self.tgt_path)))?;
        let c_tgt = CString::new(tgt).map_err(|_| OdinGdalError::InvalidPath(tgt.to_string()))?;

        unsafe {
            let opts = gdal_sys::GDALWarpAppOptionsNew( argv.as_ptr() as *mut *mut c_char, null_mut());
            if opts.is_null() {
                return Err(last_gdal_error())
            }

            let mut src_handles = [self.src_ds.c_dataset()];
            let mut usage_error: c_int = 0;
            let h_tgt = gdal_sys::GDALWarp( c_tgt.as_ptr(), null_mut(), 1, src_handles.as_mut_ptr(), opts, &mut usage_error);
            gdal_sys::GDALWarpAppOptionsFree(opts);

            if h_tgt.is_null() {
                Err(last_gdal_error())
            } else {
                let _ = gdal_sys::GDALClose(h_tgt); // this flushes the target
                if usage_error != 0 {
                    Err( OdinGdalError::MiscError( format!("invalid warp arguments {:?}", self.args())))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::DriverManager;

    #[test]
    fn test_args() {
        let ds = DriverManager::get_driver_by_name("MEM").unwrap().create( "", 4, 4, 1).unwrap();
        let mut builder = SimpleWarpBuilder::new( &ds, "/tmp/out.tif").unwrap();
        builder.set_tgt_srs("EPSG:3347")
            .set_tgt_resolution( 1000.0, 1000.0)
            .set_resample_alg( ResampleAlg::NearestNeighbour)
            .set_tgt_nodata( f64::NAN)
            .set_use_geoloc( true);

        let args = builder.args().join(" ");
        assert_eq!( args, "-t_srs EPSG:3347 -tr 1000 1000 -dstnodata nan -r near -geoloc -overwrite");
    }
}
