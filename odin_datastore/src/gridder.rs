/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
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

//! conversion of Sentinel-3 SLSTR Level-1 swath bands into gridded, reprojected COG rasters.
//!
//! SLSTR granules (`*.SEN3` directories) store each band as a NetCDF file with scaled integer values
//! and separate geodetic files with per-pixel longitude/latitude. To grid a band we rescale values
//! and geolocation arrays into Float32 GeoTIFFs, tie them together with a geolocation VRT and then
//! let GDAL warp the VRT into the target projection.

use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use odin_common::fs::{ensure_dir, files_with_extension, filestem, is_non_empty_file};
use odin_gdal::{
    LinearScaling, metadata_value, quiet_nc_dataset, rescale_to_raster,
    geoloc::{GeolocVrtSpec, GeolocWarpOptions, check_geoloc_sizes, warp_geolocated},
};
use crate::{
    errors::{Result, OdinDatastoreError, op_failed},
    manifest::{OutputManifest, SourceKind, write_manifest},
};

/// longitude/latitude are stored as micro degrees
pub const GEOLOC_SCALING: LinearScaling = LinearScaling::new( 1.0e-6, 0.0);

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ScalingFamily {
    BrightnessTemperature,
    Radiance,
}

impl ScalingFamily {
    pub fn scaling (&self)->LinearScaling {
        match self {
            ScalingFamily::BrightnessTemperature => LinearScaling::new( 0.01, 283.73), // Kelvin
            ScalingFamily::Radiance => LinearScaling::new( 1.0e-4, 0.0), // mW/(m²·sr·nm)
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq)]
pub struct BandDefinition {
    pub value_file: &'static str,
    pub variable: &'static str,
    pub geoloc_file: &'static str,
    /// SLSTR view/grid tag (fn: nadir fire, in: nadir 1km TIR, an: nadir 500m stripe A)
    pub tag: &'static str,
    pub family: ScalingFamily,
}

impl BandDefinition {
    pub fn lon_variable (&self)->String { format!("longitude_{}", self.tag) }
    pub fn lat_variable (&self)->String { format!("latitude_{}", self.tag) }

    /// name of the gridded raster inside the granule directory
    pub fn output_name (&self)->String { format!("{}.tif", self.variable) }
}

const fn band (value_file: &'static str, variable: &'static str, geoloc_file: &'static str, tag: &'static str, family: ScalingFamily)->BandDefinition {
    BandDefinition { value_file, variable, geoloc_file, tag, family }
}

pub const BANDS: [BandDefinition; 6] = [
    band( "F1_BT_fn.nc",       "F1_BT_fn",       "geodetic_fn.nc", "fn", ScalingFamily::BrightnessTemperature),
    band( "F2_BT_in.nc",       "F2_BT_in",       "geodetic_in.nc", "in", ScalingFamily::BrightnessTemperature),
    band( "S6_radiance_an.nc", "S6_radiance_an", "geodetic_an.nc", "an", ScalingFamily::Radiance),
    band( "S7_BT_in.nc",       "S7_BT_in",       "geodetic_in.nc", "in", ScalingFamily::BrightnessTemperature),
    band( "S8_BT_in.nc",       "S8_BT_in",       "geodetic_in.nc", "in", ScalingFamily::BrightnessTemperature),
    band( "S9_BT_in.nc",       "S9_BT_in",       "geodetic_in.nc", "in", ScalingFamily::BrightnessTemperature),
];

/// the band whose global attributes we use as the timestamp of the whole granule
pub const CANONICAL_FILE: &str = "F2_BT_in.nc";
pub const CANONICAL_VARIABLE: &str = "F2_BT_in";
pub const START_TIME_KEY: &str = "NC_GLOBAL#start_time";

pub const WORK_DIR: &str = "work";

/// parse "2023-07-15T16:35:24.182536Z"
pub fn parse_start_time (s: &str)->Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str( s.trim(), "%Y-%m-%dT%H:%M:%S%.fZ").ok().map( |ndt| ndt.and_utc())
}

/// the abstraction over the (GDAL based) processing of a single band, so that granule level logic
/// can be exercised without actual NetCDF input
pub trait BandBuilder: Send + Sync {
    /// the acquisition start of the granule
    fn acquisition_time (&self, granule_dir: &Path)->Result<DateTime<Utc>>;

    /// create the gridded raster for `band` at `output`
    fn build_band (&self, granule_dir: &Path, band: &BandDefinition, output: &Path)->Result<()>;
}

/// the real thing
#[derive(Debug,Clone,Default)]
pub struct GdalBandBuilder {
    pub warp: GeolocWarpOptions,
}

impl GdalBandBuilder {
    fn rescale_variable (&self, nc_path: &Path, var: &str, scaling: &LinearScaling, tgt: &Path)->Result<(usize,usize)> {
        let ds = quiet_nc_dataset( nc_path, var)?;
        Ok( rescale_to_raster( &ds, scaling, tgt)? )
    }
}

impl BandBuilder for GdalBandBuilder {
    fn acquisition_time (&self, granule_dir: &Path)->Result<DateTime<Utc>> {
        let path = granule_dir.join( CANONICAL_FILE);
        if !path.is_file() {
            return Err( OdinDatastoreError::MissingInput( format!("{:?}", path)))
        }

        let ds = quiet_nc_dataset( &path, CANONICAL_VARIABLE)?;
        let s = metadata_value( &ds, START_TIME_KEY).ok_or( op_failed!("no {} in {:?}", START_TIME_KEY, path))?;
        parse_start_time( &s).ok_or( op_failed!("invalid start_time '{}' in {:?}", s, path))
    }

    fn build_band (&self, granule_dir: &Path, band: &BandDefinition, output: &Path)->Result<()> {
        let work_dir = granule_dir.join( WORK_DIR);
        ensure_dir( &work_dir)?;

        let geoloc_path = granule_dir.join( band.geoloc_file);
        let value_path = granule_dir.join( band.value_file);

        let lon_tif = work_dir.join( format!("{}.tif", band.lon_variable()));
        let lon_size = self.rescale_variable( &geoloc_path, &band.lon_variable(), &GEOLOC_SCALING, &lon_tif)?;

        let lat_tif = work_dir.join( format!("{}.tif", band.lat_variable()));
        let lat_size = self.rescale_variable( &geoloc_path, &band.lat_variable(), &GEOLOC_SCALING, &lat_tif)?;

        let value_tif = work_dir.join( format!("{}_value.tif", band.variable));
        let value_size = self.rescale_variable( &value_path, band.variable, &band.family.scaling(), &value_tif)?;

        check_geoloc_sizes( value_size, lon_size, lat_size)?;

        // output only appears once the warp succeeded
        let vrt_path = work_dir.join( format!("{}.vrt", band.variable));
        let warped = work_dir.join( band.output_name());
        let spec = GeolocVrtSpec { data_path: &value_tif, lon_path: &lon_tif, lat_path: &lat_tif, x_size: value_size.0, y_size: value_size.1 };
        warp_geolocated( &spec, &vrt_path, &warped, &self.warp)?;
        std::fs::rename( &warped, output)?;

        Ok(())
    }
}

/// what we got out of a granule
#[derive(Debug,Clone)]
pub struct GranuleRasters {
    pub granule: PathBuf,
    pub acquired: DateTime<Utc>,
    pub rasters: Vec<PathBuf>,
}

pub struct GranuleConverter<B: BandBuilder> {
    builder: B,
}

impl<B: BandBuilder> GranuleConverter<B> {
    pub fn new (builder: B)->Self {
        GranuleConverter { builder }
    }

    /// grid all bands of the table that have their inputs in `granule_dir`. Individual bands can fail, the
    /// granule only fails if we can't get its acquisition time
    pub fn convert (&self, granule_dir: &Path)->Result<GranuleRasters> {
        let acquired = self.builder.acquisition_time( granule_dir)?;
        info!("converting granule {:?} acquired {}", granule_dir, acquired);

        for band in &BANDS {
            let value_path = granule_dir.join( band.value_file);
            let geoloc_path = granule_dir.join( band.geoloc_file);

            if !value_path.is_file() {
                warn!("skipping band {}: no value file {:?}", band.variable, value_path);
                continue
            }
            if !geoloc_path.is_file() {
                warn!("skipping band {}: no geolocation file {:?}", band.variable, geoloc_path);
                continue
            }

            let output = granule_dir.join( band.output_name());
            if is_non_empty_file( &output) {
                debug!("band {} already gridded", band.variable);
                continue
            }

            match self.builder.build_band( granule_dir, band, &output) {
                Ok(()) => info!("gridded {:?}", output),
                Err(e) => warn!("failed to grid band {} of {:?}: {}", band.variable, granule_dir, e)
            }
        }

        let rasters = files_with_extension( &granule_dir, "tif", false)?;
        for raster in &rasters {
            let label = filestem( raster).unwrap_or_default();
            if let Err(e) = write_manifest( raster, &OutputManifest::new( SourceKind::Raster, acquired, label)) {
                warn!("failed to write manifest for {:?}: {}", raster, e);
            }
        }

        Ok( GranuleRasters { granule: granule_dir.to_path_buf(), acquired, rasters } )
    }
}
