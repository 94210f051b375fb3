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

//! support for swath rasters that are georeferenced by per-pixel longitude/latitude arrays instead of an
//! affine geotransform. See https://gdal.org/development/rfc/rfc4_geolocate.html

use std::path::Path;
use gdal::Dataset;
use quick_xml::escape::escape;

use crate::{
    errors::{Result, OdinGdalError, gdal_error},
    warp::{ResampleAlg, SimpleWarpBuilder},
};

/// the pieces we need to write a single band VRT with a GEOLOCATION metadata domain
#[derive(Debug,Clone)]
pub struct GeolocVrtSpec<'a> {
    pub data_path: &'a Path,
    pub lon_path: &'a Path,
    pub lat_path: &'a Path,
    pub x_size: usize,
    pub y_size: usize,
}

fn path_str (path: &Path)->Result<String> {
    path.to_str()
        .map( |s| escape(s).into_owned())
        .ok_or( OdinGdalError::InvalidPath( format!("{:?}", path)))
}

/// create the VRT XML text. Lon/lat rasters have to be in decimal degrees and have the same
/// dimensions as the data raster (pixel/line step 1)
pub fn geoloc_vrt_xml (spec: &GeolocVrtSpec)->Result<String> {
    let data = path_str(spec.data_path)?;
    let lon = path_str(spec.lon_path)?;
    let lat = path_str(spec.lat_path)?;
    let (xs,ys) = (spec.x_size, spec.y_size);

    Ok( format!(r#"<VRTDataset rasterXSize="{xs}" rasterYSize="{ys}">
  <Metadata domain="GEOLOCATION">
    <MDI key="X_DATASET">{lon}</MDI>
    <MDI key="X_BAND">1</MDI>
    <MDI key="Y_DATASET">{lat}</MDI>
    <MDI key="Y_BAND">1</MDI>
    <MDI key="PIXEL_OFFSET">0</MDI>
    <MDI key="LINE_OFFSET">0</MDI>
    <MDI key="PIXEL_STEP">1</MDI>
    <MDI key="LINE_STEP">1</MDI>
  </Metadata>
  <VRTRasterBand band="1" dataType="Float32">
    <NoDataValue>nan</NoDataValue>
    <SimpleSource>
      <SourceFilename relativeToVRT="0">{data}</SourceFilename>
      <SourceBand>1</SourceBand>
      <SourceProperties RasterXSize="{xs}" RasterYSize="{ys}" DataType="Float32"/>
      <SrcRect xOff="0" yOff="0" xSize="{xs}" ySize="{ys}"/>
      <DstRect xOff="0" yOff="0" xSize="{xs}" ySize="{ys}"/>
    </SimpleSource>
  </VRTRasterBand>
</VRTDataset>
"#))
}

pub fn write_geoloc_vrt (spec: &GeolocVrtSpec, vrt_path: impl AsRef<Path>)->Result<()> {
    let xml = geoloc_vrt_xml(spec)?;
    std::fs::write( vrt_path.as_ref(), xml)?;
    Ok(())
}

/// value, longitude and latitude rasters have to cover the same pixel grid
pub fn check_geoloc_sizes (value: (usize,usize), lon: (usize,usize), lat: (usize,usize))->Result<()> {
    if value != lon || value != lat {
        Err( OdinGdalError::DimensionMismatch( format!("value {:?}, lon {:?}, lat {:?}", value, lon, lat)))
    } else {
        Ok(())
    }
}

/// how geolocated swath rasters get warped into a projected grid
#[derive(Debug,Clone)]
pub struct GeolocWarpOptions {
    pub src_srs: String,
    pub tgt_srs: String,
    pub tgt_resolution: f64, // in target SRS units
    pub tgt_format: String,
    pub resample_alg: ResampleAlg,
}

impl Default for GeolocWarpOptions {
    fn default()->Self {
        GeolocWarpOptions {
            src_srs: "EPSG:4326".into(),
            tgt_srs: "EPSG:3347".into(), // Statistics Canada Lambert
            tgt_resolution: 1000.0,
            tgt_format: "COG".into(),
            resample_alg: ResampleAlg::NearestNeighbour,
        }
    }
}

/// write the geolocation VRT for `spec` to `vrt_path` and warp it into `tgt_path`. No-data is NaN
pub fn warp_geolocated (spec: &GeolocVrtSpec, vrt_path: impl AsRef<Path>, tgt_path: impl AsRef<Path>, opts: &GeolocWarpOptions)->Result<()> {
    let vrt_path = vrt_path.as_ref();
    write_geoloc_vrt( spec, vrt_path)?;

    let vrt_ds = Dataset::open( vrt_path).map_err( gdal_error)?;
    SimpleWarpBuilder::new( &vrt_ds, tgt_path)?
        .set_tgt_format( &opts.tgt_format)
        .set_src_srs( &opts.src_srs)
        .set_tgt_srs( &opts.tgt_srs)
        .set_tgt_resolution( opts.tgt_resolution, opts.tgt_resolution)
        .set_resample_alg( opts.resample_alg)
        .set_use_geoloc( true)
        .set_tgt_nodata( f64::NAN)
        .set_overwrite( true)
        .add_create_option( "COMPRESS", "DEFLATE")
        .exec()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_vrt_xml() {
        let data = PathBuf::from("/data/S3A.SEN3/work/F1_BT_fn_value.tif");
        let lon = PathBuf::from("/data/S3A.SEN3/work/longitude_fn.tif");
        let lat = PathBuf::from("/data/S3A&B/work/latitude_fn.tif");
        let spec = GeolocVrtSpec { data_path: &data, lon_path: &lon, lat_path: &lat, x_size: 1500, y_size: 1200 };

        let xml = geoloc_vrt_xml(&spec).unwrap();
        assert!( xml.contains(r#"rasterXSize="1500" rasterYSize="1200""#));
        assert!( xml.contains("<MDI key=\"X_DATASET\">/data/S3A.SEN3/work/longitude_fn.tif</MDI>"));
        assert!( xml.contains("S3A&amp;B"));
        assert!( !xml.contains("GeoTransform"));
    }

    #[test]
    fn test_size_check() {
        assert!( check_geoloc_sizes( (10,8), (10,8), (10,8)).is_ok());
        assert!( matches!( check_geoloc_sizes( (10,8), (10,8), (10,7)), Err(OdinGdalError::DimensionMismatch(_))));
        assert!( matches!( check_geoloc_sizes( (10,8), (8,10), (10,8)), Err(OdinGdalError::DimensionMismatch(_))));
    }
}
