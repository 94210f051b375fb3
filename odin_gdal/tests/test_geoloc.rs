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

use std::path::Path;
use odin_gdal::{
    Buffer, Dataset, DriverManager, LinearScaling, rescale_to_raster, write_f32_raster,
    errors::OdinGdalError,
    geoloc::{GeolocVrtSpec, GeolocWarpOptions, check_geoloc_sizes, warp_geolocated},
};

const X_SIZE: usize = 10;
const Y_SIZE: usize = 8;
const NO_DATA: i16 = -32768;

/// encoded brightness temperatures with a no-data value in the first pixel
fn encoded_source ()->Dataset {
    let driver = DriverManager::get_driver_by_name("MEM").unwrap();
    let ds = driver.create_with_band_type::<i16,_>( "", X_SIZE, Y_SIZE, 1).unwrap();

    let mut values: Vec<i16> = (0..Y_SIZE).flat_map( |y| (0..X_SIZE).map( move |x| (1000 + x + y*10) as i16)).collect();
    values[0] = NO_DATA;

    let mut band = ds.rasterband(1).unwrap();
    band.set_no_data_value( Some(NO_DATA as f64)).unwrap();
    let mut buf = Buffer::new( (X_SIZE,Y_SIZE), values);
    band.write( (0,0), (X_SIZE,Y_SIZE), &mut buf).unwrap();
    drop(band);

    ds
}

/// per-pixel degrees over a 1 x 0.8 deg swath in northern Ontario
fn write_geoloc (dir: &Path)->(std::path::PathBuf, std::path::PathBuf) {
    let lon_path = dir.join("longitude_in.tif");
    let lons: Vec<f32> = (0..Y_SIZE).flat_map( |_| (0..X_SIZE).map( |x| -90.0 + x as f32 * 0.1)).collect();
    write_f32_raster( &lon_path, (X_SIZE,Y_SIZE), lons).unwrap();

    let lat_path = dir.join("latitude_in.tif");
    let lats: Vec<f32> = (0..Y_SIZE).flat_map( |y| (0..X_SIZE).map( move |_| 51.0 - y as f32 * 0.1)).collect();
    write_f32_raster( &lat_path, (X_SIZE,Y_SIZE), lats).unwrap();

    (lon_path, lat_path)
}

#[test]
fn test_rescale_to_raster() {
    let dir = tempfile::tempdir().unwrap();
    let src = encoded_source();
    let value_path = dir.path().join("S7_BT_in_value.tif");

    let size = rescale_to_raster( &src, &LinearScaling::new( 0.01, 283.73), &value_path).unwrap();
    assert_eq!( size, (X_SIZE,Y_SIZE));

    let ds = Dataset::open( &value_path).unwrap();
    let band = ds.rasterband(1).unwrap();
    let buf = band.read_band_as::<f32>().unwrap();
    let values = buf.data();

    assert!( values[0].is_nan());
    assert!( (values[1] - 293.74).abs() < 1e-3);
    assert!( (values[X_SIZE] - 293.83).abs() < 1e-3);
    assert!( band.no_data_value().map( |v| v.is_nan()).unwrap_or(false));
}

#[test]
fn test_write_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let res = write_f32_raster( dir.path().join("short.tif"), (X_SIZE,Y_SIZE), vec![0.0; X_SIZE]);
    assert!( matches!( res, Err(OdinGdalError::DimensionMismatch(_))));
    assert!( !dir.path().join("short.tif").exists());
}

#[test]
fn test_warp_geolocated() {
    let dir = tempfile::tempdir().unwrap();
    let (lon_path, lat_path) = write_geoloc( dir.path());

    let src = encoded_source();
    let value_path = dir.path().join("S7_BT_in_value.tif");
    let size = rescale_to_raster( &src, &LinearScaling::new( 0.01, 283.73), &value_path).unwrap();

    let spec = GeolocVrtSpec { data_path: &value_path, lon_path: &lon_path, lat_path: &lat_path, x_size: size.0, y_size: size.1 };
    let vrt_path = dir.path().join("S7_BT_in.vrt");
    let tgt_path = dir.path().join("S7_BT_in.tif");
    warp_geolocated( &spec, &vrt_path, &tgt_path, &GeolocWarpOptions::default()).unwrap();

    let ds = Dataset::open( &tgt_path).unwrap();
    assert!( ds.projection().contains("Statistics Canada"));

    let gt = ds.geo_transform().unwrap();
    assert!( (gt[1] - 1000.0).abs() < 1e-6);
    assert!( (gt[5] + 1000.0).abs() < 1e-6);

    // ~71km x 89km swath at 1km resolution
    let (xs, ys) = ds.raster_size();
    assert!( xs > 10 && ys > 10);

    let buf = ds.rasterband(1).unwrap().read_band_as::<f32>().unwrap();
    let finite: Vec<f32> = buf.data().iter().copied().filter( |v| v.is_finite()).collect();
    assert!( !finite.is_empty());
    assert!( finite.iter().all( |v| *v >= 293.73 && *v <= 294.6));
}

#[test]
fn test_geoloc_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let lon_path = dir.path().join("longitude_in.tif");
    write_f32_raster( &lon_path, (X_SIZE,Y_SIZE), vec![-90.0; X_SIZE*Y_SIZE]).unwrap();
    let lat_path = dir.path().join("latitude_in.tif");
    write_f32_raster( &lat_path, (X_SIZE,Y_SIZE-1), vec![51.0; X_SIZE*(Y_SIZE-1)]).unwrap();

    let lon_size = Dataset::open( &lon_path).unwrap().raster_size();
    let lat_size = Dataset::open( &lat_path).unwrap().raster_size();

    let res = check_geoloc_sizes( (X_SIZE,Y_SIZE), lon_size, lat_size);
    assert!( matches!( res, Err(OdinGdalError::DimensionMismatch(_))));
}
