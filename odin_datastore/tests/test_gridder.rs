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

use std::{path::Path, sync::{Arc, Mutex}};
use chrono::{DateTime, TimeZone, Utc};

use odin_common::fs::{filename, write_file_atomic};
use odin_datastore::{
    errors::{Result, OdinDatastoreError},
    gridder::{BANDS, BandBuilder, BandDefinition, CANONICAL_FILE, GranuleConverter},
    manifest::{SourceKind, read_manifest},
};

/// records which bands it was asked to build and writes a dummy output for each
struct MockBuilder {
    acquired: DateTime<Utc>,
    failing_band: Option<&'static str>,
    built: Arc<Mutex<Vec<String>>>,
}

impl BandBuilder for MockBuilder {
    fn acquisition_time (&self, granule_dir: &Path)->Result<DateTime<Utc>> {
        if granule_dir.join( CANONICAL_FILE).is_file() {
            Ok( self.acquired)
        } else {
            Err( OdinDatastoreError::MissingInput( CANONICAL_FILE.to_string()))
        }
    }

    fn build_band (&self, _granule_dir: &Path, band: &BandDefinition, output: &Path)->Result<()> {
        self.built.lock().unwrap().push( band.variable.to_string());
        if self.failing_band == Some( band.variable) {
            return Err( OdinDatastoreError::OpFailedError("warp failed".into()))
        }
        write_file_atomic( output, b"gridded")?;
        Ok(())
    }
}

fn acquired ()->DateTime<Utc> {
    Utc.with_ymd_and_hms( 2023, 7, 15, 16, 35, 24).unwrap()
}

/// a granule with all value files but without the `an` geolocation file
fn granule_without_an_geoloc (dir: &Path)->Result<()> {
    for b in &BANDS {
        write_file_atomic( dir.join( b.value_file), b"nc")?;
    }
    write_file_atomic( dir.join("geodetic_in.nc"), b"nc")?;
    write_file_atomic( dir.join("geodetic_fn.nc"), b"nc")?;
    Ok(())
}

fn raster_names (paths: &[std::path::PathBuf])->Vec<String> {
    let mut names: Vec<String> = paths.iter().filter_map( |p| filename(p).map( |s| s.to_string())).collect();
    names.sort();
    names
}

#[test]
fn test_missing_geoloc()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let granule = tmp.path().join("S3A_SL_1_RBT____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004.SEN3");
    std::fs::create_dir( &granule)?;
    granule_without_an_geoloc( &granule)?;

    let built = Arc::new( Mutex::new( Vec::new()));
    let converter = GranuleConverter::new( MockBuilder { acquired: acquired(), failing_band: None, built: built.clone() });

    let res = converter.convert( &granule)?;
    assert_eq!( res.acquired, acquired());
    assert_eq!( raster_names( &res.rasters), vec!["F1_BT_fn.tif", "F2_BT_in.tif", "S7_BT_in.tif", "S8_BT_in.tif", "S9_BT_in.tif"]);
    assert!( !built.lock().unwrap().iter().any( |v| v == "S6_radiance_an"));

    for raster in &res.rasters {
        let m = read_manifest( raster).unwrap();
        assert_eq!( m.source, SourceKind::Raster);
        assert_eq!( m.acquired, acquired());
    }

    // outputs that already exist are not built again
    built.lock().unwrap().clear();
    let res = converter.convert( &granule)?;
    assert_eq!( res.rasters.len(), 5);
    assert!( built.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_failing_band()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let granule = tmp.path().join("granule.SEN3");
    std::fs::create_dir( &granule)?;
    granule_without_an_geoloc( &granule)?;

    let built = Arc::new( Mutex::new( Vec::new()));
    let converter = GranuleConverter::new( MockBuilder { acquired: acquired(), failing_band: Some("S8_BT_in"), built });

    let res = converter.convert( &granule)?;
    assert_eq!( raster_names( &res.rasters), vec!["F1_BT_fn.tif", "F2_BT_in.tif", "S7_BT_in.tif", "S9_BT_in.tif"]);
    Ok(())
}

#[test]
fn test_missing_timestamp()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let granule = tmp.path().join("granule.SEN3");
    std::fs::create_dir( &granule)?;
    granule_without_an_geoloc( &granule)?;
    std::fs::remove_file( granule.join( CANONICAL_FILE))?;

    let built = Arc::new( Mutex::new( Vec::new()));
    let converter = GranuleConverter::new( MockBuilder { acquired: acquired(), failing_band: None, built: built.clone() });

    assert!( converter.convert( &granule).is_err());
    assert!( built.lock().unwrap().is_empty());
    Ok(())
}
