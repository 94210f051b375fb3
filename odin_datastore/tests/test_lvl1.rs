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

use std::{collections::HashSet, fs::File, io::Write, path::{Path, PathBuf}};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use odin_common::fs::write_file_atomic;
use odin_datastore::{
    config::EumetsatConfig,
    errors::{Result, OdinDatastoreError},
    eumdac::ProductStore,
    gridder::{BANDS, BandBuilder, BandDefinition, CANONICAL_FILE},
    lvl1::{Lvl1Acquisition, unpack_granule},
};

const NR_GRANULE: &str = "S3A_SL_1_RBT____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004.SEN3";
const NT_GRANULE: &str = "S3B_SL_1_RBT____20230715T171234_20230715T171534_20230716T015502_0179_082_012_2340_PS2_O_NT_004.SEN3";
const CORRUPT_GRANULE: &str = "S3A_SL_1_RBT____20230715T181024_20230715T181324_20230715T203410_0179_101_013_0720_PS1_O_NR_004.SEN3";

/// write a product zip with a granule dir that has all band and geolocation files
fn write_product_zip (path: &Path, granule: &str)->Result<()> {
    let mut zip = ZipWriter::new( File::create( path)?);
    let options = SimpleFileOptions::default().compression_method( CompressionMethod::Stored);

    zip.add_directory( format!("{granule}/"), options)?;
    let mut names: Vec<&str> = BANDS.iter().flat_map( |b| [b.value_file, b.geoloc_file]).collect();
    names.sort();
    names.dedup();
    for name in names {
        zip.start_file( format!("{granule}/{name}"), options)?;
        zip.write_all( b"netcdf")?;
    }
    zip.finish()?;
    Ok(())
}

/// serves a fixed set of products. Products in `corrupt` are downloaded as garbage
struct MockStore {
    products: Vec<String>,
    corrupt: HashSet<String>,
}

#[async_trait]
impl ProductStore for MockStore {
    async fn search (&self, _start: DateTime<Utc>, _end: DateTime<Utc>)->Result<Vec<String>> {
        Ok( self.products.clone())
    }

    async fn download (&self, id: &str, dir: &Path)->Result<PathBuf> {
        let path = dir.join( format!("{id}.zip"));
        if self.corrupt.contains( id) {
            write_file_atomic( &path, b"this is not a zip archive")?;
        } else {
            write_product_zip( &path, id)?;
        }
        Ok(path)
    }
}

struct MockBuilder;

impl BandBuilder for MockBuilder {
    fn acquisition_time (&self, granule_dir: &Path)->Result<DateTime<Utc>> {
        if granule_dir.join( CANONICAL_FILE).is_file() {
            Ok( Utc.with_ymd_and_hms( 2023, 7, 15, 16, 35, 24).unwrap())
        } else {
            Err( OdinDatastoreError::MissingInput( CANONICAL_FILE.to_string()))
        }
    }

    fn build_band (&self, _granule_dir: &Path, _band: &BandDefinition, output: &Path)->Result<()> {
        write_file_atomic( output, b"gridded")?;
        Ok(())
    }
}

#[tokio::test]
async fn test_acquire_day()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().join("lvl1");

    let store = MockStore {
        products: vec![ NR_GRANULE.to_string(), NT_GRANULE.to_string(), CORRUPT_GRANULE.to_string() ],
        corrupt: HashSet::from([ CORRUPT_GRANULE.to_string() ]),
    };
    let acquisition = Lvl1Acquisition::new( store, MockBuilder, EumetsatConfig::default());

    let day = NaiveDate::from_ymd_opt( 2023, 7, 15).unwrap();
    let granules = acquisition.acquire_day( day, &dir).await?;

    assert_eq!( granules.len(), 1);
    assert_eq!( granules[0].granule, dir.join( NR_GRANULE));
    assert_eq!( granules[0].rasters.len(), BANDS.len());

    // all products were downloaded but only near real time granules were unpacked
    assert!( dir.join( format!("{NT_GRANULE}.zip")).is_file());
    assert!( !dir.join( NT_GRANULE).exists());
    assert!( !dir.join( CORRUPT_GRANULE).exists());

    // nothing left over from extraction
    let leftovers: Vec<_> = std::fs::read_dir( &dir)?
        .filter_map( |e| e.ok())
        .filter( |e| e.file_name().to_string_lossy().starts_with(".unpack"))
        .collect();
    assert!( leftovers.is_empty());
    Ok(())
}

#[test]
fn test_unpack_once()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let zip_path = tmp.path().join( format!("{NR_GRANULE}.zip"));
    write_product_zip( &zip_path, NR_GRANULE)?;

    let granule_dir = unpack_granule( &zip_path, "_NR_004.SEN3")?.unwrap();
    assert!( granule_dir.join( CANONICAL_FILE).is_file());

    // an existing granule dir is not unpacked again
    std::fs::remove_file( granule_dir.join( CANONICAL_FILE))?;
    let again = unpack_granule( &zip_path, "_NR_004.SEN3")?.unwrap();
    assert_eq!( again, granule_dir);
    assert!( !granule_dir.join( CANONICAL_FILE).exists());
    Ok(())
}
