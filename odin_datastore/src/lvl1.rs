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

//! acquisition of Sentinel-3 SLSTR Level-1 granules: search, download, unpack and grid

use std::{fs::File, path::{Path, PathBuf}, sync::Arc};
use chrono::{Days, NaiveDate};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use odin_common::{datetime::{days_inclusive, naive_utc_date_to_utc_datetime}, fs::ensure_dir};
use crate::{
    config::EumetsatConfig,
    eumdac::ProductStore,
    errors::{Result, op_failed},
    gridder::{BandBuilder, GranuleConverter, GranuleRasters},
};

/// the granule directory a product zip unpacks into ("<dir>/<id>.zip" -> "<dir>/<id>")
pub fn granule_dir_of (zip_path: &Path)->Option<PathBuf> {
    let stem = zip_path.file_stem()?;
    Some( zip_path.with_file_name( stem))
}

/// unpack a product zip next to it unless the granule directory already exists. Returns None for
/// products we don't process (granule name not ending in `suffix`)
pub fn unpack_granule (zip_path: &Path, suffix: &str)->Result<Option<PathBuf>> {
    let granule_dir = granule_dir_of( zip_path).ok_or( op_failed!("not a product zip {:?}", zip_path))?;
    let is_selected = granule_dir.file_name().and_then( |s| s.to_str()).map( |s| s.ends_with( suffix)).unwrap_or(false);
    if !is_selected {
        debug!("ignoring product {:?}", zip_path);
        return Ok(None)
    }

    if !granule_dir.is_dir() {
        let tgt_dir = zip_path.parent().ok_or( op_failed!("no parent dir for {:?}", zip_path))?;
        info!("unpacking {:?}", zip_path);

        // the granule dir only appears once extraction is complete
        let tmp_dir = tempfile::Builder::new().prefix(".unpack").tempdir_in( tgt_dir)?;
        let mut archive = ZipArchive::new( File::open( zip_path)?)?;
        archive.extract( tmp_dir.path())?;

        let unpacked = tmp_dir.path().join( granule_dir.file_name().unwrap_or_default());
        if !unpacked.is_dir() {
            return Err( op_failed!("{:?} did not contain {:?}", zip_path, granule_dir))
        }
        std::fs::rename( &unpacked, &granule_dir)?;
    }

    Ok( Some(granule_dir) )
}

pub struct Lvl1Acquisition<S: ProductStore, B: BandBuilder + 'static> {
    store: S,
    converter: Arc<GranuleConverter<B>>,
    config: EumetsatConfig,
}

impl<S: ProductStore, B: BandBuilder + 'static> Lvl1Acquisition<S,B> {
    pub fn new (store: S, builder: B, config: EumetsatConfig)->Self {
        Lvl1Acquisition { store, converter: Arc::new( GranuleConverter::new( builder)), config }
    }

    /// download all products in the bounded download pool. Failed downloads are logged and dropped
    async fn download_all (&self, ids: Vec<String>, dir: &Path)->Vec<PathBuf> {
        let results: Vec<Result<PathBuf>> = stream::iter( ids)
            .map( |id| async move {
                let res = self.store.download( &id, dir).await;
                if let Err(e) = &res { warn!("failed to download {}: {}", id, e) }
                res
            })
            .buffer_unordered( self.config.download_workers.max(1))
            .collect().await;

        results.into_iter().filter_map( |r| r.ok()).collect()
    }

    /// unpack and grid granules in the bounded conversion pool. Each conversion is a blocking task
    async fn convert_all (&self, zips: Vec<PathBuf>)->Vec<GranuleRasters> {
        let suffix = self.config.granule_suffix.clone();

        let results: Vec<Option<GranuleRasters>> = stream::iter( zips)
            .map( |zip_path| {
                let converter = self.converter.clone();
                let suffix = suffix.clone();
                async move {
                    let task = tokio::task::spawn_blocking( move || -> Result<Option<GranuleRasters>> {
                        match unpack_granule( &zip_path, &suffix) {
                            Ok(Some(granule_dir)) => Ok( Some( converter.convert( &granule_dir)?)),
                            Ok(None) => Ok(None),
                            Err(e) => { warn!("skipping corrupt product {:?}: {}", zip_path, e); Ok(None) }
                        }
                    });
                    match task.await {
                        Ok(Ok(res)) => res,
                        Ok(Err(e)) => { warn!("granule conversion failed: {}", e); None }
                        Err(e) => { warn!("granule conversion task failed: {}", e); None }
                    }
                }
            })
            .buffer_unordered( self.config.conversion_workers.max(1))
            .collect().await;

        results.into_iter().flatten().collect()
    }

    /// search, download and convert all products sensed on `day`
    pub async fn acquire_day (&self, day: NaiveDate, dir: &Path)->Result<Vec<GranuleRasters>> {
        ensure_dir( dir)?;

        let start = naive_utc_date_to_utc_datetime( day);
        let end = naive_utc_date_to_utc_datetime( day.checked_add_days( Days::new(1)).ok_or( op_failed!("invalid day {}", day))?);

        let ids = self.store.search( start, end).await?;
        if ids.is_empty() {
            info!("no products for {}", day);
            return Ok(Vec::new())
        }
        info!("will download {} products for {}", ids.len(), day);

        let zips = self.download_all( ids, dir).await;
        let granules = self.convert_all( zips).await;
        info!("{} granules converted for {}", granules.len(), day);

        Ok(granules)
    }

    /// acquire day by day from `first` through `last`. A failing day is logged and does not stop the loop
    pub async fn acquire_days (&self, first: NaiveDate, last: NaiveDate, dir: &Path)->Result<Vec<GranuleRasters>> {
        let mut granules: Vec<GranuleRasters> = Vec::new();
        for day in days_inclusive( first, last) {
            match self.acquire_day( day, dir).await {
                Ok(mut gs) => granules.append( &mut gs),
                Err(e) => warn!("level 1 acquisition for {} failed: {}", day, e)
            }
        }
        Ok(granules)
    }
}
