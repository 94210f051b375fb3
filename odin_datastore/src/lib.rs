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

//! a campaign datastore that collects Sentinel-3 SLSTR Level-1 swaths, Sentinel-3 Level-2 FRP products and
//! NASA FIRMS hotspots for a region, converts them into gridded rasters and point feature files and
//! assembles per-day QGIS projects that show all three

pub mod errors;
pub mod config;
pub mod retry;
pub mod manifest;
pub mod gridder;
pub mod eumdac;
pub mod lvl1;
pub mod mirror;
pub mod lvl2;
pub mod hotspots;
pub mod firms;
pub mod aggregate;
pub mod qgis;

use std::path::{Path, PathBuf};
use chrono::NaiveDate;

use odin_common::{datetime::{parse_ymd, utc_now}, fs::ensure_writable_dir};
use crate::{aggregate::AggregationRoots, config::DatastoreConfig, errors::{Result, OdinDatastoreError}};

/// the local output folders of a campaign
#[derive(Debug,Clone)]
pub struct CampaignFolders {
    pub lvl1: PathBuf,
    pub lvl2: PathBuf,
    pub firms: PathBuf,
    pub project_root: PathBuf,
}

impl CampaignFolders {
    /// create missing folders
    pub fn ensure (&self)->Result<()> {
        for dir in [&self.lvl1, &self.lvl2, &self.firms, &self.project_root] {
            ensure_writable_dir( dir)?;
        }
        Ok(())
    }

    pub fn aggregation_roots (&self, config: &DatastoreConfig)->AggregationRoots {
        AggregationRoots {
            rasters: Some( self.lvl1.clone()),
            fires: Some( self.lvl2.join( &config.frp.output_dir)),
            hotspots: Some( self.firms.clone()),
        }
    }
}

/// the start date of a run: the given "YYYY-MM-DD" date or the campaign start. Invalid dates are an error
pub fn start_date (date_arg: Option<&str>, config: &DatastoreConfig)->Result<NaiveDate> {
    match date_arg {
        Some(s) => parse_ymd( s).ok_or( OdinDatastoreError::InvalidDate( s.to_string())),
        None => Ok( config.campaign_start )
    }
}

pub fn today ()->NaiveDate {
    utc_now().date_naive()
}

/// relative paths are resolved against the current dir so that logs and manifests show where things went
pub fn resolve_dir (dir: &Path)->Result<PathBuf> {
    Ok( std::path::absolute( dir)? )
}
