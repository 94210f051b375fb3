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

use std::{path::Path, time::Duration};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use odin_common::{BoundingBox, datetime::{deserialize_duration, serialize_duration}};
use crate::errors::Result;

/// names of the environment variables that hold our secrets. Secrets are never part of config files
pub const EUMETSAT_KEY: &str = "EUMETSAT_KEY";
pub const EUMETSAT_SECRET: &str = "EUMETSAT_SECRET";
pub const FIRMS_MAP_KEY: &str = "FIRMS_MAP_KEY";
pub const FRP_FTP_USER: &str = "FRP_FTP_USER";
pub const FRP_FTP_PASSWORD: &str = "FRP_FTP_PASSWORD";

/// fixed-delay retry policy for remote operations
#[derive(Debug,Clone,Copy,Serialize,Deserialize,PartialEq)]
pub struct RetryPolicy {
    pub attempts: usize,
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new (attempts: usize, delay: Duration)->Self { RetryPolicy { attempts, delay } }
}

/// EUMETSAT Data Store access for SLSTR Level-1 products
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct EumetsatConfig {
    pub token_url: String,
    pub search_url: String,
    pub download_url: String,
    pub collection: String,
    /// closed lon/lat ring of the region of interest
    pub roi: Vec<(f64,f64)>,
    /// products per search page
    pub page_size: usize,
    pub retry: RetryPolicy,
    pub download_workers: usize,
    pub conversion_workers: usize,
    /// only granules with names ending in this suffix are unpacked and converted
    pub granule_suffix: String,
}

impl Default for EumetsatConfig {
    fn default()->Self {
        EumetsatConfig {
            token_url: "https://api.eumetsat.int/token".into(),
            search_url: "https://api.eumetsat.int/data/search-products/1.0.0/os".into(),
            download_url: "https://api.eumetsat.int/data/download/1.0.0".into(),
            collection: "EO:EUM:DAT:0411".into(),
            roi: vec![ (-98.0,56.0), (-98.0,46.0), (-82.0,46.0), (-82.0,56.0), (-98.0,56.0) ], // PICKLE_LAKE
            page_size: 100,
            retry: RetryPolicy::new( 3, Duration::from_secs(3)),
            download_workers: 4,
            conversion_workers: 2,
            granule_suffix: "_NR_004.SEN3".into(),
        }
    }
}

/// the partner FTP(S) server that hosts Level-2 FRP products
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct FrpMirrorConfig {
    /// "host:port"
    pub host: String,
    pub root_dir: String,
    pub use_tls: bool,
    /// sub directories that contain this pattern are not mirrored
    pub exclude_pattern: String,
    pub retry: RetryPolicy,
    /// FRP product files to convert
    pub file_prefix: String,
    pub output_dir: String,
}

impl Default for FrpMirrorConfig {
    fn default()->Self {
        FrpMirrorConfig {
            host: "ftp.example.org:21".into(),
            root_dir: "NRT_like_data".into(),
            use_tls: true,
            exclude_pattern: "SL_1_RBT".into(),
            retry: RetryPolicy::new( 3, Duration::from_secs(2)),
            file_prefix: "FRP".into(),
            output_dir: "processed_output".into(),
        }
    }
}

impl FrpMirrorConfig {
    /// the host name without port, as needed for TLS server verification
    pub fn domain (&self)->&str {
        self.host.split(':').next().unwrap_or( self.host.as_str())
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct FirmsConfig {
    pub base_url: String,
    pub sensors: Vec<String>,
    pub bbox: BoundingBox,
    pub day_range: u32,
    pub retry: RetryPolicy,
}

impl Default for FirmsConfig {
    fn default()->Self {
        FirmsConfig {
            base_url: "https://firms.modaps.eosdis.nasa.gov".into(),
            sensors: vec![ "MODIS_NRT".into(), "VIIRS_NOAA20_NRT".into(), "VIIRS_SNPP_NRT".into(), "GOES_NRT".into() ],
            bbox: BoundingBox::new( -98.0, 46.0, -82.0, 56.0),
            day_range: 1,
            retry: RetryPolicy::new( 3, Duration::from_secs(3)),
        }
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// if set, layer sources are `/vsicurl/<base_url>/<path relative to project root>`
    pub base_url: Option<String>,
    pub dir_name: String,
    pub crs: String,
}

impl Default for ProjectConfig {
    fn default()->Self {
        ProjectConfig { base_url: None, dir_name: "qgis_projects".into(), crs: "EPSG:3347".into() }
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// first day of the campaign. Earlier data is neither retrieved nor aggregated
    pub campaign_start: NaiveDate,
    pub eumetsat: EumetsatConfig,
    pub frp: FrpMirrorConfig,
    pub firms: FirmsConfig,
    pub projects: ProjectConfig,
}

impl Default for DatastoreConfig {
    fn default()->Self {
        DatastoreConfig {
            campaign_start: NaiveDate::from_ymd_opt( 2023, 7, 1).unwrap_or_default(),
            eumetsat: EumetsatConfig::default(),
            frp: FrpMirrorConfig::default(),
            firms: FirmsConfig::default(),
            projects: ProjectConfig::default(),
        }
    }
}

pub fn load_config_path<P: AsRef<Path>> (path: P)->Result<DatastoreConfig> {
    let data = std::fs::read_to_string( path.as_ref())?;
    Ok( ron::from_str( &data)? )
}

/// the config at `path` if given, the built-in campaign defaults otherwise
pub fn load_config_or_default<P: AsRef<Path>> (path: Option<P>)->Result<DatastoreConfig> {
    match path {
        Some(path) => load_config_path(path),
        None => Ok( DatastoreConfig::default() )
    }
}
