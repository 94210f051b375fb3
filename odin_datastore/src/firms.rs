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

//! retrieval of NASA FIRMS hotspots through the area CSV API.
//! See https://firms.modaps.eosdis.nasa.gov/api/area/

use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use reqwest::{Client, header::HeaderMap};
use tracing::{info, warn};

use odin_common::{datetime::naive_utc_date_to_utc_datetime, fs::ensure_dir, net::get_text};
use crate::{
    config::{FirmsConfig, FIRMS_MAP_KEY},
    errors::{Result, env_credential},
    hotspots::{TableOutputs, convert_hotspots},
    retry::retry_async,
};

pub fn firms_url (config: &FirmsConfig, map_key: &str, sensor: &str, date: NaiveDate)->String {
    format!("{}/api/area/csv/{}/{}/{}/{}/{}",
        config.base_url.trim_end_matches('/'), map_key, sensor, config.bbox.to_csv_string(0), config.day_range, date.format("%Y-%m-%d"))
}

/// output file base name (without extension) for a sensor/date
pub fn firms_output_base (dir: &Path, sensor: &str, date: NaiveDate)->PathBuf {
    dir.join( format!("{}_{}", sensor, date.format("%Y-%m-%d")))
}

pub struct FirmsClient {
    client: Client,
    config: FirmsConfig,
    map_key: String,
}

impl FirmsClient {
    pub fn new (config: FirmsConfig, map_key: String)->Self {
        FirmsClient { client: Client::new(), config, map_key }
    }

    /// fails with MissingCredentials if the map key is not in our environment
    pub fn from_env (config: FirmsConfig)->Result<Self> {
        let map_key = env_credential( FIRMS_MAP_KEY)?;
        Ok( Self::new( config, map_key) )
    }

    pub async fn fetch_csv (&self, sensor: &str, date: NaiveDate)->Result<String> {
        let url = firms_url( &self.config, &self.map_key, sensor, date);
        let headers: Option<HeaderMap> = None;
        let text = retry_async( &self.config.retry, &format!("FIRMS {sensor} {date}"), || get_text( &self.client, &url, &headers)).await?;
        Ok(text)
    }

    /// retrieve and convert hotspots of all configured sensors for `date`. Sensors without hotspots
    /// produce no files, failing sensors are logged and skipped
    pub async fn get_hotspots (&self, date: NaiveDate, dir: &Path)->Result<Vec<TableOutputs>> {
        ensure_dir( dir)?;
        let acquired = naive_utc_date_to_utc_datetime( date);
        let mut outputs: Vec<TableOutputs> = Vec::new();

        for sensor in &self.config.sensors {
            let text = match self.fetch_csv( sensor, date).await {
                Ok(text) => text,
                Err(e) => { warn!("failed to retrieve {} hotspots for {}: {}", sensor, date, e); continue }
            };

            let base = firms_output_base( dir, sensor, date);
            match convert_hotspots( text.as_bytes(), &base, acquired) {
                Ok(Some(out)) => outputs.push(out),
                Ok(None) => info!("no hotspots for {} on {}", sensor, date),
                Err(e) => warn!("failed to convert {} hotspots for {}: {}", sensor, date, e)
            }
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let config = FirmsConfig::default();
        let date = NaiveDate::from_ymd_opt( 2023, 7, 15).unwrap();
        assert_eq!(
            firms_url( &config, "KEY", "VIIRS_SNPP_NRT", date),
            "https://firms.modaps.eosdis.nasa.gov/api/area/csv/KEY/VIIRS_SNPP_NRT/-98,46,-82,56/1/2023-07-15"
        );
        assert_eq!( firms_output_base( Path::new("/firms"), "GOES_NRT", date), PathBuf::from("/firms/GOES_NRT_2023-07-15"));
    }
}
