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

//! Sentinel-3 Level-2 fire radiative power (FRP) products: mirroring from the partner FTP server and
//! conversion of the per-fire tables into CSV and GeoJSON

use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use tracing::{error, info, warn};

use odin_common::{datetime::parse_compact_utc, fs::{ensure_dir, matching_files_rec}};
use odin_gdal::mdim::{Column, read_1d_columns};
use crate::{
    config::{FrpMirrorConfig, FRP_FTP_USER, FRP_FTP_PASSWORD},
    errors::{Result, env_credential, op_failed},
    hotspots::{PointTable, TableOutputs, write_point_outputs},
    manifest::SourceKind,
    mirror::{FtpSession, MirrorOptions, mirror_tree},
    retry::retry_blocking,
};

pub const FIRES_DIMENSION: &str = "fires";

/// mirror the FRP product tree into `lvl2_dir`. Credentials are checked before we connect
pub fn mirror_frp (config: &FrpMirrorConfig, cutoff: Option<NaiveDate>, lvl2_dir: &Path)->Result<Vec<PathBuf>> {
    let user = env_credential( FRP_FTP_USER)?;
    let pw = env_credential( FRP_FTP_PASSWORD)?;

    let mut session = retry_blocking( &config.retry, &format!("connecting to {}", config.host), || {
        FtpSession::connect( &config.host, config.domain(), config.use_tls, &user, &pw)
    })?;
    let opts = MirrorOptions { exclude_pattern: config.exclude_pattern.clone(), cutoff, retry: config.retry };
    let res = mirror_tree( &mut session, &config.root_dir, lvl2_dir, &opts);

    if let Err(e) = session.quit() { warn!("FTP quit failed: {}", e) }
    res
}

/// the second `_` separated segment of the FRP file stem ("FRP_in.nc" -> "in")
pub fn frp_tag (path: &Path)->Option<&str> {
    path.file_stem().and_then( |s| s.to_str()).and_then( |s| s.split('_').nth(1)).filter( |s| !s.is_empty())
}

/// granule directory name without ".SEN3" extension
pub fn granule_stem (path: &Path)->Option<&str> {
    path.parent().and_then( |p| p.file_name()).and_then( |s| s.to_str()).map( |s| s.strip_suffix(".SEN3").unwrap_or(s))
}

/// granule start time from the 8th `_` separated segment of its name
pub fn granule_start (granule_name: &str)->Option<DateTime<Utc>> {
    granule_name.split('_').nth(7).and_then( parse_compact_utc)
}

/// the base path (without extension) of the outputs for the FRP file at `path`
pub fn frp_output_base (path: &Path, output_dir: &Path)->Option<PathBuf> {
    let granule = granule_stem( path)?;
    let tag = frp_tag( path)?;
    Some( output_dir.join( format!("{granule}_{tag}")))
}

/// turn the columns into a table, formatting values. Missing values are empty cells
pub fn columns_to_table (columns: &[Column])->PointTable {
    let headers: Vec<String> = columns.iter().map( |c| c.name.clone()).collect();
    let n_rows = columns.iter().map( |c| c.values.len()).max().unwrap_or(0);

    let mut table = PointTable::new( headers);
    for i in 0..n_rows {
        let row = columns.iter().map( |c| {
            match c.values.get(i) {
                Some(v) if v.is_finite() => v.to_string(),
                _ => String::new()
            }
        }).collect();
        table.rows.push( row);
    }
    table
}

/// convert a single FRP product file. Returns None if it does not contain any fires. Files without a
/// granule start time can't be placed on a day and are rejected
pub fn convert_frp_file (path: &Path, output_dir: &Path)->Result<Option<TableOutputs>> {
    let base = frp_output_base( path, output_dir).ok_or( op_failed!("not a FRP granule file {:?}", path))?;
    let acquired = granule_stem( path).and_then( granule_start).ok_or( op_failed!("no granule start time for {:?}", path))?;

    match read_1d_columns( path, FIRES_DIMENSION)? {
        Some(columns) => {
            let table = columns_to_table( &columns);
            info!("{} fires in {:?}", table.len(), path);
            write_point_outputs( &table, &base, SourceKind::Fire, acquired)
        }
        None => {
            info!("no fires in {:?}", path);
            Ok(None)
        }
    }
}

/// convert all FRP product files below `lvl2_dir` into `<lvl2_dir>/<output_dir>`
pub fn process_lvl2_products (lvl2_dir: &Path, config: &FrpMirrorConfig)->Result<Vec<TableOutputs>> {
    let output_dir = lvl2_dir.join( &config.output_dir);
    ensure_dir( &output_dir)?;

    let re = Regex::new( &format!(r"^{}.*\.nc$", regex::escape( &config.file_prefix))).map_err( |e| op_failed!("{}", e))?;
    let mut outputs: Vec<TableOutputs> = Vec::new();

    for path in matching_files_rec( &lvl2_dir, &re)? {
        if path.starts_with( &output_dir) { continue }

        match convert_frp_file( &path, &output_dir) {
            Ok(Some(out)) => outputs.push( out),
            Ok(None) => {}
            Err(e) => warn!("failed to convert {:?}: {}", path, e)
        }
    }

    Ok(outputs)
}

/// what a Level-2 update produced. `n_mirrored` is None if mirroring failed
#[derive(Debug)]
pub struct Lvl2Update {
    pub n_mirrored: Option<usize>,
    pub outputs: Vec<TableOutputs>,
}

/// mirror and convert. A failed mirror is logged and whatever we already have locally still gets converted
pub fn update_lvl2 (config: &FrpMirrorConfig, cutoff: Option<NaiveDate>, lvl2_dir: &Path)->Result<Lvl2Update> {
    let n_mirrored = match mirror_frp( config, cutoff, lvl2_dir) {
        Ok(downloaded) => Some( downloaded.len()),
        Err(e) => { error!("mirroring FRP products failed: {}", e); None }
    };
    let outputs = process_lvl2_products( lvl2_dir, config)?;

    Ok( Lvl2Update { n_mirrored, outputs } )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANULE: &str = "S3A_SL_2_FRP____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004.SEN3";

    #[test]
    fn test_output_names() {
        let path = PathBuf::from("/data/lvl2/20230715").join(GRANULE).join("FRP_in.nc");
        assert_eq!( frp_tag(&path), Some("in"));

        let base = frp_output_base( &path, Path::new("/data/lvl2/processed_output")).unwrap();
        assert_eq!( base, PathBuf::from("/data/lvl2/processed_output/S3A_SL_2_FRP____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004_in"));

        let start = granule_start( granule_stem(&path).unwrap()).unwrap();
        assert_eq!( start.to_rfc3339(), "2023-07-15T16:35:24+00:00");

        assert!( frp_tag( Path::new("FRP.nc")).is_none());
    }

    #[test]
    fn test_no_granule_time() {
        let tmp = tempfile::tempdir().unwrap();
        let day_dir = tmp.path().join("20230715");
        std::fs::create_dir_all( &day_dir).unwrap();
        let path = day_dir.join("FRP_in.nc");
        std::fs::write( &path, b"not opened").unwrap();

        assert!( granule_stem(&path).and_then( granule_start).is_none());

        let output_dir = tmp.path().join("processed_output");
        assert!( convert_frp_file( &path, &output_dir).is_err());
        assert!( !output_dir.join("20230715_in.geojson").exists());
        assert!( !output_dir.join("20230715_in.geojson.meta.json").exists());
    }

    #[test]
    fn test_columns_to_table() {
        let columns = vec![
            Column { name: "latitude".into(), values: vec![50.5, 51.25] },
            Column { name: "longitude".into(), values: vec![-90.0, -91.5] },
            Column { name: "FRP_MWIR".into(), values: vec![12.5, f64::NAN] },
        ];
        let table = columns_to_table( &columns);
        assert_eq!( table.headers, vec!["latitude", "longitude", "FRP_MWIR"]);
        assert_eq!( table.rows[0], vec!["50.5", "-90", "12.5"]);
        assert_eq!( table.rows[1], vec!["51.25", "-91.5", ""]);
    }
}
