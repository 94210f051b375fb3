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

//! grouping of produced rasters and feature files by acquisition date

use std::{collections::BTreeMap, path::{Path, PathBuf}};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use odin_common::{
    datetime::{naive_utc_date_to_utc_datetime, parse_compact_utc, parse_ymd},
    fs::{files_with_extension, filestem, parent_dirname},
};
use crate::{errors::Result, manifest::{SourceKind, read_manifest}};

/// a file we can put into a project
#[derive(Debug,Clone,PartialEq)]
pub struct Resource {
    pub path: PathBuf,
    pub label: String,
    pub acquired: DateTime<Utc>,
}

#[derive(Debug,Clone,PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub rasters: Vec<Resource>,
    pub fires: Vec<Resource>,
    pub hotspots: Vec<Resource>,
}

impl DayBucket {
    pub fn new (date: NaiveDate)->Self {
        DayBucket { date, rasters: Vec::new(), fires: Vec::new(), hotspots: Vec::new() }
    }

    pub fn is_empty (&self)->bool {
        self.rasters.is_empty() && self.fires.is_empty() && self.hotspots.is_empty()
    }

    pub fn len (&self)->usize {
        self.rasters.len() + self.fires.len() + self.hotspots.len()
    }

    pub fn resources (&self, kind: SourceKind)->&Vec<Resource> {
        match kind {
            SourceKind::Raster => &self.rasters,
            SourceKind::Fire => &self.fires,
            SourceKind::Hotspot => &self.hotspots,
        }
    }

    fn resources_mut (&mut self, kind: SourceKind)->&mut Vec<Resource> {
        match kind {
            SourceKind::Raster => &mut self.rasters,
            SourceKind::Fire => &mut self.fires,
            SourceKind::Hotspot => &mut self.hotspots,
        }
    }
}

/// the roots we collect from. Missing roots just don't contribute
#[derive(Debug,Clone,Default)]
pub struct AggregationRoots {
    pub rasters: Option<PathBuf>,
    pub fires: Option<PathBuf>,
    pub hotspots: Option<PathBuf>,
}

/* #region file name fallbacks **************************************************************************/

/// Sentinel-3 product names have the sensing start as their 8th `_` separated segment
/// (e.g. "S3A_SL_1_RBT____20230715T163524_20230715T163824_...")
fn product_name_start (name: &str)->Option<DateTime<Utc>> {
    name.split('_').nth(7).and_then( parse_compact_utc)
}

/// rasters live inside their granule dir
pub fn raster_time_from_name (path: &Path)->Option<DateTime<Utc>> {
    parent_dirname( &path).and_then( product_name_start)
}

/// fire outputs are named after their granule
pub fn fire_time_from_name (path: &Path)->Option<DateTime<Utc>> {
    path.file_name().and_then( |s| s.to_str()).and_then( product_name_start)
}

/// hotspot outputs are named "<sensor>_<YYYY-MM-DD>"
pub fn hotspot_time_from_name (path: &Path)->Option<DateTime<Utc>> {
    filestem( &path)
        .and_then( |s| s.rsplit('_').next())
        .and_then( parse_ymd)
        .map( naive_utc_date_to_utc_datetime)
}

/* #endregion file name fallbacks */

/// the resource for an output file of the given kind. We prefer the manifest and only reverse engineer the
/// acquisition time from the file name if there is none
pub fn resource_of (path: &Path, kind: SourceKind)->Option<Resource> {
    let default_label = || filestem( &path).unwrap_or_default().to_string();

    if let Some(manifest) = read_manifest( path) {
        if manifest.source != kind {
            return None // shared output folders, this one belongs to another source
        }
        let label = if manifest.label.is_empty() { default_label() } else { manifest.label };
        return Some( Resource { path: path.to_path_buf(), label, acquired: manifest.acquired })
    }

    let acquired = match kind {
        SourceKind::Raster => raster_time_from_name( path),
        SourceKind::Fire => fire_time_from_name( path),
        SourceKind::Hotspot => hotspot_time_from_name( path),
    }?;
    Some( Resource { path: path.to_path_buf(), label: default_label(), acquired })
}

fn candidates (root: &Option<PathBuf>, ext: &str)->Result<Vec<PathBuf>> {
    match root {
        Some(dir) if dir.is_dir() => Ok( files_with_extension( dir, ext, true)? ),
        _ => Ok( Vec::new() )
    }
}

/// collect all outputs under `roots` into day buckets, ordered by date. Days before `start` are dropped,
/// files without a recognizable timestamp are ignored
pub fn aggregate (roots: &AggregationRoots, start: NaiveDate)->Result<BTreeMap<NaiveDate,DayBucket>> {
    let mut buckets: BTreeMap<NaiveDate,DayBucket> = BTreeMap::new();

    let sources = [
        (SourceKind::Raster, candidates( &roots.rasters, "tif")?),
        (SourceKind::Fire, candidates( &roots.fires, "geojson")?),
        (SourceKind::Hotspot, candidates( &roots.hotspots, "geojson")?),
    ];

    for (kind, paths) in sources {
        for path in paths {
            match resource_of( &path, kind) {
                Some(res) => {
                    let date = res.acquired.date_naive();
                    if date >= start {
                        buckets.entry( date).or_insert_with( || DayBucket::new(date)).resources_mut( kind).push( res);
                    } else {
                        debug!("{:?} predates {}", path, start);
                    }
                }
                None => debug!("no acquisition time for {:?}", path)
            }
        }
    }

    for bucket in buckets.values_mut() {
        for kind in [SourceKind::Raster, SourceKind::Fire, SourceKind::Hotspot] {
            bucket.resources_mut( kind).sort_by( |a,b| a.acquired.cmp( &b.acquired).then_with( || a.path.cmp( &b.path)));
        }
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_fallbacks() {
        let raster = Path::new("/l1/S3A_SL_1_RBT____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004.SEN3/F1_BT_fn.tif");
        assert_eq!( raster_time_from_name(raster).unwrap().to_rfc3339(), "2023-07-15T16:35:24+00:00");

        let fire = Path::new("/l2/processed_output/S3B_SL_2_FRP____20230714T031500_20230714T031800_20230714T052304_0179_082_012_2340_PS2_O_NR_004_in.geojson");
        assert_eq!( fire_time_from_name(fire).unwrap().to_rfc3339(), "2023-07-14T03:15:00+00:00");

        let hotspot = Path::new("/firms/VIIRS_NOAA20_NRT_2023-07-14.geojson");
        assert_eq!( hotspot_time_from_name(hotspot).unwrap().to_rfc3339(), "2023-07-14T00:00:00+00:00");

        assert!( raster_time_from_name( Path::new("/l1/S3A.SEN3/work/longitude_in.tif")).is_none());
        assert!( hotspot_time_from_name( Path::new("/firms/notes.geojson")).is_none());
    }
}
