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

//! sidecar files that record what an output file is and when its data was acquired, so that
//! consumers don't have to reverse engineer this from file names

use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use odin_common::fs::{sibling_with_suffix, write_file_atomic};
use crate::errors::Result;

pub const MANIFEST_SUFFIX: &str = ".meta.json";

#[derive(Debug,Clone,Copy,Serialize,Deserialize,PartialEq,Eq,Hash)]
#[serde(rename_all="lowercase")]
pub enum SourceKind {
    Raster,
    Fire,
    Hotspot,
}

#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct OutputManifest {
    pub source: SourceKind,
    pub acquired: DateTime<Utc>,
    pub label: String,
}

impl OutputManifest {
    pub fn new (source: SourceKind, acquired: DateTime<Utc>, label: impl ToString)->Self {
        OutputManifest { source, acquired, label: label.to_string() }
    }
}

pub fn manifest_path (output: impl AsRef<Path>)->PathBuf {
    sibling_with_suffix( output, MANIFEST_SUFFIX)
}

pub fn write_manifest (output: impl AsRef<Path>, manifest: &OutputManifest)->Result<PathBuf> {
    let path = manifest_path( output);
    let json = serde_json::to_string_pretty( manifest)?;
    write_file_atomic( &path, json.as_bytes())?;
    Ok(path)
}

/// the manifest of `output` if there is a readable one
pub fn read_manifest (output: impl AsRef<Path>)->Option<OutputManifest> {
    let path = manifest_path( output);
    let data = std::fs::read( &path).ok()?;
    serde_json::from_slice( &data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manifest_file() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("S7_BT_in.tif");
        assert!( read_manifest(&out).is_none());

        let acquired = Utc.with_ymd_and_hms( 2023, 7, 15, 16, 35, 24).unwrap();
        let m = OutputManifest::new( SourceKind::Raster, acquired, "S7_BT_in");
        let path = write_manifest( &out, &m)?;
        assert!( path.ends_with("S7_BT_in.tif.meta.json"));

        let json = std::fs::read_to_string(&path)?;
        assert!( json.contains("\"raster\""));
        assert_eq!( read_manifest(&out), Some(m));
        Ok(())
    }
}
