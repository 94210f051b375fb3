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

//! conversion of tabular point detections (FIRMS hotspot CSVs, FRP fire tables) into flat CSV
//! and GeoJSON point feature collections

use std::{io::Read, path::{Path, PathBuf}};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use tracing::{info, warn};

use odin_common::fs::{filestem, write_file_atomic};
use crate::{
    errors::{Result, op_failed, OdinDatastoreError},
    manifest::{OutputManifest, SourceKind, write_manifest},
};

pub const LON_COLUMN: &str = "longitude";
pub const LAT_COLUMN: &str = "latitude";
pub const ACQ_DATE_COLUMN: &str = "acq_date";
pub const ACQ_TIME_COLUMN: &str = "acq_time";
pub const TIME_COLUMN: &str = "time";

/// columns we don't carry over into feature properties (they are replaced by `time`)
pub const EXCLUDED_PROPERTIES: [&str; 2] = [ACQ_DATE_COLUMN, ACQ_TIME_COLUMN];

/// a header plus rows of cell texts
#[derive(Debug,Clone,Default,PartialEq)]
pub struct PointTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PointTable {
    pub fn new (headers: Vec<String>)->Self {
        PointTable { headers, rows: Vec::new() }
    }

    pub fn is_empty (&self)->bool { self.rows.is_empty() }
    pub fn len (&self)->usize { self.rows.len() }

    pub fn column_index (&self, name: &str)->Option<usize> {
        self.headers.iter().position( |h| h == name)
    }
}

/// the files we produced for a table
#[derive(Debug,Clone)]
pub struct TableOutputs {
    pub csv: PathBuf,
    pub geojson: PathBuf,
    pub n_features: usize,
}

/* #region time normalization ***************************************************************************/

/// FIRMS reports `acq_time` as HHMM integer, i.e. without leading zeros ("930" is 09:30).
/// Returns "HH:MM:00"
pub fn normalize_acq_time (acq_time: &str)->Option<String> {
    let s = acq_time.trim();
    if s.is_empty() || s.len() > 4 || !s.chars().all( |c| c.is_ascii_digit()) {
        return None
    }

    let padded = format!("{:0>4}", s);
    let (hh,mm) = padded.split_at(2);
    NaiveTime::parse_from_str( &format!("{hh}:{mm}:00"), "%H:%M:%S").ok().map( |t| t.format("%H:%M:%S").to_string())
}

/// combine FIRMS `acq_date` ("YYYY-MM-DD") and `acq_time` (HHMM) into a datetime
pub fn hotspot_time (acq_date: &str, acq_time: &str)->Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str( acq_date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str( &normalize_acq_time( acq_time)?, "%H:%M:%S").ok()?;
    Some( NaiveDateTime::new( date, time))
}

pub fn format_time (dt: &NaiveDateTime)->String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/* #endregion time normalization */

/* #region reading ***************************************************************************************/

/// read a FIRMS hotspot CSV. `acq_time` is normalized to "HH:MM:00" and a `time` column is appended.
/// Rows without valid date/time are dropped
pub fn read_hotspot_table<R: Read> (reader: R)->Result<PointTable> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

    let mut headers: Vec<String> = csv_reader.headers()?.iter().map( |h| h.to_string()).collect();
    let date_idx = headers.iter().position( |h| h == ACQ_DATE_COLUMN).ok_or( op_failed!("no {} column", ACQ_DATE_COLUMN))?;
    let time_idx = headers.iter().position( |h| h == ACQ_TIME_COLUMN).ok_or( op_failed!("no {} column", ACQ_TIME_COLUMN))?;
    headers.push( TIME_COLUMN.to_string());

    let mut table = PointTable::new( headers);

    for (i,record) in csv_reader.records().enumerate() {
        let record = record?;
        let acq_date = record.get(date_idx).unwrap_or_default();
        let acq_time = record.get(time_idx).unwrap_or_default();

        match hotspot_time( acq_date, acq_time) {
            Some(dt) => {
                let mut row: Vec<String> = record.iter().map( |c| c.to_string()).collect();
                row[time_idx] = dt.format("%H:%M:%S").to_string();
                row.push( format_time(&dt));
                table.rows.push( row);
            }
            None => warn!("dropping row {}: invalid acq_date/acq_time '{}' '{}'", i+1, acq_date, acq_time)
        }
    }

    Ok(table)
}

/* #endregion reading */

/* #region writing ***************************************************************************************/

/// the JSON value of a cell text: integer if it is an integral number, float if it is any other
/// number, string otherwise
pub fn cell_value (s: &str)->JsonValue {
    if let Ok(i) = s.parse::<i64>() {
        JsonValue::from(i)
    } else if let Some(n) = s.parse::<f64>().ok().filter( |f| f.is_finite()).and_then( serde_json::Number::from_f64) {
        JsonValue::Number(n)
    } else {
        JsonValue::String( s.to_string())
    }
}

pub fn to_feature_collection (table: &PointTable)->Result<FeatureCollection> {
    let lon_idx = table.column_index( LON_COLUMN).ok_or( op_failed!("no {} column", LON_COLUMN))?;
    let lat_idx = table.column_index( LAT_COLUMN).ok_or( op_failed!("no {} column", LAT_COLUMN))?;

    let mut features: Vec<Feature> = Vec::with_capacity( table.len());
    for row in &table.rows {
        let lon = row.get(lon_idx).and_then( |s| s.parse::<f64>().ok());
        let lat = row.get(lat_idx).and_then( |s| s.parse::<f64>().ok());
        let (lon,lat) = match (lon,lat) {
            (Some(lon),Some(lat)) if lon.is_finite() && lat.is_finite() => (lon,lat),
            _ => { warn!("skipping feature without valid position: {:?}", row); continue }
        };

        let mut properties = JsonObject::new();
        for (name,cell) in table.headers.iter().zip( row.iter()) {
            if !EXCLUDED_PROPERTIES.contains( &name.as_str()) {
                properties.insert( name.clone(), cell_value( cell));
            }
        }

        features.push( Feature {
            bbox: None,
            geometry: Some( Geometry::new( Value::Point( vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok( FeatureCollection { bbox: None, features, foreign_members: None } )
}

pub fn write_table_csv (table: &PointTable, path: &Path)->Result<()> {
    let mut writer = csv::Writer::from_writer( Vec::new());
    writer.write_record( &table.headers)?;
    for row in &table.rows {
        writer.write_record( row)?;
    }
    let data = writer.into_inner().map_err( |e| op_failed!("csv flush failed: {}", e))?;
    write_file_atomic( path, &data)?;
    Ok(())
}

pub fn write_feature_collection (fc: &FeatureCollection, path: &Path)->Result<()> {
    let json = serde_json::to_string( fc)?;
    write_file_atomic( path, json.as_bytes())?;
    Ok(())
}

/// write `<base>.csv` and `<base>.geojson` plus their manifests. Empty tables are not written
pub fn write_point_outputs (table: &PointTable, base: &Path, source: SourceKind, acquired: DateTime<Utc>)->Result<Option<TableOutputs>> {
    let label = filestem( &base).map( |s| s.to_string()).unwrap_or_default();
    if table.is_empty() {
        info!("no records for {}, nothing written", label);
        return Ok(None)
    }

    let csv = base.with_extension("csv");
    let geojson = base.with_extension("geojson");
    let fc = to_feature_collection( table)?;
    let n_features = fc.features.len();

    write_table_csv( table, &csv)?;
    write_feature_collection( &fc, &geojson)?;

    let manifest = OutputManifest::new( source, acquired, &label);
    write_manifest( &csv, &manifest)?;
    write_manifest( &geojson, &manifest)?;

    info!("wrote {} records to {:?}", n_features, geojson);
    Ok( Some( TableOutputs { csv, geojson, n_features }) )
}

/// the whole FIRMS hotspot pipeline for one CSV source. `base` is the output path without extension
pub fn convert_hotspots<R: Read> (reader: R, base: &Path, acquired: DateTime<Utc>)->Result<Option<TableOutputs>> {
    let table = read_hotspot_table( reader)?;
    write_point_outputs( &table, base, SourceKind::Hotspot, acquired)
}

pub fn convert_hotspot_file (input: &Path, base: &Path, acquired: DateTime<Utc>)->Result<Option<TableOutputs>> {
    let file = std::fs::File::open( input).map_err( |e| OdinDatastoreError::MissingInput( format!("{:?}: {}", input, e)))?;
    convert_hotspots( file, base, acquired)
}

/* #endregion writing */
