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

//! generation of per-day QGIS project files (`.qgs`) that reference our rasters and feature files

use std::{collections::BTreeMap, io::Cursor, path::{Path, PathBuf}};
use chrono::NaiveDate;
use quick_xml::{Writer, events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event}};
use tracing::{debug, info};

use odin_common::fs::{ensure_dir, path_to_lossy_string, write_file_atomic};
use crate::{
    aggregate::{DayBucket, Resource},
    config::ProjectConfig,
    errors::Result,
    manifest::SourceKind,
};

pub const QGIS_VERSION: &str = "3.28.0-Firenze";

/// layer tree group name, QGIS provider key and map layer type for each of our sources
pub fn group_of (kind: SourceKind)->(&'static str, &'static str, &'static str) {
    match kind {
        SourceKind::Raster => ("SLSTR L1", "gdal", "raster"),
        SourceKind::Fire => ("S3 FRP", "ogr", "vector"),
        SourceKind::Hotspot => ("FIRMS hotspots", "ogr", "vector"),
    }
}

const GROUP_ORDER: [SourceKind; 3] = [SourceKind::Raster, SourceKind::Fire, SourceKind::Hotspot];

/// the data source string for a resource. Remote sources are `/vsicurl/<base_url>/<path relative to root>`,
/// local sources are absolute paths
pub fn layer_source (path: &Path, root: &Path, base_url: Option<&str>)->Result<String> {
    let abs_path = std::path::absolute( path)?;

    if let Some(base_url) = base_url {
        let abs_root = std::path::absolute( root)?;
        if let Ok(rel) = abs_path.strip_prefix( &abs_root) {
            let rel: Vec<String> = rel.components().map( |c| c.as_os_str().to_string_lossy().to_string()).collect();
            return Ok( format!("/vsicurl/{}/{}", base_url.trim_end_matches('/'), rel.join("/")))
        }
    }

    Ok( path_to_lossy_string( abs_path) )
}

fn layer_name (res: &Resource, kind: SourceKind)->String {
    match kind {
        SourceKind::Raster => format!("{} {}", res.label, res.acquired.format("%H:%MZ")),
        _ => res.label.clone()
    }
}

fn layer_id (kind: SourceKind, idx: usize)->String {
    let prefix = match kind {
        SourceKind::Raster => "slstr",
        SourceKind::Fire => "frp",
        SourceKind::Hotspot => "firms",
    };
    format!("{prefix}_{idx}")
}

struct LayerEntry {
    id: String,
    name: String,
    source: String,
    provider: &'static str,
    layer_type: &'static str,
}

fn start (name: &str, attrs: &[(&str,&str)])->BytesStart<'static> {
    let mut elem = BytesStart::new( name.to_string());
    for attr in attrs {
        elem.push_attribute( *attr);
    }
    elem
}

fn text_element<W: std::io::Write> (writer: &mut Writer<W>, name: &str, text: &str)->Result<()> {
    writer.write_event( Event::Start( BytesStart::new(name)))?;
    writer.write_event( Event::Text( BytesText::new(text)))?;
    writer.write_event( Event::End( BytesEnd::new(name)))?;
    Ok(())
}

/// the QGIS project XML for a single day. Groups without resources are omitted
pub fn project_xml (bucket: &DayBucket, root: &Path, config: &ProjectConfig)->Result<String> {
    let title = bucket.date.format("%Y-%m-%d").to_string();

    let mut groups: Vec<(&'static str, Vec<LayerEntry>)> = Vec::new();
    for kind in GROUP_ORDER {
        let resources = bucket.resources( kind);
        if resources.is_empty() { continue }

        let (group_name, provider, layer_type) = group_of( kind);
        let mut layers: Vec<LayerEntry> = Vec::with_capacity( resources.len());
        for (i,res) in resources.iter().enumerate() {
            layers.push( LayerEntry {
                id: layer_id( kind, i),
                name: layer_name( res, kind),
                source: layer_source( &res.path, root, config.base_url.as_deref())?,
                provider,
                layer_type,
            });
        }
        groups.push( (group_name, layers));
    }

    let mut writer = Writer::new_with_indent( Cursor::new( Vec::new()), b' ', 2);
    writer.write_event( Event::Decl( BytesDecl::new( "1.0", Some("UTF-8"), None)))?;
    writer.write_event( Event::Start( start( "qgis", &[("projectname", title.as_str()), ("version", QGIS_VERSION)])))?;

    text_element( &mut writer, "title", &title)?;

    writer.write_event( Event::Start( BytesStart::new("projectCrs")))?;
    writer.write_event( Event::Start( BytesStart::new("spatialrefsys")))?;
    text_element( &mut writer, "authid", &config.crs)?;
    writer.write_event( Event::End( BytesEnd::new("spatialrefsys")))?;
    writer.write_event( Event::End( BytesEnd::new("projectCrs")))?;

    //--- layer tree (what the user sees in the layer panel)
    writer.write_event( Event::Start( BytesStart::new("layer-tree-group")))?;
    for (group_name, layers) in &groups {
        writer.write_event( Event::Start( start( "layer-tree-group", &[("name", *group_name), ("checked", "Qt::Checked"), ("expanded", "1")])))?;
        for l in layers {
            writer.write_event( Event::Empty( start( "layer-tree-layer", &[
                ("id", l.id.as_str()), ("name", l.name.as_str()), ("source", l.source.as_str()),
                ("providerKey", l.provider), ("checked", "Qt::Checked"), ("expanded", "0")
            ])))?;
        }
        writer.write_event( Event::End( BytesEnd::new("layer-tree-group")))?;
    }
    writer.write_event( Event::End( BytesEnd::new("layer-tree-group")))?;

    //--- map layer definitions
    writer.write_event( Event::Start( BytesStart::new("projectlayers")))?;
    for (_, layers) in &groups {
        for l in layers {
            let elem = if l.layer_type == "vector" {
                start( "maplayer", &[("type", l.layer_type), ("geometry", "Point")])
            } else {
                start( "maplayer", &[("type", l.layer_type)])
            };
            writer.write_event( Event::Start( elem))?;
            text_element( &mut writer, "id", &l.id)?;
            text_element( &mut writer, "datasource", &l.source)?;
            text_element( &mut writer, "layername", &l.name)?;
            text_element( &mut writer, "provider", l.provider)?;
            writer.write_event( Event::End( BytesEnd::new("maplayer")))?;
        }
    }
    writer.write_event( Event::End( BytesEnd::new("projectlayers")))?;

    writer.write_event( Event::End( BytesEnd::new("qgis")))?;

    let bytes = writer.into_inner().into_inner();
    Ok( String::from_utf8_lossy( &bytes).to_string() )
}

pub fn project_path (root: &Path, config: &ProjectConfig, date: NaiveDate)->PathBuf {
    root.join( &config.dir_name).join( format!("{}.qgs", date.format("%Y-%m-%d")))
}

/// write one project per non-empty day bucket into `<root>/<dir_name>/`. Returns the written project paths
pub fn emit_projects (buckets: &BTreeMap<NaiveDate,DayBucket>, root: &Path, config: &ProjectConfig)->Result<Vec<PathBuf>> {
    let mut projects: Vec<PathBuf> = Vec::new();

    for (date, bucket) in buckets {
        if bucket.is_empty() {
            debug!("no data for {}, no project", date);
            continue
        }

        let path = project_path( root, config, *date);
        ensure_dir( root.join( &config.dir_name))?;
        let xml = project_xml( bucket, root, config)?;
        write_file_atomic( &path, xml.as_bytes())?;

        info!("wrote project {:?} with {} layers", path, bucket.len());
        projects.push( path);
    }

    Ok(projects)
}
