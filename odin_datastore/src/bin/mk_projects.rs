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

//! group existing campaign outputs by day and write a QGIS project for each day

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use odin_datastore::{
    CampaignFolders, resolve_dir,
    aggregate::aggregate,
    config::load_config_or_default,
    qgis::emit_projects,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "write per-day QGIS projects for campaign outputs")]
struct Args {
    #[arg(short='1', long, default_value="./")]
    lvl1folder: PathBuf,

    #[arg(short='2', long, default_value="./")]
    lvl2folder: PathBuf,

    #[arg(short='f', long, default_value="./")]
    firmsfolder: PathBuf,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value=".")]
    project_root: PathBuf,

    /// serve layers from this URL (via /vsicurl) instead of local paths
    #[arg(long)]
    base_url: Option<String>,
}

fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = load_config_or_default( args.config.as_ref())?;
    if args.base_url.is_some() {
        config.projects.base_url = args.base_url.clone();
    }

    let folders = CampaignFolders {
        lvl1: resolve_dir( &args.lvl1folder)?,
        lvl2: resolve_dir( &args.lvl2folder)?,
        firms: resolve_dir( &args.firmsfolder)?,
        project_root: resolve_dir( &args.project_root)?,
    };

    let buckets = aggregate( &folders.aggregation_roots( &config), config.campaign_start)?;
    for (date, bucket) in &buckets {
        println!("{date}: {} rasters, {} fire tables, {} hotspot files", bucket.rasters.len(), bucket.fires.len(), bucket.hotspots.len());
    }

    let projects = emit_projects( &buckets, &folders.project_root, &config.projects)?;
    for p in &projects { println!("{:?}", p) }

    Ok(())
}
