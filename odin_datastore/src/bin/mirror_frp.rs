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

//! mirror Sentinel-3 Level-2 FRP products from the partner server and convert them into fire tables

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use odin_datastore::{
    resolve_dir, start_date,
    config::load_config_or_default,
    lvl2::{mirror_frp, process_lvl2_products},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "mirror and convert Sentinel-3 Level-2 FRP products")]
struct Args {
    /// skip date directories before this day (YYYY-MM-DD), defaults to campaign start
    #[arg(short, long)]
    date: Option<String>,

    /// RON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// only convert what is already mirrored
    #[arg(long)]
    no_mirror: bool,

    /// Level-2 product folder
    lvl2folder: PathBuf,
}

fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config_or_default( args.config.as_ref())?;
    let cutoff = start_date( args.date.as_deref(), &config)?;
    let lvl2 = resolve_dir( &args.lvl2folder)?;

    if !args.no_mirror {
        let downloaded = mirror_frp( &config.frp, Some(cutoff), &lvl2)?;
        println!("{} new files", downloaded.len());
        for path in &downloaded { println!("  {:?}", path) }
    }

    let outputs = process_lvl2_products( &lvl2, &config.frp)?;
    for out in &outputs {
        println!("{:?}: {} fires", out.geojson, out.n_features);
    }

    Ok(())
}
