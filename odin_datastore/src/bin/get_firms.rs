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

//! retrieve FIRMS hotspots for a given day and store them as CSV and GeoJSON

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use odin_datastore::{
    resolve_dir, today,
    config::load_config_or_default,
    errors::OdinDatastoreError,
    firms::FirmsClient,
};
use odin_common::datetime::parse_ymd;

#[derive(Parser, Debug)]
#[command(version, about, long_about = "retrieve NASA FIRMS hotspots for the campaign region")]
struct Args {
    /// day to retrieve (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    date: Option<String>,

    /// RON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// sensors to retrieve (e.g. VIIRS_SNPP_NRT), defaults to configured sensors
    #[arg(short, long, num_args=1..)]
    sensors: Vec<String>,

    /// output folder
    #[arg(short, long, default_value="./")]
    output: PathBuf,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = load_config_or_default( args.config.as_ref())?;
    if !args.sensors.is_empty() {
        config.firms.sensors = args.sensors.clone();
    }

    let date = match &args.date {
        Some(s) => parse_ymd( s).ok_or( OdinDatastoreError::InvalidDate( s.clone()))?,
        None => today()
    };
    let dir = resolve_dir( &args.output)?;

    let client = FirmsClient::from_env( config.firms)?;
    let outputs = client.get_hotspots( date, &dir).await?;

    for out in &outputs {
        println!("{:?}: {} hotspots", out.geojson, out.n_features);
    }
    if outputs.is_empty() { println!("no hotspots for {date}") }

    Ok(())
}
