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

//! grid the SLSTR bands of already unpacked Level-1 granule directories

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;

use odin_gdal::geoloc::GeolocWarpOptions;
use odin_datastore::gridder::{GdalBandBuilder, GranuleConverter};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "convert SLSTR Level-1 granules (*.SEN3 dirs) into gridded COG rasters")]
struct Args {
    /// target resolution in meters
    #[arg(long, default_value_t = 1000.0)]
    resolution: f64,

    /// target SRS
    #[arg(long, default_value = "EPSG:3347")]
    srs: String,

    #[arg(num_args=1.., required=true)]
    granules: Vec<PathBuf>,
}

fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let warp = GeolocWarpOptions { tgt_srs: args.srs.clone(), tgt_resolution: args.resolution, ..GeolocWarpOptions::default() };
    let builder = GdalBandBuilder { warp };
    let converter = GranuleConverter::new( builder);

    for granule in &args.granules {
        println!("------- {:?}", granule);
        match converter.convert( granule) {
            Ok(res) => {
                println!("acquired: {}", res.acquired);
                for raster in &res.rasters { println!("  {:?}", raster) }
            }
            Err(e) => eprintln!("failed to convert granule: {e}")
        }
    }

    Ok(())
}
