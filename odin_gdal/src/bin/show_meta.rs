/*
 * Copyright © 2024, United States Government, as represented by the Administrator of
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

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use odin_gdal::{Dataset, Metadata, quiet_nc_dataset, mdim::{open_multidim, dimension_size}};

/// show_meta - show meta information of a GDAL dataset or of a variable inside a NetCDF file
#[derive(Parser,Debug)]
#[command(version, about)]
struct Args {
    /// NetCDF variable to open (e.g. "F2_BT_in"). If omitted the path is opened as a plain GDAL dataset
    #[arg(long)]
    var: Option<String>,

    /// report the size of this dimension of the multidimensional root group (e.g. "fires")
    #[arg(long)]
    dim: Option<String>,

    /// path to GDAL dataset to analyze
    path: PathBuf,
}

fn main ()->Result<()> {
    let args = Args::parse();

    if let Some(dim) = &args.dim {
        let ds = open_multidim( &args.path)?;
        match dimension_size( &ds, dim)? {
            Some(n) => println!("dimension {dim}: {n}"),
            None => println!("no dimension {dim}")
        }
        return Ok(())
    }

    let ds = match &args.var {
        Some(var) => quiet_nc_dataset( &args.path, var)?,
        None => Dataset::open( &args.path)?
    };

    let (cols,rows) = ds.raster_size();
    println!("raster size: {},{}", cols,rows);
    show_meta( &ds, 0)?;

    for i in 0..ds.raster_count() {
        let band_id = i+1;
        println!("--- band {}", band_id);
        let band = ds.rasterband( band_id)?;
        println!("    no-data: {:?}", band.no_data_value());
        show_meta( &band, 4)?;
    }

    Ok(())
}

fn show_meta<M> (meta: &M, level: usize)->Result<()> where M: Metadata {
    let indent = " ".repeat(level);

    let descr = meta.description()?;
    if !descr.is_empty() {
        println!("{}description: {}", indent, descr);
    }

    for domain in meta.metadata_domains() {
        if let Some(items) = meta.metadata_domain( &domain) {
            if !items.is_empty() {
                println!("{}domain: '{}'", indent, domain);
                for item in &items {
                    println!("{}    {}", indent, item);
                }
            }
        }
    }

    Ok(())
}
