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

//! the campaign datastore driver: mirror and convert Level-2 FRP products, acquire and grid Level-1
//! granules day by day, retrieve FIRMS hotspots and finally write per-day QGIS projects

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use odin_common::datetime::days_inclusive;
use odin_datastore::{
    CampaignFolders, resolve_dir, start_date, today,
    aggregate::aggregate,
    config::{load_config_or_default, FRP_FTP_USER, FRP_FTP_PASSWORD},
    errors::env_credential,
    eumdac::EumetsatStore,
    firms::FirmsClient,
    gridder::GdalBandBuilder,
    lvl1::Lvl1Acquisition,
    lvl2::update_lvl2,
    qgis::emit_projects,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "collect and convert Sentinel-3 and FIRMS data for a fire campaign")]
struct Args {
    /// Level-1 product folder
    #[arg(short='1', long, default_value="./")]
    lvl1folder: PathBuf,

    /// Level-2 product folder
    #[arg(short='2', long, default_value="./")]
    lvl2folder: PathBuf,

    /// FIRMS hotspot folder
    #[arg(short='f', long, default_value="./")]
    firmsfolder: PathBuf,

    /// first day to gather data for (YYYY-MM-DD), defaults to campaign start
    #[arg(short, long)]
    date: Option<String>,

    /// RON config file, defaults to built-in campaign settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// root directory for QGIS projects (and base of relative layer URLs)
    #[arg(long, default_value=".")]
    project_root: PathBuf,

    #[arg(long)]
    skip_lvl1: bool,

    #[arg(long)]
    skip_lvl2: bool,

    #[arg(long)]
    skip_firms: bool,

    #[arg(long)]
    skip_projects: bool,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config_or_default( args.config.as_ref())?;
    let first = start_date( args.date.as_deref(), &config)?;
    let last = today();

    let folders = CampaignFolders {
        lvl1: resolve_dir( &args.lvl1folder)?,
        lvl2: resolve_dir( &args.lvl2folder)?,
        firms: resolve_dir( &args.firmsfolder)?,
        project_root: resolve_dir( &args.project_root)?,
    };
    folders.ensure()?;

    //--- check all credentials before we start any network operation
    let store = if args.skip_lvl1 { None } else { Some( EumetsatStore::from_env( config.eumetsat.clone())?) };
    let firms = if args.skip_firms { None } else { Some( FirmsClient::from_env( config.firms.clone())?) };
    if !args.skip_lvl2 {
        env_credential( FRP_FTP_USER)?;
        env_credential( FRP_FTP_PASSWORD)?;
    }

    info!("gathering data from {} to {}", first, last);

    if !args.skip_lvl2 {
        let frp_config = config.frp.clone();
        let lvl2 = folders.lvl2.clone();
        let res = tokio::task::spawn_blocking( move || update_lvl2( &frp_config, Some(first), &lvl2)).await?;

        // level 2 failures don't stop the other sources
        match res {
            Ok(update) => {
                let n_new = update.n_mirrored.map( |n| n.to_string()).unwrap_or( "no".into());
                println!("level 2: {n_new} new files, {} fire tables", update.outputs.len());
            }
            Err(e) => error!("level 2 update failed: {}", e)
        }
    }

    if let Some(store) = store {
        let acquisition = Lvl1Acquisition::new( store, GdalBandBuilder::default(), config.eumetsat.clone());
        let granules = acquisition.acquire_days( first, last, &folders.lvl1).await?;
        println!("level 1: {} granules converted", granules.len());
    }

    if let Some(firms) = firms {
        let mut n = 0;
        for day in days_inclusive( first, last) {
            n += firms.get_hotspots( day, &folders.firms).await?.len();
        }
        println!("FIRMS: {n} hotspot files");
    }

    if !args.skip_projects {
        let buckets = aggregate( &folders.aggregation_roots( &config), config.campaign_start)?;
        let projects = emit_projects( &buckets, &folders.project_root, &config.projects)?;
        println!("{} projects written", projects.len());
    }

    Ok(())
}
