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

use std::{sync::Arc, time::Duration};
use anyhow::{Result,anyhow};
use clap::Parser;
use tokio::{select, signal, time::interval};
use tracing::info;
use tracing_subscriber::EnvFilter;
use odin_scope::{ScopeConfig, ScopeReceiver, AircraftList, load_config};

/// scope server monitoring tool - prints aircraft updates received from a scope server
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// pathname of RON config file (see configs/scope_server.ron)
    #[arg(short, long)]
    config: Option<String>,

    /// ws(s):// or http(s):// URL to read updates from (if no config is given)
    url: Option<String>,

    #[arg(short, long, default_value="")]
    user: String,

    #[arg(short, long, default_value="")]
    password: String,

    /// seconds between status reports
    #[arg(short, long, default_value_t=10)]
    interval: u64,

    /// print all aircraft with each status report
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match (&args.config, &args.url) {
        (Some(path), _) => load_config( path)?,
        (None, Some(url)) => ScopeConfig::new( url, &args.user, &args.password),
        (None, None) => return Err( anyhow!("either --config or url has to be provided"))
    };

    let aircraft = Arc::new( AircraftList::new());
    let mut receiver = ScopeReceiver::with_sink( config, aircraft.clone());
    receiver.start()?;

    let mut report = interval( Duration::from_secs( args.interval.max(1)));
    loop {
        select! {
            _ = signal::ctrl_c() => break,
            _ = report.tick() => {
                let store = receiver.state().store();
                info!("{} aircraft, {} tracks, {} flight plans ({})",
                      aircraft.len(), store.n_tracks(), store.n_flight_plans(), receiver.stats());
                if args.verbose {
                    for ac in aircraft.snapshots() { println!("  {ac}"); }
                }
                if !receiver.is_running() {
                    info!("receiver terminated");
                    break
                }
            }
        }
    }

    receiver.stop().await;
    Ok(())
}
