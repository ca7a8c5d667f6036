// Copyright 2024 Privacy Guard Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # guard-sim
//!
//! Replays a capture-protection scenario against the simulated platform and
//! prints the outbound events and protection state after every step.

mod runner;
mod scenario;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use privacy_guard_core::{init_tracing, GuardConfig};
use runner::Runner;
use scenario::Scenario;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("guard-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Privacy Guard Team")
        .about("Replay screen capture scenarios against a simulated device")
        .arg(
            Arg::new("scenario")
                .value_name("FILE")
                .help("Scenario JSON file; the built-in demo runs when omitted"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Guard configuration JSON file"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("FILTER")
                .help("Log filter used when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON report per step")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-demo")
                .long("print-demo")
                .help("Print the built-in demo scenario and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("print-demo") {
        println!("{}", serde_json::to_string_pretty(&Scenario::demo())?);
        return Ok(());
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => GuardConfig::load(path).with_context(|| format!("loading config {}", path))?,
        None => GuardConfig::default(),
    };

    let filter = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.log_filter.clone());
    init_tracing(&filter);

    let scenario = match matches.get_one::<String>("scenario") {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo(),
    };

    info!("guard-sim v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let json = matches.get_flag("json");
    let mut runner = Runner::start(config)?;
    for report in runner.run(&scenario).await? {
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", report);
        }
    }
    runner.shutdown().await?;

    Ok(())
}
