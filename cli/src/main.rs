//! Post-processes travel demand into trips for dynamic traffic assignment. Aggregate matrices and
//! individual trip lists are both handled by one executable, writing to the same trip file.

#[macro_use]
extern crate log;

mod broad;
mod config;
mod detailed;
mod output;

use anyhow::{bail, Result};
use structopt::StructOpt;

use crate::config::Config;

#[derive(StructOpt)]
#[structopt(name = "dtacli", about = "Disaggregates travel demand into DTA trips")]
enum Command {
    /// Expands every zone-to-zone matrix listed in a descriptor file into trips
    Broad {
        /// The path to a JSON run configuration
        #[structopt(long)]
        config: String,
        /// The matrix descriptor file, relative to the configured tables directory
        #[structopt(long)]
        input: String,
        /// Only used to report the run. Matrices already hold expanded trips.
        #[structopt(long, default_value = "1.0")]
        sample_rate: f64,
    },
    /// Expands an individual trip list into trips
    Detailed {
        /// The path to a JSON run configuration
        #[structopt(long)]
        config: String,
        /// The trip list, relative to the configured outputs directory
        #[structopt(long)]
        input: String,
        /// The fraction of households the upstream model simulated. Each row represents
        /// 1 / sample_rate trips, unless the list has its own weights.
        #[structopt(long, default_value = "1.0")]
        sample_rate: f64,
        /// Selects probability columns and occupancy rules
        #[structopt(long)]
        market_segment: String,
    },
}

fn main() -> Result<()> {
    dtautil::logger::setup();

    match Command::from_args() {
        Command::Broad {
            config,
            input,
            sample_rate,
        } => {
            info!("Processing broad TOD trips from {}", input);
            info!("Sample Rate = {}", sample_rate);
            let config: Config = dtautil::read_json(&config)?;
            broad::run(&config, &input)?;
        }
        Command::Detailed {
            config,
            input,
            sample_rate,
            market_segment,
        } => {
            if !(sample_rate > 0.0 && sample_rate <= 1.0) {
                bail!("--sample-rate must be in (0, 1], not {}", sample_rate);
            }
            info!("Processing detailed TOD trips from {}", input);
            info!("Sample Rate = {}", sample_rate);
            info!("Market Segment = {}", market_segment);
            let config: Config = dtautil::read_json(&config)?;
            detailed::run(&config, &input, sample_rate, &market_segment)?;
        }
    }
    Ok(())
}
