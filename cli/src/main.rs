#[macro_use]
extern crate log;

use anyhow::Result;
use chrono::NaiveDate;
use structopt::StructOpt;

use gtfs::GTFS;
use splitter::{AgencyConfig, ErrorPolicy, RunOptions};

#[derive(StructOpt)]
#[structopt(about = "Splits GTFS routes into directions using an agency's reference stops")]
struct Args {
    /// The path to a GTFS directory or .zip
    #[structopt(long)]
    gtfs: String,
    /// The path to the agency's TOML config
    #[structopt(long)]
    config: String,
    /// Write JSON here instead of STDOUT
    #[structopt(long)]
    output: Option<String>,
    /// Drop services that stop running before this day, like 2024-06-01
    #[structopt(long, parse(try_from_str = parse_date))]
    date: Option<NaiveDate>,
    /// What to do when a route can't be split: abort, skip-route, or collect
    #[structopt(long, default_value = "abort")]
    errors: ErrorPolicy,
    /// Classify trips on all cores
    #[structopt(long)]
    parallel: bool,
}

fn parse_date(x: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(x, "%Y-%m-%d")
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::from_args()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let gtfs = GTFS::load(&args.gtfs)?;
    let config = AgencyConfig::load(&args.config)?;
    let options = RunOptions {
        policy: args.errors,
        parallel: args.parallel,
        active_since: args.date,
    };

    let output = splitter::run(&gtfs, &config, options)?;
    for reason in &output.skipped {
        warn!("Skipped: {reason}");
    }

    let json = serde_json::to_string_pretty(&output)?;
    match args.output {
        Some(path) => {
            fs_err::write(&path, json)?;
            info!("Wrote {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
