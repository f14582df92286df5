//! skyscan - generate, smooth and analyze 3D-capture flight paths.
//!
//! Usage:
//!   skyscan spiral --slices 3 --battery-minutes 20 --turn-radius-ft 40
//!   skyscan smooth < waypoints.json
//!   skyscan analyze < rows.json

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use skyscan_cli::commands::{self, bounce_source, SpiralOptions};
use skyscan_cli::Config;
use skyscan_core::CurvedPathConfig;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Flight-path geometry for drone 3D capture")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a multi-battery spiral mission
    Spiral(SpiralArgs),
    /// Smooth a JSON array of waypoints from stdin
    Smooth(SmoothArgs),
    /// Analyze a JSON array of waypoint rows from stdin
    Analyze,
}

#[derive(Args, Debug)]
struct SpiralArgs {
    /// Center latitude of the capture subject
    #[arg(long, default_value_t = 33.6846)]
    lat: f64,

    /// Center longitude of the capture subject
    #[arg(long, default_value_t = -117.8265, allow_negative_numbers = true)]
    lon: f64,

    /// Number of battery slices
    #[arg(long, default_value_t = 3)]
    slices: u32,

    /// Bounce count; derived from battery minutes when omitted
    #[arg(long)]
    bounces: Option<u32>,

    /// Usable battery time per slice
    #[arg(long, default_value_t = 20.0)]
    battery_minutes: f64,

    #[arg(long, default_value_t = 150.0)]
    start_radius_ft: f64,

    #[arg(long, default_value_t = 1595.0)]
    hold_radius_ft: f64,

    /// Ground altitude of the subject
    #[arg(long, default_value_t = 0.0)]
    poi_altitude_ft: f64,

    /// Smooth every slice with this turn radius
    #[arg(long)]
    turn_radius_ft: Option<f64>,
}

#[derive(Args, Debug)]
struct SmoothArgs {
    /// Largest share of a leg an arc may consume
    #[arg(long, default_value_t = 0.9)]
    max_offset_fraction: f64,

    /// Largest angular step between arc samples
    #[arg(long, default_value_t = 10.0)]
    arc_step_deg: f64,
}

fn main() -> Result<()> {
    let config = Config::from_env();

    // Logs go to stderr; stdout carries the JSON result.
    let json_logs = config.log_json;
    tracing_subscriber::registry()
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json().with_writer(io::stderr)))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr)))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skyscan=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Spiral(args) => {
            let mission = skyscan_core::MissionConfig {
                center_lat: args.lat,
                center_lon: args.lon,
                poi_altitude_ft: args.poi_altitude_ft,
                slices: args.slices,
                bounces: bounce_source(args.bounces, args.battery_minutes),
                start_radius_ft: args.start_radius_ft,
                hold_radius_ft: args.hold_radius_ft,
                ..config.mission()
            };
            let report = commands::spiral(&SpiralOptions {
                mission,
                turn_radius_ft: args.turn_radius_ft,
            })?;
            emit(&report, cli.pretty)
        }
        Command::Smooth(args) => {
            let path_config = CurvedPathConfig {
                max_offset_fraction: args.max_offset_fraction,
                max_arc_step_deg: args.arc_step_deg,
                ..CurvedPathConfig::default()
            };
            let curved = commands::smooth(io::stdin().lock(), path_config)?;
            emit(&curved, cli.pretty)
        }
        Command::Analyze => {
            let analysis = commands::analyze(io::stdin().lock(), io::stderr())?;
            emit(&analysis, cli.pretty)
        }
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(stdout, value)?;
    } else {
        serde_json::to_writer(stdout, value)?;
    }
    println!();
    Ok(())
}
