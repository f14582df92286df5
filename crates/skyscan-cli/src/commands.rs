//! Subcommand bodies. Each takes options or a reader and returns a
//! serializable report for the binary to print.

use anyhow::{Context, Result};
use serde::Serialize;
use skyscan_core::{
    analyze_rows, analyze_waypoints, generate_mission, rows_from_json, BounceSource, CurvedPath,
    CurvedPathBuilder, CurvedPathConfig, FlightPathAnalysis, LinearBouncePolicy, Mission,
    MissionConfig, Waypoint,
};
use std::io::{Read, Write};

/// Radius ratio below which a smoothed corner is reported as collapsed.
const COLLAPSE_RATIO: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SpiralOptions {
    pub mission: MissionConfig,
    /// Uniform turn radius applied to every waypoint before smoothing
    pub turn_radius_ft: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SpiralReport {
    pub mission: Mission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<Vec<CurvedPath>>,
    pub analyses: Vec<FlightPathAnalysis>,
}

/// Generate a mission, optionally smooth each slice, and analyze each slice.
pub fn spiral(options: &SpiralOptions) -> Result<SpiralReport> {
    let mission = generate_mission(&options.mission, &LinearBouncePolicy::default())
        .context("failed to generate mission")?;

    let smoothed = options.turn_radius_ft.map(|radius_ft| {
        let builder = CurvedPathBuilder::default();
        mission
            .slices
            .iter()
            .map(|slice| {
                let requested: Vec<Waypoint> = slice
                    .waypoints
                    .iter()
                    .cloned()
                    .map(|wp| wp.with_turn_radius(radius_ft))
                    .collect();
                let curved = builder.build(&requested);
                report_collapsed(&curved);
                curved
            })
            .collect::<Vec<_>>()
    });

    let analyses = match &smoothed {
        Some(paths) => paths
            .iter()
            .map(|path| analyze_waypoints(&path.to_waypoints()))
            .collect::<skyscan_core::Result<Vec<_>>>(),
        None => mission
            .slices
            .iter()
            .map(|slice| analyze_waypoints(&slice.waypoints))
            .collect(),
    }
    .context("failed to analyze generated slices")?;

    Ok(SpiralReport {
        mission,
        smoothed,
        analyses,
    })
}

/// Smooth a JSON array of waypoints read from `input`.
pub fn smooth(input: impl Read, config: CurvedPathConfig) -> Result<CurvedPath> {
    let builder = CurvedPathBuilder::new(config).context("invalid smoothing options")?;
    let waypoints: Vec<Waypoint> =
        serde_json::from_reader(input).context("expected a JSON array of waypoints")?;
    let curved = builder.build(&waypoints);
    tracing::info!(
        waypoints = waypoints.len(),
        points = curved.points.len(),
        smoothed = curved.smoothed().count(),
        "smoothed path"
    );
    report_collapsed(&curved);
    Ok(curved)
}

/// Analyze a JSON array of row objects read from `input`.
///
/// Every dropped row is echoed to `warnings`.
pub fn analyze(input: impl Read, mut warnings: impl Write) -> Result<FlightPathAnalysis> {
    let value: serde_json::Value =
        serde_json::from_reader(input).context("input is not valid JSON")?;
    let rows = rows_from_json(&value)?;
    let analysis = analyze_rows(&rows)?;
    for warning in &analysis.warnings {
        writeln!(warnings, "warning: {warning}")?;
    }
    Ok(analysis)
}

fn report_collapsed(curved: &CurvedPath) {
    for index in curved.collapsed_corners(COLLAPSE_RATIO) {
        tracing::warn!(
            waypoint = index,
            "turn radius collapsed below {:.0}% of the request",
            COLLAPSE_RATIO * 100.0
        );
    }
}

/// An explicit bounce count wins over the battery estimate.
pub fn bounce_source(bounces: Option<u32>, battery_minutes: f64) -> BounceSource {
    match bounces {
        Some(count) => BounceSource::Fixed(count),
        None => BounceSource::BatteryMinutes(battery_minutes),
    }
}
