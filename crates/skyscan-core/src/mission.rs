//! Multi-battery capture mission assembly.
//!
//! Runs the spiral generator and altitude profiler for every slice and
//! places the result on the map around the capture subject.

use crate::altitude::{AltitudeProfiler, ProfiledPoint};
use crate::config::{BounceCountPolicy, MissionConfig};
use crate::error::Result;
use crate::models::{feet_to_meters, GeoPoint, RotationDirection, Waypoint};
use crate::spatial::{bearing, normalize_heading, offset_position};
use crate::spiral::{DensityRegime, SpiralGenerator, SpiralParameters};
use serde::{Deserialize, Serialize};

/// Waypoints flown on one battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceFlight {
    pub slice_index: u32,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub parameters: SpiralParameters,
    pub regime: DensityRegime,
    pub max_radius_ft: f64,
    pub point_of_interest: GeoPoint,
    pub slices: Vec<SliceFlight>,
}

impl Mission {
    pub fn waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.slices.iter().flat_map(|slice| slice.waypoints.iter())
    }

    pub fn waypoint_count(&self) -> usize {
        self.slices.iter().map(|slice| slice.waypoints.len()).sum()
    }
}

pub fn generate_mission(config: &MissionConfig, policy: &dyn BounceCountPolicy) -> Result<Mission> {
    config.validate_center()?;
    let bounces = config.bounces.resolve(policy)?;
    let parameters = SpiralParameters::new(
        config.slices,
        bounces,
        config.start_radius_ft,
        config.hold_radius_ft,
    )?;
    let generator = SpiralGenerator::with_sample_count(parameters, config.sample_count)?;
    let profiler = AltitudeProfiler::new(config.limits, config.rates)?;

    let mut slices = Vec::with_capacity(parameters.slices as usize);
    let mut next_index = 0usize;
    for slice_index in 0..parameters.slices {
        let points = generator.generate_slice(slice_index)?;
        let profiled = profiler.profile(&points);
        let waypoints = project_slice(config.center_lat, config.center_lon, &profiled, next_index);
        next_index += waypoints.len();
        slices.push(SliceFlight {
            slice_index,
            waypoints,
        });
    }

    tracing::info!(
        slices = parameters.slices,
        bounces,
        waypoints = next_index,
        max_radius_ft = generator.max_radius_ft(),
        "generated capture mission"
    );

    Ok(Mission {
        parameters,
        regime: generator.regime(),
        max_radius_ft: generator.max_radius_ft(),
        point_of_interest: GeoPoint::new(
            config.center_lat,
            config.center_lon,
            config.poi_altitude_ft,
        ),
        slices,
    })
}

/// Place profiled spiral points around a geodetic center.
///
/// Headings face the center so the camera stays on the subject. Sequence
/// indices start at `first_index`.
pub fn project_slice(
    center_lat: f64,
    center_lon: f64,
    points: &[ProfiledPoint],
    first_index: usize,
) -> Vec<Waypoint> {
    points
        .iter()
        .enumerate()
        .map(|(offset, profiled)| {
            let spiral = &profiled.point;
            let (lat, lon) = offset_position(
                center_lat,
                center_lon,
                feet_to_meters(spiral.y_ft),
                feet_to_meters(spiral.x_ft),
            );
            let heading_deg = normalize_heading(bearing(lat, lon, center_lat, center_lon).to_degrees());
            Waypoint {
                index: first_index + offset,
                lat,
                lon,
                altitude_ft: profiled.altitude_ft,
                heading_deg,
                turn_radius_ft: 0.0,
                rotation: RotationDirection::Unknown,
                phase: Some(spiral.phase),
            }
        })
        .collect()
}
