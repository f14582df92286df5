//! Tangent-circle corner smoothing.
//!
//! Replaces each interior corner of a waypoint polyline with a circular arc
//! tangent to both adjacent legs, which is how the vehicle actually flies a
//! curved waypoint. Geometry is done in a local tangent plane anchored at the
//! first waypoint. Smoothing is best-effort per corner: a corner whose
//! geometry is degenerate stays sharp and the rest of the path is unaffected.

use crate::error::{self, FlightPathError};
use crate::models::{feet_to_meters, meters_to_feet, GeoPoint, RotationDirection, Waypoint};
use crate::spatial::LocalTangentPlane;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

const MIN_SEGMENT_LENGTH_M: f64 = 1e-3;
/// Cross products of unit vectors below this are treated as colinear.
const COLINEAR_CROSS_EPS: f64 = 1e-9;
const MIN_EFFECTIVE_RADIUS_M: f64 = 1e-3;
/// Upper bounds a caller may configure.
const MAX_OFFSET_FRACTION: f64 = 0.9;
const MAX_ARC_STEP_DEG: f64 = 10.0;
const MIN_ARC_STEPS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvedPathConfig {
    /// Arc tangent points may use at most this fraction of either adjacent leg.
    pub max_offset_fraction: f64,
    pub max_arc_step_deg: f64,
    pub min_arc_steps: usize,
    /// Turns gentler than this are flown straight.
    pub min_turn_angle_deg: f64,
}

impl Default for CurvedPathConfig {
    fn default() -> Self {
        Self {
            max_offset_fraction: MAX_OFFSET_FRACTION,
            max_arc_step_deg: MAX_ARC_STEP_DEG,
            min_arc_steps: MIN_ARC_STEPS,
            min_turn_angle_deg: 1.0,
        }
    }
}

impl CurvedPathConfig {
    pub fn validate(&self) -> error::Result<()> {
        if !(self.max_offset_fraction > 0.0 && self.max_offset_fraction <= MAX_OFFSET_FRACTION) {
            return Err(FlightPathError::config(format!(
                "max offset fraction must be in (0, {MAX_OFFSET_FRACTION}], got {}",
                self.max_offset_fraction
            )));
        }
        if !(self.max_arc_step_deg > 0.0 && self.max_arc_step_deg <= MAX_ARC_STEP_DEG) {
            return Err(FlightPathError::config(format!(
                "arc step must be in (0, {MAX_ARC_STEP_DEG}] degrees, got {}",
                self.max_arc_step_deg
            )));
        }
        if self.min_arc_steps < MIN_ARC_STEPS {
            return Err(FlightPathError::config(format!(
                "arcs need at least {MIN_ARC_STEPS} steps, got {}",
                self.min_arc_steps
            )));
        }
        if !self.min_turn_angle_deg.is_finite() || self.min_turn_angle_deg < 0.0 {
            return Err(FlightPathError::config(format!(
                "minimum turn angle must be a non-negative number, got {}",
                self.min_turn_angle_deg
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    fn from_hint(hint: RotationDirection) -> Option<Self> {
        match hint {
            RotationDirection::Left => Some(TurnDirection::Left),
            RotationDirection::Right => Some(TurnDirection::Right),
            RotationDirection::Unknown => None,
        }
    }

    /// Unit normal of `dir` pointing toward the inside of the turn.
    fn normal(self, dir: Vec2) -> Vec2 {
        match self {
            TurnDirection::Left => Vec2::new(-dir.y, dir.x),
            TurnDirection::Right => Vec2::new(dir.y, -dir.x),
        }
    }
}

/// Why a corner was left sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRadiusRequested,
    DegenerateSegment,
    AmbiguousDirection,
    NearlyStraight,
    DegenerateArc,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoRadiusRequested => "no turn radius requested",
            SkipReason::DegenerateSegment => "adjacent segment has near-zero length",
            SkipReason::AmbiguousDirection => "colinear legs and no rotation hint",
            SkipReason::NearlyStraight => "turn angle below threshold",
            SkipReason::DegenerateArc => "arc collapsed to a point",
        };
        f.write_str(text)
    }
}

/// Result of smoothing one interior waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcComputation {
    pub direction: TurnDirection,
    pub requested_radius_ft: f64,
    /// Never larger than the requested radius; smaller when legs are short
    pub effective_radius_ft: f64,
    pub turn_angle_rad: f64,
    /// Signed sweep, positive counter-clockwise
    pub sweep_rad: f64,
    pub entry: GeoPoint,
    pub exit: GeoPoint,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Arc samples from entry to exit inclusive
    pub samples: Vec<GeoPoint>,
}

impl ArcComputation {
    pub fn interior_samples(&self) -> &[GeoPoint] {
        match self.samples.len() {
            0..=2 => &[],
            n => &self.samples[1..n - 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerReport {
    /// Position of the corner in the input polyline
    pub waypoint_index: usize,
    pub outcome: Result<ArcComputation, SkipReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPointKind {
    Waypoint,
    ArcEntry,
    ArcSample,
    ArcExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub kind: PathPointKind,
    /// Input waypoint this point was derived from
    pub source_index: usize,
}

impl PathPoint {
    fn same_position(&self, other: &PathPoint) -> bool {
        self.lat == other.lat && self.lon == other.lon && self.altitude_ft == other.altitude_ft
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurvedPath {
    pub points: Vec<PathPoint>,
    pub corners: Vec<CornerReport>,
}

impl CurvedPath {
    pub fn smoothed(&self) -> impl Iterator<Item = (usize, &ArcComputation)> {
        self.corners
            .iter()
            .filter_map(|corner| corner.outcome.as_ref().ok().map(|arc| (corner.waypoint_index, arc)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (usize, SkipReason)> + '_ {
        self.corners
            .iter()
            .filter_map(|corner| corner.outcome.as_ref().err().map(|r| (corner.waypoint_index, *r)))
    }

    /// Smoothed corners whose effective radius fell below `ratio` of the request.
    pub fn collapsed_corners(&self, ratio: f64) -> Vec<usize> {
        self.smoothed()
            .filter(|(_, arc)| arc.effective_radius_ft < ratio * arc.requested_radius_ft)
            .map(|(index, _)| index)
            .collect()
    }

    /// The smoothed path as plain waypoints with no turn requests.
    pub fn to_waypoints(&self) -> Vec<Waypoint> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| Waypoint::new(index, point.lat, point.lon, point.altitude_ft))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurvedPathBuilder {
    config: CurvedPathConfig,
}

impl CurvedPathBuilder {
    pub fn new(config: CurvedPathConfig) -> error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn build(&self, waypoints: &[Waypoint]) -> CurvedPath {
        let Some(plane) = LocalTangentPlane::for_points(waypoints.iter().map(|wp| (wp.lat, wp.lon)))
        else {
            return CurvedPath::default();
        };

        let corners: Vec<CornerReport> = (1..waypoints.len().saturating_sub(1))
            .map(|index| {
                let outcome = self.smooth_corner(
                    &plane,
                    &waypoints[index - 1],
                    &waypoints[index],
                    &waypoints[index + 1],
                );
                if let Err(reason) = &outcome {
                    tracing::debug!(waypoint = index, %reason, "corner left sharp");
                }
                CornerReport {
                    waypoint_index: index,
                    outcome,
                }
            })
            .collect();

        let points = assemble(waypoints, &corners);
        CurvedPath { points, corners }
    }

    fn smooth_corner(
        &self,
        plane: &LocalTangentPlane,
        prev: &Waypoint,
        current: &Waypoint,
        next: &Waypoint,
    ) -> Result<ArcComputation, SkipReason> {
        if !(current.turn_radius_ft > 0.0 && current.turn_radius_ft.is_finite()) {
            return Err(SkipReason::NoRadiusRequested);
        }

        let p0 = Vec2::from(plane.to_local(prev.lat, prev.lon));
        let p1 = Vec2::from(plane.to_local(current.lat, current.lon));
        let p2 = Vec2::from(plane.to_local(next.lat, next.lon));

        let incoming = p1 - p0;
        let outgoing = p2 - p1;
        let len_in = incoming.length();
        let len_out = outgoing.length();
        if len_in < MIN_SEGMENT_LENGTH_M || len_out < MIN_SEGMENT_LENGTH_M {
            return Err(SkipReason::DegenerateSegment);
        }
        let dir_in = incoming.scale(1.0 / len_in);
        let dir_out = outgoing.scale(1.0 / len_out);

        let cross = dir_in.cross(dir_out);
        let direction = if cross > COLINEAR_CROSS_EPS {
            TurnDirection::Left
        } else if cross < -COLINEAR_CROSS_EPS {
            TurnDirection::Right
        } else {
            TurnDirection::from_hint(current.rotation).ok_or(SkipReason::AmbiguousDirection)?
        };

        let turn_angle = dir_in.dot(dir_out).clamp(-1.0, 1.0).acos();
        if turn_angle < self.config.min_turn_angle_deg.to_radians() {
            return Err(SkipReason::NearlyStraight);
        }

        // Inscribed circle: tangent length = r * tan(deflection / 2).
        let half_tan = (turn_angle / 2.0).tan();
        let requested_m = feet_to_meters(current.turn_radius_ft);
        let desired_offset = requested_m * half_tan;
        let max_offset = self.config.max_offset_fraction * len_in.min(len_out);
        let (offset, effective_m, effective_ft) = if desired_offset <= max_offset {
            (desired_offset, requested_m, current.turn_radius_ft)
        } else {
            let shrunk = max_offset / half_tan;
            (max_offset, shrunk, meters_to_feet(shrunk).min(current.turn_radius_ft))
        };
        if !offset.is_finite() || !effective_m.is_finite() || effective_m < MIN_EFFECTIVE_RADIUS_M {
            return Err(SkipReason::DegenerateArc);
        }

        let entry = p1 - dir_in.scale(offset);
        let exit = p1 + dir_out.scale(offset);
        let entry_alt = current.altitude_ft + (prev.altitude_ft - current.altitude_ft) * (offset / len_in);
        let exit_alt = current.altitude_ft + (next.altitude_ft - current.altitude_ft) * (offset / len_out);

        let center_from_entry = entry + direction.normal(dir_in).scale(effective_m);
        let center_from_exit = exit + direction.normal(dir_out).scale(effective_m);
        let center = (center_from_entry + center_from_exit).scale(0.5);

        let start_angle = (entry - center).angle();
        let end_angle = (exit - center).angle();
        let mut sweep = end_angle - start_angle;
        match direction {
            TurnDirection::Left if sweep < 0.0 => sweep += TAU,
            TurnDirection::Right if sweep > 0.0 => sweep -= TAU,
            _ => {}
        }

        let max_step = self.config.max_arc_step_deg.to_radians();
        let steps = ((sweep.abs() / max_step).ceil() as usize).max(self.config.min_arc_steps);

        let to_geo = |point: Vec2, altitude_ft: f64| {
            let (lat, lon) = plane.to_geodetic(point.x, point.y);
            GeoPoint::new(lat, lon, altitude_ft)
        };

        let samples = (0..=steps)
            .map(|step| {
                let fraction = step as f64 / steps as f64;
                let altitude_ft = entry_alt + (exit_alt - entry_alt) * fraction;
                let point = if step == 0 {
                    entry
                } else if step == steps {
                    exit
                } else {
                    center + Vec2::polar(effective_m, start_angle + sweep * fraction)
                };
                to_geo(point, altitude_ft)
            })
            .collect();

        let (center_lat, center_lon) = plane.to_geodetic(center.x, center.y);
        Ok(ArcComputation {
            direction,
            requested_radius_ft: current.turn_radius_ft,
            effective_radius_ft: effective_ft,
            turn_angle_rad: turn_angle,
            sweep_rad: sweep,
            entry: to_geo(entry, entry_alt),
            exit: to_geo(exit, exit_alt),
            center_lat,
            center_lon,
            samples,
        })
    }
}

/// Stitch straight legs and arcs into one ordered point list.
fn assemble(waypoints: &[Waypoint], corners: &[CornerReport]) -> Vec<PathPoint> {
    let arc_at = |index: usize| arc_for_waypoint(corners, index);
    let waypoint_point = |index: usize| {
        let wp = &waypoints[index];
        PathPoint {
            lat: wp.lat,
            lon: wp.lon,
            altitude_ft: wp.altitude_ft,
            kind: PathPointKind::Waypoint,
            source_index: index,
        }
    };
    let arc_point = |point: &GeoPoint, kind: PathPointKind, index: usize| PathPoint {
        lat: point.lat,
        lon: point.lon,
        altitude_ft: point.altitude_ft,
        kind,
        source_index: index,
    };

    let mut points: Vec<PathPoint> = Vec::new();
    let mut push = |point: PathPoint| {
        if points.last().map_or(true, |last| !last.same_position(&point)) {
            points.push(point);
        }
    };

    if waypoints.len() == 1 {
        push(waypoint_point(0));
    }

    for index in 0..waypoints.len().saturating_sub(1) {
        let next = index + 1;
        match arc_at(index) {
            Some(arc) => push(arc_point(&arc.exit, PathPointKind::ArcExit, index)),
            None => push(waypoint_point(index)),
        }
        match arc_at(next) {
            Some(arc) => {
                push(arc_point(&arc.entry, PathPointKind::ArcEntry, next));
                for sample in arc.interior_samples() {
                    push(arc_point(sample, PathPointKind::ArcSample, next));
                }
            }
            None => push(waypoint_point(next)),
        }
    }

    points
}

/// Corner reports start at the second waypoint.
fn arc_for_waypoint(corners: &[CornerReport], index: usize) -> Option<&ArcComputation> {
    corners
        .get(index.checked_sub(1)?)
        .and_then(|corner| corner.outcome.as_ref().ok())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn polar(radius: f64, angle: f64) -> Self {
        Self::new(radius * angle.cos(), radius * angle.sin())
    }

    fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}
