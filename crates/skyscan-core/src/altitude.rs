//! Phase-aware AGL altitude assignment.
//!
//! Altitude climbs with distance from the spiral center on the way out and
//! descends more gently on the way back, so the return leg re-images the
//! subject from a different elevation. The running maximum is threaded
//! through the waypoint sequence as an explicit accumulator.

use crate::config::{AltitudeLimits, AltitudeRates};
use crate::error::Result;
use crate::models::Leg;
use crate::spiral::SpiralPoint;
use serde::{Deserialize, Serialize};

/// Accumulated state carried from one waypoint to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeState {
    pub first_distance_ft: f64,
    pub max_altitude_ft: f64,
    pub max_distance_ft: f64,
}

/// A spiral waypoint with its assigned altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfiledPoint {
    pub point: SpiralPoint,
    pub altitude_ft: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeProfiler {
    limits: AltitudeLimits,
    rates: AltitudeRates,
}

impl AltitudeProfiler {
    pub fn new(limits: AltitudeLimits, rates: AltitudeRates) -> Result<Self> {
        limits.validate()?;
        rates.validate()?;
        Ok(Self { limits, rates })
    }

    pub fn limits(&self) -> &AltitudeLimits {
        &self.limits
    }

    /// Assign altitudes to generated spiral waypoints, in generation order.
    pub fn profile(&self, points: &[SpiralPoint]) -> Vec<ProfiledPoint> {
        let altitudes = self.altitudes(points.iter().map(|p| (p.phase.leg(), p.distance_ft())));
        points
            .iter()
            .zip(altitudes)
            .map(|(point, altitude_ft)| ProfiledPoint {
                point: *point,
                altitude_ft,
            })
            .collect()
    }

    /// Altitudes for a sequence of `(leg, distance from center)` stops.
    pub fn altitudes<I>(&self, stops: I) -> Vec<f64>
    where
        I: IntoIterator<Item = (Leg, f64)>,
    {
        stops
            .into_iter()
            .scan(None, |state: &mut Option<AltitudeState>, (leg, distance_ft)| {
                let (next, raw_altitude) = self.advance(*state, leg, distance_ft);
                *state = Some(next);
                Some(self.limits.clamp(raw_altitude))
            })
            .collect()
    }

    /// One fold step. Returns the next state and the unclamped altitude.
    pub fn advance(
        &self,
        state: Option<AltitudeState>,
        leg: Leg,
        distance_ft: f64,
    ) -> (AltitudeState, f64) {
        let min = self.limits.min_agl_ft;
        let Some(mut state) = state else {
            let seeded = AltitudeState {
                first_distance_ft: distance_ft,
                max_altitude_ft: min,
                max_distance_ft: distance_ft,
            };
            return (seeded, min);
        };

        let altitude = match leg {
            Leg::Inbound => {
                let closed_in = (state.max_distance_ft - distance_ft).max(0.0);
                (state.max_altitude_ft - closed_in * self.rates.descent_rate).max(min)
            }
            Leg::Start | Leg::Outbound | Leg::Hold => {
                let climbed = min + (distance_ft - state.first_distance_ft) * self.rates.climb_rate;
                if climbed > state.max_altitude_ft {
                    state.max_altitude_ft = climbed;
                    state.max_distance_ft = distance_ft;
                }
                climbed
            }
        };

        (state, altitude)
    }
}
