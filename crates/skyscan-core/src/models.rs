//! Core data models for the flight-path engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const METERS_PER_FOOT: f64 = 0.3048;
pub const FEET_PER_METER: f64 = 1.0 / METERS_PER_FOOT;

pub fn feet_to_meters(feet: f64) -> f64 {
    feet * METERS_PER_FOOT
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

/// Rotation hint carried by a waypoint. Only consulted when the geometry
/// alone cannot tell a left turn from a right one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationDirection {
    #[default]
    Unknown,
    /// Counter-clockwise
    Left,
    /// Clockwise
    Right,
}

impl RotationDirection {
    /// Parse a mission-file cell. Unrecognized values map to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "left" | "l" | "ccw" | "counterclockwise" | "counter_clockwise" | "1" => Self::Left,
            "right" | "r" | "cw" | "clockwise" | "2" => Self::Right,
            _ => Self::Unknown,
        }
    }
}

/// Coarse stage of the spiral a phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Start,
    Outbound,
    Hold,
    Inbound,
}

/// Named schedule instant a generated waypoint was placed at.
///
/// Bounce numbers are 1-based. Quarter and three-quarter variants only
/// appear in the denser one- and two-slice schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Phase {
    Start,
    OutboundQuarter(u32),
    OutboundMid(u32),
    OutboundThreeQuarter(u32),
    OutboundBounce(u32),
    HoldQuarter,
    HoldMid,
    HoldThreeQuarter,
    HoldEnd,
    InboundQuarter(u32),
    InboundMid(u32),
    InboundThreeQuarter(u32),
    InboundBounce(u32),
}

impl Phase {
    pub fn leg(self) -> Leg {
        match self {
            Phase::Start => Leg::Start,
            Phase::OutboundQuarter(_)
            | Phase::OutboundMid(_)
            | Phase::OutboundThreeQuarter(_)
            | Phase::OutboundBounce(_) => Leg::Outbound,
            Phase::HoldQuarter | Phase::HoldMid | Phase::HoldThreeQuarter | Phase::HoldEnd => {
                Leg::Hold
            }
            Phase::InboundQuarter(_)
            | Phase::InboundMid(_)
            | Phase::InboundThreeQuarter(_)
            | Phase::InboundBounce(_) => Leg::Inbound,
        }
    }

    /// Bounce number for outbound/inbound phases.
    pub fn bounce(self) -> Option<u32> {
        match self {
            Phase::OutboundQuarter(n)
            | Phase::OutboundMid(n)
            | Phase::OutboundThreeQuarter(n)
            | Phase::OutboundBounce(n)
            | Phase::InboundQuarter(n)
            | Phase::InboundMid(n)
            | Phase::InboundThreeQuarter(n)
            | Phase::InboundBounce(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => write!(f, "start"),
            Phase::OutboundQuarter(n) => write!(f, "outbound_quarter_{n}"),
            Phase::OutboundMid(n) => write!(f, "outbound_mid_{n}"),
            Phase::OutboundThreeQuarter(n) => write!(f, "outbound_three_quarter_{n}"),
            Phase::OutboundBounce(n) => write!(f, "outbound_bounce_{n}"),
            Phase::HoldQuarter => write!(f, "hold_quarter"),
            Phase::HoldMid => write!(f, "hold_mid"),
            Phase::HoldThreeQuarter => write!(f, "hold_three_quarter"),
            Phase::HoldEnd => write!(f, "hold_end"),
            Phase::InboundQuarter(n) => write!(f, "inbound_quarter_{n}"),
            Phase::InboundMid(n) => write!(f, "inbound_mid_{n}"),
            Phase::InboundThreeQuarter(n) => write!(f, "inbound_three_quarter_{n}"),
            Phase::InboundBounce(n) => write!(f, "inbound_bounce_{n}"),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim().to_lowercase();
        match tag.as_str() {
            "start" => return Ok(Phase::Start),
            "hold_quarter" => return Ok(Phase::HoldQuarter),
            "hold_mid" => return Ok(Phase::HoldMid),
            "hold_three_quarter" => return Ok(Phase::HoldThreeQuarter),
            "hold_end" => return Ok(Phase::HoldEnd),
            _ => {}
        }

        let unknown = || format!("unknown phase tag '{value}'");
        let (stem, number) = tag.rsplit_once('_').ok_or_else(unknown)?;
        let bounce: u32 = number.parse().map_err(|_| unknown())?;
        match stem {
            "outbound_quarter" => Ok(Phase::OutboundQuarter(bounce)),
            "outbound_mid" => Ok(Phase::OutboundMid(bounce)),
            "outbound_three_quarter" => Ok(Phase::OutboundThreeQuarter(bounce)),
            "outbound_bounce" => Ok(Phase::OutboundBounce(bounce)),
            "inbound_quarter" => Ok(Phase::InboundQuarter(bounce)),
            "inbound_mid" => Ok(Phase::InboundMid(bounce)),
            "inbound_three_quarter" => Ok(Phase::InboundThreeQuarter(bounce)),
            "inbound_bounce" => Ok(Phase::InboundBounce(bounce)),
            _ => Err(unknown()),
        }
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.to_string()
    }
}

impl TryFrom<String> for Phase {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A geodetic position with altitude above ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, altitude_ft: f64) -> Self {
        Self {
            lat,
            lon,
            altitude_ft,
        }
    }

    pub fn altitude_m(&self) -> f64 {
        feet_to_meters(self.altitude_ft)
    }
}

/// A finished, geodetic point on a flight path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Unique insertion-order sequence index
    #[serde(default)]
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    /// Altitude above ground level in feet
    pub altitude_ft: f64,
    /// Heading in degrees, 0-360
    #[serde(default)]
    pub heading_deg: f64,
    /// Requested turn radius in feet; 0 means a sharp corner
    #[serde(default)]
    pub turn_radius_ft: f64,
    #[serde(default)]
    pub rotation: RotationDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

impl Waypoint {
    pub fn new(index: usize, lat: f64, lon: f64, altitude_ft: f64) -> Self {
        Self {
            index,
            lat,
            lon,
            altitude_ft,
            heading_deg: 0.0,
            turn_radius_ft: 0.0,
            rotation: RotationDirection::Unknown,
            phase: None,
        }
    }

    pub fn with_turn_radius(mut self, turn_radius_ft: f64) -> Self {
        self.turn_radius_ft = turn_radius_ft;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationDirection) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn altitude_m(&self) -> f64 {
        feet_to_meters(self.altitude_ft)
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon, self.altitude_ft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_tags_round_trip_through_strings() {
        let phases = [
            Phase::Start,
            Phase::OutboundBounce(3),
            Phase::OutboundThreeQuarter(12),
            Phase::HoldEnd,
            Phase::InboundMid(1),
        ];
        for phase in phases {
            let tag = phase.to_string();
            assert_eq!(tag.parse::<Phase>(), Ok(phase), "tag {tag}");
        }
        assert_eq!(Phase::OutboundBounce(3).to_string(), "outbound_bounce_3");
    }

    #[test]
    fn phase_rejects_unknown_tags() {
        assert!("sideways_bounce_2".parse::<Phase>().is_err());
        assert!("outbound_bounce_x".parse::<Phase>().is_err());
        assert!("".parse::<Phase>().is_err());
    }

    #[test]
    fn phase_serializes_as_tag_string() {
        let json = serde_json::to_string(&Phase::InboundBounce(4)).unwrap();
        assert_eq!(json, "\"inbound_bounce_4\"");
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back.leg(), Leg::Inbound);
        assert_eq!(back.bounce(), Some(4));
    }

    #[test]
    fn rotation_parse_accepts_common_spellings() {
        assert_eq!(RotationDirection::parse("CCW"), RotationDirection::Left);
        assert_eq!(RotationDirection::parse(" right "), RotationDirection::Right);
        assert_eq!(RotationDirection::parse("0"), RotationDirection::Unknown);
        assert_eq!(RotationDirection::parse("banana"), RotationDirection::Unknown);
    }

    #[test]
    fn waypoint_altitude_units_stay_consistent() {
        let wp = Waypoint::new(0, 33.0, -117.0, 100.0);
        assert!((wp.altitude_m() - 30.48).abs() < 1e-9);
        assert!((meters_to_feet(wp.altitude_m()) - 100.0).abs() < 1e-9);
    }
}
