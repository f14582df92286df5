//! Configuration records for spiral generation and altitude profiling.

use crate::error::{FlightPathError, Result};
use serde::{Deserialize, Serialize};

/// Default mission center (UCI campus).
const DEFAULT_CENTER_LAT: f64 = 33.6846;
const DEFAULT_CENTER_LON: f64 = -117.8265;

/// Named climb/descent rate tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudePreset {
    /// Rates used for flown missions
    #[default]
    Production,
    /// Gentler climb used for preview overlays
    Visualization,
}

impl AltitudePreset {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "visualization" | "visualisation" | "viz" | "preview" => Some(Self::Visualization),
            _ => None,
        }
    }

    pub fn rates(self) -> AltitudeRates {
        match self {
            AltitudePreset::Production => AltitudeRates {
                climb_rate: 0.37,
                descent_rate: 0.10,
            },
            AltitudePreset::Visualization => AltitudeRates {
                climb_rate: 0.20,
                descent_rate: 0.10,
            },
        }
    }
}

/// Feet of altitude gained (lost) per foot of radial distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeRates {
    pub climb_rate: f64,
    pub descent_rate: f64,
}

impl Default for AltitudeRates {
    fn default() -> Self {
        AltitudePreset::default().rates()
    }
}

impl AltitudeRates {
    pub fn validate(&self) -> Result<()> {
        if !self.climb_rate.is_finite() || self.climb_rate < 0.0 {
            return Err(FlightPathError::config(format!(
                "climb rate must be finite and non-negative, got {}",
                self.climb_rate
            )));
        }
        if !self.descent_rate.is_finite() || self.descent_rate < 0.0 {
            return Err(FlightPathError::config(format!(
                "descent rate must be finite and non-negative, got {}",
                self.descent_rate
            )));
        }
        Ok(())
    }
}

/// AGL envelope every generated waypoint must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeLimits {
    pub min_agl_ft: f64,
    #[serde(default)]
    pub max_agl_ft: Option<f64>,
}

impl Default for AltitudeLimits {
    fn default() -> Self {
        Self {
            min_agl_ft: 60.0,
            max_agl_ft: Some(400.0), // FAA Part 107 ceiling
        }
    }
}

impl AltitudeLimits {
    pub fn validate(&self) -> Result<()> {
        if !self.min_agl_ft.is_finite() || self.min_agl_ft < 0.0 {
            return Err(FlightPathError::config(format!(
                "minimum AGL must be finite and non-negative, got {}",
                self.min_agl_ft
            )));
        }
        if let Some(max) = self.max_agl_ft {
            if !max.is_finite() || max < self.min_agl_ft {
                return Err(FlightPathError::config(format!(
                    "maximum AGL ({max}) must be finite and at least the minimum ({})",
                    self.min_agl_ft
                )));
            }
        }
        Ok(())
    }

    /// Clamp into `[min, max]`. The minimum always applies.
    pub fn clamp(&self, altitude_ft: f64) -> f64 {
        let floored = altitude_ft.max(self.min_agl_ft);
        match self.max_agl_ft {
            Some(max) => floored.min(max),
            None => floored,
        }
    }
}

/// Maps usable battery time to a bounce count.
pub trait BounceCountPolicy {
    fn bounce_count(&self, battery_minutes: f64) -> Result<u32>;
}

/// `N = round(base + per_minute * (minutes - reference))`, clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearBouncePolicy {
    pub base: f64,
    pub per_minute: f64,
    pub reference_minutes: f64,
    pub min_bounces: u32,
    pub max_bounces: u32,
}

impl Default for LinearBouncePolicy {
    fn default() -> Self {
        Self {
            base: 5.0,
            per_minute: 0.3,
            reference_minutes: 10.0,
            min_bounces: 3,
            max_bounces: 12,
        }
    }
}

impl BounceCountPolicy for LinearBouncePolicy {
    fn bounce_count(&self, battery_minutes: f64) -> Result<u32> {
        if !battery_minutes.is_finite() || battery_minutes <= 0.0 {
            return Err(FlightPathError::config(format!(
                "battery duration must be a positive number of minutes, got {battery_minutes}"
            )));
        }
        if self.min_bounces == 0 || self.min_bounces > self.max_bounces {
            return Err(FlightPathError::config(format!(
                "bounce clamp [{}, {}] is empty or allows zero bounces",
                self.min_bounces, self.max_bounces
            )));
        }
        let raw = (self.base + self.per_minute * (battery_minutes - self.reference_minutes)).round();
        if !raw.is_finite() {
            return Err(FlightPathError::config("bounce policy produced a non-finite count"));
        }
        let clamped = raw.clamp(self.min_bounces as f64, self.max_bounces as f64);
        Ok(clamped as u32)
    }
}

impl<F> BounceCountPolicy for F
where
    F: Fn(f64) -> u32,
{
    fn bounce_count(&self, battery_minutes: f64) -> Result<u32> {
        Ok(self(battery_minutes))
    }
}

/// Where the bounce count of a mission comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BounceSource {
    Fixed(u32),
    BatteryMinutes(f64),
}

impl BounceSource {
    pub fn resolve(&self, policy: &dyn BounceCountPolicy) -> Result<u32> {
        match *self {
            BounceSource::Fixed(bounces) => Ok(bounces),
            BounceSource::BatteryMinutes(minutes) => policy.bounce_count(minutes),
        }
    }
}

/// Full configuration for generating a multi-battery capture mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Ground altitude of the capture subject, used for the point of interest
    #[serde(default)]
    pub poi_altitude_ft: f64,
    pub slices: u32,
    pub bounces: BounceSource,
    pub start_radius_ft: f64,
    pub hold_radius_ft: f64,
    #[serde(default)]
    pub limits: AltitudeLimits,
    #[serde(default)]
    pub rates: AltitudeRates,
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

pub(crate) fn default_sample_count() -> usize {
    1200
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            center_lat: DEFAULT_CENTER_LAT,
            center_lon: DEFAULT_CENTER_LON,
            poi_altitude_ft: 0.0,
            slices: 3,
            bounces: BounceSource::BatteryMinutes(20.0),
            start_radius_ft: 150.0,
            hold_radius_ft: 1595.0,
            limits: AltitudeLimits::default(),
            rates: AltitudeRates::default(),
            sample_count: default_sample_count(),
        }
    }
}

impl MissionConfig {
    pub fn validate_center(&self) -> Result<()> {
        if !self.center_lat.is_finite() || self.center_lat.abs() > 90.0 {
            return Err(FlightPathError::config(format!(
                "center latitude out of range: {}",
                self.center_lat
            )));
        }
        if !self.center_lon.is_finite() || self.center_lon.abs() > 180.0 {
            return Err(FlightPathError::config(format!(
                "center longitude out of range: {}",
                self.center_lon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_policy_matches_battery_table() {
        let policy = LinearBouncePolicy::default();
        assert_eq!(policy.bounce_count(10.0).unwrap(), 5);
        assert_eq!(policy.bounce_count(20.0).unwrap(), 8);
        assert_eq!(policy.bounce_count(15.0).unwrap(), 7); // 6.5 rounds up
        assert_eq!(policy.bounce_count(1.0).unwrap(), 3);
        assert_eq!(policy.bounce_count(90.0).unwrap(), 12);
    }

    #[test]
    fn linear_policy_rejects_bad_durations() {
        let policy = LinearBouncePolicy::default();
        assert!(policy.bounce_count(0.0).is_err());
        assert!(policy.bounce_count(f64::NAN).is_err());
    }

    #[test]
    fn closures_act_as_policies() {
        let doubled = |minutes: f64| (minutes / 2.0) as u32;
        assert_eq!(BounceSource::BatteryMinutes(14.0).resolve(&doubled).unwrap(), 7);
        assert_eq!(BounceSource::Fixed(4).resolve(&doubled).unwrap(), 4);
    }

    #[test]
    fn presets_expose_both_rate_tables() {
        assert_eq!(AltitudePreset::Production.rates().climb_rate, 0.37);
        assert_eq!(AltitudePreset::Visualization.rates().climb_rate, 0.20);
        assert_eq!(AltitudePreset::parse("viz"), Some(AltitudePreset::Visualization));
        assert_eq!(AltitudePreset::parse("turbo"), None);
    }

    #[test]
    fn limits_clamp_and_validate() {
        let limits = AltitudeLimits {
            min_agl_ft: 100.0,
            max_agl_ft: Some(300.0),
        };
        assert_eq!(limits.clamp(50.0), 100.0);
        assert_eq!(limits.clamp(500.0), 300.0);
        assert_eq!(limits.clamp(200.0), 200.0);

        let inverted = AltitudeLimits {
            min_agl_ft: 300.0,
            max_agl_ft: Some(100.0),
        };
        assert!(inverted.validate().is_err());
    }
}
