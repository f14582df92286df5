//! CLI defaults from environment.

use skyscan_core::{AltitudeLimits, AltitudePreset, MissionConfig};
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub limits: AltitudeLimits,
    pub preset: AltitudePreset,
    pub sample_count: usize,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AltitudeLimits::default();
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());

        let max_agl_ft = match lookup("SKYSCAN_MAX_AGL_FT") {
            Some(value) if matches!(value.trim(), "none" | "off") => None,
            Some(value) => value.trim().parse().ok().or(defaults.max_agl_ft),
            None => defaults.max_agl_ft,
        };

        Self {
            limits: AltitudeLimits {
                min_agl_ft: number("SKYSCAN_MIN_AGL_FT").unwrap_or(defaults.min_agl_ft),
                max_agl_ft,
            },
            preset: lookup("SKYSCAN_ALTITUDE_PRESET")
                .and_then(|s| AltitudePreset::parse(&s))
                .unwrap_or_default(),
            sample_count: lookup("SKYSCAN_SAMPLE_COUNT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(MissionConfig::default().sample_count),
            log_json: lookup("SKYSCAN_LOG_FORMAT").is_some_and(|s| s.trim() == "json"),
        }
    }

    /// Mission defaults with the environment's altitude settings applied.
    pub fn mission(&self) -> MissionConfig {
        MissionConfig {
            limits: self.limits,
            rates: self.preset.rates(),
            sample_count: self.sample_count,
            ..MissionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.limits, AltitudeLimits::default());
        assert_eq!(config.preset, AltitudePreset::Production);
        assert_eq!(config.sample_count, 1200);
        assert!(!config.log_json);
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("SKYSCAN_MIN_AGL_FT", "80"),
            ("SKYSCAN_MAX_AGL_FT", "none"),
            ("SKYSCAN_ALTITUDE_PRESET", "visualization"),
            ("SKYSCAN_SAMPLE_COUNT", "bogus"),
            ("SKYSCAN_LOG_FORMAT", "json"),
        ]));
        assert!(config.log_json);
        assert_eq!(config.limits.min_agl_ft, 80.0);
        assert_eq!(config.limits.max_agl_ft, None);
        assert_eq!(config.preset, AltitudePreset::Visualization);
        assert_eq!(config.sample_count, 1200);
        assert_eq!(config.mission().rates.climb_rate, 0.20);
    }
}
