//! Parametric multi-battery "bounce" spiral.
//!
//! Each battery flies one angular slice of the full circle. Inside its slice
//! the vehicle swings back and forth between the slice edges (the bounces)
//! while the radius grows exponentially outbound, holds at its maximum, then
//! decays on the way back in. Waypoints are picked from a dense pre-sampled
//! table so they sit exactly on the curve a renderer would draw.

use crate::config::default_sample_count;
use crate::error::{FlightPathError, Result};
use crate::models::Phase;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Fraction of the outbound leg flown in the early growth regime.
const TRANSITION_FRACTION: f64 = 0.4;
/// Schedule instants are placed on quarter-bounce boundaries.
const QUARTERS_PER_SPAN: u32 = 4;
/// Upper bound on bounces per slice. Far above any real battery budget.
pub const MAX_BOUNCES: u32 = 1000;

const FULL_QUARTERS: &[u32] = &[1, 2, 3, 4];
const HALF_QUARTERS: &[u32] = &[2, 4];

/// Immutable inputs for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiralParameters {
    pub slices: u32,
    pub bounces: u32,
    pub start_radius_ft: f64,
    pub hold_radius_ft: f64,
}

impl SpiralParameters {
    pub fn new(
        slices: u32,
        bounces: u32,
        start_radius_ft: f64,
        hold_radius_ft: f64,
    ) -> Result<Self> {
        let params = Self {
            slices,
            bounces,
            start_radius_ft,
            hold_radius_ft,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slices == 0 {
            return Err(FlightPathError::config("slice count must be at least 1"));
        }
        if self.bounces == 0 {
            return Err(FlightPathError::config("bounce count must be at least 1"));
        }
        if self.bounces > MAX_BOUNCES {
            return Err(FlightPathError::config(format!(
                "bounce count must be at most {MAX_BOUNCES}, got {}",
                self.bounces
            )));
        }
        if !self.start_radius_ft.is_finite() || self.start_radius_ft <= 0.0 {
            return Err(FlightPathError::config(format!(
                "start radius must be positive, got {}",
                self.start_radius_ft
            )));
        }
        if !self.hold_radius_ft.is_finite() || self.hold_radius_ft <= self.start_radius_ft {
            return Err(FlightPathError::config(format!(
                "hold radius ({}) must exceed start radius ({})",
                self.hold_radius_ft, self.start_radius_ft
            )));
        }
        let alpha = self.base_alpha();
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(FlightPathError::config(format!(
                "growth rate is not usable ({alpha}) for {} bounces",
                self.bounces
            )));
        }
        Ok(())
    }

    /// Angular width of one slice in radians.
    pub fn dphi(&self) -> f64 {
        TAU / self.slices as f64
    }

    pub fn base_alpha(&self) -> f64 {
        (self.hold_radius_ft / self.start_radius_ft).ln() / (self.bounces as f64 * self.dphi())
    }
}

/// Growth-rate regime chosen from the hold/start radius ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityRegime {
    /// ratio > 20
    Wide,
    /// ratio > 10
    Moderate,
    Narrow,
}

impl DensityRegime {
    pub fn classify(radius_ratio: f64) -> Self {
        if radius_ratio > 20.0 {
            DensityRegime::Wide
        } else if radius_ratio > 10.0 {
            DensityRegime::Moderate
        } else {
            DensityRegime::Narrow
        }
    }

    /// `(early, late)` multipliers applied to the base growth rate.
    pub fn multipliers(self) -> (f64, f64) {
        match self {
            DensityRegime::Wide => (1.02, 0.80),
            DensityRegime::Moderate => (1.05, 0.85),
            DensityRegime::Narrow => (1.00, 0.90),
        }
    }
}

/// Which quarter points of each span get a waypoint, keyed by slice count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDensity {
    pub bounce_quarters: &'static [u32],
    pub hold_quarters: &'static [u32],
}

impl ScheduleDensity {
    pub fn for_slices(slices: u32) -> Self {
        match slices {
            // A full 360° bounce is long; support it at every quarter.
            1 => Self {
                bounce_quarters: FULL_QUARTERS,
                hold_quarters: FULL_QUARTERS,
            },
            2 => Self {
                bounce_quarters: HALF_QUARTERS,
                hold_quarters: FULL_QUARTERS,
            },
            _ => Self {
                bounce_quarters: HALF_QUARTERS,
                hold_quarters: HALF_QUARTERS,
            },
        }
    }

    pub fn waypoint_count(&self, bounces: u32) -> usize {
        1 + 2 * bounces as usize * self.bounce_quarters.len() + self.hold_quarters.len()
    }
}

/// One entry of the dense curve table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiralSample {
    /// Curve parameter (radians of oscillation time)
    pub t: f64,
    pub radius_ft: f64,
    /// Polar angle after slice rotation, radians
    pub angle_rad: f64,
    /// East offset from the spiral center
    pub x_ft: f64,
    /// North offset from the spiral center
    pub y_ft: f64,
}

/// A scheduled waypoint on the spiral, before altitude assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiralPoint {
    pub phase: Phase,
    pub sample_index: usize,
    pub t: f64,
    pub radius_ft: f64,
    pub angle_rad: f64,
    pub x_ft: f64,
    pub y_ft: f64,
}

impl SpiralPoint {
    fn from_sample(phase: Phase, sample_index: usize, sample: SpiralSample) -> Self {
        Self {
            phase,
            sample_index,
            t: sample.t,
            radius_ft: sample.radius_ft,
            angle_rad: sample.angle_rad,
            x_ft: sample.x_ft,
            y_ft: sample.y_ft,
        }
    }

    /// Distance from the spiral center.
    pub fn distance_ft(&self) -> f64 {
        self.radius_ft
    }
}

#[derive(Debug, Clone)]
pub struct SpiralGenerator {
    params: SpiralParameters,
    regime: DensityRegime,
    alpha_early: f64,
    alpha_late: f64,
    dphi: f64,
    t_total: f64,
    t_transition: f64,
    radius_at_transition: f64,
    total_steps: usize,
    outbound_end_step: usize,
    hold_end_step: usize,
    max_radius_ft: f64,
}

impl SpiralGenerator {
    pub fn new(params: SpiralParameters) -> Result<Self> {
        Self::with_sample_count(params, default_sample_count())
    }

    /// `sample_count` is the approximate size of the dense table; it is
    /// rounded so every quarter-bounce boundary lands on a sample.
    pub fn with_sample_count(params: SpiralParameters, sample_count: usize) -> Result<Self> {
        params.validate()?;
        if sample_count < 2 {
            return Err(FlightPathError::config(format!(
                "dense sample count must be at least 2, got {sample_count}"
            )));
        }

        let bounces = params.bounces as usize;
        let dphi = params.dphi();
        let base_alpha = params.base_alpha();
        let regime = DensityRegime::classify(params.hold_radius_ft / params.start_radius_ft);
        let (early, late) = regime.multipliers();
        let alpha_early = base_alpha * early;
        let alpha_late = base_alpha * late;

        let t_out = params.bounces as f64 * dphi;
        let t_total = 2.0 * t_out + dphi;
        let t_transition = TRANSITION_FRACTION * t_out;
        let radius_at_transition = params.start_radius_ft * (alpha_early * t_transition).exp();

        let quarter_spans = QUARTERS_PER_SPAN as usize * (2 * bounces + 1);
        let steps_per_quarter =
            (((sample_count - 1) as f64 / quarter_spans as f64).round() as usize).max(1);
        let total_steps = quarter_spans * steps_per_quarter;
        let outbound_end_step = QUARTERS_PER_SPAN as usize * bounces * steps_per_quarter;
        let hold_end_step = outbound_end_step + QUARTERS_PER_SPAN as usize * steps_per_quarter;

        let mut generator = Self {
            params,
            regime,
            alpha_early,
            alpha_late,
            dphi,
            t_total,
            t_transition,
            radius_at_transition,
            total_steps,
            outbound_end_step,
            hold_end_step,
            max_radius_ft: 0.0,
        };
        generator.max_radius_ft = generator.outbound_radius(generator.step_time(outbound_end_step));

        tracing::debug!(
            regime = ?regime,
            base_alpha,
            alpha_early,
            alpha_late,
            max_radius_ft = generator.max_radius_ft,
            samples = total_steps + 1,
            "spiral generator configured"
        );

        Ok(generator)
    }

    pub fn parameters(&self) -> &SpiralParameters {
        &self.params
    }

    pub fn regime(&self) -> DensityRegime {
        self.regime
    }

    /// Radius held between the outbound and inbound legs.
    pub fn max_radius_ft(&self) -> f64 {
        self.max_radius_ft
    }

    pub fn sample_count(&self) -> usize {
        self.total_steps + 1
    }

    pub fn expected_waypoint_count(slices: u32, bounces: u32) -> usize {
        ScheduleDensity::for_slices(slices).waypoint_count(bounces)
    }

    /// Slice rotation: slice 0 starts due north, later slices follow
    /// counter-clockwise.
    pub fn slice_offset(&self, slice_index: u32) -> f64 {
        FRAC_PI_2 + slice_index as f64 * self.dphi
    }

    /// The full dense curve for one slice.
    pub fn dense_curve(&self, slice_index: u32) -> Result<Vec<SpiralSample>> {
        self.check_slice(slice_index)?;
        let offset = self.slice_offset(slice_index);
        Ok((0..=self.total_steps)
            .map(|step| self.sample(step, offset))
            .collect())
    }

    /// Scheduled waypoints for one slice, in flight order.
    pub fn generate_slice(&self, slice_index: u32) -> Result<Vec<SpiralPoint>> {
        self.check_slice(slice_index)?;
        let offset = self.slice_offset(slice_index);
        let points = self
            .schedule()
            .into_iter()
            .map(|(quarter, phase)| {
                let instant = quarter as f64 * self.dphi / QUARTERS_PER_SPAN as f64;
                let step = self.nearest_step(instant);
                SpiralPoint::from_sample(phase, step, self.sample(step, offset))
            })
            .collect();
        Ok(points)
    }

    fn check_slice(&self, slice_index: u32) -> Result<()> {
        if slice_index >= self.params.slices {
            return Err(FlightPathError::config(format!(
                "slice index {slice_index} out of range for {} slices",
                self.params.slices
            )));
        }
        Ok(())
    }

    /// Named instants as `(quarter offset from t = 0, phase)`.
    fn schedule(&self) -> Vec<(u32, Phase)> {
        let density = ScheduleDensity::for_slices(self.params.slices);
        let bounces = self.params.bounces;
        let mut schedule = Vec::with_capacity(density.waypoint_count(bounces));
        schedule.push((0, Phase::Start));

        for bounce in 1..=bounces {
            let base = QUARTERS_PER_SPAN * (bounce - 1);
            for &quarter in density.bounce_quarters {
                schedule.push((base + quarter, outbound_phase(bounce, quarter)));
            }
        }

        let hold_base = QUARTERS_PER_SPAN * bounces;
        for &quarter in density.hold_quarters {
            schedule.push((hold_base + quarter, hold_phase(quarter)));
        }

        let inbound_base = hold_base + QUARTERS_PER_SPAN;
        for bounce in 1..=bounces {
            let base = inbound_base + QUARTERS_PER_SPAN * (bounce - 1);
            for &quarter in density.bounce_quarters {
                schedule.push((base + quarter, inbound_phase(bounce, quarter)));
            }
        }

        schedule
    }

    fn nearest_step(&self, instant: f64) -> usize {
        let position = (instant / self.t_total * self.total_steps as f64).round();
        (position.max(0.0) as usize).min(self.total_steps)
    }

    fn step_time(&self, step: usize) -> f64 {
        self.t_total * step as f64 / self.total_steps as f64
    }

    fn outbound_radius(&self, t: f64) -> f64 {
        if t <= self.t_transition {
            self.params.start_radius_ft * (self.alpha_early * t).exp()
        } else {
            self.radius_at_transition * (self.alpha_late * (t - self.t_transition)).exp()
        }
    }

    fn radius_at_step(&self, step: usize) -> f64 {
        if step <= self.outbound_end_step {
            self.outbound_radius(self.step_time(step))
        } else if step <= self.hold_end_step {
            self.max_radius_ft
        } else {
            let elapsed = self.step_time(step) - self.step_time(self.hold_end_step);
            self.max_radius_ft * (-self.alpha_late * elapsed).exp()
        }
    }

    /// Triangle wave sweeping `0 → dphi → 0` once per two bounces.
    fn oscillation_angle(&self, t: f64) -> f64 {
        let phase = (t / self.dphi).rem_euclid(2.0);
        if phase <= 1.0 {
            phase * self.dphi
        } else {
            (2.0 - phase) * self.dphi
        }
    }

    fn sample(&self, step: usize, offset: f64) -> SpiralSample {
        let t = self.step_time(step);
        let radius_ft = self.radius_at_step(step);
        let angle_rad = self.oscillation_angle(t) + offset;
        SpiralSample {
            t,
            radius_ft,
            angle_rad,
            x_ft: radius_ft * angle_rad.cos(),
            y_ft: radius_ft * angle_rad.sin(),
        }
    }
}

fn outbound_phase(bounce: u32, quarter: u32) -> Phase {
    match quarter {
        1 => Phase::OutboundQuarter(bounce),
        2 => Phase::OutboundMid(bounce),
        3 => Phase::OutboundThreeQuarter(bounce),
        _ => Phase::OutboundBounce(bounce),
    }
}

fn hold_phase(quarter: u32) -> Phase {
    match quarter {
        1 => Phase::HoldQuarter,
        2 => Phase::HoldMid,
        3 => Phase::HoldThreeQuarter,
        _ => Phase::HoldEnd,
    }
}

fn inbound_phase(bounce: u32, quarter: u32) -> Phase {
    match quarter {
        1 => Phase::InboundQuarter(bounce),
        2 => Phase::InboundMid(bounce),
        3 => Phase::InboundThreeQuarter(bounce),
        _ => Phase::InboundBounce(bounce),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Leg;

    fn three_slice_params() -> SpiralParameters {
        SpiralParameters::new(3, 6, 150.0, 1595.0).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(SpiralParameters::new(0, 6, 150.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, 0, 150.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, 6, 0.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, 6, -10.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, 6, 150.0, 150.0).is_err());
        assert!(SpiralParameters::new(3, 6, 150.0, f64::INFINITY).is_err());
        assert!(SpiralParameters::new(3, MAX_BOUNCES + 1, 150.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, u32::MAX, 150.0, 1595.0).is_err());
        assert!(SpiralParameters::new(3, MAX_BOUNCES, 150.0, 1595.0).is_ok());
        let err = SpiralParameters::new(3, 6, 150.0, 100.0).unwrap_err();
        assert!(matches!(err, FlightPathError::InvalidConfig(_)));
    }

    #[test]
    fn regime_table_matches_ratio_breakpoints() {
        assert_eq!(DensityRegime::classify(25.0), DensityRegime::Wide);
        assert_eq!(DensityRegime::classify(20.0), DensityRegime::Moderate);
        assert_eq!(DensityRegime::classify(10.63), DensityRegime::Moderate);
        assert_eq!(DensityRegime::classify(10.0), DensityRegime::Narrow);
        assert_eq!(DensityRegime::Wide.multipliers(), (1.02, 0.80));
        assert_eq!(DensityRegime::Narrow.multipliers(), (1.00, 0.90));
    }

    #[test]
    fn three_slice_scenario_has_fixed_shape() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        let points = generator.generate_slice(0).unwrap();

        assert_eq!(points.len(), 4 * 6 + 3);
        assert_eq!(points.len(), SpiralGenerator::expected_waypoint_count(3, 6));
        assert_eq!(points[0].phase, Phase::Start);
        assert!((points[0].distance_ft() - 150.0).abs() < 1e-9);

        let last_outbound = points
            .iter()
            .find(|p| p.phase == Phase::OutboundBounce(6))
            .unwrap();
        assert!((last_outbound.radius_ft - generator.max_radius_ft()).abs() < 1e-9);
        assert!(last_outbound.radius_ft > 1000.0 && last_outbound.radius_ft <= 1595.0);

        assert_eq!(points.last().unwrap().phase, Phase::InboundBounce(6));
        assert_eq!(points[1].phase, Phase::OutboundMid(1));
        assert_eq!(points[2].phase, Phase::OutboundBounce(1));
    }

    #[test]
    fn slice_start_faces_its_rotation_offset() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        let start = generator.generate_slice(0).unwrap()[0];
        assert!(start.x_ft.abs() < 1e-9);
        assert!((start.y_ft - 150.0).abs() < 1e-9);
    }

    #[test]
    fn radius_follows_leg_monotonicity() {
        for slices in 1..=4 {
            for bounces in [1, 3, 8, 12] {
                let params = SpiralParameters::new(slices, bounces, 120.0, 2800.0).unwrap();
                let generator = SpiralGenerator::new(params).unwrap();
                let points = generator.generate_slice(0).unwrap();
                for pair in points.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    match b.phase.leg() {
                        Leg::Outbound => assert!(b.radius_ft >= a.radius_ft),
                        Leg::Hold => assert_eq!(b.radius_ft, generator.max_radius_ft()),
                        Leg::Inbound => assert!(b.radius_ft <= a.radius_ft),
                        Leg::Start => unreachable!("start only appears first"),
                    }
                }
            }
        }
    }

    #[test]
    fn dense_curve_is_monotone_per_leg() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        let curve = generator.dense_curve(1).unwrap();
        assert_eq!(curve.len(), generator.sample_count());
        let out_end = generator.outbound_end_step;
        let hold_end = generator.hold_end_step;
        for step in 1..curve.len() {
            let (prev, next) = (curve[step - 1].radius_ft, curve[step].radius_ft);
            if step <= out_end {
                assert!(next >= prev, "outbound step {step}");
            } else if step <= hold_end {
                assert_eq!(next, generator.max_radius_ft());
            } else {
                assert!(next <= prev, "inbound step {step}");
            }
        }
    }

    #[test]
    fn waypoints_sit_on_dense_curve() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        let curve = generator.dense_curve(2).unwrap();
        let steps_per_quarter = generator.total_steps / (4 * (2 * 6 + 1));
        for point in generator.generate_slice(2).unwrap() {
            let sample = curve[point.sample_index];
            assert_eq!(sample.x_ft, point.x_ft);
            assert_eq!(sample.y_ft, point.y_ft);
            assert_eq!(point.sample_index % steps_per_quarter, 0);
        }
    }

    #[test]
    fn bounce_apexes_alternate_between_slice_edges() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        let dphi = generator.parameters().dphi();
        let offset = generator.slice_offset(0);
        for point in generator.generate_slice(0).unwrap() {
            let local = point.angle_rad - offset;
            assert!(local >= -1e-9 && local <= dphi + 1e-9);
            if let Phase::OutboundBounce(n) = point.phase {
                let expected = if n % 2 == 1 { dphi } else { 0.0 };
                assert!((local - expected).abs() < 1e-9, "bounce {n}: {local}");
            }
            if let Phase::OutboundMid(_) = point.phase {
                assert!((local - dphi / 2.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn density_table_is_keyed_by_slice_count() {
        assert_eq!(SpiralGenerator::expected_waypoint_count(1, 5), 8 * 5 + 5);
        assert_eq!(SpiralGenerator::expected_waypoint_count(2, 5), 4 * 5 + 5);
        assert_eq!(SpiralGenerator::expected_waypoint_count(3, 5), 4 * 5 + 3);
        assert_eq!(SpiralGenerator::expected_waypoint_count(8, 5), 4 * 5 + 3);

        for slices in 1..=4 {
            let params = SpiralParameters::new(slices, 5, 100.0, 900.0).unwrap();
            let points = SpiralGenerator::new(params)
                .unwrap()
                .generate_slice(0)
                .unwrap();
            assert_eq!(
                points.len(),
                SpiralGenerator::expected_waypoint_count(slices, 5)
            );
        }
    }

    #[test]
    fn single_slice_adds_quarter_support_points() {
        let params = SpiralParameters::new(1, 3, 100.0, 900.0).unwrap();
        let points = SpiralGenerator::new(params)
            .unwrap()
            .generate_slice(0)
            .unwrap();
        assert!(points.iter().any(|p| p.phase == Phase::OutboundQuarter(2)));
        assert!(points.iter().any(|p| p.phase == Phase::HoldThreeQuarter));
        assert!(points.iter().any(|p| p.phase == Phase::InboundThreeQuarter(3)));
    }

    #[test]
    fn slice_index_is_checked() {
        let generator = SpiralGenerator::new(three_slice_params()).unwrap();
        assert!(generator.generate_slice(3).is_err());
        assert!(generator.dense_curve(7).is_err());
    }

    #[test]
    fn generation_is_deterministic() {
        let a = SpiralGenerator::new(three_slice_params())
            .unwrap()
            .generate_slice(1)
            .unwrap();
        let b = SpiralGenerator::new(three_slice_params())
            .unwrap()
            .generate_slice(1)
            .unwrap();
        assert_eq!(a, b);
    }
}
