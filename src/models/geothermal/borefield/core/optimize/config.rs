use uom::si::{f64::TemperatureInterval, temperature_interval::kelvin as delta_kelvin};

use crate::support::sqp::SqpConfig;

use super::OptimizeError;

/// Per-borehole extraction rate bounds in W/m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for RateBounds {
    fn default() -> Self {
        Self {
            lower: 5.0,
            upper: 50.0,
        }
    }
}

impl RateBounds {
    /// Clamps `rate` into the bounds.
    #[must_use]
    pub fn clip(&self, rate: f64) -> f64 {
        rate.clamp(self.lower, self.upper)
    }

    pub(super) fn validate(&self) -> Result<(), OptimizeError> {
        if self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper {
            Ok(())
        } else {
            Err(OptimizeError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

/// Temperature-change limits the optimized field must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactLimits {
    /// Limit on a borehole's total change (own plus neighbors).
    pub environment: TemperatureInterval,

    /// Limit on the change a borehole receives from its neighbors.
    pub neighbor: TemperatureInterval,
}

impl Default for ImpactLimits {
    fn default() -> Self {
        Self {
            environment: TemperatureInterval::new::<delta_kelvin>(6.0),
            neighbor: TemperatureInterval::new::<delta_kelvin>(1.5),
        }
    }
}

/// Observation depths, from `start` to `end` inclusive at `step`, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthProfile {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Default for DepthProfile {
    fn default() -> Self {
        Self {
            start: 10.0,
            end: 70.0,
            step: 10.0,
        }
    }
}

impl DepthProfile {
    /// Upper bound on sampled depths.
    const MAX_DEPTHS: usize = 10_000;

    /// Sampled depths in increasing order.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::InvalidDepths`] if a value is not finite, the
    /// step is not positive, the range is inverted, or it holds too many depths.
    pub fn depths(&self) -> Result<Vec<f64>, OptimizeError> {
        let invalid = |reason: &'static str| OptimizeError::InvalidDepths {
            profile: *self,
            reason,
        };
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(invalid("values must be finite"));
        }
        if self.step <= 0.0 {
            return Err(invalid("step must be positive"));
        }
        if self.end < self.start {
            return Err(invalid("end must not precede start"));
        }

        let steps = ((self.end - self.start) / self.step + 1e-9).floor();
        if steps >= Self::MAX_DEPTHS as f64 {
            return Err(invalid("too many depths"));
        }
        Ok((0..=steps as usize)
            .map(|k| self.start + k as f64 * self.step)
            .collect())
    }
}

/// Configuration for [`optimize_heat_load`](super::optimize_heat_load).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeConfig {
    pub bounds: RateBounds,
    pub limits: ImpactLimits,
    pub depths: DepthProfile,

    /// Half-width (m) of the box around each borehole inside which neighbors count.
    ///
    /// `None` includes every borehole, matching the temperature field.
    pub neighbor_cutoff: Option<f64>,

    /// Distance from a source axis at which the self-term is evaluated, in metres.
    pub regularization_radius: f64,

    /// Starting rates, one per borehole.
    ///
    /// Defaults to 10 W/m everywhere, clipped into the bounds.
    pub initial_rates: Option<Vec<f64>>,

    /// Decimal places kept when keying the constraint cache.
    pub cache_decimals: u32,

    pub sqp: SqpConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            bounds: RateBounds::default(),
            limits: ImpactLimits::default(),
            depths: DepthProfile::default(),
            neighbor_cutoff: Some(500.0),
            regularization_radius: 0.1,
            initial_rates: None,
            cache_decimals: 3,
            sqp: SqpConfig::default(),
        }
    }
}
