use rayon::prelude::*;
use uom::si::{f64::TemperatureInterval, temperature_interval::kelvin as delta_kelvin};

use crate::models::geothermal::borefield::core::{
    Borehole, Ground, ImpactLimits, IntegralTable, neighbor_temperature_change,
    self_temperature_change,
};

/// Margin above the neighbor limit before a borehole is flagged.
pub const NEIGHBOR_MARKER_TOLERANCE: f64 = 0.1;

/// Temperature changes at one borehole's own location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoreholeImpact {
    /// Change caused by all other boreholes.
    pub neighbor: TemperatureInterval,

    /// Own self-term plus the neighbor change.
    pub total: TemperatureInterval,
}

impl BoreholeImpact {
    /// Whether the neighbor change exceeds `limit` by more than
    /// [`NEIGHBOR_MARKER_TOLERANCE`].
    #[must_use]
    pub fn exceeds_neighbor_limit(&self, limit: TemperatureInterval) -> bool {
        self.neighbor > limit + TemperatureInterval::new::<delta_kelvin>(NEIGHBOR_MARKER_TOLERANCE)
    }
}

/// Field-wide impact and load figures at one depth.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    /// Largest total change at any borehole, never below zero.
    pub max_ground: TemperatureInterval,

    /// Largest neighbor change at any borehole, never below zero.
    pub max_neighbor: TemperatureInterval,

    /// Smallest extraction rate in W/m.
    pub min_rate: f64,

    /// Largest extraction rate in W/m.
    pub max_rate: f64,

    /// Impacts in borehole order.
    pub impacts: Vec<BoreholeImpact>,
}

/// Which field maxima respect their limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCheck {
    pub ground: bool,
    pub neighbor: bool,
}

impl LimitCheck {
    #[must_use]
    pub fn is_within(&self) -> bool {
        self.ground && self.neighbor
    }
}

impl FieldSummary {
    /// Evaluates every borehole at its own location and the first depth of `integrals`.
    ///
    /// The neighbor sum covers every other borehole without a distance
    /// cutoff. Boreholes must be at distinct locations.
    ///
    /// # Panics
    ///
    /// Panics if `integrals` holds no depth or covers fewer boreholes.
    #[must_use]
    pub fn evaluate(boreholes: &[Borehole], ground: &Ground, integrals: &IntegralTable) -> Self {
        let depth = [integrals.depths()[0]];

        let impacts: Vec<BoreholeImpact> = (0..boreholes.len())
            .into_par_iter()
            .map(|i| {
                let b = &boreholes[i];
                let others: Vec<Borehole> = boreholes
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != i)
                    .map(|(_, o)| *o)
                    .collect();

                let neighbor =
                    neighbor_temperature_change(b.x(), b.y(), &depth, &others, ground)[0];
                let own = self_temperature_change(b.rate(), &integrals.get(i, 0), ground);

                BoreholeImpact {
                    neighbor: TemperatureInterval::new::<delta_kelvin>(neighbor),
                    total: TemperatureInterval::new::<delta_kelvin>(own + neighbor),
                }
            })
            .collect();

        let zero = TemperatureInterval::new::<delta_kelvin>(0.0);
        let max_ground = impacts.iter().map(|m| m.total).fold(zero, max_interval);
        let max_neighbor = impacts.iter().map(|m| m.neighbor).fold(zero, max_interval);

        Self {
            max_ground,
            max_neighbor,
            min_rate: boreholes.iter().map(Borehole::rate).fold(f64::INFINITY, f64::min),
            max_rate: boreholes.iter().map(Borehole::rate).fold(f64::NEG_INFINITY, f64::max),
            impacts,
        }
    }

    /// Compares the field maxima against `limits`.
    #[must_use]
    pub fn check(&self, limits: &ImpactLimits) -> LimitCheck {
        LimitCheck {
            ground: self.max_ground <= limits.environment,
            neighbor: self.max_neighbor <= limits.neighbor,
        }
    }

    /// Indices of boreholes whose neighbor change exceeds `limit` plus the marker tolerance.
    pub fn flagged(&self, limit: TemperatureInterval) -> impl Iterator<Item = usize> + '_ {
        self.impacts
            .iter()
            .enumerate()
            .filter(move |(_, impact)| impact.exceeds_neighbor_limit(limit))
            .map(|(i, _)| i)
    }
}

fn max_interval(a: TemperatureInterval, b: TemperatureInterval) -> TemperatureInterval {
    if b > a { b } else { a }
}
