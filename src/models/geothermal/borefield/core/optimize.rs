//! Maximum sustainable extraction rates under temperature-change limits.
//!
//! The decision vector holds one extraction rate per borehole, bounded
//! elementwise. The optimizer maximizes the summed rate while keeping, at
//! every borehole and every observation depth,
//!
//! - the total change (own plus neighbors) within the environmental limit, and
//! - the change received from neighbors within the neighbor limit.
//!
//! Constraint values come from [`FieldImpactModel`], memoized per rounded
//! rate vector, and the program is solved with [`sqp::minimize`].

mod cache;
mod config;
mod error;
mod problem;

pub use cache::{ConstraintCache, RateKey};
pub use config::{DepthProfile, ImpactLimits, OptimizeConfig, RateBounds};
pub use error::{EvaluateError, OptimizeError};
pub use problem::{FieldImpact, FieldImpactModel};

use log::{info, warn};
use uom::si::{
    f64::{Power, TemperatureInterval},
    power::watt,
    temperature_interval::kelvin as delta_kelvin,
};

use crate::support::{
    constraint::{NonNegative, StrictlyPositive},
    sqp::{self, Status},
};

use super::{Borehole, Ground, ensure_distinct};

use problem::LoadProblem;

/// Rate used for every borehole when no starting rates are given, in W/m.
pub const DEFAULT_INITIAL_RATE: f64 = 10.0;

/// Outcome of [`optimize_heat_load`].
///
/// Check [`success`](Self::success) before trusting the rates.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// The solver converged and both limits hold within tolerance.
    pub success: bool,
    pub status: Status,

    /// Final rates in W/m, one per borehole.
    pub rates: Vec<f64>,

    /// Largest total change at the final rates.
    pub max_environment: TemperatureInterval,

    /// Largest neighbor change at the final rates.
    pub max_neighbor: TemperatureInterval,

    /// Environmental limit minus achieved maximum; negative when violated.
    pub environment_margin: TemperatureInterval,

    /// Neighbor limit minus achieved maximum; negative when violated.
    pub neighbor_margin: TemperatureInterval,

    /// Solver iterations performed.
    pub iterations: usize,

    /// Distinct rate vectors evaluated.
    pub evaluations: usize,

    /// One line per accepted iteration, in order.
    pub log: Vec<String>,
}

impl OptimizationResult {
    /// Sum of the final rates in W/m.
    #[must_use]
    pub fn total_rate(&self) -> f64 {
        self.rates.iter().sum()
    }
}

/// Field load before and after optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadComparison {
    /// Summed initial rates in W/m.
    pub initial_rate: f64,

    /// Summed optimized rates in W/m.
    pub optimized_rate: f64,

    /// Initial extraction `Σ q·H`.
    pub initial_load: Power,

    /// Optimized extraction `Σ q·H`.
    pub optimized_load: Power,
}

impl LoadComparison {
    /// Compares the rates carried by `boreholes` with `optimized` rates.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluateError::RateCount`] if the rate vector does not match
    /// the borehole count.
    pub fn new(boreholes: &[Borehole], optimized: &[f64]) -> Result<Self, EvaluateError> {
        if optimized.len() != boreholes.len() {
            return Err(EvaluateError::RateCount {
                expected: boreholes.len(),
                actual: optimized.len(),
            });
        }

        let initial_load = boreholes.iter().map(|b| b.rate() * b.length()).sum();
        let optimized_load = boreholes
            .iter()
            .zip(optimized)
            .map(|(b, q)| q * b.length())
            .sum();

        Ok(Self {
            initial_rate: boreholes.iter().map(Borehole::rate).sum(),
            optimized_rate: optimized.iter().sum(),
            initial_load: Power::new::<watt>(initial_load),
            optimized_load: Power::new::<watt>(optimized_load),
        })
    }

    /// Optimized minus initial summed rate, in W/m.
    #[must_use]
    pub fn rate_change(&self) -> f64 {
        self.optimized_rate - self.initial_rate
    }

    /// Optimized minus initial extraction.
    #[must_use]
    pub fn load_change(&self) -> Power {
        self.optimized_load - self.initial_load
    }
}

/// Finds the largest summed extraction rate the field sustains.
///
/// The rates carried by `boreholes` are ignored. The search starts from
/// [`OptimizeConfig::initial_rates`], or [`DEFAULT_INITIAL_RATE`] everywhere,
/// clipped into the bounds. Solver non-convergence and infeasibility are reported through
/// [`OptimizationResult::success`], not as errors.
///
/// # Errors
///
/// Returns an [`OptimizeError`] if the inputs or configuration are invalid.
pub fn optimize_heat_load(
    boreholes: &[Borehole],
    ground: &Ground,
    config: &OptimizeConfig,
) -> Result<OptimizationResult, OptimizeError> {
    if boreholes.is_empty() {
        return Err(OptimizeError::NoBoreholes);
    }
    ensure_distinct(boreholes)?;
    config.bounds.validate()?;
    let magnitude = config.bounds.lower.abs().max(config.bounds.upper.abs());
    if !RateKey::fits(magnitude, config.cache_decimals) {
        return Err(OptimizeError::CacheDecimals {
            decimals: config.cache_decimals,
            magnitude,
        });
    }
    let depths = config.depths.depths()?;
    let radius = StrictlyPositive::new(config.regularization_radius)
        .map_err(OptimizeError::invalid("regularization_radius"))?
        .into_inner();
    let cutoff = config
        .neighbor_cutoff
        .map(|c| NonNegative::new(c).map(|c| c.into_inner()))
        .transpose()
        .map_err(OptimizeError::invalid("neighbor_cutoff"))?;
    let x0 = initial_rates(boreholes.len(), config)?;

    let environment_limit = config.limits.environment.get::<delta_kelvin>();
    let neighbor_limit = config.limits.neighbor.get::<delta_kelvin>();

    let model = FieldImpactModel::new(boreholes, ground, &depths, radius, cutoff);
    let mut problem = LoadProblem::new(
        &model,
        environment_limit,
        neighbor_limit,
        config.cache_decimals,
    );

    info!(
        "optimizing {} boreholes: bounds [{}, {}] W/m, limits {} K / {} K",
        boreholes.len(),
        config.bounds.lower,
        config.bounds.upper,
        environment_limit,
        neighbor_limit,
    );

    let mut log = Vec::new();
    let bounds = vec![(config.bounds.lower, config.bounds.upper); boreholes.len()];
    let solution = sqp::minimize(&mut problem, &x0, &bounds, &config.sqp, |it| {
        let line = format!(
            "iter {:>3}: load={:.2} W/m, max ΔT_env={:.2} K, max ΔT_neigh={:.2} K",
            it.iter,
            -it.objective,
            environment_limit - it.constraints[0],
            neighbor_limit - it.constraints[1],
        );
        info!("{line}");
        log.push(line);
    })?;

    let environment_margin = solution.constraints[0];
    let neighbor_margin = solution.constraints[1];
    let success = solution.status == Status::Converged
        && environment_margin >= -config.sqp.ftol
        && neighbor_margin >= -config.sqp.ftol;

    let result = OptimizationResult {
        success,
        status: solution.status,
        max_environment: TemperatureInterval::new::<delta_kelvin>(
            environment_limit - environment_margin,
        ),
        max_neighbor: TemperatureInterval::new::<delta_kelvin>(neighbor_limit - neighbor_margin),
        environment_margin: TemperatureInterval::new::<delta_kelvin>(environment_margin),
        neighbor_margin: TemperatureInterval::new::<delta_kelvin>(neighbor_margin),
        iterations: solution.iters,
        evaluations: problem.evaluations(),
        log,
        rates: solution.x,
    };

    if result.success {
        info!(
            "optimization converged after {} iterations: total {:.2} W/m",
            result.iterations,
            result.total_rate()
        );
    } else {
        warn!(
            "optimization did not succeed ({:?}) after {} iterations: margins {:.3} K / {:.3} K",
            result.status, result.iterations, environment_margin, neighbor_margin,
        );
    }

    Ok(result)
}

fn initial_rates(count: usize, config: &OptimizeConfig) -> Result<Vec<f64>, OptimizeError> {
    let Some(rates) = &config.initial_rates else {
        return Ok(vec![config.bounds.clip(DEFAULT_INITIAL_RATE); count]);
    };

    if rates.len() != count {
        return Err(OptimizeError::InitialRates(EvaluateError::RateCount {
            expected: count,
            actual: rates.len(),
        }));
    }
    if let Some((index, &value)) = rates.iter().enumerate().find(|(_, q)| !q.is_finite()) {
        return Err(OptimizeError::InitialRates(EvaluateError::NonFiniteRate {
            index,
            value,
        }));
    }
    Ok(rates.iter().map(|&q| config.bounds.clip(q)).collect())
}
