use thiserror::Error;

use crate::{
    models::geothermal::borefield::core::GeometryError,
    support::{constraint::ConstraintError, sqp::SqpError},
};

use super::DepthProfile;

/// Errors from evaluating field impacts for a rate vector.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EvaluateError {
    /// The rate vector does not have one entry per borehole.
    #[error("expected {expected} rates, got {actual}")]
    RateCount { expected: usize, actual: usize },

    /// A rate is NaN or infinite.
    #[error("rate {index} is not finite: {value}")]
    NonFiniteRate { index: usize, value: f64 },
}

/// Errors that prevent an optimization from running.
///
/// Failing to find a feasible optimum is not an error; see
/// [`OptimizationResult::success`](super::OptimizationResult::success).
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("no boreholes to optimize")]
    NoBoreholes,

    /// Two boreholes share a location.
    #[error("invalid borehole layout")]
    Geometry(#[from] GeometryError),

    #[error("invalid rate bounds [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("invalid depth profile {profile:?}: {reason}")]
    InvalidDepths {
        profile: DepthProfile,
        reason: &'static str,
    },

    #[error("invalid optimizer configuration `{name}`")]
    InvalidConfig {
        name: &'static str,
        #[source]
        source: ConstraintError,
    },

    /// Rates up to `magnitude` W/m cannot be keyed at `decimals` places.
    #[error("cache_decimals {decimals} is too fine for rates up to {magnitude} W/m")]
    CacheDecimals { decimals: u32, magnitude: f64 },

    #[error("invalid initial rates")]
    InitialRates(#[source] EvaluateError),

    #[error("solver failed")]
    Solver(#[from] SqpError<EvaluateError>),
}

impl OptimizeError {
    pub(super) fn invalid(name: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::InvalidConfig { name, source }
    }
}
