//! Thermal superposition over a field of borehole heat exchangers.
//!
//! Each borehole is a finite line source with a mirror image above the
//! ground surface, optionally moving with uniform groundwater flow. Field
//! temperature changes are superposed from a closed-form self-term at each
//! source and a numerically integrated neighbor term everywhere else. On top
//! of the field evaluation, [`optimize_heat_load`] searches for the largest
//! extraction rates that keep every borehole within its temperature limits.

mod borehole;
mod compare;
mod field;
mod grid;
mod ground;
mod integrals;
mod kernel;
mod layout;
mod optimize;

#[cfg(test)]
mod test_support;

pub use borehole::{Borehole, BoreholeError};
pub use compare::{CompareError, DifferenceMax, FieldDifference};
pub use field::{
    BoreholeImpact, FieldConfig, FieldError, FieldMap, FieldSummary, LimitCheck,
    NEIGHBOR_MARKER_TOLERANCE, evaluate_on_grid, summarize, temperature_field, temperature_grid,
};
pub use grid::{
    ClosestPair, ExtendedGrid, GeometryError, NodeMap, assign_sources_to_nearest_nodes,
    ensure_distinct, find_closest_pair,
};
pub use ground::{Ground, GroundProperties, WATER_VOLUMETRIC_HEAT_CAPACITY};
pub use integrals::IntegralTable;
pub use kernel::{
    EXPONENT_CLIP, SelfIntegrals, neighbor_temperature_change, self_temperature_change,
};
pub use layout::{LayoutConfig, LayoutError, random_layout};
pub use optimize::{
    ConstraintCache, DEFAULT_INITIAL_RATE, DepthProfile, EvaluateError, FieldImpact,
    FieldImpactModel, ImpactLimits, LoadComparison, OptimizationResult, OptimizeConfig,
    OptimizeError, RateBounds, RateKey, optimize_heat_load,
};
