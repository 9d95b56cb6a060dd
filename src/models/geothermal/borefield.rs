//! Borehole heat exchanger field models.
//!
//! [`BoreField`] ties a borehole layout to its ground and exposes the field
//! workflows: the temperature-change map at a section depth, the per-borehole
//! impact summary, and the search for maximum sustainable extraction rates.
//! [`FieldImpactModel`] is the [`twine_core::Model`] the optimizer evaluates
//! its constraints with. [`random_layout`] draws reproducible layouts with a
//! minimum spacing. The computational core is in the internal `core` module.
//!
//! # Example
//!
//! ```
//! use borefield_models::models::geothermal::borefield::{
//!     BoreField, Borehole, FieldConfig, Ground, GroundProperties, OptimizeConfig,
//! };
//! use uom::si::{f64::Velocity, velocity::meter_per_second};
//!
//! let boreholes = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]
//!     .into_iter()
//!     .map(|(x, y)| Borehole::new(x, y, 80.0, 10.0))
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! let ground = Ground::new(&GroundProperties {
//!     seepage_velocity: Velocity::new::<meter_per_second>(0.0),
//!     ..GroundProperties::default()
//! })
//! .unwrap();
//! let field = BoreField::new(boreholes, ground);
//!
//! let map = field.temperature_field(&FieldConfig::default()).unwrap();
//! assert!(map.values.iter().all(|t| *t > 0.0));
//!
//! let result = field.optimize(&OptimizeConfig::default()).unwrap();
//! assert!(result.success);
//! assert!(result.rates.iter().all(|q| (5.0..=50.0).contains(q)));
//! ```

mod core;

pub use self::core::{
    Borehole, BoreholeError, BoreholeImpact, ClosestPair, CompareError, ConstraintCache,
    DEFAULT_INITIAL_RATE, DepthProfile, DifferenceMax, EXPONENT_CLIP, EvaluateError,
    ExtendedGrid, FieldConfig, FieldDifference, FieldError, FieldImpact, FieldImpactModel,
    FieldMap, FieldSummary, GeometryError, Ground, GroundProperties, ImpactLimits,
    IntegralTable, LayoutConfig, LayoutError, LimitCheck, LoadComparison,
    NEIGHBOR_MARKER_TOLERANCE, NodeMap, OptimizationResult, OptimizeConfig, OptimizeError,
    RateBounds, RateKey, SelfIntegrals, WATER_VOLUMETRIC_HEAT_CAPACITY, assign_sources_to_nearest_nodes, ensure_distinct,
    evaluate_on_grid, find_closest_pair, neighbor_temperature_change, optimize_heat_load,
    random_layout, self_temperature_change, summarize, temperature_field, temperature_grid,
};

/// A borehole layout in a given ground.
#[derive(Debug, Clone, PartialEq)]
pub struct BoreField {
    boreholes: Vec<Borehole>,
    ground: Ground,
}

impl BoreField {
    #[must_use]
    pub fn new(boreholes: Vec<Borehole>, ground: Ground) -> Self {
        Self { boreholes, ground }
    }

    #[must_use]
    pub fn boreholes(&self) -> &[Borehole] {
        &self.boreholes
    }

    #[must_use]
    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    /// The same field with every rate replaced, e.g. by optimized rates.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] if `rates` does not hold one finite rate
    /// per borehole.
    pub fn with_rates(&self, rates: &[f64]) -> Result<Self, EvaluateError> {
        if rates.len() != self.boreholes.len() {
            return Err(EvaluateError::RateCount {
                expected: self.boreholes.len(),
                actual: rates.len(),
            });
        }
        if let Some((index, &value)) = rates.iter().enumerate().find(|(_, q)| !q.is_finite()) {
            return Err(EvaluateError::NonFiniteRate { index, value });
        }

        let boreholes = self
            .boreholes
            .iter()
            .zip(rates)
            .map(|(b, &q)| b.with_rate(q))
            .collect();
        Ok(Self::new(boreholes, self.ground))
    }

    /// Temperature-change map on a grid derived from the layout.
    ///
    /// # Errors
    ///
    /// See [`temperature_field`].
    pub fn temperature_field(&self, config: &FieldConfig) -> Result<FieldMap, FieldError> {
        temperature_field(&self.boreholes, &self.ground, config)
    }

    /// Temperature-change map on an existing grid.
    ///
    /// # Errors
    ///
    /// See [`evaluate_on_grid`].
    pub fn temperature_field_on(
        &self,
        grid: ExtendedGrid,
        config: &FieldConfig,
    ) -> Result<FieldMap, FieldError> {
        evaluate_on_grid(&self.boreholes, &self.ground, grid, config)
    }

    /// Per-borehole impacts at `depth`, without building a grid.
    ///
    /// # Errors
    ///
    /// See [`summarize`].
    pub fn summary(&self, depth: f64, radius: f64) -> Result<FieldSummary, FieldError> {
        summarize(&self.boreholes, &self.ground, depth, radius)
    }

    /// Constraint model the optimizer evaluates.
    #[must_use]
    pub fn impact_model(
        &self,
        depths: &[f64],
        radius: f64,
        cutoff: Option<f64>,
    ) -> FieldImpactModel<'_> {
        FieldImpactModel::new(&self.boreholes, &self.ground, depths, radius, cutoff)
    }

    /// Maximum sustainable rates.
    ///
    /// # Errors
    ///
    /// See [`optimize_heat_load`].
    pub fn optimize(&self, config: &OptimizeConfig) -> Result<OptimizationResult, OptimizeError> {
        optimize_heat_load(&self.boreholes, &self.ground, config)
    }

    /// Compares this field's rates with `optimized` rates.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluateError`] if `optimized` has the wrong length.
    pub fn compare_load(&self, optimized: &[f64]) -> Result<LoadComparison, EvaluateError> {
        LoadComparison::new(&self.boreholes, optimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use twine_core::Model;
    use uom::si::{
        f64::Velocity, temperature_interval::kelvin as delta_kelvin, velocity::meter_per_second,
    };

    fn field() -> BoreField {
        let boreholes = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]
            .into_iter()
            .map(|(x, y)| Borehole::new(x, y, 80.0, 10.0).unwrap())
            .collect();
        let ground = Ground::new(&GroundProperties {
            seepage_velocity: Velocity::new::<meter_per_second>(0.0),
            ..GroundProperties::default()
        })
        .unwrap();
        BoreField::new(boreholes, ground)
    }

    #[test]
    fn summary_matches_field_map() {
        let field = field();
        let config = FieldConfig::default();
        let map = field.temperature_field(&config).unwrap();
        let summary = field
            .summary(config.depth, config.regularization_radius)
            .unwrap();

        assert_eq!(map.summary, summary);
        assert_eq!(map.depth, 30.0);
        assert_eq!(summary.min_rate, 10.0);
    }

    #[test]
    fn optimized_field_on_the_same_grid() {
        let field = field();
        let config = FieldConfig::default();
        let before = field.temperature_field(&config).unwrap();

        let result = field.optimize(&OptimizeConfig::default()).unwrap();
        assert!(result.success);

        let optimized = field.with_rates(&result.rates).unwrap();
        let after = optimized
            .temperature_field_on(before.grid.clone(), &config)
            .unwrap();
        assert_eq!(after.grid, before.grid);

        // The neighbor limit binds and rates drop below 10 W/m at the ends.
        let comparison = field.compare_load(&result.rates).unwrap();
        assert_relative_eq!(comparison.optimized_rate, result.total_rate());
        assert!(after.summary.max_neighbor < before.summary.max_neighbor);

        let sources: Vec<_> = field.boreholes().iter().map(|b| (b.x(), b.y())).collect();
        let diff = FieldDifference::between(&before, &after, &sources, 0.0).unwrap();
        assert!(diff.max.unwrap().value > 0.0);
    }

    #[test]
    fn impact_model_is_a_model() {
        let field = field();
        let model = field.impact_model(&[10.0, 40.0, 70.0], 0.1, None);
        let impact = model.call(&vec![10.0; 3]).unwrap();

        // The field summary at the same depth cannot exceed the profile maximum.
        let summary = field.summary(40.0, 0.1).unwrap();
        assert!(impact.max_total >= summary.max_ground.get::<delta_kelvin>());
        assert!(impact.max_neighbor >= summary.max_neighbor.get::<delta_kelvin>());
    }

    #[test]
    fn coincident_boreholes_are_rejected_everywhere() {
        let field = field();
        let mut boreholes = field.boreholes().to_vec();
        boreholes.push(boreholes[0].with_rate(12.0));
        let stacked = BoreField::new(boreholes, *field.ground());
        let coincident = GeometryError::Coincident {
            first: 0,
            second: 3,
        };

        assert!(matches!(
            stacked.temperature_field(&FieldConfig::default()),
            Err(FieldError::Geometry(err)) if err == coincident
        ));
        assert!(matches!(
            stacked.summary(30.0, 0.1),
            Err(FieldError::Geometry(err)) if err == coincident
        ));
        assert!(matches!(
            stacked.optimize(&OptimizeConfig::default()),
            Err(OptimizeError::Geometry(err)) if err == coincident
        ));
    }

    #[test]
    fn with_rates_validates() {
        let field = field();
        assert!(matches!(
            field.with_rates(&[1.0]),
            Err(EvaluateError::RateCount { .. })
        ));
        assert!(matches!(
            field.with_rates(&[1.0, f64::INFINITY, 1.0]),
            Err(EvaluateError::NonFiniteRate { index: 1, .. })
        ));
        let scaled = field.with_rates(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(scaled.boreholes()[2].rate(), 3.0);
        assert_eq!(scaled.boreholes()[2].x(), 20.0);
    }
}
