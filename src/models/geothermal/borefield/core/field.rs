//! Temperature-change field over an evaluation grid.

mod error;
mod summary;

pub use error::FieldError;
pub use summary::{BoreholeImpact, FieldSummary, LimitCheck, NEIGHBOR_MARKER_TOLERANCE};

use log::debug;
use ndarray::Array2;
use rayon::prelude::*;

use crate::support::constraint::{NonNegative, StrictlyPositive};

use super::{
    Borehole, ExtendedGrid, Ground, IntegralTable, NodeMap, assign_sources_to_nearest_nodes,
    ensure_distinct, find_closest_pair, neighbor_temperature_change, self_temperature_change,
};

/// Configuration for [`temperature_field`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    /// Grid nodes per closest borehole distance.
    ///
    /// The grid spacing is the closest pair distance divided by this factor.
    pub density: f64,

    /// Observation (section) depth in metres.
    pub depth: f64,

    /// Fraction of the field span added as margin on each side.
    pub margin: f64,

    /// Distance from a source axis at which the self-term is evaluated, in metres.
    pub regularization_radius: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            density: 2.0,
            depth: 30.0,
            margin: 0.1,
            regularization_radius: 0.1,
        }
    }
}

/// A temperature-change field at one depth, with its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    pub grid: ExtendedGrid,

    /// Temperature change (K) at every node, shaped `(rows, columns)`.
    pub values: Array2<f64>,

    /// Observation depth in metres.
    pub depth: f64,

    pub summary: FieldSummary,
}

/// Evaluates the temperature-change field of a borehole field.
///
/// Builds a grid at spacing `closest distance / density`, snaps every
/// borehole to its nearest node, evaluates each node, and summarizes the
/// impacts at each borehole location.
///
/// # Errors
///
/// Returns a [`FieldError`] if the configuration is invalid or the layout
/// cannot be gridded (fewer than two boreholes, or coincident boreholes).
pub fn temperature_field(
    boreholes: &[Borehole],
    ground: &Ground,
    config: &FieldConfig,
) -> Result<FieldMap, FieldError> {
    let density = StrictlyPositive::new(config.density).map_err(FieldError::invalid("density"))?;
    let margin = NonNegative::new(config.margin).map_err(FieldError::invalid("margin"))?;

    let closest = find_closest_pair(boreholes)?;
    let spacing = StrictlyPositive::new(closest.distance / density.into_inner())
        .map_err(FieldError::invalid("density"))?;
    let grid = ExtendedGrid::new(boreholes, spacing, margin)?;

    evaluate_on_grid(boreholes, ground, grid, config)
}

/// Evaluates the temperature-change field on a caller-supplied grid.
///
/// Use this to compare two loadings of the same field on identical axes.
///
/// # Errors
///
/// Returns a [`FieldError`] if two boreholes coincide or the depth or
/// regularization radius is invalid.
pub fn evaluate_on_grid(
    boreholes: &[Borehole],
    ground: &Ground,
    grid: ExtendedGrid,
    config: &FieldConfig,
) -> Result<FieldMap, FieldError> {
    let radius = validate_section(boreholes, config.depth, config.regularization_radius)?;

    let integrals = IntegralTable::new(boreholes, &[config.depth], radius);
    let node_map = assign_sources_to_nearest_nodes(boreholes, &grid);
    let values = temperature_grid(boreholes, ground, &grid, &node_map, &integrals)?;
    let summary = FieldSummary::evaluate(boreholes, ground, &integrals);

    Ok(FieldMap {
        grid,
        values,
        depth: config.depth,
        summary,
    })
}

/// Per-borehole impacts at `depth` without building a grid.
///
/// # Errors
///
/// Returns a [`FieldError`] if two boreholes coincide, `depth` is not finite
/// or `radius` is not strictly positive.
pub fn summarize(
    boreholes: &[Borehole],
    ground: &Ground,
    depth: f64,
    radius: f64,
) -> Result<FieldSummary, FieldError> {
    let radius = validate_section(boreholes, depth, radius)?;
    let integrals = IntegralTable::new(boreholes, &[depth], radius);
    Ok(FieldSummary::evaluate(boreholes, ground, &integrals))
}

/// Checks the inputs shared by every single-depth evaluation and returns the
/// validated regularization radius.
fn validate_section(boreholes: &[Borehole], depth: f64, radius: f64) -> Result<f64, FieldError> {
    ensure_distinct(boreholes)?;
    if !depth.is_finite() {
        return Err(FieldError::NonFiniteDepth(depth));
    }
    Ok(StrictlyPositive::new(radius)
        .map_err(FieldError::invalid("regularization_radius"))?
        .into_inner())
}

/// Temperature change at every grid node, at the first depth of `integrals`.
///
/// A node carrying snapped boreholes takes the sum of their self-terms plus
/// the neighbor term of every other borehole. Any other node takes the
/// neighbor term of all boreholes.
///
/// # Errors
///
/// Returns a [`FieldError`] if `node_map` names an unknown borehole.
///
/// # Panics
///
/// Panics if `integrals` holds no depth.
pub fn temperature_grid(
    boreholes: &[Borehole],
    ground: &Ground,
    grid: &ExtendedGrid,
    node_map: &NodeMap,
    integrals: &IntegralTable,
) -> Result<Array2<f64>, FieldError> {
    if let Some(&index) = node_map.values().flatten().find(|&&i| i >= boreholes.len()) {
        return Err(FieldError::UnknownBorehole {
            index,
            count: boreholes.len(),
        });
    }
    let depth = [integrals.depths()[0]];
    let (rows, cols) = grid.shape();
    debug!(
        "evaluating {rows}x{cols} grid over {} boreholes at z = {} m",
        boreholes.len(),
        depth[0]
    );

    let data: Vec<f64> = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (i, j) = (idx / cols, idx % cols);
            let (x, y) = (grid.x()[j], grid.y()[i]);

            match node_map.get(&(i, j)) {
                Some(snapped) => {
                    let own: f64 = snapped
                        .iter()
                        .map(|&s| {
                            let integral = integrals.get(s, 0);
                            self_temperature_change(boreholes[s].rate(), &integral, ground)
                        })
                        .sum();
                    let others: Vec<Borehole> = boreholes
                        .iter()
                        .enumerate()
                        .filter(|(k, _)| !snapped.contains(k))
                        .map(|(_, b)| *b)
                        .collect();
                    own + neighbor_temperature_change(x, y, &depth, &others, ground)[0]
                }
                None => neighbor_temperature_change(x, y, &depth, boreholes, ground)[0],
            }
        })
        .collect();

    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::geothermal::borefield::core::{
        GeometryError, SelfIntegrals,
        test_support::{borehole, default_ground, row_of_three, still_ground},
    };

    #[test]
    fn snapped_nodes_use_self_term() {
        let ground = still_ground();
        let boreholes = row_of_three();
        let map = temperature_field(&boreholes, &ground, &FieldConfig::default()).unwrap();

        // Spacing 5 m and margin 2 m: x = -2, 3, ..., 23 and y = 0.
        assert_eq!(map.grid.shape(), (1, 6));
        let node_map = assign_sources_to_nearest_nodes(&boreholes, &map.grid);
        assert_eq!(node_map[&(0, 0)], vec![0]);
        assert_eq!(node_map[&(0, 2)], vec![1]);
        assert_eq!(node_map[&(0, 4)], vec![2]);

        // The centre node sits 2 m from the middle borehole.
        let self_term = self_temperature_change(
            boreholes[1].rate(),
            &SelfIntegrals::new(80.0, 30.0, 0.1),
            &ground,
        );
        let others = [boreholes[0], boreholes[2]];
        let neighbors = neighbor_temperature_change(8.0, 0.0, &[30.0], &others, &ground)[0];
        assert_relative_eq!(map.values[[0, 2]], self_term + neighbors, max_relative = 1e-12);

        // Open nodes see every borehole as a neighbor.
        let open = neighbor_temperature_change(3.0, 0.0, &[30.0], &boreholes, &ground)[0];
        assert_relative_eq!(map.values[[0, 1]], open, max_relative = 1e-12);
    }

    #[test]
    fn source_nodes_are_the_warmest() {
        let ground = still_ground();
        let boreholes = [
            borehole(0.0, 0.0, 20.0),
            borehole(30.0, 0.0, 20.0),
            borehole(0.0, 30.0, 20.0),
            borehole(30.0, 30.0, 20.0),
        ];
        let config = FieldConfig {
            density: 3.0,
            ..FieldConfig::default()
        };
        let map = temperature_field(&boreholes, &ground, &config).unwrap();

        let node_map = assign_sources_to_nearest_nodes(&boreholes, &map.grid);
        let hottest_source = node_map
            .keys()
            .map(|&(i, j)| map.values[[i, j]])
            .fold(f64::NEG_INFINITY, f64::max);
        let hottest_open = map
            .values
            .indexed_iter()
            .filter(|(node, _)| !node_map.contains_key(node))
            .map(|(_, &v)| v)
            .fold(f64::NEG_INFINITY, f64::max);

        assert!(hottest_source > hottest_open);
        assert!(map.values.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn field_is_linear_in_rate() {
        let ground = default_ground();
        let boreholes = row_of_three();
        let doubled: Vec<_> = boreholes.iter().map(|b| b.with_rate(2.0 * b.rate())).collect();

        let base = temperature_field(&boreholes, &ground, &FieldConfig::default()).unwrap();
        let more = temperature_field(&doubled, &ground, &FieldConfig::default()).unwrap();

        for (b, m) in base.values.iter().zip(more.values.iter()) {
            assert_relative_eq!(*m, 2.0 * b, max_relative = 1e-12);
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        let ground = still_ground();
        let boreholes = row_of_three();

        let config = FieldConfig {
            density: 0.0,
            ..FieldConfig::default()
        };
        assert!(matches!(
            temperature_field(&boreholes, &ground, &config),
            Err(FieldError::InvalidConfig { name: "density", .. })
        ));

        let config = FieldConfig {
            depth: f64::NAN,
            ..FieldConfig::default()
        };
        assert!(matches!(
            temperature_field(&boreholes, &ground, &config),
            Err(FieldError::NonFiniteDepth(_))
        ));

        assert!(matches!(
            temperature_field(&boreholes[..1], &ground, &FieldConfig::default()),
            Err(FieldError::Geometry(GeometryError::TooFewBoreholes { count: 1 }))
        ));
    }

    #[test]
    fn coincident_boreholes_on_a_fixed_grid() {
        let ground = still_ground();
        let boreholes = row_of_three();
        let grid = temperature_field(&boreholes, &ground, &FieldConfig::default())
            .unwrap()
            .grid;

        let stacked = [boreholes[0], boreholes[1], borehole(10.0, 0.0, 5.0)];
        assert!(matches!(
            evaluate_on_grid(&stacked, &ground, grid, &FieldConfig::default()),
            Err(FieldError::Geometry(GeometryError::Coincident {
                first: 1,
                second: 2
            }))
        ));
        assert!(matches!(
            summarize(&stacked, &ground, 30.0, 0.1),
            Err(FieldError::Geometry(GeometryError::Coincident { .. }))
        ));
        assert!(summarize(&boreholes[..1], &ground, 30.0, 0.1).is_ok());
        assert!(matches!(
            summarize(&boreholes, &ground, 30.0, 0.0),
            Err(FieldError::InvalidConfig {
                name: "regularization_radius",
                ..
            })
        ));
    }

    #[test]
    fn rejects_foreign_node_map() {
        let ground = still_ground();
        let boreholes = row_of_three();
        let grid = ExtendedGrid::new(
            &boreholes,
            StrictlyPositive::new(5.0).unwrap(),
            NonNegative::new(0.1).unwrap(),
        )
        .unwrap();
        let integrals = IntegralTable::new(&boreholes, &[30.0], 0.1);
        let mut node_map = assign_sources_to_nearest_nodes(&boreholes, &grid);
        node_map.entry((0, 1)).or_default().push(7);

        assert!(matches!(
            temperature_grid(&boreholes, &ground, &grid, &node_map, &integrals),
            Err(FieldError::UnknownBorehole { index: 7, count: 3 })
        ));
    }
}
