//! Evaluation grid and source snapping.
//!
//! The temperature field is sampled on a uniform grid covering the borehole
//! field plus a margin. Because the neighbor kernel is singular on a source
//! axis, every borehole is snapped to its nearest grid node, and nodes that
//! carry sources are evaluated with the regularized self-term instead.

mod error;

pub use error::GeometryError;

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::support::constraint::{Constrained, NonNegative, StrictlyPositive};

use super::Borehole;

/// Upper bound on grid nodes, guarding against a vanishing spacing.
const MAX_NODES: usize = 25_000_000;

/// The two closest boreholes in a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    pub first: usize,
    pub second: usize,

    /// Planar distance in metres.
    pub distance: f64,
}

/// Finds the pair of boreholes with the smallest planar distance.
///
/// Ties resolve to the lowest `(first, second)` index pair.
///
/// # Errors
///
/// Returns [`GeometryError::TooFewBoreholes`] for fewer than two boreholes
/// and [`GeometryError::Coincident`] if two boreholes share a location.
pub fn find_closest_pair(boreholes: &[Borehole]) -> Result<ClosestPair, GeometryError> {
    if boreholes.len() < 2 {
        return Err(GeometryError::TooFewBoreholes {
            count: boreholes.len(),
        });
    }

    let mut closest = ClosestPair {
        first: 0,
        second: 1,
        distance: f64::INFINITY,
    };
    for (i, a) in boreholes.iter().enumerate() {
        for (j, b) in boreholes.iter().enumerate().skip(i + 1) {
            let distance = a.distance_to(b);
            if distance < closest.distance {
                closest = ClosestPair {
                    first: i,
                    second: j,
                    distance,
                };
            }
        }
    }

    if closest.distance == 0.0 {
        return Err(GeometryError::Coincident {
            first: closest.first,
            second: closest.second,
        });
    }
    Ok(closest)
}

/// Checks that no two boreholes share a location.
///
/// Fields of zero or one borehole pass trivially.
///
/// # Errors
///
/// Returns [`GeometryError::Coincident`] for the first coincident pair.
pub fn ensure_distinct(boreholes: &[Borehole]) -> Result<(), GeometryError> {
    if boreholes.len() < 2 {
        return Ok(());
    }
    find_closest_pair(boreholes).map(|_| ())
}

/// Uniform grid spanning a borehole field plus a margin on every side.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedGrid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl ExtendedGrid {
    /// Builds a grid over the bounding box of `boreholes`.
    ///
    /// Each axis is widened by `margin` times its span on both sides, then
    /// sampled from the lower edge at `spacing` until the upper edge is
    /// reached or passed. A field that is a single point along an axis gets
    /// a single node on that axis.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if `boreholes` is empty or if the grid
    /// would exceed an internal node limit.
    pub fn new(
        boreholes: &[Borehole],
        spacing: Constrained<f64, StrictlyPositive>,
        margin: Constrained<f64, NonNegative>,
    ) -> Result<Self, GeometryError> {
        if boreholes.is_empty() {
            return Err(GeometryError::TooFewBoreholes { count: 0 });
        }
        let spacing = spacing.into_inner();
        let margin = margin.into_inner();

        let x = Axis::spanning(boreholes.iter().map(Borehole::x), spacing, margin);
        let y = Axis::spanning(boreholes.iter().map(Borehole::y), spacing, margin);

        match x.count.checked_mul(y.count) {
            Some(nodes) if nodes <= MAX_NODES => Ok(Self {
                x: x.coordinates(spacing),
                y: y.coordinates(spacing),
            }),
            _ => Err(GeometryError::TooManyNodes { spacing }),
        }
    }

    /// Grid coordinates along x (columns).
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Grid coordinates along y (rows).
    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Mesh shape as `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    /// Full coordinate meshes `(xx, yy)`, each of shape [`Self::shape`].
    #[must_use]
    pub fn mesh(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = self.shape();
        let xx = Array2::from_shape_fn(shape, |(_, j)| self.x[j]);
        let yy = Array2::from_shape_fn(shape, |(i, _)| self.y[i]);
        (xx, yy)
    }

    /// Index `(row, column)` of the node nearest to `(x, y)`.
    ///
    /// Offsets are rounded half-to-even and clamped into the grid, so points
    /// outside the grid snap to its edge.
    #[must_use]
    pub fn nearest_node(&self, x: f64, y: f64) -> (usize, usize) {
        (snap(&self.y, y), snap(&self.x, x))
    }
}

/// Maps grid nodes `(row, column)` to the boreholes snapped onto them.
pub type NodeMap = BTreeMap<(usize, usize), Vec<usize>>;

/// Snaps every borehole to its nearest grid node.
///
/// Every borehole index appears in exactly one list; several boreholes may
/// share a node.
#[must_use]
pub fn assign_sources_to_nearest_nodes(boreholes: &[Borehole], grid: &ExtendedGrid) -> NodeMap {
    let mut map = NodeMap::new();
    for (index, b) in boreholes.iter().enumerate() {
        map.entry(grid.nearest_node(b.x(), b.y()))
            .or_default()
            .push(index);
    }
    map
}

struct Axis {
    start: f64,
    count: usize,
}

impl Axis {
    fn spanning(values: impl Iterator<Item = f64> + Clone, spacing: f64, margin: f64) -> Self {
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        let pad = margin * (max - min);
        let (start, end) = (min - pad, max + pad);

        // The slack keeps an exact multiple of the spacing from adding a node.
        let steps = ((end - start) / spacing - 1e-9).ceil().max(0.0);
        Self {
            start,
            count: (steps as usize).saturating_add(1),
        }
    }

    fn coordinates(&self, spacing: f64) -> Vec<f64> {
        (0..self.count)
            .map(|k| self.start + k as f64 * spacing)
            .collect()
    }
}

fn snap(axis: &[f64], value: f64) -> usize {
    let step = if axis.len() > 1 { axis[1] - axis[0] } else { 1.0 };
    let offset = ((value - axis[0]) / step).round_ties_even();
    offset.clamp(0.0, (axis.len() - 1) as f64) as usize
}
