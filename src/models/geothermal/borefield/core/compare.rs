//! Validation of a computed field against a reference field.
//!
//! Two fields on identical axes are differenced node by node. Nodes close to
//! a source are masked out, since both solutions are least reliable there and
//! any difference is dominated by how each regularizes the source axis.

mod error;

pub use error::CompareError;

use ndarray::Array2;

use crate::support::constraint::NonNegative;

use super::FieldMap;

/// Location and value of the largest unmasked difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferenceMax {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Absolute node-wise difference of two fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDifference {
    /// `|a − b|` at every node, NaN where masked.
    pub values: Array2<f64>,

    /// `None` if every node is masked.
    pub max: Option<DifferenceMax>,
}

impl FieldDifference {
    /// Differences two fields on shared uniform axes.
    ///
    /// A square of `⌈radius / Δx⌉` nodes on each side of the node nearest to
    /// every source point is masked. Masks are clipped at the grid edges;
    /// sources outside the grid mask nothing beyond it.
    ///
    /// # Errors
    ///
    /// Returns a [`CompareError`] if a field does not match the axes, an axis
    /// is empty, or the radius is negative.
    pub fn new(
        x: &[f64],
        y: &[f64],
        a: &Array2<f64>,
        b: &Array2<f64>,
        sources: &[(f64, f64)],
        radius: f64,
    ) -> Result<Self, CompareError> {
        if x.is_empty() || y.is_empty() {
            return Err(CompareError::EmptyAxis);
        }
        let expected = (y.len(), x.len());
        for field in [a, b] {
            if field.dim() != expected {
                return Err(CompareError::Shape {
                    expected,
                    actual: field.dim(),
                });
            }
        }
        let radius = NonNegative::new(radius)?.into_inner();

        let mut values = (a - b).mapv(f64::abs);

        let dx = step(x);
        let dy = step(y);
        // A mask never needs to reach further than the longer axis.
        let reach = (radius / dx).ceil().min(x.len().max(y.len()) as f64) as isize;
        for &(sx, sy) in sources {
            let j0 = ((sx - x[0]) / dx).round_ties_even() as isize;
            let i0 = ((sy - y[0]) / dy).round_ties_even() as isize;
            let rows = clip_range(i0, reach, y.len());
            let cols = clip_range(j0, reach, x.len());
            for i in rows {
                for j in cols.clone() {
                    values[[i, j]] = f64::NAN;
                }
            }
        }

        let max = values
            .indexed_iter()
            .filter(|(_, v)| !v.is_nan())
            .fold(None, |best: Option<DifferenceMax>, ((row, col), &value)| {
                match best {
                    Some(best) if best.value >= value => Some(best),
                    _ => Some(DifferenceMax {
                        row,
                        col,
                        x: x[col],
                        y: y[row],
                        value,
                    }),
                }
            });

        Ok(Self { values, max })
    }

    /// Differences two field maps evaluated on the same grid.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::GridMismatch`] if the grids differ, or any
    /// error from [`FieldDifference::new`].
    pub fn between(
        a: &FieldMap,
        b: &FieldMap,
        sources: &[(f64, f64)],
        radius: f64,
    ) -> Result<Self, CompareError> {
        if a.grid != b.grid {
            return Err(CompareError::GridMismatch);
        }
        Self::new(a.grid.x(), a.grid.y(), &a.values, &b.values, sources, radius)
    }
}

fn step(axis: &[f64]) -> f64 {
    if axis.len() > 1 { axis[1] - axis[0] } else { 1.0 }
}

/// Indices within `reach` of `center`, clipped to `0..len`.
fn clip_range(center: isize, reach: isize, len: usize) -> std::ops::Range<usize> {
    let len = isize::try_from(len).unwrap_or(isize::MAX);
    let start = center.saturating_sub(reach).clamp(0, len) as usize;
    let end = center.saturating_add(reach).saturating_add(1).clamp(0, len) as usize;
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::Array1;

    use crate::models::geothermal::borefield::core::{
        FieldConfig, temperature_field,
        test_support::{row_of_three, still_ground},
    };

    fn axes() -> (Vec<f64>, Vec<f64>) {
        let x = Array1::linspace(-5.0, 5.0, 11).to_vec();
        let y = Array1::linspace(0.0, 4.0, 5).to_vec();
        (x, y)
    }

    #[test]
    fn masks_around_sources() {
        let (x, y) = axes();
        let a = Array2::from_shape_fn((5, 11), |(i, j)| (i * 11 + j) as f64);
        let b = Array2::zeros((5, 11));

        let diff = FieldDifference::new(&x, &y, &a, &b, &[(4.9, 3.8)], 0.5).unwrap();

        // One node on each side of (row 4, col 10), clipped at the edges.
        let masked: Vec<_> = diff
            .values
            .indexed_iter()
            .filter(|(_, v)| v.is_nan())
            .map(|(node, _)| node)
            .collect();
        assert_eq!(masked, vec![(3, 9), (3, 10), (4, 9), (4, 10)]);

        let max = diff.max.unwrap();
        assert_eq!((max.row, max.col), (4, 8));
        assert_relative_eq!(max.x, 3.0);
        assert_relative_eq!(max.y, 4.0);
        assert_relative_eq!(max.value, 52.0);
    }

    #[test]
    fn difference_is_absolute() {
        let (x, y) = axes();
        let a = Array2::from_elem((5, 11), 1.0);
        let mut b = Array2::from_elem((5, 11), 1.0);
        b[[2, 3]] = 1.75;

        let diff = FieldDifference::new(&x, &y, &a, &b, &[], 0.2).unwrap();
        let max = diff.max.unwrap();
        assert_eq!((max.row, max.col), (2, 3));
        assert_relative_eq!(max.value, 0.75);
        assert!(diff.values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn sources_outside_mask_nothing() {
        let (x, y) = axes();
        let a = Array2::from_elem((5, 11), 2.0);
        let b = Array2::zeros((5, 11));

        let diff = FieldDifference::new(&x, &y, &a, &b, &[(40.0, -30.0)], 1.0).unwrap();
        assert!(diff.values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn fully_masked_has_no_max() {
        let x = vec![0.0, 1.0];
        let y = vec![0.0];
        let a = Array2::from_elem((1, 2), 3.0);
        let b = Array2::zeros((1, 2));

        let diff = FieldDifference::new(&x, &y, &a, &b, &[(0.0, 0.0)], 1.0).unwrap();
        assert!(diff.max.is_none());
    }

    #[test]
    fn extreme_radius_and_sources_stay_in_range() {
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![0.0, 1.0];
        let a = Array2::from_elem((2, 3), 3.0);
        let b = Array2::zeros((2, 3));

        let diff = FieldDifference::new(&x, &y, &a, &b, &[(1.0, 0.0)], 1e300).unwrap();
        assert!(diff.values.iter().all(|v| v.is_nan()));
        assert!(diff.max.is_none());

        let far = [(1e300, -1e300), (-1e300, 1e300)];
        let diff = FieldDifference::new(&x, &y, &a, &b, &far, 1.0).unwrap();
        assert!(diff.values.iter().all(|v| !v.is_nan()));
        assert_eq!(diff.max.map(|m| m.value), Some(3.0));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let (x, y) = axes();
        let a = Array2::zeros((5, 11));
        let b = Array2::zeros((11, 5));

        assert_eq!(
            FieldDifference::new(&x, &y, &a, &b, &[], 0.2),
            Err(CompareError::Shape {
                expected: (5, 11),
                actual: (11, 5)
            })
        );
        assert!(matches!(
            FieldDifference::new(&x, &y, &a, &a, &[], -1.0),
            Err(CompareError::Radius(_))
        ));
        assert_eq!(
            FieldDifference::new(&[], &y, &a, &a, &[], 0.2),
            Err(CompareError::EmptyAxis)
        );
    }

    #[test]
    fn identical_fields_differ_by_nothing() {
        let ground = still_ground();
        let boreholes = row_of_three();
        let map = temperature_field(&boreholes, &ground, &FieldConfig::default()).unwrap();

        let sources: Vec<_> = boreholes.iter().map(|b| (b.x(), b.y())).collect();
        let diff = FieldDifference::between(&map, &map, &sources, 0.0).unwrap();
        assert_eq!(diff.max.map(|m| m.value), Some(0.0));
    }
}
