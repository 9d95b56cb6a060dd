use thiserror::Error;

use crate::support::constraint::ConstraintError;

/// Errors from comparing two temperature fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompareError {
    /// A field does not match the axes it is compared on.
    #[error("field shape {actual:?} does not match axes {expected:?}")]
    Shape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The two fields were evaluated on different grids.
    #[error("fields are defined on different grids")]
    GridMismatch,

    /// An axis has no coordinates.
    #[error("axes must not be empty")]
    EmptyAxis,

    /// The masking radius is negative or NaN.
    #[error("invalid masking radius")]
    Radius(#[from] ConstraintError),
}
