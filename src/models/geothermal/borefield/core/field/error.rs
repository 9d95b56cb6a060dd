use ndarray::ShapeError;
use thiserror::Error;

use crate::{
    models::geothermal::borefield::core::GeometryError, support::constraint::ConstraintError,
};

/// Errors from evaluating a temperature field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The borehole layout cannot be gridded.
    #[error("invalid field geometry")]
    Geometry(#[from] GeometryError),

    /// A field configuration value violates its constraint.
    #[error("invalid field configuration `{name}`")]
    InvalidConfig {
        name: &'static str,
        #[source]
        source: ConstraintError,
    },

    /// The observation depth is not finite.
    #[error("observation depth must be finite, got {0}")]
    NonFiniteDepth(f64),

    /// A node map refers to a borehole that does not exist.
    #[error("node map refers to borehole {index}, but the field has {count}")]
    UnknownBorehole { index: usize, count: usize },

    /// The evaluated values could not be arranged on the grid.
    #[error("grid shape mismatch")]
    Shape(#[from] ShapeError),
}

impl FieldError {
    pub(super) fn invalid(name: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::InvalidConfig { name, source }
    }
}
