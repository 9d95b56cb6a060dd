use thiserror::Error;

/// Errors from building an evaluation grid over a borehole field.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// A closest pair needs at least two boreholes.
    #[error("at least 2 boreholes are required, got {count}")]
    TooFewBoreholes { count: usize },

    /// Two boreholes share a location, so no grid spacing can separate them.
    #[error("boreholes {first} and {second} coincide")]
    Coincident { first: usize, second: usize },

    /// The spacing is too fine for the field extent.
    #[error("grid spacing {spacing} m is too small for the field extent")]
    TooManyNodes { spacing: f64 },
}
