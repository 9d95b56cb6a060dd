use thiserror::Error;

/// Errors that prevent [`minimize`](super::minimize) from running.
///
/// Failing to converge is not an error; it is reported through
/// [`Status`](super::Status) on the returned solution.
#[derive(Debug, Error)]
pub enum SqpError<E: std::error::Error + 'static> {
    /// The objective or constraint evaluation failed.
    #[error("problem evaluation failed")]
    Problem(#[source] E),

    /// The decision vector is empty.
    #[error("decision vector must not be empty")]
    EmptyProblem,

    /// The number of bounds does not match the decision vector.
    #[error("expected {expected} bounds, got {actual}")]
    BoundsLength { expected: usize, actual: usize },

    /// A lower bound exceeds its upper bound, or a bound is not finite.
    #[error("invalid bounds for variable {index}: [{lower}, {upper}]")]
    InvalidBounds {
        index: usize,
        lower: f64,
        upper: f64,
    },

    /// The problem returned a different number of constraints than before.
    #[error("constraint count changed from {expected} to {actual}")]
    ConstraintCount { expected: usize, actual: usize },

    /// A solver control is out of range.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(&'static str),
}
