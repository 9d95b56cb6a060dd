use thiserror::Error;

use crate::support::constraint::{Constrained, ConstraintError, StrictlyPositive};

/// A vertical borehole heat exchanger.
///
/// Coordinates are planar positions in metres in a consistent projection.
/// The rate is the heat extraction per metre of borehole (W/m), positive for
/// extraction. Location and length are fixed for the lifetime of a value;
/// the rate can be replaced with [`Borehole::with_rate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Borehole {
    x: f64,
    y: f64,
    length: f64,
    rate: f64,
}

/// Errors from constructing a [`Borehole`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoreholeError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("borehole length is invalid")]
    Length(#[from] ConstraintError),
}

impl Borehole {
    /// Constructs a validated borehole.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate or the rate is not finite, or if the
    /// length is not strictly positive.
    pub fn new(x: f64, y: f64, length: f64, rate: f64) -> Result<Self, BoreholeError> {
        for (field, value) in [("x", x), ("y", y), ("rate", rate), ("length", length)] {
            if !value.is_finite() {
                return Err(BoreholeError::NonFinite { field, value });
            }
        }
        let length = Constrained::<f64, StrictlyPositive>::new(length)?;
        Ok(Self::from_constrained(x, y, length, rate))
    }

    /// Constructs a borehole from a pre-validated length.
    #[must_use]
    pub fn from_constrained(
        x: f64,
        y: f64,
        length: Constrained<f64, StrictlyPositive>,
        rate: f64,
    ) -> Self {
        Self {
            x,
            y,
            length: length.into_inner(),
            rate,
        }
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Borehole length in metres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Heat extraction rate in W/m.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns a copy of this borehole with a different heat extraction rate.
    #[must_use]
    pub fn with_rate(self, rate: f64) -> Self {
        Self { rate, ..self }
    }

    /// Planar distance to another borehole.
    #[must_use]
    pub fn distance_to(&self, other: &Borehole) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
