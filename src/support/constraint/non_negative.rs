use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing that a value is non-negative (zero or greater).
///
/// A groundwater seepage velocity of zero is valid (pure conduction), so
/// velocities use this constraint rather than [`StrictlyPositive`].
///
/// [`StrictlyPositive`]: super::StrictlyPositive
///
/// # Examples
///
/// ```
/// use borefield_models::support::constraint::NonNegative;
///
/// assert!(NonNegative::new(0.0).is_ok());
/// assert!(NonNegative::new(1e-7).is_ok());
/// assert!(NonNegative::new(-1e-7).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs a [`Constrained<T, NonNegative>`] if the value is non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or not a number (`NaN`).
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::<T, NonNegative>::new(value)
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{f64::Velocity, velocity::meter_per_second};

    #[test]
    fn velocities() {
        let still = Velocity::new::<meter_per_second>(0.0);
        assert!(NonNegative::new(still).is_ok());

        let seepage = Velocity::new::<meter_per_second>(1e-7);
        assert_eq!(NonNegative::new(seepage).unwrap().into_inner(), seepage);

        let reversed = Velocity::new::<meter_per_second>(-1e-7);
        assert_eq!(NonNegative::new(reversed), Err(ConstraintError::Negative));
    }

    #[test]
    fn nan_is_rejected() {
        assert_eq!(NonNegative::new(f64::NAN), Err(ConstraintError::NotANumber));
    }
}
