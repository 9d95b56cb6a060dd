//! Random borehole layouts with a minimum spacing.
//!
//! Candidate locations are drawn uniformly over a rectangular domain and
//! rejected when they fall closer than the minimum spacing to an accepted
//! borehole. Layouts are reproducible from their seed.
//!
//! ```
//! use borefield_models::models::geothermal::borefield::{LayoutConfig, random_layout};
//!
//! let config = LayoutConfig {
//!     count: 25,
//!     ..LayoutConfig::default()
//! };
//! let boreholes = random_layout(&config).unwrap();
//! assert_eq!(boreholes.len(), 25);
//! assert_eq!(boreholes, random_layout(&config).unwrap());
//! ```

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::support::constraint::{ConstraintError, NonNegative, StrictlyPositive};

use super::{Borehole, BoreholeError};

/// Layout generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Number of boreholes to place.
    pub count: usize,

    /// Domain extent along x, from 0, in metres.
    pub width: f64,

    /// Domain extent along y, from 0, in metres.
    pub height: f64,

    /// Minimum distance between any two boreholes in metres.
    pub min_spacing: f64,

    /// Length of every borehole in metres.
    pub length: f64,

    /// Initial extraction rate of every borehole in W/m.
    pub rate: f64,

    pub seed: u64,

    /// Candidate draws before giving up.
    pub max_tries: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            count: 200,
            width: 500.0,
            height: 500.0,
            min_spacing: 20.0,
            length: 80.0,
            rate: 10.0,
            seed: 42,
            max_tries: 1_000_000,
        }
    }
}

/// Errors from [`random_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid layout parameter `{name}`")]
    InvalidParameter {
        name: &'static str,
        #[source]
        source: ConstraintError,
    },

    /// A domain extent is infinite.
    #[error("layout parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("invalid borehole template")]
    Borehole(#[from] BoreholeError),

    /// The domain is too crowded to fit the requested count.
    #[error("placed {placed} of {requested} boreholes after {tries} tries")]
    Exhausted {
        placed: usize,
        requested: usize,
        tries: usize,
    },
}

/// Places `config.count` boreholes at random with at least `min_spacing` between them.
///
/// # Errors
///
/// Returns a [`LayoutError`] if a parameter is invalid or the boreholes do
/// not fit within `max_tries` draws.
pub fn random_layout(config: &LayoutConfig) -> Result<Vec<Borehole>, LayoutError> {
    let invalid = |name: &'static str| {
        move |source: ConstraintError| LayoutError::InvalidParameter { name, source }
    };
    let extent = |name: &'static str, value: f64| -> Result<f64, LayoutError> {
        let value = StrictlyPositive::new(value).map_err(invalid(name))?.into_inner();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(LayoutError::NonFinite { name, value })
        }
    };
    let width = extent("width", config.width)?;
    let height = extent("height", config.height)?;
    let spacing = NonNegative::new(config.min_spacing).map_err(invalid("min_spacing"))?;
    let template = Borehole::new(0.0, 0.0, config.length, config.rate)?;

    let min_dist_sq = spacing.into_inner().powi(2);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut tries = 0;

    while points.len() < config.count && tries < config.max_tries {
        tries += 1;
        // Scaling a unit draw keeps extents near `f64::MAX` in range.
        let x = rng.gen_range(0.0..=1.0) * width;
        let y = rng.gen_range(0.0..=1.0) * height;

        let clear = points
            .iter()
            .all(|&(px, py)| (x - px).powi(2) + (y - py).powi(2) >= min_dist_sq);
        if clear {
            points.push((x, y));
        }
    }

    if points.len() < config.count {
        return Err(LayoutError::Exhausted {
            placed: points.len(),
            requested: config.count,
            tries,
        });
    }

    points
        .into_iter()
        .map(|(x, y)| Ok(Borehole::new(x, y, template.length(), template.rate())?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_domain_and_spacing() {
        let config = LayoutConfig {
            count: 60,
            width: 300.0,
            height: 200.0,
            min_spacing: 15.0,
            ..LayoutConfig::default()
        };
        let boreholes = random_layout(&config).unwrap();

        assert_eq!(boreholes.len(), 60);
        for (i, a) in boreholes.iter().enumerate() {
            assert!((0.0..=300.0).contains(&a.x()));
            assert!((0.0..=200.0).contains(&a.y()));
            assert_eq!(a.length(), 80.0);
            assert_eq!(a.rate(), 10.0);
            for b in &boreholes[i + 1..] {
                assert!(a.distance_to(b) >= 15.0);
            }
        }
    }

    #[test]
    fn seeds_are_reproducible() {
        let config = LayoutConfig {
            count: 10,
            ..LayoutConfig::default()
        };
        let other = LayoutConfig { seed: 7, ..config };

        assert_eq!(random_layout(&config), random_layout(&config));
        assert_ne!(random_layout(&config), random_layout(&other));
    }

    #[test]
    fn crowded_domain_is_exhausted() {
        // At most four boreholes 10 m apart fit in a 10 m square.
        let config = LayoutConfig {
            count: 5,
            width: 10.0,
            height: 10.0,
            min_spacing: 10.0,
            max_tries: 5_000,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            random_layout(&config),
            Err(LayoutError::Exhausted {
                requested: 5,
                tries: 5_000,
                ..
            })
        ));
    }

    #[test]
    fn vast_domains_and_counts_do_not_abort() {
        let config = LayoutConfig {
            count: 3,
            width: f64::MAX,
            height: f64::MAX,
            ..LayoutConfig::default()
        };
        let boreholes = random_layout(&config).unwrap();
        assert_eq!(boreholes.len(), 3);
        assert!(boreholes.iter().all(|b| b.x().is_finite() && b.y().is_finite()));

        let config = LayoutConfig {
            count: usize::MAX,
            max_tries: 50,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            random_layout(&config),
            Err(LayoutError::Exhausted { tries: 50, .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let config = LayoutConfig {
            width: 0.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            random_layout(&config),
            Err(LayoutError::InvalidParameter { name: "width", .. })
        ));

        for (width, height, name) in [
            (f64::INFINITY, 100.0, "width"),
            (100.0, f64::INFINITY, "height"),
        ] {
            let config = LayoutConfig {
                width,
                height,
                ..LayoutConfig::default()
            };
            assert!(matches!(
                random_layout(&config),
                Err(LayoutError::NonFinite { name: n, .. }) if n == name
            ));
        }

        let config = LayoutConfig {
            length: -80.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(random_layout(&config), Err(LayoutError::Borehole(_))));
    }
}
