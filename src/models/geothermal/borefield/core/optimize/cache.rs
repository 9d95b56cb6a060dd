use std::collections::HashMap;

use log::trace;

/// A rate vector rounded to a fixed number of decimals.
///
/// Rates are stored as integer multiples of `10^-decimals`, rounded half to
/// even, so vectors that differ only by floating-point noise share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey(Vec<i64>);

impl RateKey {
    #[must_use]
    pub fn new(rates: &[f64], decimals: u32) -> Self {
        let scale = scale(decimals);
        Self(
            rates
                .iter()
                .map(|q| (q * scale).round_ties_even() as i64)
                .collect(),
        )
    }

    /// Whether every rate of magnitude up to `magnitude` keys without
    /// saturating at `decimals`.
    ///
    /// A saturated key collapses distinct rate vectors onto one entry.
    #[must_use]
    pub fn fits(magnitude: f64, decimals: u32) -> bool {
        magnitude == 0.0 || magnitude.abs() * scale(decimals) < i64::MAX as f64
    }
}

fn scale(decimals: u32) -> f64 {
    i32::try_from(decimals).map_or(f64::INFINITY, |d| 10f64.powi(d))
}

/// Memoized evaluations for one optimization run.
///
/// Entries are never evicted; the cache lives only as long as the run.
#[derive(Debug)]
pub struct ConstraintCache<T> {
    decimals: u32,
    entries: HashMap<RateKey, T>,
}

impl<T: Copy> ConstraintCache<T> {
    #[must_use]
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached value for `rates`, or evaluates and stores it.
    ///
    /// Failed evaluations are not stored.
    ///
    /// # Errors
    ///
    /// Propagates the error from `evaluate`.
    pub fn get_or_try_insert<E>(
        &mut self,
        rates: &[f64],
        evaluate: impl FnOnce(&[f64]) -> Result<T, E>,
    ) -> Result<T, E> {
        let key = RateKey::new(rates, self.decimals);
        if let Some(value) = self.entries.get(&key) {
            trace!("constraint cache hit ({} entries)", self.entries.len());
            return Ok(*value);
        }

        let value = evaluate(rates)?;
        self.entries.insert(key, value);
        Ok(value)
    }

    /// Number of distinct rate vectors evaluated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
