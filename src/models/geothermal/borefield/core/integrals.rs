//! Precomputed self-term integrals.

use super::{Borehole, SelfIntegrals};

/// Self-term integrals indexed by borehole and observation depth.
///
/// Built once per field evaluation or optimization run and never mutated.
/// Depths come from a small fixed set, so they are addressed by position
/// rather than by value.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralTable {
    depths: Vec<f64>,
    integrals: Vec<SelfIntegrals>,
}

impl IntegralTable {
    /// Evaluates the integrals for every borehole at every depth.
    #[must_use]
    pub fn new(boreholes: &[Borehole], depths: &[f64], radius: f64) -> Self {
        let integrals = boreholes
            .iter()
            .flat_map(|b| {
                depths
                    .iter()
                    .map(move |&z| SelfIntegrals::new(b.length(), z, radius))
            })
            .collect();

        Self {
            depths: depths.to_vec(),
            integrals,
        }
    }

    #[must_use]
    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    /// Number of boreholes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.depths.is_empty() {
            0
        } else {
            self.integrals.len() / self.depths.len()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.integrals.is_empty()
    }

    /// Integrals for `borehole` at the depth with index `depth`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn get(&self, borehole: usize, depth: usize) -> SelfIntegrals {
        assert!(depth < self.depths.len(), "depth index out of range");
        self.integrals[borehole * self.depths.len() + depth]
    }

    /// Integrals for `borehole` at every depth, in depth order.
    ///
    /// # Panics
    ///
    /// Panics if the borehole index is out of range.
    #[must_use]
    pub fn for_borehole(&self, borehole: usize) -> &[SelfIntegrals] {
        let n = self.depths.len();
        &self.integrals[borehole * n..(borehole + 1) * n]
    }
}
