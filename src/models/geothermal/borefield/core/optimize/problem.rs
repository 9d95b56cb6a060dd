//! Constraint evaluation and the nonlinear program over extraction rates.

use rayon::prelude::*;
use twine_core::Model;

use crate::{
    models::geothermal::borefield::core::{
        Borehole, Ground, IntegralTable, neighbor_temperature_change, self_temperature_change,
    },
    support::sqp::{Evaluation, Problem},
};

use super::{ConstraintCache, EvaluateError};

/// Worst-case temperature changes (K) over all boreholes and observation depths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldImpact {
    /// Largest own-plus-neighbor change at any borehole.
    pub max_total: f64,

    /// Largest neighbor-only change at any borehole.
    pub max_neighbor: f64,
}

/// Evaluates [`FieldImpact`] for a vector of extraction rates.
///
/// Geometry, ground and self-term integrals are fixed at construction; only
/// the rates vary between calls. Each borehole is evaluated at its own
/// location across every observation depth, counting only the neighbors
/// inside the cutoff box, and boreholes are evaluated in parallel.
#[derive(Debug, Clone)]
pub struct FieldImpactModel<'a> {
    boreholes: &'a [Borehole],
    ground: &'a Ground,
    integrals: IntegralTable,
    neighbors: Vec<Vec<usize>>,
}

impl<'a> FieldImpactModel<'a> {
    /// Prepares the model.
    ///
    /// With `cutoff` set, a borehole's neighbors are those with
    /// `|Δx| ≤ cutoff` and `|Δy| ≤ cutoff`; otherwise every other borehole.
    #[must_use]
    pub fn new(
        boreholes: &'a [Borehole],
        ground: &'a Ground,
        depths: &[f64],
        radius: f64,
        cutoff: Option<f64>,
    ) -> Self {
        let neighbors = boreholes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                boreholes
                    .iter()
                    .enumerate()
                    .filter(|&(k, other)| {
                        k != i
                            && cutoff.is_none_or(|c| {
                                (other.x() - b.x()).abs() <= c && (other.y() - b.y()).abs() <= c
                            })
                    })
                    .map(|(k, _)| k)
                    .collect()
            })
            .collect();

        Self {
            boreholes,
            ground,
            integrals: IntegralTable::new(boreholes, depths, radius),
            neighbors,
        }
    }

    /// Observation depths in metres.
    #[must_use]
    pub fn depths(&self) -> &[f64] {
        self.integrals.depths()
    }

    /// Number of neighbors counted for each borehole.
    pub fn neighbor_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().map(Vec::len)
    }

    /// Worst neighbor and total change at borehole `i` over all depths.
    fn borehole_impact(&self, i: usize, rates: &[f64]) -> (f64, f64) {
        let b = &self.boreholes[i];
        let sources: Vec<Borehole> = self.neighbors[i]
            .iter()
            .map(|&k| self.boreholes[k].with_rate(rates[k]))
            .collect();

        let neighbor =
            neighbor_temperature_change(b.x(), b.y(), self.depths(), &sources, self.ground);

        self.integrals.for_borehole(i).iter().zip(&neighbor).fold(
            (f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(max_neighbor, max_total), (integrals, &n)| {
                let total = n + self_temperature_change(rates[i], integrals, self.ground);
                (max_neighbor.max(n), max_total.max(total))
            },
        )
    }
}

impl Model for FieldImpactModel<'_> {
    type Input = Vec<f64>;
    type Output = FieldImpact;
    type Error = EvaluateError;

    fn call(&self, rates: &Self::Input) -> Result<Self::Output, Self::Error> {
        if rates.len() != self.boreholes.len() {
            return Err(EvaluateError::RateCount {
                expected: self.boreholes.len(),
                actual: rates.len(),
            });
        }
        if let Some((index, &value)) = rates.iter().enumerate().find(|(_, q)| !q.is_finite()) {
            return Err(EvaluateError::NonFiniteRate { index, value });
        }

        let (max_neighbor, max_total) = (0..self.boreholes.len())
            .into_par_iter()
            .map(|i| self.borehole_impact(i, rates))
            .reduce(
                || (f64::NEG_INFINITY, f64::NEG_INFINITY),
                |a, b| (a.0.max(b.0), a.1.max(b.1)),
            );

        Ok(FieldImpact {
            max_total,
            max_neighbor,
        })
    }
}

/// Maximize total extraction subject to both impact limits.
///
/// Objective `−Σq`; constraints `lim_env − max_total ≥ 0` and
/// `lim_neigh − max_neighbor ≥ 0`. Impacts are memoized per rounded rate
/// vector for the lifetime of the problem.
pub(super) struct LoadProblem<'m, 'a> {
    model: &'m FieldImpactModel<'a>,
    environment_limit: f64,
    neighbor_limit: f64,
    cache: ConstraintCache<FieldImpact>,
}

impl<'m, 'a> LoadProblem<'m, 'a> {
    pub(super) fn new(
        model: &'m FieldImpactModel<'a>,
        environment_limit: f64,
        neighbor_limit: f64,
        cache_decimals: u32,
    ) -> Self {
        Self {
            model,
            environment_limit,
            neighbor_limit,
            cache: ConstraintCache::new(cache_decimals),
        }
    }

    /// Number of distinct rate vectors evaluated.
    pub(super) fn evaluations(&self) -> usize {
        self.cache.len()
    }
}

impl Problem for LoadProblem<'_, '_> {
    type Error = EvaluateError;

    fn evaluate(&mut self, rates: &[f64]) -> Result<Evaluation, Self::Error> {
        let model = self.model;
        let impact = self
            .cache
            .get_or_try_insert(rates, |rates| model.call(&rates.to_vec()))?;

        Ok(Evaluation {
            objective: -rates.iter().sum::<f64>(),
            constraints: vec![
                self.environment_limit - impact.max_total,
                self.neighbor_limit - impact.max_neighbor,
            ],
        })
    }
}
