//! Dense dual active-set solver for strictly convex quadratic programs.
//!
//! Solves `min ½ xᵀGx + aᵀx` subject to `nⱼᵀx ≥ bⱼ` with the method of
//! Goldfarb and Idnani. The dual method starts from the unconstrained
//! minimum and adds violated constraints one at a time, so no feasible
//! starting point is required and infeasibility is detected directly.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

const VIOLATION_TOL: f64 = 1e-10;
const DUAL_TOL: f64 = 1e-12;
const DIRECTION_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(super) enum QpError {
    #[error("quadratic term is not positive definite")]
    NotPositiveDefinite,

    #[error("constraints are infeasible")]
    Infeasible,

    #[error("active constraint normals are linearly dependent")]
    Degenerate,

    #[error("active-set iteration limit reached")]
    Stalled,
}

#[derive(Debug, Clone)]
pub(super) struct QpSolution {
    pub(super) x: DVector<f64>,

    /// One multiplier per constraint, zero for inactive constraints.
    pub(super) multipliers: DVector<f64>,
}

/// Solves the quadratic program.
///
/// `normals` holds one constraint normal per column and `rhs` the matching
/// lower bounds.
pub(super) fn solve(
    hessian: &DMatrix<f64>,
    linear: &DVector<f64>,
    normals: &DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<QpSolution, QpError> {
    let n = linear.len();
    let m = rhs.len();
    debug_assert_eq!(normals.shape(), (n, m));

    let inverse = hessian
        .clone()
        .cholesky()
        .ok_or(QpError::NotPositiveDefinite)?
        .inverse();

    let mut x = -(&inverse * linear);
    let mut active: Vec<usize> = Vec::new();
    let mut duals: Vec<f64> = Vec::new();

    let max_steps = 10 * (m + n);
    let mut steps = 0;

    while let Some(p) = most_violated(normals, rhs, &x, &active) {
        let normal = normals.column(p).into_owned();
        let mut trial = duals.clone();
        trial.push(0.0);

        loop {
            steps += 1;
            if steps > max_steps {
                return Err(QpError::Stalled);
            }

            let (z, r) = directions(&inverse, normals, &active, &normal)?;

            let mut t_dual = f64::INFINITY;
            let mut blocking = None;
            for (k, &rk) in r.iter().enumerate() {
                if rk > DUAL_TOL {
                    let t = trial[k] / rk;
                    if t < t_dual {
                        t_dual = t;
                        blocking = Some(k);
                    }
                }
            }

            let curvature = z.dot(&normal);
            let t_primal = if z.norm() <= DIRECTION_TOL * (1.0 + normal.norm()) || curvature <= 0.0
            {
                f64::INFINITY
            } else {
                -(normal.dot(&x) - rhs[p]) / curvature
            };

            if !t_primal.is_finite() {
                // Pure dual step: drop the blocking constraint and retry.
                let Some(k) = blocking else {
                    return Err(QpError::Infeasible);
                };
                step_duals(&mut trial, &r, t_dual);
                active.remove(k);
                trial.remove(k);
                continue;
            }

            let t = t_primal.min(t_dual);
            x += &z * t;
            step_duals(&mut trial, &r, t);

            match blocking {
                Some(k) if t_dual < t_primal => {
                    active.remove(k);
                    trial.remove(k);
                }
                _ => {
                    active.push(p);
                    duals = trial;
                    break;
                }
            }
        }
    }

    let mut multipliers = DVector::zeros(m);
    for (&j, &u) in active.iter().zip(&duals) {
        multipliers[j] = u;
    }

    Ok(QpSolution { x, multipliers })
}

fn most_violated(
    normals: &DMatrix<f64>,
    rhs: &DVector<f64>,
    x: &DVector<f64>,
    active: &[usize],
) -> Option<usize> {
    (0..rhs.len())
        .filter(|j| !active.contains(j))
        .filter_map(|j| {
            let slack = normals.column(j).dot(x) - rhs[j];
            (slack < -VIOLATION_TOL * (1.0 + rhs[j].abs())).then_some((j, slack))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(j, _)| j)
}

/// Primal step direction and dual update direction for adding `normal`.
fn directions(
    inverse: &DMatrix<f64>,
    normals: &DMatrix<f64>,
    active: &[usize],
    normal: &DVector<f64>,
) -> Result<(DVector<f64>, DVector<f64>), QpError> {
    if active.is_empty() {
        return Ok((inverse * normal, DVector::zeros(0)));
    }

    let mut basis = DMatrix::zeros(normal.len(), active.len());
    for (k, &j) in active.iter().enumerate() {
        basis.set_column(k, &normals.column(j));
    }

    let projected = inverse * &basis;
    let gram = basis.transpose() * &projected;
    let b = projected.transpose() * normal;

    let r = match gram.clone().cholesky() {
        Some(chol) => chol.solve(&b),
        None => gram.lu().solve(&b).ok_or(QpError::Degenerate)?,
    };
    let z = inverse * normal - &projected * &r;

    Ok((z, r))
}

fn step_duals(trial: &mut [f64], r: &DVector<f64>, t: f64) {
    for (u, rk) in trial.iter_mut().zip(r.iter()) {
        *u -= t * rk;
    }
    if let Some(last) = trial.last_mut() {
        *last += t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn unconstrained_minimum() {
        let g = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let a = DVector::from_vec(vec![-2.0, -4.0]);
        let normals = DMatrix::zeros(2, 0);
        let rhs = DVector::zeros(0);

        let sol = solve(&g, &a, &normals, &rhs).unwrap();
        assert_relative_eq!(sol.x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sol.x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_active_constraint() {
        // min ½|x|² - x₀ - x₁  s.t.  -x₀ - x₁ ≥ -1
        let g = DMatrix::identity(2, 2);
        let a = DVector::from_vec(vec![-1.0, -1.0]);
        let normals = DMatrix::from_column_slice(2, 1, &[-1.0, -1.0]);
        let rhs = DVector::from_vec(vec![-1.0]);

        let sol = solve(&g, &a, &normals, &rhs).unwrap();
        assert_relative_eq!(sol.x[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(sol.x[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(sol.multipliers[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn box_bounds() {
        // min ½|x|² - 3x₀ + x₁  with  0 ≤ x ≤ 2
        let g = DMatrix::identity(2, 2);
        let a = DVector::from_vec(vec![-3.0, 1.0]);
        let normals =
            DMatrix::from_column_slice(2, 4, &[1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, -1.0]);
        let rhs = DVector::from_vec(vec![0.0, 0.0, -2.0, -2.0]);

        let sol = solve(&g, &a, &normals, &rhs).unwrap();
        assert_relative_eq!(sol.x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(sol.x[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(sol.multipliers[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(sol.multipliers[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn detects_infeasibility() {
        // x ≥ 1 and -x ≥ 0 cannot both hold.
        let g = DMatrix::identity(1, 1);
        let a = DVector::zeros(1);
        let normals = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        let rhs = DVector::from_vec(vec![1.0, 0.0]);

        assert_eq!(
            solve(&g, &a, &normals, &rhs).unwrap_err(),
            QpError::Infeasible
        );
    }

    #[test]
    fn rejects_indefinite_hessian() {
        let g = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        let a = DVector::zeros(2);
        let normals = DMatrix::zeros(2, 0);
        let rhs = DVector::zeros(0);

        assert_eq!(
            solve(&g, &a, &normals, &rhs).unwrap_err(),
            QpError::NotPositiveDefinite
        );
    }
}
