//! Sequential quadratic programming for bounded, inequality-constrained problems.
//!
//! [`minimize`] solves
//!
//! ```text
//! min f(x)   subject to   cⱼ(x) ≥ 0,   lowerᵢ ≤ xᵢ ≤ upperᵢ
//! ```
//!
//! for black-box `f` and `c` supplied through the [`Problem`] trait.
//! Gradients are approximated by forward differences, the Hessian of the
//! Lagrangian by a damped BFGS update, and each step comes from a quadratic
//! subproblem solved with a dual active-set method. Steps are accepted by a
//! backtracking line search on an L1 merit function.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use borefield_models::support::sqp::{minimize, Evaluation, Problem, SqpConfig, Status};
//!
//! // Maximize x + y inside the disk x² + y² ≤ 2 (optimum at x = y = 1).
//! struct Disk;
//!
//! impl Problem for Disk {
//!     type Error = Infallible;
//!
//!     fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation, Infallible> {
//!         Ok(Evaluation {
//!             objective: -(x[0] + x[1]),
//!             constraints: vec![2.0 - x[0] * x[0] - x[1] * x[1]],
//!         })
//!     }
//! }
//!
//! let config = SqpConfig { max_iters: 100, ftol: 1e-8, eps: 1e-7 };
//! let solution = minimize(&mut Disk, &[0.5, 0.0], &[(-5.0, 5.0); 2], &config, |_| {}).unwrap();
//!
//! assert_eq!(solution.status, Status::Converged);
//! assert!((solution.x[0] - 1.0).abs() < 1e-3);
//! assert!((solution.x[1] - 1.0).abs() < 1e-3);
//! ```

mod config;
mod error;
mod qp;

pub use config::SqpConfig;
pub use error::SqpError;

use log::debug;
use nalgebra::{DMatrix, DVector};

/// Objective and constraint values at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Objective value to minimize.
    pub objective: f64,

    /// Inequality constraint values; each is satisfied when `≥ 0`.
    pub constraints: Vec<f64>,
}

/// A nonlinear program evaluated as a black box.
pub trait Problem {
    type Error: std::error::Error + 'static;

    /// Evaluates the objective and all constraints at `x`.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the point cannot be evaluated.
    fn evaluate(&mut self, x: &[f64]) -> Result<Evaluation, Self::Error>;
}

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Objective change (or step) and constraint violation fell below `ftol`.
    Converged,

    /// The iteration budget ran out.
    MaxIters,

    /// No step along the search direction reduced the merit function.
    LineSearchFailed,

    /// The quadratic subproblem could not be solved, even when relaxed.
    InfeasibleSubproblem,
}

/// State reported to the observer after each accepted iteration.
#[derive(Debug, Clone, Copy)]
pub struct Iterate<'a> {
    /// One-based iteration number.
    pub iter: usize,
    pub x: &'a [f64],
    pub objective: f64,
    pub constraints: &'a [f64],
}

/// Result of [`minimize`].
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final iterate.
    pub x: Vec<f64>,
    pub objective: f64,
    pub constraints: Vec<f64>,
    pub status: Status,

    /// Iterations performed.
    pub iters: usize,
}

impl Solution {
    /// Sum of constraint violations at the final iterate.
    #[must_use]
    pub fn violation(&self) -> f64 {
        violation(self.constraints.iter().copied())
    }
}

/// Minimizes a bounded, inequality-constrained problem.
///
/// The starting point is clipped into `bounds`. `observer` is called once per
/// accepted iteration with the new iterate.
///
/// # Errors
///
/// Returns [`SqpError`] for malformed inputs or when the problem itself fails
/// to evaluate. Non-convergence is reported through [`Solution::status`].
pub fn minimize<P: Problem>(
    problem: &mut P,
    x0: &[f64],
    bounds: &[(f64, f64)],
    config: &SqpConfig,
    mut observer: impl FnMut(&Iterate<'_>),
) -> Result<Solution, SqpError<P::Error>> {
    validate(x0, bounds, config)?;

    let n = x0.len();
    let lower = DVector::from_iterator(n, bounds.iter().map(|b| b.0));
    let upper = DVector::from_iterator(n, bounds.iter().map(|b| b.1));
    let x = DVector::from_column_slice(x0)
        .zip_zip_map(&lower, &upper, |x, lo, up| x.clamp(lo, up));

    let mut linearizer = Linearizer {
        problem,
        upper: &upper,
        eps: config.eps,
        constraint_count: None,
    };

    let eval = linearizer.evaluate(&x)?;
    let mut point = linearizer.linearize(x, eval)?;
    let m = point.c.len();

    let mut hessian = DMatrix::identity(n, n);
    let mut penalty = DVector::zeros(m);
    let mut reset = false;

    for iter in 1..=config.max_iters {
        let step = match subproblem(&hessian, &point, &lower, &upper) {
            Ok(step) => step,
            Err(err) if !reset => {
                debug!("sqp iter {iter}: subproblem failed ({err}), resetting hessian");
                hessian = DMatrix::identity(n, n);
                reset = true;
                continue;
            }
            Err(_) => return Ok(point.finish(Status::InfeasibleSubproblem, iter)),
        };

        // L1 penalty weights never decrease faster than halfway to |λ|.
        penalty.zip_apply(&step.lambda, |rho, lambda| {
            *rho = lambda.abs().max(0.5 * (*rho + lambda.abs()));
        });

        if step.d.norm() < config.ftol && violation(point.c.iter().copied()) < config.ftol {
            return Ok(point.finish(Status::Converged, iter));
        }

        let Some((x_new, eval_new)) =
            line_search(&mut linearizer, &point, &step.d, &penalty, &lower, &upper)?
        else {
            if reset {
                return Ok(point.finish(Status::LineSearchFailed, iter));
            }
            debug!("sqp iter {iter}: line search failed, resetting hessian");
            hessian = DMatrix::identity(n, n);
            reset = true;
            continue;
        };
        reset = false;

        let next = linearizer.linearize(x_new, eval_new)?;
        observer(&Iterate {
            iter,
            x: next.x.as_slice(),
            objective: next.f,
            constraints: next.c.as_slice(),
        });

        let s = &next.x - &point.x;
        let converged = ((next.f - point.f).abs() < config.ftol || s.norm() < config.ftol)
            && violation(next.c.iter().copied()) < config.ftol;

        let y = next.lagrangian_gradient(&step.lambda) - point.lagrangian_gradient(&step.lambda);
        point = next;

        if converged {
            return Ok(point.finish(Status::Converged, iter));
        }

        damped_bfgs_update(&mut hessian, &s, y);
    }

    Ok(point.finish(Status::MaxIters, config.max_iters))
}

fn validate<E: std::error::Error + 'static>(
    x0: &[f64],
    bounds: &[(f64, f64)],
    config: &SqpConfig,
) -> Result<(), SqpError<E>> {
    if x0.is_empty() {
        return Err(SqpError::EmptyProblem);
    }
    if bounds.len() != x0.len() {
        return Err(SqpError::BoundsLength {
            expected: x0.len(),
            actual: bounds.len(),
        });
    }
    if let Some((index, &(lower, upper))) = bounds
        .iter()
        .enumerate()
        .find(|(_, (lo, up))| !lo.is_finite() || !up.is_finite() || lo > up)
    {
        return Err(SqpError::InvalidBounds {
            index,
            lower,
            upper,
        });
    }
    if !(config.ftol > 0.0) {
        return Err(SqpError::InvalidConfig("ftol must be positive"));
    }
    if !(config.eps > 0.0) {
        return Err(SqpError::InvalidConfig("eps must be positive"));
    }
    Ok(())
}

fn violation(constraints: impl Iterator<Item = f64>) -> f64 {
    constraints.map(|c| (-c).max(0.0)).sum()
}

/// A point with its values and finite-difference derivatives.
struct Point {
    x: DVector<f64>,
    f: f64,
    c: DVector<f64>,
    grad: DVector<f64>,

    /// Constraint Jacobian, one row per constraint.
    jac: DMatrix<f64>,
}

impl Point {
    fn lagrangian_gradient(&self, lambda: &DVector<f64>) -> DVector<f64> {
        &self.grad - self.jac.transpose() * lambda
    }

    fn finish(self, status: Status, iters: usize) -> Solution {
        Solution {
            x: self.x.as_slice().to_vec(),
            objective: self.f,
            constraints: self.c.as_slice().to_vec(),
            status,
            iters,
        }
    }
}

struct Linearizer<'a, P> {
    problem: &'a mut P,
    upper: &'a DVector<f64>,
    eps: f64,
    constraint_count: Option<usize>,
}

impl<P: Problem> Linearizer<'_, P> {
    fn evaluate(&mut self, x: &DVector<f64>) -> Result<Evaluation, SqpError<P::Error>> {
        let eval = self
            .problem
            .evaluate(x.as_slice())
            .map_err(SqpError::Problem)?;

        let actual = eval.constraints.len();
        match self.constraint_count {
            None => self.constraint_count = Some(actual),
            Some(expected) if expected != actual => {
                return Err(SqpError::ConstraintCount { expected, actual });
            }
            Some(_) => {}
        }
        Ok(eval)
    }

    /// Forward differences, stepping backward where a forward probe would
    /// leave the upper bound.
    fn linearize(
        &mut self,
        x: DVector<f64>,
        eval: Evaluation,
    ) -> Result<Point, SqpError<P::Error>> {
        let n = x.len();
        let c = DVector::from_vec(eval.constraints);
        let mut grad = DVector::zeros(n);
        let mut jac = DMatrix::zeros(c.len(), n);

        for i in 0..n {
            let h = if x[i] + self.eps <= self.upper[i] {
                self.eps
            } else {
                -self.eps
            };
            let mut probe = x.clone();
            probe[i] += h;
            let shifted = self.evaluate(&probe)?;

            grad[i] = (shifted.objective - eval.objective) / h;
            for (j, cj) in shifted.constraints.iter().enumerate() {
                jac[(j, i)] = (cj - c[j]) / h;
            }
        }

        Ok(Point {
            x,
            f: eval.objective,
            c,
            grad,
            jac,
        })
    }
}

struct Step {
    d: DVector<f64>,
    lambda: DVector<f64>,
}

/// Solves the quadratic subproblem at `point`.
///
/// When the linearized constraints conflict with the bounds, retries with
/// every constraint relaxed by a shared, heavily penalized slack variable.
fn subproblem(
    hessian: &DMatrix<f64>,
    point: &Point,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> Result<Step, qp::QpError> {
    let n = point.x.len();
    let m = point.c.len();

    let mut normals = DMatrix::zeros(n, m + 2 * n);
    let mut rhs = DVector::zeros(m + 2 * n);
    for j in 0..m {
        normals.set_column(j, &point.jac.row(j).transpose());
        rhs[j] = -point.c[j];
    }
    for i in 0..n {
        normals[(i, m + i)] = 1.0;
        rhs[m + i] = lower[i] - point.x[i];
        normals[(i, m + n + i)] = -1.0;
        rhs[m + n + i] = point.x[i] - upper[i];
    }

    match qp::solve(hessian, &point.grad, &normals, &rhs) {
        Ok(sol) => Ok(Step {
            d: sol.x,
            lambda: sol.multipliers.rows(0, m).into_owned(),
        }),
        Err(qp::QpError::Infeasible) => {
            debug!("sqp subproblem infeasible, relaxing constraints");
            elastic_subproblem(hessian, point, &normals, &rhs)
        }
        Err(err) => Err(err),
    }
}

fn elastic_subproblem(
    hessian: &DMatrix<f64>,
    point: &Point,
    normals: &DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<Step, qp::QpError> {
    let n = point.x.len();
    let m = point.c.len();
    let k = rhs.len();

    let mut g = DMatrix::identity(n + 1, n + 1);
    g.view_mut((0, 0), (n, n)).copy_from(hessian);

    let weight = 1e3 * (1.0 + point.grad.amax());
    let mut a = DVector::zeros(n + 1);
    a.rows_mut(0, n).copy_from(&point.grad);
    a[n] = weight;

    let mut relaxed = DMatrix::zeros(n + 1, k + 1);
    relaxed.view_mut((0, 0), (n, k)).copy_from(normals);
    for j in 0..m {
        relaxed[(n, j)] = 1.0;
    }
    relaxed[(n, k)] = 1.0;

    let mut relaxed_rhs = DVector::zeros(k + 1);
    relaxed_rhs.rows_mut(0, k).copy_from(rhs);

    let sol = qp::solve(&g, &a, &relaxed, &relaxed_rhs)?;
    Ok(Step {
        d: sol.x.rows(0, n).into_owned(),
        lambda: sol.multipliers.rows(0, m).into_owned(),
    })
}

/// Backtracking on the L1 merit function `f + Σ ρⱼ max(0, -cⱼ)`.
///
/// Returns `None` when no step length down to about 1e-3 is acceptable.
fn line_search<P: Problem>(
    linearizer: &mut Linearizer<'_, P>,
    point: &Point,
    d: &DVector<f64>,
    penalty: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> Result<Option<(DVector<f64>, Evaluation)>, SqpError<P::Error>> {
    let merit_penalty = |c: &[f64]| -> f64 {
        c.iter()
            .zip(penalty.iter())
            .map(|(cj, rho)| rho * (-cj).max(0.0))
            .sum()
    };

    let current_penalty = merit_penalty(point.c.as_slice());
    let merit = point.f + current_penalty;
    let slope = (point.grad.dot(d) - current_penalty).min(0.0);

    let mut alpha = 1.0;
    for _ in 0..=10 {
        let x_new =
            (&point.x + d * alpha).zip_zip_map(lower, upper, |x, lo, up| x.clamp(lo, up));
        let eval = linearizer.evaluate(&x_new)?;
        let merit_new = eval.objective + merit_penalty(&eval.constraints);

        if merit_new <= merit + 0.1 * alpha * slope {
            return Ok(Some((x_new, eval)));
        }
        alpha *= 0.5;
    }

    Ok(None)
}

/// Powell-damped BFGS update, which keeps the approximation positive definite.
fn damped_bfgs_update(hessian: &mut DMatrix<f64>, s: &DVector<f64>, y: DVector<f64>) {
    let bs = &*hessian * s;
    let sbs = s.dot(&bs);
    if sbs <= 0.0 {
        return;
    }

    let mut y = y;
    let mut sy = s.dot(&y);
    if sy < 0.2 * sbs {
        let theta = 0.8 * sbs / (sbs - sy);
        y = &y * theta + &bs * (1.0 - theta);
        sy = s.dot(&y);
    }

    *hessian += &y * y.transpose() / sy - &bs * bs.transpose() / sbs;
}
