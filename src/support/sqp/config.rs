/// Solver controls for [`minimize`](super::minimize).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqpConfig {
    /// Maximum number of SQP iterations.
    pub max_iters: usize,

    /// Convergence tolerance.
    ///
    /// Applied to the change in objective between accepted iterates, to the
    /// step length, and to the summed constraint violation.
    pub ftol: f64,

    /// Finite-difference step used to approximate gradients.
    pub eps: f64,
}

impl Default for SqpConfig {
    fn default() -> Self {
        Self {
            max_iters: 50,
            ftol: 1e-3,
            eps: 1e-2,
        }
    }
}
