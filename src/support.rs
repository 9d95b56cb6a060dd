//! Crate-level support utilities.
//!
//! - [`constraint`]: Type-level numeric constraints.
//! - [`sqp`]: Sequential quadratic programming for bounded, inequality-constrained problems.

pub mod constraint;
pub mod sqp;
