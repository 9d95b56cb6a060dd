//! Line-source temperature-change kernels.
//!
//! Every borehole is a finite line source of length `H` hanging from the
//! ground surface, paired with a mirror image above the surface so the
//! surface stays at the undisturbed temperature. Two kernels evaluate the
//! resulting quasi-steady temperature change:
//!
//! - [`self_temperature_change`]: a borehole at its own axis, in closed form,
//!   with the singular distance regularized to a small radius `R_w`.
//! - [`neighbor_temperature_change`]: any point away from the sources, under
//!   uniform groundwater advection, integrated numerically along each source.
//!
//! Both are linear in the heat extraction rate.

mod neighbor;
mod self_term;

pub use neighbor::{EXPONENT_CLIP, neighbor_temperature_change};
pub use self_term::{SelfIntegrals, self_temperature_change};
