//! # Borefield Models
//!
//! Models of borehole heat exchanger (BHE) fields built in the style of
//! [Twine](https://github.com/isentropic-dev/twine).
//!
//! A field of vertical boreholes extracts heat from the ground. Each
//! borehole cools its own surroundings and, through conduction and
//! groundwater advection, its neighbors. This crate estimates those
//! seasonal-average temperature changes with a line-source superposition
//! model and searches for the largest per-borehole extraction rates that keep
//! them within environmental and neighbor-interference limits.
//!
//! ## Crate layout
//!
//! - [`models`]: Domain-specific models, including the borehole field
//!   ([`models::geothermal::borefield`]).
//! - [`support`]: Supporting utilities used by models.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.

pub mod models;
pub mod support;
