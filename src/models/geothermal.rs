//! Shallow geothermal models.
//!
//! This module contains models of ground heat exchangers and the ground
//! around them.

pub mod borefield;
