//! Public models.
//!
//! Models are organized into domain-specific submodules (e.g., `geothermal`).
//!
//! # Model structure
//!
//! Each model lives in its own module and contains an internal `core` submodule
//! where the actual computation and domain logic lives. The public module
//! re-exports the types callers need and provides thin entry points, including
//! [`twine_core::Model`] adapters, that delegate to the core.

pub mod geothermal;
