//! # peridyn-math
//!
//! Linear algebra primitives for the peridyn kernels.
//!
//! Provides:
//! - Re-exports of double-precision `glam` types (`DVec3`, `DMat3`)
//! - Tensor helpers used by the correspondence formulation
//!   (outer products, trace, checked inversion, finiteness checks)

pub mod tensor;

// Re-export glam types as the canonical math types for peridyn.
pub use glam::{DMat3, DVec3};
