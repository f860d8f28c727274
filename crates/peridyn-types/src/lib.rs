//! # peridyn-types
//!
//! Shared types, identifiers, error types, and numeric constants
//! for the peridyn peridynamics engine.
//!
//! This crate has no domain logic: it defines the vocabulary
//! that all other peridyn crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{PeridynError, PeridynResult};
pub use ids::ChunkId;
