//! # peridyn-decomp
//!
//! Splits a body's point graph into chunks and plans the halo traffic
//! between them.
//!
//! ## Key Types
//!
//! - [`Decomposition`]: Point → chunk assignment (recursive coordinate
//!   bisection, deterministic).
//! - [`ChunkHandler`]: Global ↔ local index translation for one chunk,
//!   owned points first, halo points after.
//! - [`HaloPlan`]: Every (field, source, destination, index list)
//!   transfer the data handlers perform each step.

pub mod chunk_handler;
pub mod decomposer;
pub mod halo;

pub use chunk_handler::{localize_system, ChunkHandler};
pub use decomposer::{decompose, Decomposition};
pub use halo::{ExchangeDirection, HaloExchange, HaloPlan};
