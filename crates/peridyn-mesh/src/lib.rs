//! # peridyn-mesh
//!
//! Point cloud representation and the bond discretization built on it.
//!
//! ## Key Types
//!
//! - [`PointCloud`]: Reference positions, volumes, and named point sets.
//!   Immutable once a job starts.
//! - [`BondSystem`]: Bonds within a horizon, grouped per owning point
//!   with contiguous neighbor ranges.
//! - Procedural generators for tests and demos (uniform boxes, point lines).

pub mod discretization;
pub mod generators;
pub mod point_cloud;

pub use discretization::{Bond, BondSystem};
pub use point_cloud::PointCloud;
