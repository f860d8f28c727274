//! Numeric constants and simulation defaults.

/// Default safety factor applied to the stable timestep.
pub const DEFAULT_SAFETY_FACTOR: f64 = 0.7;

/// Default correction factor for zero-energy mode stabilization.
pub const DEFAULT_CORRECTION_FACTOR: f64 = 0.1;

/// Default damage above which a correspondence point is killed.
pub const DEFAULT_MAX_DAMAGE: f64 = 0.85;

/// Default Poisson ratio when none is given (bond-based limit).
pub const DEFAULT_POISSON_RATIO: f64 = 0.25;

/// Relative determinant floor for the shape tensor; below it the tensor is singular.
pub const SINGULAR_SHAPE_TENSOR: f64 = 1.0e-12;

/// Floor for the Jacobian `det(F)`; below it the point is considered collapsed.
pub const JACOBIAN_FLOOR: f64 = f64::EPSILON;

/// Minimum admissible reference bond length.
pub const MIN_BOND_LENGTH: f64 = 1.0e-12;
