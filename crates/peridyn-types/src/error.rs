//! Error types for the peridyn engine.
//!
//! All crates return `PeridynResult<T>` from fallible operations.
//! Numeric degeneracy inside a force kernel is *not* an error: it is
//! recorded as bond or point failure in the chunk storage.

use thiserror::Error;

/// Unified error type for the peridyn engine.
#[derive(Debug, Error)]
pub enum PeridynError {
    /// Configuration value is missing, conflicting, or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Material parameter is out of valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// Point cloud or bond data is malformed or inconsistent.
    #[error("Invalid discretization: {0}")]
    InvalidDiscretization(String),

    /// The point set cannot be split into the requested chunks.
    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    /// The requested feature is explicitly not supported.
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Message passing between chunks or ranks failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A global quantity became non-finite; the run must stop.
    #[error("Numeric failure: {0}")]
    NumericFailure(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, PeridynError>`.
pub type PeridynResult<T> = Result<T, PeridynError>;
