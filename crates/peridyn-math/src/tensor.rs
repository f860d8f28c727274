//! Second-order tensor helpers on `DMat3`.
//!
//! `glam` stores matrices column-major; `outer(a, b)` follows the usual
//! convention `(a ⊗ b)_ij = a_i b_j`.

use glam::{DMat3, DVec3};

/// Outer product `a ⊗ b`.
#[inline]
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Trace of a 3×3 tensor.
#[inline]
pub fn trace(m: &DMat3) -> f64 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// Returns true if every component is finite.
#[inline]
pub fn is_finite(m: &DMat3) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}

/// Inverts `m` unless it is singular.
///
/// Singularity is judged relative to the magnitude of `m`: the matrix is
/// rejected when `|det(m)| <= rel_tol · s³` with `s = ‖m‖_F / √3`, or when
/// the inverse contains non-finite components.
pub fn try_inverse(m: &DMat3, rel_tol: f64) -> Option<DMat3> {
    let scale = frobenius_norm(m) / 3.0_f64.sqrt();
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= rel_tol * scale * scale * scale {
        return None;
    }
    let inv = m.inverse();
    is_finite(&inv).then_some(inv)
}

/// Frobenius norm `sqrt(Σ m_ij²)`.
pub fn frobenius_norm(m: &DMat3) -> f64 {
    (m.x_axis.length_squared() + m.y_axis.length_squared() + m.z_axis.length_squared()).sqrt()
}
