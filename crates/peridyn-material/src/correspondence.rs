//! Correspondence (non-ordinary state-based) material.
//!
//! For each point the kernel reconstructs a non-local deformation gradient
//! from its active bonds,
//!
//! ```text
//! K = Σ ω V_j ξ ⊗ ξ          (shape tensor)
//! F = (Σ ω V_j η ⊗ ξ) · K⁻¹   (ξ = X_j − X_i, η = x_j − x_i)
//! ```
//!
//! evaluates a compressible Neo-Hookean first Piola-Kirchhoff stress `P`,
//! and maps it back onto the bonds as the force state `T = ω P K⁻¹ ξ`.
//! A zero-energy mode correction `C_s · bc · ω/ω₀ · (η − F ξ)` suppresses
//! the hourglass modes the averaged gradient cannot see. `T` is applied
//! to the owner (scaled by `V_j`) and, with opposite sign, to the
//! neighbor (scaled by `V_i`), so neighbor contributions on halo points
//! must be summed back into their owners.
//!
//! Degenerate points (singular `K`, collapsed or non-finite `F`, degenerate
//! stress, too much damage) are killed: all their bonds are deactivated.

use peridyn_math::tensor::{is_finite, outer, trace, try_inverse};
use peridyn_math::{DMat3, DVec3};
use peridyn_mesh::BondSystem;
use peridyn_types::constants::{
    DEFAULT_CORRECTION_FACTOR, DEFAULT_MAX_DAMAGE, JACOBIAN_FLOOR, SINGULAR_SHAPE_TENSOR,
};
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

use crate::parameters::PointParameters;
use crate::storage::Storage;
use crate::traits::{HaloField, MaterialModel};

/// Weight of a bond as a function of its reference length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceFunction {
    /// ω = 1
    Constant,
    /// ω = δ / L
    #[default]
    Inverse,
    /// ω = exp(−L² / δ²)
    Gaussian,
}

impl InfluenceFunction {
    /// Evaluates ω for a bond of reference length `length`.
    #[inline]
    pub fn eval(self, length: f64, horizon: f64) -> f64 {
        match self {
            InfluenceFunction::Constant => 1.0,
            InfluenceFunction::Inverse => horizon / length,
            InfluenceFunction::Gaussian => (-(length * length) / (horizon * horizon)).exp(),
        }
    }
}

/// Configuration of the correspondence formulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceMaterial {
    /// Damage above which a point is killed.
    pub max_damage: f64,
    /// Zero-energy mode correction factor `C_s`.
    pub correction_factor: f64,
    /// Bond weighting.
    pub influence: InfluenceFunction,
}

impl Default for CorrespondenceMaterial {
    fn default() -> Self {
        Self {
            max_damage: DEFAULT_MAX_DAMAGE,
            correction_factor: DEFAULT_CORRECTION_FACTOR,
            influence: InfluenceFunction::default(),
        }
    }
}

/// Reconstructed kinematics of one point.
#[derive(Debug, Clone, Copy)]
pub struct DeformationGradient {
    /// Deformation gradient F.
    pub f: DMat3,
    /// Inverse shape tensor K⁻¹.
    pub k_inv: DMat3,
    /// Sum of active bond weights ω₀.
    pub omega0: f64,
}

impl CorrespondenceMaterial {
    /// Validates the formulation settings.
    pub fn validate(&self) -> PeridynResult<()> {
        if !(self.max_damage > 0.0 && self.max_damage <= 1.0) {
            return Err(PeridynError::InvalidMaterial(format!(
                "max_damage must lie in (0, 1], got {}",
                self.max_damage
            )));
        }
        if !(self.correction_factor.is_finite() && self.correction_factor >= 0.0) {
            return Err(PeridynError::InvalidMaterial(format!(
                "correction_factor must be non-negative, got {}",
                self.correction_factor
            )));
        }
        Ok(())
    }

    /// Reconstructs `F` for point `i` from its active bonds.
    ///
    /// Returns `None` when the shape tensor is singular, `F` is not finite,
    /// or `det(F)` falls below the Jacobian floor.
    pub fn deformation_gradient(
        &self,
        storage: &Storage,
        system: &BondSystem,
        params: &PointParameters,
        i: usize,
    ) -> Option<DeformationGradient> {
        let mut k = DMat3::ZERO;
        let mut moment = DMat3::ZERO;
        let mut omega0 = 0.0;
        for bond_id in system.each_bond_idx(i) {
            if !storage.bond_active[bond_id] {
                continue;
            }
            let bond = system.bonds[bond_id];
            let j = bond.neighbor;
            let xi = system.reference_diff(i, j);
            let eta = storage.current_diff(i, j);
            let omega = self.influence.eval(bond.length, params.horizon);
            let weight = omega * system.volume[j];
            omega0 += omega;
            k += outer(xi, xi) * weight;
            moment += outer(eta, xi) * weight;
        }

        let k_inv = try_inverse(&k, SINGULAR_SHAPE_TENSOR)?;
        let f = moment * k_inv;
        if !is_finite(&f) || !(f.determinant() > JACOBIAN_FLOOR) {
            return None;
        }
        Some(DeformationGradient { f, k_inv, omega0 })
    }
}

/// Compressible Neo-Hookean first Piola-Kirchhoff stress.
///
/// ```text
/// S = G J^(−2/3) (I − tr(C)/3 · C⁻¹) + K/2 (J² − 1) C⁻¹,   P = F S
/// ```
///
/// Returns `None` for a degenerate state (collapsed `J`, singular `C`,
/// non-finite result).
pub fn first_piola_kirchhoff(f: &DMat3, params: &PointParameters) -> Option<DMat3> {
    let j = f.determinant();
    if !(j > JACOBIAN_FLOOR) {
        return None;
    }
    let c = f.transpose() * *f;
    let c_inv = try_inverse(&c, SINGULAR_SHAPE_TENSOR)?;
    let deviatoric = (DMat3::IDENTITY - c_inv * (trace(&c) / 3.0)) * (params.shear_modulus * j.powf(-2.0 / 3.0));
    let volumetric = c_inv * (params.bulk_modulus / 2.0 * (j * j - 1.0));
    let p = *f * (deviatoric + volumetric);
    is_finite(&p).then_some(p)
}

impl MaterialModel for CorrespondenceMaterial {
    fn read_halo_fields(&self) -> &'static [HaloField] {
        &[HaloField::Position]
    }

    fn write_halo_fields(&self) -> &'static [HaloField] {
        &[HaloField::ForceDensity]
    }

    fn force_density_point(
        &self,
        storage: &mut Storage,
        system: &BondSystem,
        params: &PointParameters,
        i: usize,
    ) {
        if storage.damage[i] > self.max_damage {
            storage.kill_point(system, i);
            return;
        }
        let Some(defgrad) = self.deformation_gradient(storage, system, params, i) else {
            storage.kill_point(system, i);
            return;
        };
        let Some(p) = first_piola_kirchhoff(&defgrad.f, params) else {
            storage.kill_point(system, i);
            return;
        };
        // zero stress only belongs to the exact reference configuration
        if p == DMat3::ZERO && defgrad.f != DMat3::IDENTITY {
            storage.kill_point(system, i);
            return;
        }

        let pk_inv = p * defgrad.k_inv;
        let zem_scale = self.correction_factor * params.bc / defgrad.omega0;
        let mut n_active = 0;
        for bond_id in system.each_bond_idx(i) {
            let bond = system.bonds[bond_id];
            let j = bond.neighbor;
            let xi = system.reference_diff(i, j);
            let eta = storage.current_diff(i, j);
            let stretch = (eta.length() - bond.length) / bond.length;

            if stretch > params.epsilon_c && bond.fail_permit {
                storage.bond_active[bond_id] = false;
            }
            if !storage.bond_active[bond_id] {
                continue;
            }

            let omega = self.influence.eval(bond.length, params.horizon);
            let t_stress: DVec3 = pk_inv * xi * omega;
            let t_zem = (eta - defgrad.f * xi) * (zem_scale * omega);
            let t = t_stress + t_zem;
            if !t.is_finite() {
                storage.bond_active[bond_id] = false;
                continue;
            }
            n_active += 1;
            storage.b_int[i] += t * system.volume[j];
            storage.b_int[j] -= t * system.volume[i];
        }
        storage.n_active_bonds[i] = n_active;
    }

    fn name(&self) -> &str {
        "correspondence"
    }
}
