//! Derived per-region constants.
//!
//! Elastic constants follow the isotropic relations
//! `G = E/(2(1+ν))`, `K = E/(3(1−2ν))`, `λ = Eν/((1+ν)(1−2ν))`.
//! The bond constant is `bc = 18K/(πδ⁴)` and the fracture energy and
//! critical stretch are linked by `εc = √(5Gc / (9Kδ))` (3D).

use std::f64::consts::PI;

use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

use crate::properties::{Fracture, MaterialProperties};

/// Immutable physical constants of one material region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointParameters {
    /// Horizon δ.
    pub horizon: f64,
    /// Density ρ.
    pub rho: f64,
    /// Young's modulus E.
    pub youngs_modulus: f64,
    /// Poisson ratio ν.
    pub nu: f64,
    /// Shear modulus G (= μ).
    pub shear_modulus: f64,
    /// Bulk modulus K.
    pub bulk_modulus: f64,
    /// First Lamé parameter λ.
    pub lambda: f64,
    /// Critical energy release rate (infinite when bonds never fail).
    pub gc: f64,
    /// Critical stretch (infinite when bonds never fail).
    pub epsilon_c: f64,
    /// Bond constant `18K/(πδ⁴)`.
    pub bc: f64,
}

impl PointParameters {
    /// Derives the parameters from validated properties.
    pub fn from_properties(props: &MaterialProperties) -> PeridynResult<Self> {
        props.validate()?;
        let e = props.youngs_modulus;
        let nu = props.poisson_ratio;
        let delta = props.horizon;

        let shear_modulus = e / (2.0 * (1.0 + nu));
        let bulk_modulus = e / (3.0 * (1.0 - 2.0 * nu));
        let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let bc = 18.0 * bulk_modulus / (PI * delta.powi(4));

        let (gc, epsilon_c) = match props.fracture {
            Fracture::Energy(gc) => (gc, (5.0 * gc / (9.0 * bulk_modulus * delta)).sqrt()),
            Fracture::CriticalStretch(eps) => (9.0 / 5.0 * bulk_modulus * delta * eps * eps, eps),
            Fracture::None => (f64::INFINITY, f64::INFINITY),
        };

        let params = Self {
            horizon: delta,
            rho: props.density,
            youngs_modulus: e,
            nu,
            shear_modulus,
            bulk_modulus,
            lambda,
            gc,
            epsilon_c,
            bc,
        };
        if !(params.bc.is_finite() && params.bulk_modulus.is_finite()) {
            return Err(PeridynError::InvalidMaterial(format!(
                "Derived constants are not finite for {props:?}"
            )));
        }
        Ok(params)
    }
}

/// Parameter regions and the region of every point.
///
/// A body usually has a single region; point sets may override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Distinct parameter regions.
    pub regions: Vec<PointParameters>,
    /// Region index of each point.
    pub point_map: Vec<usize>,
}

impl ParameterSet {
    /// A single region shared by `n_points` points.
    pub fn uniform(params: PointParameters, n_points: usize) -> Self {
        Self {
            regions: vec![params],
            point_map: vec![0; n_points],
        }
    }

    /// Parameters of point `i`.
    #[inline]
    pub fn get(&self, i: usize) -> &PointParameters {
        &self.regions[self.point_map[i]]
    }

    /// Restricts the map to a subset of points (in the given order).
    pub fn select(&self, points: &[usize]) -> Self {
        Self {
            regions: self.regions.clone(),
            point_map: points.iter().map(|&p| self.point_map[p]).collect(),
        }
    }
}
