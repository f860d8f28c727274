//! User-supplied physical properties of a material region.
//!
//! These are the raw inputs (horizon, density, elastic and fracture
//! constants). They are validated and turned into
//! [`PointParameters`](crate::parameters::PointParameters) once, at setup.

use peridyn_types::constants::DEFAULT_POISSON_RATIO;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

/// Fracture input for a material region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fracture {
    /// Critical energy release rate `Gc`.
    Energy(f64),
    /// Critical bond stretch `εc`.
    CriticalStretch(f64),
    /// Bonds never break.
    None,
}

/// Physical properties of one material region.
///
/// | Field | Symbol | Constraint |
/// |---|---|---|
/// | `horizon` | δ | > 0 |
/// | `density` | ρ | > 0 |
/// | `youngs_modulus` | E | > 0 |
/// | `poisson_ratio` | ν | −1 < ν < 0.5 |
/// | `fracture` | Gc or εc | > 0 |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Horizon radius δ.
    pub horizon: f64,
    /// Mass density ρ.
    pub density: f64,
    /// Young's modulus E.
    pub youngs_modulus: f64,
    /// Poisson ratio ν.
    #[serde(default = "default_poisson_ratio")]
    pub poisson_ratio: f64,
    /// Fracture parameter.
    pub fracture: Fracture,
}

fn default_poisson_ratio() -> f64 {
    DEFAULT_POISSON_RATIO
}

impl MaterialProperties {
    /// Creates properties with the default Poisson ratio and no fracture.
    pub fn new(horizon: f64, density: f64, youngs_modulus: f64) -> Self {
        Self {
            horizon,
            density,
            youngs_modulus,
            poisson_ratio: DEFAULT_POISSON_RATIO,
            fracture: Fracture::None,
        }
    }

    /// Sets the Poisson ratio.
    pub fn with_poisson_ratio(mut self, nu: f64) -> Self {
        self.poisson_ratio = nu;
        self
    }

    /// Sets the critical energy release rate.
    pub fn with_fracture_energy(mut self, gc: f64) -> Self {
        self.fracture = Fracture::Energy(gc);
        self
    }

    /// Sets the critical bond stretch.
    pub fn with_critical_stretch(mut self, epsilon_c: f64) -> Self {
        self.fracture = Fracture::CriticalStretch(epsilon_c);
        self
    }

    /// Validates the physical ranges of all properties.
    pub fn validate(&self) -> PeridynResult<()> {
        positive("horizon", self.horizon)?;
        positive("density", self.density)?;
        positive("youngs_modulus", self.youngs_modulus)?;
        let nu = self.poisson_ratio;
        if !(nu.is_finite() && nu > -1.0 && nu < 0.5) {
            return Err(PeridynError::InvalidMaterial(format!(
                "poisson_ratio must lie in (-1, 0.5), got {nu}"
            )));
        }
        match self.fracture {
            Fracture::Energy(gc) => positive("fracture energy", gc),
            Fracture::CriticalStretch(eps) => positive("critical stretch", eps),
            Fracture::None => Ok(()),
        }
    }
}

fn positive(name: &str, value: f64) -> PeridynResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PeridynError::InvalidMaterial(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
