//! # peridyn-material
//!
//! Material model contract, per-chunk storage, and force kernels.
//!
//! ## Design
//!
//! The [`MaterialModel`] trait is the capability interface every
//! formulation implements: parameter derivation, storage allocation,
//! halo field declarations, and the per-point force density kernel.
//! A body selects its formulation once through the tagged [`Material`]
//! enum, which dispatches to the concrete model.

pub mod bond_based;
pub mod correspondence;
pub mod parameters;
pub mod properties;
pub mod storage;
pub mod traits;

pub use bond_based::BondBasedMaterial;
pub use correspondence::{CorrespondenceMaterial, InfluenceFunction};
pub use parameters::{ParameterSet, PointParameters};
pub use properties::{Fracture, MaterialProperties};
pub use storage::Storage;
pub use traits::{HaloField, MaterialModel, SystemKind};

use peridyn_mesh::BondSystem;
use peridyn_types::PeridynResult;
use serde::{Deserialize, Serialize};

/// The material formulation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Bond-based peridynamics.
    BondBased(BondBasedMaterial),
    /// Correspondence formulation.
    Correspondence(CorrespondenceMaterial),
}

impl Material {
    /// Validates formulation-specific settings.
    pub fn validate(&self) -> PeridynResult<()> {
        match self {
            Material::BondBased(_) => Ok(()),
            Material::Correspondence(m) => m.validate(),
        }
    }

    fn model(&self) -> &dyn MaterialModel {
        match self {
            Material::BondBased(m) => m,
            Material::Correspondence(m) => m,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Correspondence(CorrespondenceMaterial::default())
    }
}

impl MaterialModel for Material {
    fn point_parameters(&self, props: &MaterialProperties) -> PeridynResult<PointParameters> {
        self.model().point_parameters(props)
    }

    fn system_kind(&self) -> SystemKind {
        self.model().system_kind()
    }

    fn allocate_storage(&self, system: &BondSystem) -> Storage {
        self.model().allocate_storage(system)
    }

    fn read_halo_fields(&self) -> &'static [HaloField] {
        self.model().read_halo_fields()
    }

    fn write_halo_fields(&self) -> &'static [HaloField] {
        self.model().write_halo_fields()
    }

    fn force_density_point(
        &self,
        storage: &mut Storage,
        system: &BondSystem,
        params: &PointParameters,
        i: usize,
    ) {
        self.model().force_density_point(storage, system, params, i);
    }

    fn name(&self) -> &str {
        self.model().name()
    }
}
