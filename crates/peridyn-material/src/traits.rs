//! Material model trait: the contract every force kernel satisfies.
//!
//! The time solver and data handlers only talk to materials through
//! this trait, so a new formulation plugs in by implementing it and
//! adding a variant to [`Material`](crate::Material).

use peridyn_mesh::BondSystem;
use peridyn_types::PeridynResult;
use serde::{Deserialize, Serialize};

use crate::parameters::{ParameterSet, PointParameters};
use crate::properties::MaterialProperties;
use crate::storage::Storage;

/// A vector field that can be moved between chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HaloField {
    /// Current position. Flows owner → halo.
    Position,
    /// Internal force density. Flows halo → owner and is summed.
    ForceDensity,
}

impl HaloField {
    /// Stable numeric tag used in transport messages.
    pub fn tag(self) -> u32 {
        match self {
            HaloField::Position => 1,
            HaloField::ForceDensity => 2,
        }
    }
}

/// Discretization a material needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SystemKind {
    /// Pairwise bonds within the horizon.
    Bonds,
}

/// Trait for peridynamic material models.
///
/// Per time step the data handler calls, for every chunk:
///
/// ```text
/// exchange(read_halo_fields, owner → halo)
/// material.force_density(storage, system, params)
/// exchange(write_halo_fields, halo → owner, summed)
/// ```
pub trait MaterialModel: Send + Sync {
    /// Derives point parameters from raw properties.
    fn point_parameters(&self, props: &MaterialProperties) -> PeridynResult<PointParameters> {
        PointParameters::from_properties(props)
    }

    /// The discretization this material computes on.
    fn system_kind(&self) -> SystemKind {
        SystemKind::Bonds
    }

    /// Allocates the storage for one chunk.
    fn allocate_storage(&self, system: &BondSystem) -> Storage {
        Storage::new(system)
    }

    /// Fields the kernel reads on halo points.
    fn read_halo_fields(&self) -> &'static [HaloField];

    /// Fields the kernel writes on halo points; owners sum them.
    fn write_halo_fields(&self) -> &'static [HaloField];

    /// Adds the internal force density contributions of owned point `i`.
    fn force_density_point(
        &self,
        storage: &mut Storage,
        system: &BondSystem,
        params: &PointParameters,
        i: usize,
    );

    /// Computes the internal force density of a whole chunk.
    ///
    /// `params` maps owned points to their region.
    fn force_density(&self, storage: &mut Storage, system: &BondSystem, params: &ParameterSet) {
        storage.reset_b_int();
        for i in 0..system.owned_count() {
            self.force_density_point(storage, system, params.get(i), i);
        }
    }

    /// Returns the name of this material model.
    fn name(&self) -> &str;
}
