//! Bond-based peridynamics (prototype microelastic brittle material).
//!
//! Each bond acts as a linear spring along its current direction:
//! `b_i += bc · ε / l · (x_j − x_i) · V_j`. The paired bond j→i owned by
//! the neighbor produces the opposite force, so only the owner is updated
//! and nothing is written to halo points.

use peridyn_mesh::BondSystem;
use peridyn_types::constants::DEFAULT_POISSON_RATIO;
use peridyn_types::PeridynResult;
use serde::{Deserialize, Serialize};

use crate::parameters::PointParameters;
use crate::properties::MaterialProperties;
use crate::storage::Storage;
use crate::traits::{HaloField, MaterialModel};

/// Bond-based material. Its Poisson ratio is fixed at 1/4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BondBasedMaterial;

impl BondBasedMaterial {
    /// Creates a new bond-based material.
    pub fn new() -> Self {
        Self
    }
}

impl MaterialModel for BondBasedMaterial {
    fn point_parameters(&self, props: &MaterialProperties) -> PeridynResult<PointParameters> {
        let mut props = props.clone();
        if props.poisson_ratio != DEFAULT_POISSON_RATIO {
            tracing::warn!(
                given = props.poisson_ratio,
                "bond-based material ignores the Poisson ratio and uses 1/4"
            );
            props.poisson_ratio = DEFAULT_POISSON_RATIO;
        }
        PointParameters::from_properties(&props)
    }

    fn read_halo_fields(&self) -> &'static [HaloField] {
        &[HaloField::Position]
    }

    fn write_halo_fields(&self) -> &'static [HaloField] {
        &[]
    }

    fn force_density_point(
        &self,
        storage: &mut Storage,
        system: &BondSystem,
        params: &PointParameters,
        i: usize,
    ) {
        let mut n_active = 0;
        for bond_id in system.each_bond_idx(i) {
            let bond = system.bonds[bond_id];
            let j = bond.neighbor;
            let dx = storage.current_diff(i, j);
            let l = dx.length();
            let stretch = (l - bond.length) / bond.length;

            if stretch > params.epsilon_c && bond.fail_permit {
                storage.bond_active[bond_id] = false;
            }
            if !storage.bond_active[bond_id] {
                continue;
            }

            let force = dx * (params.bc * stretch / l);
            if !force.is_finite() {
                storage.bond_active[bond_id] = false;
                continue;
            }
            n_active += 1;
            storage.b_int[i] += force * system.volume[j];
        }
        storage.n_active_bonds[i] = n_active;
    }

    fn name(&self) -> &str {
        "bond_based"
    }
}
