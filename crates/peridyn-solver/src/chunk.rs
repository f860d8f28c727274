//! Body chunk: the unit of parallel work.

use peridyn_decomp::{localize_system, ChunkHandler};
use peridyn_io::{ExportField, FieldData};
use peridyn_material::{Material, MaterialModel, ParameterSet, Storage};
use peridyn_mesh::BondSystem;
use peridyn_types::PeridynResult;

use crate::body::Body;
use crate::partition::Partition;

/// One chunk of a body: localized bonds, storage and parameters.
///
/// Owned slots of `storage` are only ever written by the worker (thread
/// or rank) holding this chunk; halo slots are written by exchanges.
#[derive(Debug, Clone)]
pub struct BodyChunk {
    pub handler: ChunkHandler,
    pub system: BondSystem,
    pub storage: Storage,
    /// Parameters of the owned points, in local order.
    pub params: ParameterSet,
    material: Material,
}

impl BodyChunk {
    /// Builds chunk `chunk` of a partitioned body.
    pub fn new(body: &Body, partition: &Partition, chunk: usize) -> PeridynResult<Self> {
        let handler = ChunkHandler::new(&partition.system, &partition.decomposition, chunk)?;
        let system = localize_system(&partition.system, &handler)?;
        let material = *body.material();
        let mut storage = material.allocate_storage(&system);
        let params = partition.params.select(handler.loc_points());

        let velocity = body.initial_velocity();
        let b_ext = body.external_force_density();
        for (local, &global) in handler.loc_points().iter().enumerate() {
            storage.velocity[local] = velocity[global];
            storage.b_ext[local] = b_ext[global];
        }

        tracing::debug!(
            chunk = %handler.chunk_id,
            owned = handler.n_loc_points,
            halo = handler.n_points() - handler.n_loc_points,
            bonds = system.bond_count(),
            "chunk built"
        );
        Ok(Self {
            handler,
            system,
            storage,
            params,
            material,
        })
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Recomputes the internal force density of the owned points.
    pub fn compute_force_density(&mut self) {
        self.material
            .force_density(&mut self.storage, &self.system, &self.params);
    }

    /// Recomputes the damage of the owned points.
    pub fn update_damage(&mut self) {
        self.storage.update_damage(&self.system);
    }

    /// Largest stable step over the owned points.
    ///
    /// Per point `Δt = sqrt(2ρ / Σ_j V_j · c / L_j)` over the active bonds.
    /// Points without active bonds impose no limit.
    pub fn stable_timestep(&self) -> f64 {
        let mut dt = f64::INFINITY;
        for i in 0..self.handler.n_loc_points {
            let params = self.params.get(i);
            let mut stiffness = 0.0;
            for bond_id in self.system.each_bond_idx(i) {
                if self.storage.bond_active[bond_id] {
                    let bond = &self.system.bonds[bond_id];
                    stiffness += self.system.volume[bond.neighbor] * params.bc / bond.length;
                }
            }
            if stiffness > 0.0 {
                dt = dt.min((2.0 * params.rho / stiffness).sqrt());
            }
        }
        dt
    }

    /// Kinetic energy `Σ ½ ρ V |v|²` of the owned points.
    pub fn kinetic_energy(&self) -> f64 {
        (0..self.handler.n_loc_points)
            .map(|i| {
                0.5 * self.params.get(i).rho
                    * self.system.volume[i]
                    * self.storage.velocity[i].length_squared()
            })
            .sum()
    }

    /// Largest owned damage.
    pub fn max_damage(&self) -> f64 {
        self.storage.damage.iter().copied().fold(0.0, f64::max)
    }

    /// Sum of owned damage values.
    pub fn damage_sum(&self) -> f64 {
        self.storage.damage.iter().sum()
    }

    /// Number of owned bonds no longer carrying force.
    pub fn broken_bonds(&self) -> usize {
        self.storage.bond_active.iter().filter(|&&active| !active).count()
    }

    /// Owned values of an export field, in local order.
    pub fn export_field(&self, field: ExportField) -> FieldData {
        let n = self.handler.n_loc_points;
        let s = &self.storage;
        let vectors = match field {
            ExportField::Damage => return FieldData::Scalar(s.damage.clone()),
            ExportField::Position => &s.position[..n],
            ExportField::Displacement => &s.displacement[..],
            ExportField::Velocity => &s.velocity[..],
            ExportField::Acceleration => &s.acceleration[..],
            ExportField::BInt => &s.b_int[..n],
            ExportField::BExt => &s.b_ext[..],
        };
        FieldData::Vector(vectors.iter().map(|v| v.to_array()).collect())
    }
}
