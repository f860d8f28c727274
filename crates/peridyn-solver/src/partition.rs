//! Setup shared by all data handlers.

use peridyn_decomp::{decompose, ChunkHandler, Decomposition, HaloPlan};
use peridyn_material::{MaterialModel, ParameterSet};
use peridyn_mesh::BondSystem;
use peridyn_types::PeridynResult;

use crate::body::Body;

/// A body's global discretization split into chunks.
///
/// Built once per job and read-only afterwards. Every transport derives
/// its chunks and halo traffic from the same partition, which is what
/// makes their trajectories identical.
#[derive(Debug, Clone)]
pub struct Partition {
    pub params: ParameterSet,
    pub system: BondSystem,
    pub decomposition: Decomposition,
    pub plan: HaloPlan,
}

impl Partition {
    /// Discretizes and decomposes `body` into `n_chunks` chunks.
    pub fn new(body: &Body, n_chunks: usize) -> PeridynResult<Self> {
        let params = body.parameters()?;
        let system = body.bond_system(&params)?;
        let decomposition = decompose(&system.position, n_chunks)?;
        Self::from_decomposition(body, params, system, decomposition)
    }

    /// Uses an explicit decomposition.
    pub fn from_decomposition(
        body: &Body,
        params: ParameterSet,
        system: BondSystem,
        decomposition: Decomposition,
    ) -> PeridynResult<Self> {
        let handlers = (0..decomposition.n_chunks())
            .map(|c| ChunkHandler::new(&system, &decomposition, c))
            .collect::<PeridynResult<Vec<_>>>()?;
        let material = body.material();
        let plan = HaloPlan::build(
            &handlers,
            material.read_halo_fields(),
            material.write_halo_fields(),
        )?;

        let (min, max) = decomposition.load_range();
        tracing::info!(
            body = body.name(),
            points = system.owned_count(),
            bonds = system.bond_count(),
            chunks = decomposition.n_chunks(),
            min_points = min,
            max_points = max,
            halo_values = plan.volume(),
            "body partitioned"
        );
        Ok(Self {
            params,
            system,
            decomposition,
            plan,
        })
    }

    #[inline]
    pub fn n_chunks(&self) -> usize {
        self.decomposition.n_chunks()
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.system.owned_count()
    }
}
