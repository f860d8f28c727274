//! Distributed transport: one chunk per rank.
//!
//! Every rank holds the shared partition but builds only its own chunk.
//! An exchange first posts all outgoing transfers of the field, then
//! receives the incoming ones in plan order, so the owner-side sums are
//! performed in the same order as in the thread transport.

use std::collections::BTreeMap;

use peridyn_decomp::{ExchangeDirection, HaloPlan};
use peridyn_io::{ExportField, FieldData};
use peridyn_material::{HaloField, Material};
use peridyn_math::DVec3;
use peridyn_types::{PeridynError, PeridynResult};

use crate::body::Body;
use crate::chunk::BodyChunk;
use crate::comm::{Communicator, GATHER_TAG};
use crate::data_handler::{apply_transfer, assemble, ChunkExport, DataHandler, ReduceOp};
use crate::partition::Partition;

/// Rank that gathers exports and results.
pub const ROOT: usize = 0;

/// Distributed data handler over any [`Communicator`].
pub struct DistributedDataHandler<C: Communicator> {
    comm: C,
    chunk: BodyChunk,
    plan: HaloPlan,
    n_points: usize,
    n_bonds: usize,
}

impl<C: Communicator> DistributedDataHandler<C> {
    /// Builds this rank's chunk. The partition must have one chunk per rank.
    pub fn new(comm: C, body: &Body, partition: &Partition) -> PeridynResult<Self> {
        if comm.size() != partition.n_chunks() {
            return Err(PeridynError::Transport(format!(
                "{} ranks cannot run a decomposition into {} chunks",
                comm.size(),
                partition.n_chunks()
            )));
        }
        let chunk = BodyChunk::new(body, partition, comm.rank())?;
        Ok(Self {
            comm,
            chunk,
            plan: partition.plan.clone(),
            n_points: partition.point_count(),
            n_bonds: partition.system.bond_count(),
        })
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// This rank's chunk.
    pub fn chunk(&self) -> &BodyChunk {
        &self.chunk
    }

    /// Gives back the communicator.
    pub fn into_comm(self) -> C {
        self.comm
    }
}

impl<C: Communicator> DataHandler for DistributedDataHandler<C> {
    fn transport(&self) -> &'static str {
        "distributed"
    }

    fn material(&self) -> &Material {
        self.chunk.material()
    }

    fn n_chunks(&self) -> usize {
        self.comm.size()
    }

    fn point_count(&self) -> usize {
        self.n_points
    }

    fn bond_count(&self) -> usize {
        self.n_bonds
    }

    fn is_root(&self) -> bool {
        self.comm.rank() == ROOT
    }

    fn exchange(&mut self, field: HaloField, direction: ExchangeDirection) -> PeridynResult<()> {
        let rank = self.comm.rank();
        let src = self.chunk.storage.field(field);
        for ex in self.plan.outgoing(rank, field, direction) {
            let data = ex
                .src_idxs
                .iter()
                .flat_map(|&s| src[s].to_array())
                .collect();
            self.comm.send(ex.dest_chunk, ex.tag(), data)?;
        }

        for ex in self.plan.incoming(rank, field, direction) {
            let data = self.comm.recv(ex.src_chunk, ex.tag())?;
            if data.len() != 3 * ex.dest_idxs.len() {
                return Err(PeridynError::Transport(format!(
                    "Rank {rank}: {field:?} message from rank {} has {} values, expected {}",
                    ex.src_chunk,
                    data.len(),
                    3 * ex.dest_idxs.len()
                )));
            }
            let values: Vec<DVec3> = data.chunks_exact(3).map(DVec3::from_slice).collect();
            let dest = self.chunk.storage.field_mut(field);
            apply_transfer(dest, &ex.dest_idxs, &values, direction);
        }
        Ok(())
    }

    fn for_each_chunk<F>(&mut self, f: F) -> PeridynResult<()>
    where
        F: Fn(&mut BodyChunk) -> PeridynResult<()> + Send + Sync,
    {
        f(&mut self.chunk)
    }

    fn reduce<F>(&mut self, op: ReduceOp, f: F) -> PeridynResult<f64>
    where
        F: Fn(&BodyChunk) -> f64 + Send + Sync,
    {
        let local = f(&self.chunk);
        self.comm.all_reduce(local, op)
    }

    fn gather(
        &mut self,
        fields: &[ExportField],
    ) -> PeridynResult<Option<BTreeMap<String, FieldData>>> {
        let local = ChunkExport::new(&self.chunk, fields);
        if !self.is_root() {
            self.comm.send(ROOT, GATHER_TAG, local.encode())?;
            return Ok(None);
        }
        let mut parts = Vec::with_capacity(self.comm.size());
        parts.push(local);
        for src in 1..self.comm.size() {
            let buf = self.comm.recv(src, GATHER_TAG)?;
            parts.push(ChunkExport::decode(&buf, fields)?);
        }
        assemble(self.n_points, fields, &parts).map(Some)
    }
}
