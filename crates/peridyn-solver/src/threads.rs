//! Shared-memory transport: all chunks in one process on a rayon pool.
//!
//! An exchange runs in two phases. Packing reads the source slots of
//! every transfer while no chunk is mutated; applying then hands each
//! chunk to one worker, which writes its incoming transfers in plan
//! order. No chunk is ever written by two workers at once.

use std::collections::BTreeMap;

use peridyn_decomp::{ExchangeDirection, HaloExchange, HaloPlan};
use peridyn_io::{ExportField, FieldData};
use peridyn_material::{HaloField, Material};
use peridyn_math::DVec3;
use peridyn_types::{PeridynError, PeridynResult};
use rayon::prelude::*;

use crate::body::Body;
use crate::chunk::BodyChunk;
use crate::data_handler::{apply_transfer, assemble, ChunkExport, DataHandler, ReduceOp};
use crate::partition::Partition;

/// Thread-based data handler.
pub struct ThreadsDataHandler {
    chunks: Vec<BodyChunk>,
    material: Material,
    plan: HaloPlan,
    n_points: usize,
    n_bonds: usize,
    pool: rayon::ThreadPool,
}

impl ThreadsDataHandler {
    /// Decomposes `body` into `n_chunks` chunks, one worker thread each.
    pub fn new(body: &Body, n_chunks: usize) -> PeridynResult<Self> {
        let partition = Partition::new(body, n_chunks)?;
        Self::from_partition(body, partition)
    }

    /// Builds the chunks of an existing partition.
    pub fn from_partition(body: &Body, partition: Partition) -> PeridynResult<Self> {
        let n_chunks = partition.n_chunks();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_chunks)
            .thread_name(|i| format!("peridyn-chunk-{i}"))
            .build()
            .map_err(|e| PeridynError::Transport(format!("Cannot start worker pool: {e}")))?;

        let chunks = pool.install(|| {
            (0..n_chunks)
                .into_par_iter()
                .map(|c| BodyChunk::new(body, &partition, c))
                .collect::<PeridynResult<Vec<_>>>()
        })?;

        Ok(Self {
            chunks,
            material: *body.material(),
            n_points: partition.point_count(),
            n_bonds: partition.system.bond_count(),
            plan: partition.plan,
            pool,
        })
    }

    /// The chunks, in chunk order.
    pub fn chunks(&self) -> &[BodyChunk] {
        &self.chunks
    }

    pub fn plan(&self) -> &HaloPlan {
        &self.plan
    }
}

impl DataHandler for ThreadsDataHandler {
    fn transport(&self) -> &'static str {
        "threads"
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    fn point_count(&self) -> usize {
        self.n_points
    }

    fn bond_count(&self) -> usize {
        self.n_bonds
    }

    fn is_root(&self) -> bool {
        true
    }

    fn exchange(&mut self, field: HaloField, direction: ExchangeDirection) -> PeridynResult<()> {
        let transfers: Vec<&HaloExchange> = self.plan.select(field, direction).collect();
        if transfers.is_empty() {
            return Ok(());
        }
        let chunks = &mut self.chunks;

        self.pool.install(|| {
            let packed: Vec<Vec<DVec3>> = transfers
                .par_iter()
                .map(|ex| {
                    let src = chunks[ex.src_chunk].storage.field(field);
                    ex.src_idxs.iter().map(|&s| src[s]).collect()
                })
                .collect();

            chunks.par_iter_mut().enumerate().for_each(|(c, chunk)| {
                let dest = chunk.storage.field_mut(field);
                for (ex, values) in transfers.iter().zip(&packed) {
                    if ex.dest_chunk == c {
                        apply_transfer(dest, &ex.dest_idxs, values, direction);
                    }
                }
            });
        });
        Ok(())
    }

    fn for_each_chunk<F>(&mut self, f: F) -> PeridynResult<()>
    where
        F: Fn(&mut BodyChunk) -> PeridynResult<()> + Send + Sync,
    {
        let chunks = &mut self.chunks;
        self.pool.install(|| chunks.par_iter_mut().try_for_each(|c| f(c)))
    }

    fn reduce<F>(&mut self, op: ReduceOp, f: F) -> PeridynResult<f64>
    where
        F: Fn(&BodyChunk) -> f64 + Send + Sync,
    {
        let chunks = &self.chunks;
        let values: Vec<f64> = self.pool.install(|| chunks.par_iter().map(|c| f(c)).collect());
        Ok(op.fold(values))
    }

    fn gather(
        &mut self,
        fields: &[ExportField],
    ) -> PeridynResult<Option<BTreeMap<String, FieldData>>> {
        let parts: Vec<ChunkExport> = self
            .chunks
            .iter()
            .map(|c| ChunkExport::new(c, fields))
            .collect();
        assemble(self.n_points, fields, &parts).map(Some)
    }
}
