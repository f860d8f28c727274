//! Per-chunk index translation.
//!
//! A chunk stores its owned points first (in global order), followed by
//! its halo: every point owned elsewhere that an owned point's bonds
//! reference. Local slot `k < n_loc_points` is owned, the rest are halo.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use peridyn_mesh::{Bond, BondSystem};
use peridyn_types::{ChunkId, PeridynError, PeridynResult};

use crate::decomposer::Decomposition;

/// Global ↔ local index maps of one chunk. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ChunkHandler {
    /// This chunk.
    pub chunk_id: ChunkId,
    /// Number of owned points.
    pub n_loc_points: usize,
    /// Global ids of all local slots: owned, then halo.
    pub point_ids: Vec<usize>,
    /// Local halo slots grouped by the chunk that owns them.
    pub halo_by_owner: BTreeMap<usize, Vec<usize>>,
    localizer: HashMap<usize, usize>,
}

impl ChunkHandler {
    /// Builds the handler of chunk `chunk` from the global bond system.
    pub fn new(
        system: &BondSystem,
        decomposition: &Decomposition,
        chunk: usize,
    ) -> PeridynResult<Self> {
        if decomposition.point_count() != system.owned_count() {
            return Err(PeridynError::Decomposition(format!(
                "Decomposition covers {} points, bond system has {}",
                decomposition.point_count(),
                system.owned_count()
            )));
        }
        let loc_points = decomposition.chunks.get(chunk).ok_or_else(|| {
            PeridynError::Decomposition(format!(
                "Chunk {chunk} does not exist (chunk count: {})",
                decomposition.n_chunks()
            ))
        })?;

        let halo: BTreeSet<usize> = loc_points
            .iter()
            .flat_map(|&i| system.bonds[system.each_bond_idx(i)].iter().map(|b| b.neighbor))
            .filter(|&j| decomposition.chunk_of[j] != chunk)
            .collect();

        let n_loc_points = loc_points.len();
        let mut point_ids = Vec::with_capacity(n_loc_points + halo.len());
        point_ids.extend_from_slice(loc_points);
        point_ids.extend(halo.iter().copied());

        let localizer: HashMap<usize, usize> = point_ids
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();

        let mut halo_by_owner: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (local, &global) in point_ids.iter().enumerate().skip(n_loc_points) {
            halo_by_owner
                .entry(decomposition.chunk_of[global])
                .or_default()
                .push(local);
        }

        Ok(Self {
            chunk_id: ChunkId(chunk as u32),
            n_loc_points,
            point_ids,
            halo_by_owner,
            localizer,
        })
    }

    /// Owned global ids, in global order.
    #[inline]
    pub fn loc_points(&self) -> &[usize] {
        &self.point_ids[..self.n_loc_points]
    }

    /// Halo global ids, ascending.
    #[inline]
    pub fn halo_points(&self) -> &[usize] {
        &self.point_ids[self.n_loc_points..]
    }

    /// Number of local slots (owned + halo).
    #[inline]
    pub fn n_points(&self) -> usize {
        self.point_ids.len()
    }

    /// Local slot of a global point, if the chunk references it.
    #[inline]
    pub fn local(&self, global: usize) -> Option<usize> {
        self.localizer.get(&global).copied()
    }

    /// Global id of a local slot.
    #[inline]
    pub fn global(&self, local: usize) -> usize {
        self.point_ids[local]
    }

    /// Whether a local slot is owned by this chunk.
    #[inline]
    pub fn is_owned(&self, local: usize) -> bool {
        local < self.n_loc_points
    }
}

/// Restricts a global bond system to one chunk, in local indices.
///
/// Only owned points carry bonds; positions and volumes cover every
/// local slot.
pub fn localize_system(global: &BondSystem, handler: &ChunkHandler) -> PeridynResult<BondSystem> {
    let position = handler.point_ids.iter().map(|&g| global.position[g]).collect();
    let volume = handler.point_ids.iter().map(|&g| global.volume[g]).collect();

    let mut bond_lists = Vec::with_capacity(handler.n_loc_points);
    for &i in handler.loc_points() {
        let mut bonds = Vec::with_capacity(global.n_neighbors[i]);
        for bond in &global.bonds[global.each_bond_idx(i)] {
            let neighbor = handler.local(bond.neighbor).ok_or_else(|| {
                PeridynError::Decomposition(format!(
                    "Neighbor {} of point {i} missing from the halo of {}",
                    bond.neighbor, handler.chunk_id
                ))
            })?;
            bonds.push(Bond { neighbor, ..*bond });
        }
        bond_lists.push(bonds);
    }
    Ok(BondSystem::from_bond_lists(position, volume, bond_lists))
}
