//! Halo exchange planning.
//!
//! Planned once at setup. For every chunk A holding halo copies of points
//! owned by chunk B, each field the material reads produces a transfer
//! B → A (copy owner values into the halo), and each field it writes
//! produces a transfer A → B (sum halo contributions into the owner).
//!
//! Exchanges are stored consumer-major, then by owner, both ascending.
//! Data handlers apply them in this order, which fixes the summation
//! order of write fields independently of the transport.

use peridyn_material::HaloField;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

use crate::chunk_handler::ChunkHandler;

/// Direction of a halo transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeDirection {
    /// Owner values overwrite halo copies.
    LocToHalo,
    /// Halo contributions are added to the owner values.
    HaloToLoc,
}

/// One planned transfer of a field between two chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaloExchange {
    pub field: HaloField,
    pub direction: ExchangeDirection,
    pub src_chunk: usize,
    pub dest_chunk: usize,
    /// Local slots read in the source chunk.
    pub src_idxs: Vec<usize>,
    /// Local slots written in the destination chunk, paired with `src_idxs`.
    pub dest_idxs: Vec<usize>,
}

impl HaloExchange {
    /// Message tag of this transfer (unique per field and direction).
    pub fn tag(&self) -> u32 {
        let dir = match self.direction {
            ExchangeDirection::LocToHalo => 0,
            ExchangeDirection::HaloToLoc => 1,
        };
        self.field.tag() * 2 + dir
    }
}

/// All transfers of a decomposed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaloPlan {
    pub exchanges: Vec<HaloExchange>,
}

impl HaloPlan {
    /// Plans the transfers for the given read and write field sets.
    ///
    /// `handlers[c]` must be the handler of chunk `c`.
    pub fn build(
        handlers: &[ChunkHandler],
        read_fields: &[HaloField],
        write_fields: &[HaloField],
    ) -> PeridynResult<Self> {
        let mut exchanges = Vec::new();
        for (consumer, handler) in handlers.iter().enumerate() {
            for (&owner, halo_idxs) in &handler.halo_by_owner {
                let owner_handler = handlers.get(owner).ok_or_else(|| {
                    PeridynError::Decomposition(format!(
                        "Halo of chunk {consumer} refers to missing chunk {owner}"
                    ))
                })?;
                let owner_idxs = halo_idxs
                    .iter()
                    .map(|&h| {
                        let global = handler.global(h);
                        owner_handler
                            .local(global)
                            .filter(|&l| owner_handler.is_owned(l))
                            .ok_or_else(|| {
                                PeridynError::Decomposition(format!(
                                    "Point {global} is not owned by chunk {owner}"
                                ))
                            })
                    })
                    .collect::<PeridynResult<Vec<usize>>>()?;

                for &field in read_fields {
                    exchanges.push(HaloExchange {
                        field,
                        direction: ExchangeDirection::LocToHalo,
                        src_chunk: owner,
                        dest_chunk: consumer,
                        src_idxs: owner_idxs.clone(),
                        dest_idxs: halo_idxs.clone(),
                    });
                }
                for &field in write_fields {
                    exchanges.push(HaloExchange {
                        field,
                        direction: ExchangeDirection::HaloToLoc,
                        src_chunk: consumer,
                        dest_chunk: owner,
                        src_idxs: halo_idxs.clone(),
                        dest_idxs: owner_idxs.clone(),
                    });
                }
            }
        }
        tracing::debug!(
            chunks = handlers.len(),
            exchanges = exchanges.len(),
            "halo plan built"
        );
        Ok(Self { exchanges })
    }

    /// Transfers of one field in one direction, in plan order.
    pub fn select(
        &self,
        field: HaloField,
        direction: ExchangeDirection,
    ) -> impl Iterator<Item = &HaloExchange> {
        self.exchanges
            .iter()
            .filter(move |ex| ex.field == field && ex.direction == direction)
    }

    /// Transfers a chunk sends, in plan order.
    pub fn outgoing(
        &self,
        chunk: usize,
        field: HaloField,
        direction: ExchangeDirection,
    ) -> impl Iterator<Item = &HaloExchange> {
        self.select(field, direction).filter(move |ex| ex.src_chunk == chunk)
    }

    /// Transfers a chunk receives, in plan order.
    pub fn incoming(
        &self,
        chunk: usize,
        field: HaloField,
        direction: ExchangeDirection,
    ) -> impl Iterator<Item = &HaloExchange> {
        self.select(field, direction).filter(move |ex| ex.dest_chunk == chunk)
    }

    /// Number of values moved per step, summed over all transfers.
    pub fn volume(&self) -> usize {
        self.exchanges.iter().map(|ex| ex.src_idxs.len()).sum()
    }
}
