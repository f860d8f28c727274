//! Strongly-typed identifiers.
//!
//! Global point ids and chunk-local slot indices stay plain `usize`;
//! chunks get a newtype so they are never mixed up with either.

use serde::{Deserialize, Serialize};

/// Index of a chunk (one thread worker or one distributed rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub u32);

impl ChunkId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ChunkId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk {}", self.0)
    }
}
