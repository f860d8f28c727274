//! Domain decomposition by recursive coordinate bisection.
//!
//! The point set is split along the axis of largest extent into two groups
//! whose sizes are proportional to the number of chunks each side receives;
//! each group is split again until one group per chunk remains. The result
//! is a k-d tree whose leaves are the chunks: spatially compact chunks keep
//! the bond cut low, and the proportional split keeps every chunk within
//! one point of `N/P`.
//!
//! Ties along the split axis are broken by point index, so identical input
//! always produces an identical decomposition.

use peridyn_math::DVec3;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

/// Assignment of every point to exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Owning chunk of each global point.
    pub chunk_of: Vec<usize>,
    /// Owned global points of each chunk, ascending.
    pub chunks: Vec<Vec<usize>>,
}

impl Decomposition {
    /// Builds a decomposition from an explicit assignment.
    ///
    /// Every chunk in `0..n_chunks` must own at least one point.
    pub fn from_assignment(chunk_of: Vec<usize>, n_chunks: usize) -> PeridynResult<Self> {
        if n_chunks == 0 {
            return Err(PeridynError::Decomposition(
                "At least one chunk is required".into(),
            ));
        }
        let mut chunks = vec![Vec::new(); n_chunks];
        for (point, &chunk) in chunk_of.iter().enumerate() {
            let owned = chunks.get_mut(chunk).ok_or_else(|| {
                PeridynError::Decomposition(format!(
                    "Point {point} assigned to chunk {chunk} (chunk count: {n_chunks})"
                ))
            })?;
            owned.push(point);
        }
        if let Some(empty) = chunks.iter().position(Vec::is_empty) {
            return Err(PeridynError::Decomposition(format!(
                "Chunk {empty} owns no points"
            )));
        }
        Ok(Self { chunk_of, chunks })
    }

    /// Number of chunks.
    #[inline]
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Number of decomposed points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.chunk_of.len()
    }

    /// Smallest and largest owned-point count over all chunks.
    pub fn load_range(&self) -> (usize, usize) {
        let sizes = self.chunks.iter().map(Vec::len);
        (sizes.clone().min().unwrap_or(0), sizes.max().unwrap_or(0))
    }
}

/// Partitions `positions` into `n_chunks` spatially compact chunks.
///
/// Fails if `n_chunks` is zero or exceeds the number of points.
pub fn decompose(positions: &[DVec3], n_chunks: usize) -> PeridynResult<Decomposition> {
    let n = positions.len();
    if n_chunks == 0 {
        return Err(PeridynError::Decomposition(
            "At least one chunk is required".into(),
        ));
    }
    if n_chunks > n {
        return Err(PeridynError::Decomposition(format!(
            "Cannot split {n} points into {n_chunks} chunks"
        )));
    }

    let mut chunk_of = vec![0; n];
    bisect(positions, (0..n).collect(), n_chunks, 0, &mut chunk_of);
    let decomposition = Decomposition::from_assignment(chunk_of, n_chunks)?;

    let (min, max) = decomposition.load_range();
    tracing::debug!(points = n, chunks = n_chunks, min, max, "domain decomposed");
    Ok(decomposition)
}

fn bisect(
    positions: &[DVec3],
    mut ids: Vec<usize>,
    n_parts: usize,
    first_chunk: usize,
    chunk_of: &mut [usize],
) {
    if n_parts == 1 {
        for id in ids {
            chunk_of[id] = first_chunk;
        }
        return;
    }

    let axis = longest_axis(positions, &ids);
    ids.sort_by(|&a, &b| {
        positions[a][axis]
            .total_cmp(&positions[b][axis])
            .then(a.cmp(&b))
    });

    // len >= n_parts guarantees both halves can feed their chunks.
    let left_parts = n_parts / 2;
    let split = ids.len() * left_parts / n_parts;
    let right = ids.split_off(split);
    bisect(positions, ids, left_parts, first_chunk, chunk_of);
    bisect(positions, right, n_parts - left_parts, first_chunk + left_parts, chunk_of);
}

fn longest_axis(positions: &[DVec3], ids: &[usize]) -> usize {
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for &id in ids {
        min = min.min(positions[id]);
        max = max.max(positions[id]);
    }
    let extent = max - min;
    if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    }
}
