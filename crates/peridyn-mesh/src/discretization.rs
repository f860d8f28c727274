//! Bond discretization: the neighbor graph within a horizon.
//!
//! Every point owns one bond to each neighbor inside its horizon, so a
//! pair of points is connected by two directed bonds (i→j owned by i,
//! j→i owned by j). Force kernels process each owned bond once; state
//! based kernels apply the bond force to both endpoints.
//!
//! Neighbor search uses an R-tree over the reference positions.

use std::ops::Range;

use peridyn_math::DVec3;
use peridyn_types::constants::MIN_BOND_LENGTH;
use peridyn_types::{PeridynError, PeridynResult};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::point_cloud::PointCloud;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// A directed bond from its owning point to `neighbor`.
///
/// The owner is implied by the bond range it lives in
/// (see [`BondSystem::each_bond_idx`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    /// Index of the neighbor point (global, or chunk-local once localized).
    pub neighbor: usize,
    /// Reference length, always > 0.
    pub length: f64,
    /// Whether this bond may break.
    pub fail_permit: bool,
}

/// Bonds grouped per owning point.
///
/// `position` and `volume` cover every point a bond may reference; the
/// bond ranges cover only the owning points, which come first. For a
/// whole body both sets coincide. For a chunk, owned points are followed
/// by halo points.
#[derive(Debug, Clone)]
pub struct BondSystem {
    /// Reference positions of all referenced points.
    pub position: Vec<DVec3>,
    /// Volumes of all referenced points.
    pub volume: Vec<f64>,
    /// All bonds, owner-major.
    pub bonds: Vec<Bond>,
    /// Number of bonds of each owning point.
    pub n_neighbors: Vec<usize>,
    /// Bond index range of each owning point.
    pub bond_ids: Vec<Range<usize>>,
}

impl BondSystem {
    /// Assembles a system from per-owner bond lists.
    pub fn from_bond_lists(
        position: Vec<DVec3>,
        volume: Vec<f64>,
        bond_lists: Vec<Vec<Bond>>,
    ) -> Self {
        let n_neighbors: Vec<usize> = bond_lists.iter().map(Vec::len).collect();
        let mut bond_ids = Vec::with_capacity(bond_lists.len());
        let mut bonds = Vec::with_capacity(n_neighbors.iter().sum());
        for list in bond_lists {
            let start = bonds.len();
            bonds.extend(list);
            bond_ids.push(start..bonds.len());
        }
        Self {
            position,
            volume,
            bonds,
            n_neighbors,
            bond_ids,
        }
    }

    /// Number of points that own bonds.
    #[inline]
    pub fn owned_count(&self) -> usize {
        self.bond_ids.len()
    }

    /// Number of points referenced by the system (owned + halo).
    #[inline]
    pub fn point_count(&self) -> usize {
        self.position.len()
    }

    /// Total number of bonds.
    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Bond indices owned by point `i`.
    #[inline]
    pub fn each_bond_idx(&self, i: usize) -> Range<usize> {
        self.bond_ids[i].clone()
    }

    /// Reference bond vector `X_j - X_i`.
    #[inline]
    pub fn reference_diff(&self, i: usize, j: usize) -> DVec3 {
        self.position[j] - self.position[i]
    }
}

/// Builds the bond system of a point cloud for the given horizon.
///
/// A bond i→j exists for every `j ≠ i` with `|X_j - X_i| <= horizon`.
/// Neighbors are ordered by index so the result is deterministic.
/// A bond may fail only if both endpoints permit failure.
pub fn find_bonds(
    cloud: &PointCloud,
    horizon: f64,
    fail_permit: &[bool],
) -> PeridynResult<BondSystem> {
    cloud.validate()?;
    let n = cloud.point_count();
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(PeridynError::InvalidMaterial(format!(
            "Horizon must be positive, got {horizon}"
        )));
    }
    if fail_permit.len() != n {
        return Err(PeridynError::InvalidDiscretization(format!(
            "Failure permit count ({}) != point count ({n})",
            fail_permit.len()
        )));
    }

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        cloud
            .position
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(p.to_array(), i))
            .collect(),
    );

    let horizon_sq = horizon * horizon;
    let mut bond_lists = Vec::with_capacity(n);
    for (i, &xi) in cloud.position.iter().enumerate() {
        let mut neighbors: Vec<usize> = tree
            .locate_within_distance(xi.to_array(), horizon_sq)
            .map(|p| p.data)
            .filter(|&j| j != i)
            .collect();
        neighbors.sort_unstable();

        let mut bonds = Vec::with_capacity(neighbors.len());
        for j in neighbors {
            let length = (cloud.position[j] - xi).length();
            if length < MIN_BOND_LENGTH {
                return Err(PeridynError::InvalidDiscretization(format!(
                    "Points {i} and {j} coincide (distance {length:e})"
                )));
            }
            bonds.push(Bond {
                neighbor: j,
                length,
                fail_permit: fail_permit[i] && fail_permit[j],
            });
        }
        bond_lists.push(bonds);
    }

    let system = BondSystem::from_bond_lists(cloud.position.clone(), cloud.volume.clone(), bond_lists);
    tracing::debug!(
        points = n,
        bonds = system.bond_count(),
        horizon,
        "bond system built"
    );
    Ok(system)
}
