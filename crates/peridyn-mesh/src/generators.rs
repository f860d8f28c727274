//! Procedural point clouds for tests and demos.
//!
//! These generators produce deterministic, resolution-configurable
//! clouds on a regular lattice.

use peridyn_math::DVec3;

use crate::point_cloud::PointCloud;

/// Generates a block of points on a cubic lattice with spacing `dx`.
///
/// The block spans `[-lx/2, lx/2] × [-ly/2, ly/2] × [-lz/2, lz/2]`,
/// centered at the origin. Points sit at cell centers, each carrying
/// volume `dx³`. At least one point is generated along every axis.
///
/// # Example
/// ```
/// use peridyn_mesh::generators::uniform_box;
/// let cloud = uniform_box(1.0, 0.5, 0.25, 0.25);
/// assert_eq!(cloud.point_count(), 4 * 2 * 1);
/// ```
pub fn uniform_box(lx: f64, ly: f64, lz: f64, dx: f64) -> PointCloud {
    let nx = ((lx / dx).round() as usize).max(1);
    let ny = ((ly / dx).round() as usize).max(1);
    let nz = ((lz / dx).round() as usize).max(1);
    let n = nx * ny * nz;

    let origin = DVec3::new(-lx / 2.0, -ly / 2.0, -lz / 2.0) + DVec3::splat(dx / 2.0);
    let mut position = Vec::with_capacity(n);
    // x varies fastest so neighboring ids are spatially close
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                position.push(origin + DVec3::new(i as f64, j as f64, k as f64) * dx);
            }
        }
    }

    PointCloud {
        position,
        volume: vec![dx * dx * dx; n],
        point_sets: Default::default(),
    }
}

/// Generates `count` points along the X axis starting at the origin.
pub fn point_line(count: usize, spacing: f64, volume: f64) -> PointCloud {
    PointCloud {
        position: (0..count)
            .map(|i| DVec3::new(i as f64 * spacing, 0.0, 0.0))
            .collect(),
        volume: vec![volume; count],
        point_sets: Default::default(),
    }
}
