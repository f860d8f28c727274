//! Integration tests for peridyn-mesh.

use approx::assert_relative_eq;
use peridyn_math::DVec3;
use peridyn_mesh::discretization::find_bonds;
use peridyn_mesh::generators::{point_line, uniform_box};
use peridyn_mesh::PointCloud;

// ─── PointCloud Tests ─────────────────────────────────────────

#[test]
fn new_cloud_validates() {
    let cloud = PointCloud::new(vec![DVec3::ZERO, DVec3::X], vec![1.0, 1.0]).unwrap();
    assert_eq!(cloud.point_count(), 2);
    assert_relative_eq!(cloud.total_volume(), 2.0);
}

#[test]
fn empty_cloud_rejected() {
    assert!(PointCloud::new(Vec::new(), Vec::new()).is_err());
}

#[test]
fn mismatched_volume_rejected() {
    assert!(PointCloud::new(vec![DVec3::ZERO], vec![1.0, 1.0]).is_err());
}

#[test]
fn non_positive_volume_rejected() {
    assert!(PointCloud::new(vec![DVec3::ZERO], vec![0.0]).is_err());
}

#[test]
fn point_set_where_selects_points() {
    let mut cloud = point_line(5, 1.0, 1.0);
    let count = cloud.add_point_set_where("right", |p| p.x > 2.5);
    assert_eq!(count, 2);
    assert_eq!(cloud.point_set("right").unwrap(), &[3, 4]);
}

#[test]
fn point_set_out_of_range_rejected() {
    let mut cloud = point_line(3, 1.0, 1.0);
    assert!(cloud.add_point_set("bad", vec![0, 7]).is_err());
    assert!(cloud.point_set("bad").is_err());
}

#[test]
fn point_set_is_sorted_and_deduplicated() {
    let mut cloud = point_line(4, 1.0, 1.0);
    cloud.add_point_set("s", vec![3, 1, 3]).unwrap();
    assert_eq!(cloud.point_set("s").unwrap(), &[1, 3]);
}

// ─── Generator Tests ──────────────────────────────────────────

#[test]
fn uniform_box_counts_and_volume() {
    let cloud = uniform_box(1.0, 1.0, 1.0, 0.25);
    assert_eq!(cloud.point_count(), 64);
    assert_relative_eq!(cloud.total_volume(), 1.0, epsilon = 1e-12);
    assert!(cloud.validate().is_ok());
}

#[test]
fn uniform_box_is_centered() {
    let cloud = uniform_box(2.0, 1.0, 1.0, 0.5);
    let centroid = cloud.position.iter().copied().sum::<DVec3>() / cloud.point_count() as f64;
    assert_relative_eq!(centroid.length(), 0.0, epsilon = 1e-12);
}

// ─── Bond Search Tests ────────────────────────────────────────

#[test]
fn two_points_share_a_bond_pair() {
    let cloud = point_line(2, 1.0, 1.0);
    let system = find_bonds(&cloud, 1.5, &[true, true]).unwrap();
    assert_eq!(system.bond_count(), 2);
    assert_eq!(system.n_neighbors, vec![1, 1]);
    assert_eq!(system.bonds[0].neighbor, 1);
    assert_eq!(system.bonds[1].neighbor, 0);
    assert_relative_eq!(system.bonds[0].length, 1.0);
}

#[test]
fn horizon_limits_neighborhood() {
    let cloud = point_line(5, 1.0, 1.0);
    let system = find_bonds(&cloud, 1.01, &[true; 5]).unwrap();
    // End points have one neighbor, interior points two.
    assert_eq!(system.n_neighbors, vec![1, 2, 2, 2, 1]);
    let range = system.each_bond_idx(2);
    let neighbors: Vec<usize> = system.bonds[range].iter().map(|b| b.neighbor).collect();
    assert_eq!(neighbors, vec![1, 3]);
}

#[test]
fn bond_adjacency_is_symmetric() {
    let cloud = uniform_box(1.0, 1.0, 0.5, 0.25);
    let system = find_bonds(&cloud, 0.55, &vec![true; cloud.point_count()]).unwrap();
    for i in 0..system.owned_count() {
        for bond in &system.bonds[system.each_bond_idx(i)] {
            let back = &system.bonds[system.each_bond_idx(bond.neighbor)];
            assert!(back.iter().any(|b| b.neighbor == i));
            assert!(bond.length > 0.0);
        }
    }
}

#[test]
fn fail_permit_requires_both_endpoints() {
    let cloud = point_line(3, 1.0, 1.0);
    let system = find_bonds(&cloud, 1.5, &[true, false, true]).unwrap();
    assert!(system.bonds.iter().all(|b| !b.fail_permit));
}

#[test]
fn coincident_points_rejected() {
    let cloud = PointCloud::new(vec![DVec3::ZERO, DVec3::ZERO], vec![1.0, 1.0]).unwrap();
    assert!(find_bonds(&cloud, 1.0, &[true, true]).is_err());
}

#[test]
fn non_positive_horizon_rejected() {
    let cloud = point_line(2, 1.0, 1.0);
    assert!(find_bonds(&cloud, 0.0, &[true, true]).is_err());
}
