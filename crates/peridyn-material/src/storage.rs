//! Per-chunk mutable simulation state.
//!
//! Vector fields that halo exchanges touch (`position`, `b_int`) are sized
//! to every point the chunk references, owned points first. Integrated
//! state (velocity, acceleration, displacement, damage) is owned-only.

use peridyn_math::DVec3;
use peridyn_mesh::BondSystem;

use crate::traits::HaloField;

/// Mutable per-point and per-bond state of one chunk.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Number of owned points.
    pub n_loc_points: usize,
    /// Current position (owned + halo).
    pub position: Vec<DVec3>,
    /// Internal force density (owned + halo).
    pub b_int: Vec<DVec3>,
    /// External force density (owned).
    pub b_ext: Vec<DVec3>,
    /// Displacement from the reference position (owned).
    pub displacement: Vec<DVec3>,
    /// Velocity (owned).
    pub velocity: Vec<DVec3>,
    /// Half-step velocity of the leapfrog scheme (owned).
    pub velocity_half: Vec<DVec3>,
    /// Acceleration (owned).
    pub acceleration: Vec<DVec3>,
    /// Fraction of broken bonds (owned).
    pub damage: Vec<f64>,
    /// Whether each owned bond still carries force.
    pub bond_active: Vec<bool>,
    /// Number of active bonds per owned point.
    pub n_active_bonds: Vec<usize>,
}

impl Storage {
    /// Allocates storage for a (possibly localized) bond system.
    ///
    /// Positions start at the reference configuration, all bonds intact.
    pub fn new(system: &BondSystem) -> Self {
        let n_loc = system.owned_count();
        let n_all = system.point_count();
        Self {
            n_loc_points: n_loc,
            position: system.position.clone(),
            b_int: vec![DVec3::ZERO; n_all],
            b_ext: vec![DVec3::ZERO; n_loc],
            displacement: vec![DVec3::ZERO; n_loc],
            velocity: vec![DVec3::ZERO; n_loc],
            velocity_half: vec![DVec3::ZERO; n_loc],
            acceleration: vec![DVec3::ZERO; n_loc],
            damage: vec![0.0; n_loc],
            bond_active: vec![true; system.bond_count()],
            n_active_bonds: system.n_neighbors.clone(),
        }
    }

    /// Read access to a halo-exchangeable field.
    pub fn field(&self, field: HaloField) -> &[DVec3] {
        match field {
            HaloField::Position => &self.position,
            HaloField::ForceDensity => &self.b_int,
        }
    }

    /// Write access to a halo-exchangeable field.
    pub fn field_mut(&mut self, field: HaloField) -> &mut [DVec3] {
        match field {
            HaloField::Position => &mut self.position,
            HaloField::ForceDensity => &mut self.b_int,
        }
    }

    /// Current bond vector `x_j - x_i`.
    #[inline]
    pub fn current_diff(&self, i: usize, j: usize) -> DVec3 {
        self.position[j] - self.position[i]
    }

    /// Zeroes the internal force density on owned and halo slots.
    pub fn reset_b_int(&mut self) {
        self.b_int.fill(DVec3::ZERO);
    }

    /// Deactivates every bond of point `i`. Irreversible.
    pub fn kill_point(&mut self, system: &BondSystem, i: usize) {
        self.bond_active[system.each_bond_idx(i)].fill(false);
        self.n_active_bonds[i] = 0;
    }

    /// Recomputes `damage = 1 − active / total` for every owned point.
    pub fn update_damage(&mut self, system: &BondSystem) {
        for i in 0..self.n_loc_points {
            let total = system.n_neighbors[i];
            self.damage[i] = if total == 0 {
                0.0
            } else {
                1.0 - self.n_active_bonds[i] as f64 / total as f64
            };
        }
    }
}
