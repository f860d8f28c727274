//! Discretized body: one material sample per point.
//!
//! Positions and volumes are stored per point in global order. Point sets
//! are named, sorted index lists used by material regions and conditions.

use std::collections::BTreeMap;

use peridyn_math::DVec3;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

/// A point cloud in its reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud {
    /// Reference position of each point.
    pub position: Vec<DVec3>,
    /// Volume of each point.
    pub volume: Vec<f64>,
    /// Named point sets (sorted, deduplicated global indices).
    pub point_sets: BTreeMap<String, Vec<usize>>,
}

impl PointCloud {
    /// Creates a validated point cloud.
    pub fn new(position: Vec<DVec3>, volume: Vec<f64>) -> PeridynResult<Self> {
        let cloud = Self {
            position,
            volume,
            point_sets: BTreeMap::new(),
        };
        cloud.validate()?;
        Ok(cloud)
    }

    /// Returns the number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.position.len()
    }

    /// Validates point cloud integrity.
    ///
    /// Checks:
    /// - At least one point
    /// - Position and volume arrays have the same length
    /// - Positions are finite, volumes are finite and positive
    /// - Point set indices are in range
    pub fn validate(&self) -> PeridynResult<()> {
        let n = self.position.len();
        if n == 0 {
            return Err(PeridynError::InvalidDiscretization(
                "Point cloud is empty".into(),
            ));
        }
        if self.volume.len() != n {
            return Err(PeridynError::InvalidDiscretization(format!(
                "Volume count ({}) != point count ({})",
                self.volume.len(),
                n
            )));
        }
        if let Some(i) = self.position.iter().position(|p| !p.is_finite()) {
            return Err(PeridynError::InvalidDiscretization(format!(
                "Point {i} has a non-finite position"
            )));
        }
        if let Some(i) = self.volume.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(PeridynError::InvalidDiscretization(format!(
                "Point {i} has non-positive volume {}",
                self.volume[i]
            )));
        }
        for (name, set) in &self.point_sets {
            if let Some(&idx) = set.iter().find(|&&idx| idx >= n) {
                return Err(PeridynError::InvalidDiscretization(format!(
                    "Point set '{name}' references point {idx} (point count: {n})"
                )));
            }
        }
        Ok(())
    }

    /// Registers a named point set from explicit indices.
    pub fn add_point_set(&mut self, name: impl Into<String>, mut points: Vec<usize>) -> PeridynResult<()> {
        let name = name.into();
        let n = self.point_count();
        if let Some(&idx) = points.iter().find(|&&idx| idx >= n) {
            return Err(PeridynError::InvalidDiscretization(format!(
                "Point set '{name}' references point {idx} (point count: {n})"
            )));
        }
        points.sort_unstable();
        points.dedup();
        self.point_sets.insert(name, points);
        Ok(())
    }

    /// Registers a named point set of all points matching `predicate`.
    ///
    /// Returns the number of points in the new set.
    pub fn add_point_set_where<F>(&mut self, name: impl Into<String>, predicate: F) -> usize
    where
        F: Fn(DVec3) -> bool,
    {
        let points: Vec<usize> = self
            .position
            .iter()
            .enumerate()
            .filter(|(_, p)| predicate(**p))
            .map(|(i, _)| i)
            .collect();
        let count = points.len();
        self.point_sets.insert(name.into(), points);
        count
    }

    /// Returns the indices of a named point set.
    pub fn point_set(&self, name: &str) -> PeridynResult<&[usize]> {
        self.point_sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PeridynError::InvalidDiscretization(format!("Unknown point set '{name}'")))
    }

    /// Sum of all point volumes.
    pub fn total_volume(&self) -> f64 {
        self.volume.iter().sum()
    }
}
