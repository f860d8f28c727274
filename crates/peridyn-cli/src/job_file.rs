//! JSON job description.
//!
//! A job file describes a procedural block, its material, point sets and
//! their conditions, the time solver and the run settings:
//!
//! ```json
//! {
//!   "name": "plate",
//!   "block": { "lx": 0.1, "ly": 0.05, "lz": 0.01, "dx": 0.0025 },
//!   "material": { "correspondence": { "max_damage": 0.85, "correction_factor": 0.1, "influence": "inverse" } },
//!   "properties": { "horizon": 0.0075, "density": 7850.0, "youngs_modulus": 2.1e11,
//!                   "poisson_ratio": 0.25, "fracture": { "energy": 1000.0 } },
//!   "point_sets": [ { "name": "right", "min": [0.045, -1, -1], "max": [1, 1, 1] } ],
//!   "velocity": [ { "set": "right", "value": [10.0, 0.0, 0.0] } ],
//!   "time_solver": { "steps": 1000 },
//!   "job": { "transport": { "threads": { "n_chunks": 4 } }, "export": { "frequency": 100 } }
//! }
//! ```

use std::path::Path;

use peridyn_material::{Material, MaterialProperties};
use peridyn_math::DVec3;
use peridyn_mesh::generators::uniform_box;
use peridyn_solver::{Body, Job, JobConfig, TimeSolverConfig, VelocityVerlet};
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

/// A rectangular block of points on a cubic lattice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSpec {
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    /// Lattice spacing.
    pub dx: f64,
}

/// Points whose reference position lies in an axis-aligned box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSetSpec {
    pub name: String,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

/// A vector applied to a point set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVector {
    pub set: String,
    pub value: [f64; 3],
}

/// Material properties overriding the body's on a point set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetProperties {
    pub set: String,
    pub properties: MaterialProperties,
}

/// Complete job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(default = "default_name")]
    pub name: String,
    pub block: BlockSpec,
    #[serde(default)]
    pub material: Material,
    pub properties: MaterialProperties,
    #[serde(default)]
    pub point_sets: Vec<PointSetSpec>,
    #[serde(default)]
    pub set_properties: Vec<SetProperties>,
    #[serde(default)]
    pub no_failure: Vec<String>,
    #[serde(default)]
    pub velocity: Vec<SetVector>,
    #[serde(default)]
    pub force_density: Vec<SetVector>,
    pub time_solver: TimeSolverConfig,
    #[serde(default)]
    pub job: JobConfig,
}

fn default_name() -> String {
    "job".into()
}

impl JobFile {
    /// Reads a job file.
    pub fn load(path: &Path) -> PeridynResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses a job description.
    pub fn from_json(json: &str) -> PeridynResult<Self> {
        serde_json::from_str(json).map_err(|e| PeridynError::Serialization(e.to_string()))
    }

    /// Builds the body described by the file.
    pub fn body(&self) -> PeridynResult<Body> {
        let BlockSpec { lx, ly, lz, dx } = self.block;
        if ![lx, ly, lz, dx].iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(PeridynError::InvalidConfig(
                "Block dimensions and spacing must be positive".into(),
            ));
        }
        let cloud = uniform_box(lx, ly, lz, dx);
        let mut body = Body::new(self.material, cloud)?.with_name(self.name.clone());
        body.material_properties(self.properties.clone())?;

        for set in &self.point_sets {
            let min = DVec3::from_array(set.min);
            let max = DVec3::from_array(set.max);
            let count = body.point_set_where(set.name.clone(), |p| {
                p.cmpge(min).all() && p.cmple(max).all()
            });
            if count == 0 {
                tracing::warn!(set = %set.name, "point set is empty");
            }
        }
        for region in &self.set_properties {
            body.set_material_properties(&region.set, region.properties.clone())?;
        }
        for set in &self.no_failure {
            body.no_failure(set)?;
        }
        for v in &self.velocity {
            body.velocity_ic(&v.set, DVec3::from_array(v.value))?;
        }
        for b in &self.force_density {
            body.forcedensity_bc(&b.set, DVec3::from_array(b.value))?;
        }
        Ok(body)
    }

    /// Builds the job described by the file.
    pub fn job(&self) -> PeridynResult<Job> {
        let solver = VelocityVerlet::new(self.time_solver.clone())?;
        self.job.validate()?;
        Ok(Job::new(self.body()?, solver).with_config(self.job.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peridyn_solver::Transport;

    const PLATE: &str = r#"{
        "name": "plate",
        "block": { "lx": 0.02, "ly": 0.01, "lz": 0.01, "dx": 0.0025 },
        "material": { "bond_based": null },
        "properties": { "horizon": 0.0076, "density": 7850.0, "youngs_modulus": 2.1e11,
                        "fracture": { "critical_stretch": 0.001 } },
        "point_sets": [ { "name": "right", "min": [0.005, -1, -1], "max": [1, 1, 1] } ],
        "velocity": [ { "set": "right", "value": [1.0, 0.0, 0.0] } ],
        "time_solver": { "steps": 3 },
        "job": { "transport": { "distributed": { "n_ranks": 2 } }, "quiet": true }
    }"#;

    #[test]
    fn parses_and_builds_job() {
        let file = JobFile::from_json(PLATE).unwrap();
        assert_eq!(file.name, "plate");
        assert_eq!(file.job.transport, Transport::Distributed { n_ranks: 2 });
        let body = file.body().unwrap();
        assert_eq!(body.point_count(), 8 * 4 * 4);
        assert_eq!(body.cloud().point_set("right").unwrap().len(), 2 * 4 * 4);
        let results = file.job().unwrap().run().unwrap();
        assert_eq!(results.summary.steps, 3);
    }

    #[test]
    fn unknown_set_in_conditions_rejected() {
        let json = PLATE.replace(r#""set": "right""#, r#""set": "left""#);
        let file = JobFile::from_json(&json).unwrap();
        assert!(file.body().is_err());
    }

    #[test]
    fn conflicting_time_solver_rejected() {
        let json = PLATE.replace(r#"{ "steps": 3 }"#, r#"{ "steps": 3, "time": 1.0 }"#);
        let file = JobFile::from_json(&json).unwrap();
        assert!(matches!(file.job(), Err(PeridynError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            JobFile::from_json("{ not json"),
            Err(PeridynError::Serialization(_))
        ));
    }
}
