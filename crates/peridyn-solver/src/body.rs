//! A simulated body: point cloud, material and conditions.
//!
//! Material properties are assigned to point sets; the set `"all"`
//! covers every point and is created with the body. Later assignments
//! override earlier ones point by point.

use peridyn_material::{Material, MaterialModel, MaterialProperties, ParameterSet, PointParameters};
use peridyn_math::DVec3;
use peridyn_mesh::discretization::find_bonds;
use peridyn_mesh::{BondSystem, PointCloud};
use peridyn_types::{PeridynError, PeridynResult};

/// Name of the point set holding every point.
pub const ALL_POINTS: &str = "all";

/// A peridynamic body ready to be decomposed.
#[derive(Debug, Clone)]
pub struct Body {
    name: String,
    cloud: PointCloud,
    material: Material,
    properties: Vec<(String, MaterialProperties)>,
    no_failure: Vec<String>,
    velocity: Vec<DVec3>,
    b_ext: Vec<DVec3>,
}

impl Body {
    /// Creates a body with the given material formulation.
    pub fn new(material: Material, mut cloud: PointCloud) -> PeridynResult<Self> {
        cloud.validate()?;
        material.validate()?;
        let n = cloud.point_count();
        cloud.add_point_set(ALL_POINTS, (0..n).collect())?;
        Ok(Self {
            name: "body".into(),
            cloud,
            material,
            properties: Vec::new(),
            no_failure: Vec::new(),
            velocity: vec![DVec3::ZERO; n],
            b_ext: vec![DVec3::ZERO; n],
        })
    }

    /// Sets the body name used in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.cloud.point_count()
    }

    /// Adds a named point set.
    pub fn point_set(&mut self, name: impl Into<String>, points: Vec<usize>) -> PeridynResult<()> {
        self.cloud.add_point_set(name, points)
    }

    /// Adds a named point set selected by reference position.
    pub fn point_set_where<F>(&mut self, name: impl Into<String>, predicate: F) -> usize
    where
        F: Fn(DVec3) -> bool,
    {
        self.cloud.add_point_set_where(name, predicate)
    }

    /// Assigns material properties to every point.
    pub fn material_properties(&mut self, props: MaterialProperties) -> PeridynResult<()> {
        self.set_material_properties(ALL_POINTS, props)
    }

    /// Assigns material properties to a point set.
    pub fn set_material_properties(
        &mut self,
        set: &str,
        props: MaterialProperties,
    ) -> PeridynResult<()> {
        self.cloud.point_set(set)?;
        props.validate()?;
        self.properties.push((set.to_string(), props));
        Ok(())
    }

    /// Forbids bond failure for every bond touching the point set.
    pub fn no_failure(&mut self, set: &str) -> PeridynResult<()> {
        self.cloud.point_set(set)?;
        self.no_failure.push(set.to_string());
        Ok(())
    }

    /// Sets the initial velocity of a point set.
    pub fn velocity_ic(&mut self, set: &str, velocity: DVec3) -> PeridynResult<()> {
        let points = self.cloud.point_set(set)?;
        check_finite("velocity", velocity)?;
        for &p in points {
            self.velocity[p] = velocity;
        }
        Ok(())
    }

    /// Sets a constant external force density on a point set.
    pub fn forcedensity_bc(&mut self, set: &str, b: DVec3) -> PeridynResult<()> {
        let points = self.cloud.point_set(set)?;
        check_finite("force density", b)?;
        for &p in points {
            self.b_ext[p] = b;
        }
        Ok(())
    }

    /// Initial velocity of every point.
    pub fn initial_velocity(&self) -> &[DVec3] {
        &self.velocity
    }

    /// External force density of every point.
    pub fn external_force_density(&self) -> &[DVec3] {
        &self.b_ext
    }

    /// Derives the parameters of every point.
    ///
    /// Every point must be covered by a property assignment, and all
    /// regions must share one horizon.
    pub fn parameters(&self) -> PeridynResult<ParameterSet> {
        let n = self.point_count();
        let mut regions: Vec<PointParameters> = Vec::with_capacity(self.properties.len());
        let mut point_map = vec![usize::MAX; n];
        for (set, props) in &self.properties {
            let params = self.material.point_parameters(props)?;
            if let Some(first) = regions.first() {
                if first.horizon != params.horizon {
                    return Err(PeridynError::Unsupported(format!(
                        "Point set '{set}' uses horizon {} while the body uses {}",
                        params.horizon, first.horizon
                    )));
                }
            }
            let region = regions.len();
            regions.push(params);
            for &p in self.cloud.point_set(set)? {
                point_map[p] = region;
            }
        }
        if let Some(p) = point_map.iter().position(|&r| r == usize::MAX) {
            return Err(PeridynError::InvalidMaterial(format!(
                "Point {p} of body '{}' has no material properties",
                self.name
            )));
        }
        Ok(ParameterSet { regions, point_map })
    }

    /// Per-point failure permission.
    pub fn fail_permit(&self) -> PeridynResult<Vec<bool>> {
        let mut permit = vec![true; self.point_count()];
        for set in &self.no_failure {
            for &p in self.cloud.point_set(set)? {
                permit[p] = false;
            }
        }
        Ok(permit)
    }

    /// Builds the global bond system for the given parameters.
    pub fn bond_system(&self, params: &ParameterSet) -> PeridynResult<BondSystem> {
        let horizon = params
            .regions
            .first()
            .map(|p| p.horizon)
            .ok_or_else(|| PeridynError::InvalidMaterial("Body has no material properties".into()))?;
        find_bonds(&self.cloud, horizon, &self.fail_permit()?)
    }
}

fn check_finite(what: &str, v: DVec3) -> PeridynResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(PeridynError::InvalidConfig(format!(
            "Initial {what} must be finite, got {v}"
        )))
    }
}
