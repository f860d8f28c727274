//! Export contract types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use peridyn_types::PeridynError;
use serde::{Deserialize, Serialize};

/// A per-point field that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportField {
    Position,
    Displacement,
    Velocity,
    Acceleration,
    /// Internal force density.
    BInt,
    /// External force density.
    BExt,
    Damage,
}

impl ExportField {
    /// Every exportable field.
    pub const ALL: [ExportField; 7] = [
        ExportField::Position,
        ExportField::Displacement,
        ExportField::Velocity,
        ExportField::Acceleration,
        ExportField::BInt,
        ExportField::BExt,
        ExportField::Damage,
    ];

    /// Name used in snapshots and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ExportField::Position => "position",
            ExportField::Displacement => "displacement",
            ExportField::Velocity => "velocity",
            ExportField::Acceleration => "acceleration",
            ExportField::BInt => "b_int",
            ExportField::BExt => "b_ext",
            ExportField::Damage => "damage",
        }
    }

    /// Whether the field holds one scalar per point.
    pub fn is_scalar(self) -> bool {
        matches!(self, ExportField::Damage)
    }
}

impl fmt::Display for ExportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportField {
    type Err = PeridynError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| PeridynError::InvalidConfig(format!("Unknown export field '{s}'")))
    }
}

/// When and what to export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Export every `frequency` steps. Step 0 is always exported.
    pub frequency: usize,
    /// Exported fields.
    #[serde(default = "default_fields")]
    pub fields: Vec<ExportField>,
}

fn default_fields() -> Vec<ExportField> {
    vec![
        ExportField::Position,
        ExportField::Displacement,
        ExportField::Damage,
    ]
}

impl ExportOptions {
    /// Exports position, displacement and damage every `frequency` steps.
    pub fn every(frequency: usize) -> Self {
        Self {
            frequency,
            fields: default_fields(),
        }
    }

    /// Replaces the exported field list.
    pub fn with_fields(mut self, fields: impl Into<Vec<ExportField>>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Whether step `step` is due for export.
    pub fn is_due(&self, step: usize) -> bool {
        self.frequency > 0 && step % self.frequency == 0
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::every(10)
    }
}

/// Values of one exported field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldData {
    Vector(Vec<[f64; 3]>),
    Scalar(Vec<f64>),
}

impl FieldData {
    /// Number of points covered.
    pub fn len(&self) -> usize {
        match self {
            FieldData::Vector(v) => v.len(),
            FieldData::Scalar(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            FieldData::Vector(v) => v.iter().flatten().all(|x| x.is_finite()),
            FieldData::Scalar(v) => v.iter().all(|x| x.is_finite()),
        }
    }
}

/// State of a body at one step, in global point order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Step number.
    pub step: usize,
    /// Simulation time (seconds).
    pub time: f64,
    /// Global point ids, ascending.
    pub point_ids: Vec<usize>,
    /// Field name → values, paired with `point_ids`.
    pub fields: BTreeMap<String, FieldData>,
}

impl Snapshot {
    /// Values of a field, if exported.
    pub fn field(&self, field: ExportField) -> Option<&FieldData> {
        self.fields.get(field.name())
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.point_ids.len()
    }
}
