//! Export validation.
//!
//! Export options are checked at job setup so that a bad field list
//! fails before any computation; snapshots are checked before writing
//! and after reading.

use std::collections::BTreeSet;

use peridyn_types::{PeridynError, PeridynResult};

use crate::contract::{ExportField, ExportOptions, FieldData, Snapshot};

/// Validates export options.
pub fn validate_export_options(options: &ExportOptions) -> PeridynResult<()> {
    if options.frequency == 0 {
        return Err(PeridynError::InvalidConfig(
            "Export frequency must be >= 1".into(),
        ));
    }
    if options.fields.is_empty() {
        return Err(PeridynError::InvalidConfig(
            "At least one export field is required".into(),
        ));
    }
    let mut seen = BTreeSet::new();
    for field in &options.fields {
        if !seen.insert(*field) {
            return Err(PeridynError::InvalidConfig(format!(
                "Export field '{field}' listed twice"
            )));
        }
    }
    Ok(())
}

/// Validates a snapshot's internal consistency.
pub fn validate_snapshot(snapshot: &Snapshot) -> PeridynResult<()> {
    if !snapshot.time.is_finite() {
        return Err(PeridynError::Serialization(format!(
            "Snapshot {} has non-finite time",
            snapshot.step
        )));
    }
    if snapshot.point_ids.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PeridynError::Serialization(format!(
            "Snapshot {} point ids are not strictly ascending",
            snapshot.step
        )));
    }
    let n = snapshot.point_count();
    for (name, data) in &snapshot.fields {
        if data.len() != n {
            return Err(PeridynError::Serialization(format!(
                "Field '{name}' has {} values for {n} points",
                data.len()
            )));
        }
        if let Ok(field) = name.parse::<ExportField>() {
            let scalar = matches!(data, FieldData::Scalar(_));
            // An empty vector field deserializes as the first untagged variant.
            if n > 0 && scalar != field.is_scalar() {
                return Err(PeridynError::Serialization(format!(
                    "Field '{name}' has the wrong arity"
                )));
            }
        }
    }
    Ok(())
}
