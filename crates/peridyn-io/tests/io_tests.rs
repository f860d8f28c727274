//! Integration tests for peridyn-io.

use std::collections::BTreeMap;

use peridyn_io::contract::{ExportField, ExportOptions, FieldData, Snapshot};
use peridyn_io::validator::{validate_export_options, validate_snapshot};
use peridyn_io::writer::{read_snapshot, JsonSnapshotWriter, MemorySnapshotWriter, SnapshotWriter};

fn snapshot(step: usize) -> Snapshot {
    let mut fields = BTreeMap::new();
    fields.insert(
        "position".to_string(),
        FieldData::Vector(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
    );
    fields.insert("damage".to_string(), FieldData::Scalar(vec![0.0, 0.5]));
    Snapshot {
        step,
        time: step as f64 * 0.5,
        point_ids: vec![0, 1],
        fields,
    }
}

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("peridyn-io-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn default_export_fields() {
    let options = ExportOptions::every(5);
    assert_eq!(
        options.fields,
        vec![ExportField::Position, ExportField::Displacement, ExportField::Damage]
    );
    assert!(options.is_due(0));
    assert!(options.is_due(10));
    assert!(!options.is_due(7));
}

#[test]
fn export_field_names_parse_back() {
    for field in ExportField::ALL {
        assert_eq!(field.name().parse::<ExportField>().unwrap(), field);
    }
    assert!("stress".parse::<ExportField>().is_err());
}

#[test]
fn export_options_from_json_use_default_fields() {
    let options: ExportOptions = serde_json::from_str(r#"{"frequency": 3}"#).unwrap();
    assert_eq!(options.frequency, 3);
    assert_eq!(options.fields.len(), 3);

    let options: ExportOptions =
        serde_json::from_str(r#"{"frequency": 1, "fields": ["b_int", "velocity"]}"#).unwrap();
    assert_eq!(options.fields, vec![ExportField::BInt, ExportField::Velocity]);
}

#[test]
fn snapshot_json_round_trip() {
    let snap = snapshot(4);
    let json = serde_json::to_string(&snap).unwrap();
    let recovered: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, snap);
    assert_eq!(recovered.field(ExportField::Damage), Some(&FieldData::Scalar(vec![0.0, 0.5])));
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn zero_frequency_rejected() {
    assert!(validate_export_options(&ExportOptions::every(0)).is_err());
    assert!(validate_export_options(&ExportOptions::every(1)).is_ok());
}

#[test]
fn empty_or_duplicate_fields_rejected() {
    let empty = ExportOptions::every(1).with_fields(Vec::new());
    assert!(validate_export_options(&empty).is_err());
    let dup = ExportOptions::every(1).with_fields(vec![ExportField::Damage, ExportField::Damage]);
    assert!(validate_export_options(&dup).is_err());
}

#[test]
fn snapshot_length_mismatch_rejected() {
    let mut snap = snapshot(0);
    snap.fields.insert("velocity".into(), FieldData::Vector(vec![[0.0; 3]]));
    assert!(validate_snapshot(&snap).is_err());
}

#[test]
fn snapshot_wrong_arity_rejected() {
    let mut snap = snapshot(0);
    snap.fields.insert("damage".into(), FieldData::Vector(vec![[0.0; 3]; 2]));
    assert!(validate_snapshot(&snap).is_err());
}

#[test]
fn snapshot_unsorted_ids_rejected() {
    let mut snap = snapshot(0);
    snap.point_ids = vec![1, 0];
    assert!(validate_snapshot(&snap).is_err());
}

// ─── Writer Tests ─────────────────────────────────────────────

#[test]
fn memory_writer_collects_snapshots() {
    let mut writer = MemorySnapshotWriter::new();
    writer.write(&snapshot(0)).unwrap();
    writer.write(&snapshot(2)).unwrap();
    writer.finish().unwrap();
    assert_eq!(writer.snapshots.len(), 2);
    assert_eq!(writer.snapshots[1].step, 2);
}

#[test]
fn json_writer_names_files_by_step() {
    let dir = scratch_dir("names");
    let mut writer = JsonSnapshotWriter::new(&dir, "plate").unwrap();
    writer.write(&snapshot(0)).unwrap();
    writer.write(&snapshot(25)).unwrap();
    writer.finish().unwrap();

    assert_eq!(writer.written().len(), 2);
    assert_eq!(writer.written()[1], dir.join("plate_25.json"));
    let recovered = read_snapshot(&dir.join("plate_25.json")).unwrap();
    assert_eq!(recovered, snapshot(25));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reading_missing_snapshot_fails() {
    let dir = scratch_dir("missing");
    assert!(read_snapshot(&dir.join("nope_0.json")).is_err());
}
