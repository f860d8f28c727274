//! # peridyn-io
//!
//! Output boundary of a peridyn job: which fields to export and how
//! often, the [`Snapshot`] value handed to writers, and a JSON writer.
//!
//! Snapshots carry plain `[f64; 3]` arrays in global point order so that
//! consumers need nothing from the solver crates to read them.

pub mod contract;
pub mod validator;
pub mod writer;

pub use contract::{ExportField, ExportOptions, FieldData, Snapshot};
pub use validator::{validate_export_options, validate_snapshot};
pub use writer::{read_snapshot, JsonSnapshotWriter, MemorySnapshotWriter, SnapshotWriter};
