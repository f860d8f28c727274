//! Snapshot writers.

use std::fs;
use std::path::{Path, PathBuf};

use peridyn_types::{PeridynError, PeridynResult};

use crate::contract::Snapshot;
use crate::validator::validate_snapshot;

/// Destination of exported snapshots.
pub trait SnapshotWriter: Send {
    /// Persists one snapshot.
    fn write(&mut self, snapshot: &Snapshot) -> PeridynResult<()>;

    /// Called once after the last step.
    fn finish(&mut self) -> PeridynResult<()> {
        Ok(())
    }
}

/// Writes `<dir>/<prefix>_<step>.json` per snapshot.
#[derive(Debug, Clone)]
pub struct JsonSnapshotWriter {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl JsonSnapshotWriter {
    /// Creates the writer, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> PeridynResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            written: Vec::new(),
        })
    }

    /// Path a snapshot of `step` is written to.
    pub fn path_for(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, step))
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl SnapshotWriter for JsonSnapshotWriter {
    fn write(&mut self, snapshot: &Snapshot) -> PeridynResult<()> {
        validate_snapshot(snapshot)?;
        let path = self.path_for(snapshot.step);
        let json = serde_json::to_string(snapshot)
            .map_err(|e| PeridynError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "snapshot written");
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> PeridynResult<()> {
        tracing::info!(files = self.written.len(), dir = %self.dir.display(), "export finished");
        Ok(())
    }
}

/// Keeps snapshots in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotWriter {
    pub snapshots: Vec<Snapshot>,
}

impl MemorySnapshotWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotWriter for MemorySnapshotWriter {
    fn write(&mut self, snapshot: &Snapshot) -> PeridynResult<()> {
        validate_snapshot(snapshot)?;
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

/// Reads and validates a JSON snapshot.
pub fn read_snapshot(path: &Path) -> PeridynResult<Snapshot> {
    let json = fs::read_to_string(path)?;
    let snapshot: Snapshot =
        serde_json::from_str(&json).map_err(|e| PeridynError::Serialization(e.to_string()))?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}
