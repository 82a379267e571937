use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::gerrit::Change;

/// A serialized copy of the full change list, used to skip the network
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot back into memory
    pub fn load(&self) -> Result<Vec<Change>> {
        let data = fs::read(&self.path)
            .with_context(|| format!("Failed to read snapshot {:?}", self.path))?;

        serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse snapshot {:?}", self.path))
    }

    /// Write the complete change list, replacing any previous snapshot
    pub fn save(&self, changes: &[Change]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let data = serde_json::to_vec(changes).context("Failed to serialize changes")?;

        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write snapshot {:?}", self.path))?;

        info!("Wrote {} changes to {:?}", changes.len(), self.path);
        Ok(())
    }
}
