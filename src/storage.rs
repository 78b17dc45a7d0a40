use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Abstract persistence for a run's collected records
pub trait RecordStore<T> {
    /// Load the stored records. Nothing stored yet is an empty list.
    fn load(&self) -> Result<Vec<T>>;
    /// Replace the stored records with `records`
    fn save(&self, records: &[T]) -> Result<()>;
}

/// Writes records as a pretty-printed JSON array.
///
/// The array is written to a temporary file next to the target and renamed
/// over it, so readers see either the previous document or the new one.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> RecordStore<T> for JsonFileStore {
    fn load(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_slice(&content)
            .with_context(|| format!("Invalid records in {}", self.path.display()))
    }

    fn save(&self, records: &[T]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).context("Failed to create output directory")?;

        let mut file =
            NamedTempFile::new_in(&dir).context("Failed to create temporary output file")?;
        serde_json::to_writer_pretty(&mut file, records)
            .context("Failed to serialize records")?;
        file.write_all(b"\n")
            .context("Failed to write records to file")?;
        file.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "records saved");
        Ok(())
    }
}
