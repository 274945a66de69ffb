//! JSON-file-backed registry store.
//!
//! One [`RegistryStore`] owns the in-memory [`Document`] and its on-disk
//! path. Every mutating call persists the whole document before returning:
//! serialize, write to a temp file in the same directory, atomically rename
//! over the target. Entity operations live in per-entity submodules
//! (`projects`, `test_files`, ...), each an `impl RegistryStore` block.
//!
//! The design assumes a single active writer process; other consumers go
//! through its HTTP interface or call [`RegistryStore::reload`] to observe
//! another writer's state.

pub mod document;
pub mod migrate;

mod jenkins;
mod ports;
mod projects;
mod results;
mod settings;
mod test_files;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::RegistryError;

pub use document::{Document, JenkinsJob, Project, ProjectPort, Setting, Test, TestResult};
pub use projects::ProjectUpdate;
pub use results::NewTestResult;

/// File-backed registry of projects, tests, ports, jobs, results and
/// settings.
pub struct RegistryStore {
    path: PathBuf,
    doc: Document,
}

impl RegistryStore {
    /// Open the registry at `path`, creating an empty document if the file
    /// does not exist. A file that cannot be parsed at all is replaced by a
    /// fresh empty document; a parseable but stale schema is migrated and
    /// rewritten once.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let mut store = Self {
            path,
            doc: Document::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// The on-disk location of this registry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard the in-memory document and re-read from disk. This is how a
    /// reader observes a write made by another process.
    pub fn reload(&mut self) -> Result<(), RegistryError> {
        self.load()
    }

    fn load(&mut self) -> Result<(), RegistryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.doc = Document::default();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                // Nothing recoverable at this layer; start fresh and
                // overwrite the corrupt file.
                warn!(
                    "registry at {} is corrupt ({e}); starting with an empty document",
                    self.path.display()
                );
                self.doc = Document::default();
                self.persist()?;
                return Ok(());
            }
        };

        let (doc, migrated) = migrate::normalize(value)?;
        self.doc = doc;
        if migrated {
            debug!("registry at {} migrated to current schema", self.path.display());
            self.persist()?;
        }
        Ok(())
    }

    /// Write the whole document to disk atomically: temp file in the same
    /// directory, fsync, rename over the target.
    pub(crate) fn persist(&self) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let serialized = serde_json::to_string_pretty(&self.doc)?;

        let temp_path = PathBuf::from(format!(
            "{}.tmp.{}",
            self.path.display(),
            std::process::id()
        ));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        debug!("persisted registry to {}", self.path.display());
        Ok(())
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Replace the whole document (backup restore) and persist.
    pub fn replace_document(&mut self, doc: Document) -> Result<(), RegistryError> {
        self.doc = doc;
        self.persist()
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> Document {
        self.doc.clone()
    }
}

/// Current time as epoch seconds, the timestamp unit of the document.
pub fn current_time_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn temp_store() -> (tempfile::TempDir, RegistryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("registry.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_missing_file_yields_empty_document() {
        let (_dir, store) = temp_store();
        assert!(store.projects().is_empty());
        // No mutation yet, so nothing is written either.
        assert!(!store.path().exists());
    }

    #[test]
    fn open_invalid_json_yields_empty_document_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "{ not json !!").unwrap();

        let store = RegistryStore::open(&path).unwrap();
        assert!(store.projects().is_empty());

        // The corrupt file was replaced with a valid empty document.
        let reread: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread["projects"], serde_json::json!([]));
    }

    #[test]
    fn open_empty_object_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "{}").unwrap();

        let store = RegistryStore::open(&path).unwrap();
        assert!(store.projects().is_empty());
    }

    #[test]
    fn migrated_file_is_rewritten_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(
            &path,
            r#"{"projects":[{"id":1,"name":"old","path":"/p","created_at":5}]}"#,
        )
        .unwrap();

        let store = RegistryStore::open(&path).unwrap();
        assert!(store.projects()[0].tags.is_empty());

        // On-disk file now carries the backfilled fields.
        let reread = fs::read_to_string(&path).unwrap();
        assert!(reread.contains("\"tags\""));
        assert!(reread.contains("\"test_results\""));
    }

    #[test]
    fn persist_is_pretty_printed_two_space() {
        let (_dir, mut store) = temp_store();
        store.add_project("app", "/tmp/app").unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("{\n  \"projects\""));
    }

    #[test]
    fn reload_observes_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut writer = RegistryStore::open(&path).unwrap();
        let mut reader = RegistryStore::open(&path).unwrap();

        writer.add_project("app", "/tmp/app").unwrap();
        assert!(reader.projects().is_empty());

        reader.reload().unwrap();
        assert_eq!(reader.projects().len(), 1);
    }
}
