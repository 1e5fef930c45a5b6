//! Filesystem-backed collaborators.
//!
//! Files are replaced by writing and syncing a sibling temp file, then
//! renaming it over the target, so a crash mid-write leaves the previous
//! version intact.

use super::{DatasetRecord, DatasetUpdate, NewDataset, ObjectStorage, RecordStore};
use crate::error::{EngineError, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `bytes` to `target` through a synced temp file and rename.
///
/// Each call gets its own temp file, so concurrent writers to one target
/// never share one; the last rename wins.
fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Object storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an object path onto the root, rejecting anything that would
    /// escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(EngineError::Storage(format!(
                "invalid object path '{}'",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStorage for FsStorage {
    fn download(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        std::fs::read(&full).map_err(|e| {
            EngineError::Storage(format!("failed to read '{}': {}", full.display(), e))
        })
    }

    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let full = self.resolve(path)?;
        debug!(
            "Writing {} bytes ({}) to {}",
            bytes.len(),
            content_type,
            full.display()
        );
        write_atomically(&full, bytes).map_err(|e| {
            EngineError::Storage(format!("failed to write '{}': {}", full.display(), e))
        })
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Storage(format!(
                "failed to delete '{}': {}",
                full.display(),
                e
            ))),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordDocument {
    next_id: u64,
    datasets: BTreeMap<String, DatasetRecord>,
}

/// Record store persisted as one JSON document.
///
/// Every mutation reads, modifies, and atomically rewrites the document while
/// holding a process-wide lock.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<RecordDocument> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RecordDocument::default()),
            Err(e) => Err(EngineError::Storage(format!(
                "failed to read '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, document: &RecordDocument) -> Result<()> {
        let text = serde_json::to_string_pretty(document)?;
        write_atomically(&self.path, text.as_bytes()).map_err(|e| {
            EngineError::Storage(format!("failed to write '{}': {}", self.path.display(), e))
        })
    }
}

impl RecordStore for JsonRecordStore {
    fn create_dataset(&self, new: NewDataset) -> Result<DatasetRecord> {
        let _guard = self.lock.lock();
        let mut document = self.load()?;
        document.next_id += 1;
        let id = format!("ds_{}", document.next_id);
        let record = DatasetRecord::from_new(id.clone(), new, Utc::now());
        document.datasets.insert(id, record.clone());
        self.save(&document)?;
        Ok(record)
    }

    fn get_dataset_by_id(&self, id: &str) -> Result<Option<DatasetRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.datasets.remove(id))
    }

    fn update_dataset(&self, id: &str, update: DatasetUpdate) -> Result<DatasetRecord> {
        let _guard = self.lock.lock();
        let mut document = self.load()?;
        let record = document
            .datasets
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        update.apply_to(record, Utc::now());
        let updated = record.clone();
        self.save(&document)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PreprocessingStatus;

    #[test]
    fn test_fs_upload_download_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        storage
            .upload("processed/ds_1/v1.csv", b"\"a\"\n\"1\"\n", "text/csv")
            .unwrap();
        assert_eq!(
            storage.download("processed/ds_1/v1.csv").unwrap(),
            b"\"a\"\n\"1\"\n"
        );

        storage.delete("processed/ds_1/v1.csv").unwrap();
        assert!(storage.download("processed/ds_1/v1.csv").is_err());
        // Deleting twice is fine.
        storage.delete("processed/ds_1/v1.csv").unwrap();
    }

    #[test]
    fn test_fs_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        for path in ["../secret.csv", "/etc/passwd", "a/../../b", ""] {
            let err = storage.upload(path, b"x", "text/csv").unwrap_err();
            assert_eq!(err.error_code(), "STORAGE_ERROR", "{path}");
        }
    }

    #[test]
    fn test_fs_upload_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.upload("f.csv", b"1", "text/csv").unwrap();
        storage.upload("f.csv", b"2", "text/csv").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(storage.download("f.csv").unwrap(), b"2");
    }

    #[test]
    fn test_concurrent_uploads_to_one_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FsStorage::new(dir.path()));

        let handles: Vec<_> = (0..4u8)
            .map(|n| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| {
                            storage
                                .upload("uploads/u1/x.csv", &[b'0' + n], "text/csv")
                                .is_err()
                        })
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);

        let content = storage.download("uploads/u1/x.csv").unwrap();
        assert_eq!(content.len(), 1);
        let leftovers = std::fs::read_dir(dir.path().join("uploads/u1")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_json_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.json");

        let created = JsonRecordStore::new(&path)
            .create_dataset(NewDataset {
                user_id: "u1".to_string(),
                name: "a.csv".to_string(),
                file_path: "uploads/ds_1/a.csv".to_string(),
                row_count: 4,
            })
            .unwrap();
        assert_eq!(created.id, "ds_1");

        let reopened = JsonRecordStore::new(&path);
        reopened
            .update_dataset(
                "ds_1",
                DatasetUpdate {
                    preprocessing_status: Some(PreprocessingStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        let record = JsonRecordStore::new(&path)
            .get_dataset_by_id("ds_1")
            .unwrap()
            .unwrap();
        assert_eq!(record.preprocessing_status, PreprocessingStatus::Completed);
        assert_eq!(record.row_count, 4);
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("none.json"));
        assert!(store.get_dataset_by_id("ds_1").unwrap().is_none());
    }
}
