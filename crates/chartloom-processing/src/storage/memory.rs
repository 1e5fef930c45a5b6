//! In-process collaborators.

use super::{DatasetRecord, DatasetUpdate, NewDataset, ObjectStorage, RecordStore};
use crate::error::{EngineError, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object storage backed by a map.
///
/// Uploads can be made to fail on demand, which is how storage outages are
/// simulated.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail (or succeed again).
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Content type recorded for `path`, if the object exists.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .read()
            .get(path)
            .map(|obj| obj.content_type.clone())
    }

    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().contains_key(path)
    }

    /// Paths of every stored object, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl ObjectStorage for MemoryStorage {
    fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .get(path)
            .map(|obj| obj.bytes.clone())
            .ok_or_else(|| EngineError::Storage(format!("object '{}' does not exist", path)))
    }

    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(EngineError::Storage(format!(
                "upload of '{}' rejected by storage",
                path
            )));
        }
        self.objects.write().insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.objects.write().remove(path);
        Ok(())
    }
}

/// Record store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, DatasetRecord>>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn create_dataset(&self, new: NewDataset) -> Result<DatasetRecord> {
        let id = format!("ds_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = DatasetRecord::from_new(id.clone(), new, Utc::now());
        self.records.write().insert(id, record.clone());
        Ok(record)
    }

    fn get_dataset_by_id(&self, id: &str) -> Result<Option<DatasetRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn update_dataset(&self, id: &str, update: DatasetUpdate) -> Result<DatasetRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        update.apply_to(record, Utc::now());
        Ok(record.clone())
    }
}
