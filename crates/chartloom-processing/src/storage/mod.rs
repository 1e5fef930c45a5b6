//! External collaborators: object storage and the dataset record store.
//!
//! The engine only talks to these traits. Two implementations of each ship
//! with the crate:
//!
//! - [`MemoryStorage`] / [`MemoryRecordStore`] keep everything in process,
//!   guarded by `parking_lot` locks.
//! - [`FsStorage`] / [`JsonRecordStore`] persist under a data directory and
//!   replace files by write-then-rename.
//!
//! # Implementing a New Backend
//!
//! Implement [`ObjectStorage`] and [`RecordStore`] for your client types and
//! hand them to [`EngineBuilder`](crate::pipeline::EngineBuilder) as
//! `Arc<dyn ...>`. Report every backend failure as
//! [`EngineError::Storage`](crate::error::EngineError::Storage); the engine
//! treats it as fatal for the current invocation.

mod fs;
mod memory;

pub use fs::{FsStorage, JsonRecordStore};
pub use memory::{MemoryRecordStore, MemoryStorage};

use crate::error::Result;
use crate::types::PreprocessingMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blob storage holding raw uploads and cleaned artifacts.
///
/// Implementations must be `Send + Sync`; one instance serves every dataset.
pub trait ObjectStorage: Send + Sync {
    /// Fetch the bytes stored at `path`.
    fn download(&self, path: &str) -> Result<Vec<u8>>;

    /// Store `bytes` at `path`, replacing any previous object.
    ///
    /// Readers must never observe a partially written object.
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Remove the object at `path`. Removing a missing object succeeds.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Store of dataset records.
pub trait RecordStore: Send + Sync {
    /// Create a pending record and assign it an id.
    fn create_dataset(&self, new: NewDataset) -> Result<DatasetRecord>;

    /// Look up a record by id.
    fn get_dataset_by_id(&self, id: &str) -> Result<Option<DatasetRecord>>;

    /// Apply `update` to the record and return the updated record.
    ///
    /// Fails with `NotFound` when no record has this id.
    fn update_dataset(&self, id: &str, update: DatasetUpdate) -> Result<DatasetRecord>;
}

/// Processing state of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessingStatus {
    /// Uploaded, never applied.
    #[default]
    Pending,
    /// At least one apply succeeded.
    Completed,
}

/// A dataset record as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Artifact the dataset currently points at.
    pub file_path: String,
    /// Raw upload; never deleted by processing.
    pub original_file_path: String,
    pub row_count: usize,
    pub original_row_count: usize,
    pub preprocessing_status: PreprocessingStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preprocessing_metadata: Option<PreprocessingMetadata>,
    /// Number of successful applies.
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatasetRecord {
    fn from_new(id: String, new: NewDataset, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            name: new.name,
            original_file_path: new.file_path.clone(),
            file_path: new.file_path,
            row_count: new.row_count,
            original_row_count: new.row_count,
            preprocessing_status: PreprocessingStatus::Pending,
            preprocessing_metadata: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields for a new record.
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub user_id: String,
    pub name: String,
    pub file_path: String,
    pub row_count: usize,
}

/// Partial update of a record; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DatasetUpdate {
    pub file_path: Option<String>,
    pub row_count: Option<usize>,
    pub original_row_count: Option<usize>,
    pub preprocessing_status: Option<PreprocessingStatus>,
    pub preprocessing_metadata: Option<PreprocessingMetadata>,
    pub revision: Option<u32>,
}

impl DatasetUpdate {
    fn apply_to(self, record: &mut DatasetRecord, now: DateTime<Utc>) {
        if let Some(path) = self.file_path {
            record.file_path = path;
        }
        if let Some(count) = self.row_count {
            record.row_count = count;
        }
        if let Some(count) = self.original_row_count {
            record.original_row_count = count;
        }
        if let Some(status) = self.preprocessing_status {
            record.preprocessing_status = status;
        }
        if let Some(metadata) = self.preprocessing_metadata {
            record.preprocessing_metadata = Some(metadata);
        }
        if let Some(revision) = self.revision {
            record.revision = revision;
        }
        record.updated_at = now;
    }
}
