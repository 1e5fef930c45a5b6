//! Apply execution: the persisting run.
//!
//! Ordering is write-then-flip. The cleaned artifact is uploaded under a new
//! revision path first; the dataset record is pointed at it only after the
//! upload succeeded. A failed upload leaves the record untouched, and a failed
//! record update removes the orphaned artifact.

use crate::cleaner::DataCleaner;
use crate::config::EngineConfig;
use crate::error::{Result, ResultExt};
use crate::parser::{CONTENT_TYPE, RawTable, to_delimited_text};
use crate::storage::{
    DatasetRecord, DatasetUpdate, ObjectStorage, PreprocessingStatus, RecordStore,
};
use crate::types::{ApplyResult, PreprocessingMetadata};
use chrono::Utc;
use tracing::{error, info, warn};

/// Path of the cleaned artifact for a dataset revision.
pub fn processed_artifact_path(dataset_id: &str, revision: u32) -> String {
    format!("processed/{}/v{}.csv", dataset_id, revision)
}

/// Runs the cleaning pass and commits its output.
pub struct ApplyExecutor<'a> {
    storage: &'a dyn ObjectStorage,
    records: &'a dyn RecordStore,
    config: &'a EngineConfig,
}

impl<'a> ApplyExecutor<'a> {
    pub fn new(
        storage: &'a dyn ObjectStorage,
        records: &'a dyn RecordStore,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            storage,
            records,
            config,
        }
    }

    /// Clean `table` (the current artifact of `record`) and replace the
    /// artifact with the result.
    pub fn execute(&self, record: &DatasetRecord, table: &RawTable) -> Result<ApplyResult> {
        let result = DataCleaner::process(table, self.config)?;
        let bytes = to_delimited_text(&result.headers, &result.cleaned_rows)?;

        let revision = record.revision + 1;
        let artifact_path = processed_artifact_path(&record.id, revision);

        self.storage
            .upload(&artifact_path, &bytes, CONTENT_TYPE)
            .context("Writing cleaned artifact")?;
        info!(
            "Wrote cleaned artifact {} ({} bytes)",
            artifact_path,
            bytes.len()
        );

        let metadata = PreprocessingMetadata::from_result(&result, Utc::now());
        let update = DatasetUpdate {
            file_path: Some(artifact_path.clone()),
            row_count: Some(result.processed_row_count()),
            original_row_count: Some(result.original_row_count),
            preprocessing_status: Some(PreprocessingStatus::Completed),
            preprocessing_metadata: Some(metadata.clone()),
            revision: Some(revision),
        };

        if let Err(e) = self.records.update_dataset(&record.id, update) {
            error!("Record update for '{}' failed: {}", record.id, e);
            if let Err(cleanup) = self.storage.delete(&artifact_path) {
                warn!("Failed to remove orphaned artifact {}: {}", artifact_path, cleanup);
            }
            return Err(e.with_context("Updating dataset record"));
        }

        self.remove_superseded(record, &artifact_path);

        info!(
            "Applied preprocessing to '{}': {} -> {} rows (revision {})",
            record.id,
            result.original_row_count,
            result.processed_row_count(),
            revision
        );

        Ok(ApplyResult {
            success: true,
            original_row_count: metadata.original_row_count,
            processed_row_count: metadata.processed_row_count,
            metadata,
        })
    }

    /// Delete the artifact the record pointed at before this run, unless it is
    /// the raw upload.
    fn remove_superseded(&self, record: &DatasetRecord, new_path: &str) {
        let previous = &record.file_path;
        if previous == &record.original_file_path || previous == new_path {
            return;
        }
        if let Err(e) = self.storage.delete(previous) {
            warn!("Failed to remove superseded artifact {}: {}", previous, e);
        }
    }
}
