//! The engine: dataset-level operations over the storage collaborators.
//!
//! Use [`Engine::builder()`] to wire an engine to an [`ObjectStorage`] and a
//! [`RecordStore`].

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, ResultExt};
use crate::parser::{self, CONTENT_TYPE, RawTable};
use crate::pipeline::{ApplyExecutor, PreviewAssembler};
use crate::profiler::DataProfiler;
use crate::storage::{DatasetRecord, NewDataset, ObjectStorage, RecordStore};
use crate::types::{ApplyResult, DatasetProfile, PreviewResult};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SUPPORTED_EXTENSION: &str = ".csv";

/// Dataset preprocessing engine.
///
/// # Example
///
/// ```rust,ignore
/// use chartloom_processing::{Engine, MemoryRecordStore, MemoryStorage};
/// use std::sync::Arc;
///
/// let engine = Engine::builder()
///     .storage(Arc::new(MemoryStorage::new()))
///     .records(Arc::new(MemoryRecordStore::new()))
///     .build()?;
///
/// let record = engine.register("user-1", "sales.csv", bytes)?;
/// let preview = engine.preview("user-1", &record.id)?;
/// let applied = engine.apply("user-1", &record.id)?;
/// ```
pub struct Engine {
    config: EngineConfig,
    storage: Arc<dyn ObjectStorage>,
    records: Arc<dyn RecordStore>,
}

// Engines are shared across request handlers.
static_assertions::assert_impl_all!(Engine: Send, Sync);

impl Engine {
    /// Create a new engine builder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store a raw upload and create its pending dataset record.
    pub fn register(&self, user_id: &str, name: &str, bytes: &[u8]) -> Result<DatasetRecord> {
        let user_id = authorize(user_id)?;
        ensure_supported(name)?;

        let table = decode(bytes)?;
        if table.row_count() == 0 {
            return Err(EngineError::EmptySource(name.to_string()));
        }

        // One directory per upload, so equal names never share an object.
        let path = format!(
            "uploads/{}/{}/{}",
            sanitize_segment(user_id),
            Uuid::new_v4(),
            sanitize_segment(name)
        );
        self.storage
            .upload(&path, bytes, CONTENT_TYPE)
            .context("Storing raw upload")?;

        let record = match self.records.create_dataset(NewDataset {
            user_id: user_id.to_string(),
            name: name.to_string(),
            file_path: path.clone(),
            row_count: table.row_count(),
        }) {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&path) {
                    warn!("Failed to remove orphaned upload {}: {}", path, cleanup);
                }
                return Err(e.with_context("Creating dataset record"));
            }
        };

        info!(
            "Registered dataset '{}' ({}): {} rows x {} columns",
            record.id,
            name,
            table.row_count(),
            table.column_count()
        );
        Ok(record)
    }

    /// Fetch a dataset record owned by `user_id`.
    pub fn dataset(&self, user_id: &str, dataset_id: &str) -> Result<DatasetRecord> {
        let user_id = authorize(user_id)?;
        match self.records.get_dataset_by_id(dataset_id)? {
            Some(record) if record.user_id == user_id => Ok(record),
            Some(_) => {
                // Foreign records are indistinguishable from missing ones.
                debug!("Dataset '{}' is owned by another user", dataset_id);
                Err(EngineError::NotFound(dataset_id.to_string()))
            }
            None => Err(EngineError::NotFound(dataset_id.to_string())),
        }
    }

    /// Profile the dataset's current artifact.
    ///
    /// `sample_size` defaults to the configured profile sample size.
    pub fn profile(
        &self,
        user_id: &str,
        dataset_id: &str,
        sample_size: Option<usize>,
    ) -> Result<DatasetProfile> {
        let sample_size = sample_size.unwrap_or(self.config.profile_sample_size);
        if sample_size == 0 {
            return Err(EngineError::InvalidConfig(
                "sample size must be at least 1".to_string(),
            ));
        }

        let record = self.dataset(user_id, dataset_id)?;
        let table = self.load_table(&record)?;
        let columns = DataProfiler::profile(&table, sample_size, &self.config);

        Ok(DatasetProfile {
            dataset_id: record.id,
            row_count: table.row_count(),
            column_count: table.column_count(),
            sample_size: sample_size.min(table.row_count()),
            columns,
        })
    }

    /// Dry-run the cleaning pass. Nothing is persisted.
    pub fn preview(&self, user_id: &str, dataset_id: &str) -> Result<PreviewResult> {
        let record = self.dataset(user_id, dataset_id)?;
        let table = self.load_table(&record)?;
        PreviewAssembler::assemble(&table, &self.config)
            .map_err(|e| e.with_context(format!("Previewing dataset '{}'", record.id)))
    }

    /// Run the cleaning pass and replace the dataset's artifact with its output.
    pub fn apply(&self, user_id: &str, dataset_id: &str) -> Result<ApplyResult> {
        let record = self.dataset(user_id, dataset_id)?;
        let table = self.load_table(&record)?;
        ApplyExecutor::new(self.storage.as_ref(), self.records.as_ref(), &self.config)
            .execute(&record, &table)
            .map_err(|e| e.with_context(format!("Applying preprocessing to '{}'", record.id)))
    }

    fn load_table(&self, record: &DatasetRecord) -> Result<RawTable> {
        ensure_supported(&record.file_path)?;
        let bytes = self
            .storage
            .download(&record.file_path)
            .context(format!("Loading artifact for '{}'", record.id))?;
        let table = decode(&bytes)?;
        debug!(
            "Loaded '{}': {} rows x {} columns",
            record.file_path,
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<EngineConfig>,
    storage: Option<Arc<dyn ObjectStorage>>,
    records: Option<Arc<dyn RecordStore>>,
}

impl EngineBuilder {
    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Build the engine, validating the configuration.
    pub fn build(self) -> Result<Engine> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        let storage = self
            .storage
            .ok_or_else(|| EngineError::InvalidConfig("object storage is required".to_string()))?;
        let records = self
            .records
            .ok_or_else(|| EngineError::InvalidConfig("record store is required".to_string()))?;

        Ok(Engine {
            config,
            storage,
            records,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn authorize(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        warn!("Rejected request without a caller identity");
        return Err(EngineError::Unauthorized(
            "caller identity is required".to_string(),
        ));
    }
    Ok(user_id)
}

fn ensure_supported(path: &str) -> Result<()> {
    if path.to_ascii_lowercase().ends_with(SUPPORTED_EXTENSION) {
        Ok(())
    } else {
        Err(EngineError::UnsupportedFormat(format!(
            "'{}' is not a comma-separated text file",
            path
        )))
    }
}

fn decode(bytes: &[u8]) -> Result<RawTable> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        EngineError::UnsupportedFormat(format!("content is not UTF-8 text: {}", e))
    })?;
    parser::parse(text)
}

/// Reduce a user-supplied string to a safe single path segment.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Dot-only segments would be read as path components.
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}
