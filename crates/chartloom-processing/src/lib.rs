//! Dataset Preprocessing & Statistical Profiling Engine
//!
//! Turns raw comma-separated uploads into cleaned, chart-ready tables and
//! describes every column along the way.
//!
//! # Overview
//!
//! - **Parsing**: permissive row parser with normalized, unique headers
//! - **Type Inference**: numeric, categorical, or free text per column from a sample
//! - **Profiling**: counts, percentages, quartiles, histograms, and modes
//! - **Cleaning**: empty-row removal, median/mode imputation, duplicate removal
//! - **Preview**: a dry run whose counts match what apply will do
//! - **Apply**: rewrites the dataset artifact with write-then-flip ordering
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chartloom_processing::{Engine, EngineConfig, FsStorage, JsonRecordStore};
//! use std::sync::Arc;
//!
//! let engine = Engine::builder()
//!     .config(EngineConfig::builder().preview_rows(20).build()?)
//!     .storage(Arc::new(FsStorage::new("data/objects")))
//!     .records(Arc::new(JsonRecordStore::new("data/datasets.json")))
//!     .build()?;
//!
//! let record = engine.register("user-1", "sales.csv", &std::fs::read("sales.csv")?)?;
//!
//! let preview = engine.preview("user-1", &record.id)?;
//! println!("{} duplicates would be removed", preview.changes.duplicates_removed);
//!
//! let applied = engine.apply("user-1", &record.id)?;
//! println!("{} -> {} rows", applied.original_row_count, applied.processed_row_count);
//! ```
//!
//! # Working Without Storage
//!
//! The building blocks run on in-memory tables as well:
//!
//! ```rust,ignore
//! use chartloom_processing::{DataCleaner, DataProfiler, EngineConfig, parse};
//!
//! let table = parse("a,b\n1,x\n,y\n1,x\n3,\n")?;
//! let config = EngineConfig::default();
//!
//! let profiles = DataProfiler::profile(&table, 1000, &config);
//! let cleaned = DataCleaner::process(&table, &config)?;
//! assert_eq!(cleaned.counters.duplicates_removed, 1);
//! ```
//!
//! # Storage Backends
//!
//! The engine talks to object storage and the record store through the
//! [`storage::ObjectStorage`] and [`storage::RecordStore`] traits. See the
//! [`storage`] module for the bundled implementations.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod parser;
pub mod pipeline;
pub mod profiler;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{ConfigValidationError, EngineConfig, EngineConfigBuilder};
pub use error::{EngineError, Result as EngineResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use parser::{RawTable, parse, to_delimited_text};
pub use pipeline::{ApplyExecutor, Engine, EngineBuilder, PREPROCESSING_STEPS, PreviewAssembler};
pub use profiler::{DataProfiler, classify, infer_column_kinds};
pub use storage::{
    DatasetRecord, DatasetUpdate, FsStorage, JsonRecordStore, MemoryRecordStore, MemoryStorage,
    NewDataset, ObjectStorage, PreprocessingStatus, RecordStore,
};
pub use types::{
    ApplyResult, CleaningCounters, CleaningResult, ColumnChange, ColumnKind, ColumnProfile,
    DatasetProfile, ImputationStrategy, PreprocessingMetadata, PreviewResult, TableSnapshot,
};
pub use utils::{MISSING_TOKENS, is_missing, parse_numeric};
