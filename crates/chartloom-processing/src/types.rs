//! Data model shared by the profiler, the row processor, and the outward
//! preview/apply interface.
//!
//! Everything here serializes with camelCase keys, which is the shape the
//! dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Column Kinds & Profiles
// ============================================================================

/// Semantic kind of a column. Inferred, never declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One histogram bucket. Buckets are right-open except the last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Quartiles picked at sorted index `floor(p * (n - 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quartiles {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

/// Descriptive statistics over the valid values of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub mean: f64,
    /// Same as `quartiles.q50`.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub quartiles: Quartiles,
    pub histogram: Vec<HistogramBin>,
}

/// Frequency statistics over the valid values of a categorical or text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalSummary {
    pub unique_count: usize,
    pub most_common_value: String,
    pub most_common_count: usize,
    /// Percentage (0-100) of valid values equal to `most_common_value`.
    pub most_common_share: f64,
}

/// Profile of a single column over a leading sample of rows.
///
/// `valid_count + missing_count + mismatched_count == total_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub total_count: usize,
    pub valid_count: usize,
    pub missing_count: usize,
    pub mismatched_count: usize,
    pub valid_pct: f64,
    pub missing_pct: f64,
    pub mismatched_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalSummary>,
}

/// Profile of a whole dataset, as returned by the interactive profiling call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    pub dataset_id: String,
    pub row_count: usize,
    pub column_count: usize,
    pub sample_size: usize,
    pub columns: Vec<ColumnProfile>,
}

// ============================================================================
// Cleaning Results
// ============================================================================

/// How a column's missing cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationStrategy {
    /// Median of the numeric values.
    Median,
    /// Most frequent value, first seen wins ties.
    Mode,
    /// Fallback when the column has no usable values (`0` or `"Unknown"`).
    Constant,
    /// Imputation turned off in the configuration.
    Disabled,
}

/// Row-level change counters for one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningCounters {
    pub empty_rows_removed: usize,
    pub duplicates_removed: usize,
    pub cells_imputed: usize,
}

impl CleaningCounters {
    /// Rows dropped for any reason.
    pub fn rows_removed(&self) -> usize {
        self.empty_rows_removed + self.duplicates_removed
    }

    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-column change report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_before: usize,
    pub missing_after: usize,
    pub imputation_strategy: ImputationStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputation_value: Option<String>,
}

/// Output of one Row Processor run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningResult {
    pub headers: Vec<String>,
    pub cleaned_rows: Vec<Vec<String>>,
    /// Data rows in the source before any were dropped.
    pub original_row_count: usize,
    pub counters: CleaningCounters,
    pub column_changes: Vec<ColumnChange>,
}

impl CleaningResult {
    pub fn processed_row_count(&self) -> usize {
        self.cleaned_rows.len()
    }
}

// ============================================================================
// Preview & Apply Responses
// ============================================================================

/// Leading rows of a table for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSample {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One side of the preview's before/after comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub row_count: usize,
    pub column_count: usize,
    pub sample: TableSample,
    pub profiles: Vec<ColumnProfile>,
}

/// Response of the non-persisting preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub original: TableSnapshot,
    pub processed: TableSnapshot,
    pub changes: CleaningCounters,
    pub column_changes: Vec<ColumnChange>,
    pub steps: Vec<String>,
}

/// Summary persisted on the dataset record after a successful apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessingMetadata {
    pub processed_at: DateTime<Utc>,
    pub original_row_count: usize,
    pub processed_row_count: usize,
    #[serde(flatten)]
    pub changes: CleaningCounters,
    pub column_changes: Vec<ColumnChange>,
}

impl PreprocessingMetadata {
    pub fn from_result(result: &CleaningResult, processed_at: DateTime<Utc>) -> Self {
        Self {
            processed_at,
            original_row_count: result.original_row_count,
            processed_row_count: result.processed_row_count(),
            changes: result.counters,
            column_changes: result.column_changes.clone(),
        }
    }
}

/// Response of the persisting apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub success: bool,
    pub metadata: PreprocessingMetadata,
    pub original_row_count: usize,
    pub processed_row_count: usize,
}
