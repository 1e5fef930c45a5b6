//! Configuration types for the preprocessing engine.
//!
//! This module provides configuration options using the builder pattern.
//! Preview and apply read the same [`EngineConfig`], which is what keeps
//! their type decisions identical.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical ratio of numeric-parseable values a column must strictly exceed
/// to be classified as numeric.
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.6;

/// Columns with fewer distinct normalized values than this are categorical.
pub const DEFAULT_CATEGORICAL_CARDINALITY_CAP: usize = 20;

/// Rows examined by the type inferencer.
pub const DEFAULT_TYPE_SAMPLE_SIZE: usize = 100;

/// Rows examined by the statistics profiler.
pub const DEFAULT_PROFILE_SAMPLE_SIZE: usize = 1000;

/// Rows exposed in preview samples.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Maximum number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Configuration for the preprocessing engine.
///
/// Use [`EngineConfig::builder()`] to create a new configuration
/// with fluent API. Missing fields in JSON fall back to defaults.
///
/// # Example
///
/// ```rust,ignore
/// use chartloom_processing::config::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .numeric_threshold(0.8)
///     .preview_rows(25)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ratio of numeric values (over the non-missing sample) a column must
    /// strictly exceed to be numeric.
    /// Default: 0.6
    pub numeric_threshold: f64,

    /// Distinct normalized values below which a non-numeric column is
    /// categorical rather than free text.
    /// Default: 20
    pub categorical_cardinality_cap: usize,

    /// Number of leading rows the type inferencer looks at.
    /// Default: 100
    pub type_sample_size: usize,

    /// Number of leading rows the statistics profiler looks at.
    /// Default: 1000
    pub profile_sample_size: usize,

    /// Rows shown in `original.sample` and `processed.sample`.
    /// Default: 10
    pub preview_rows: usize,

    /// Maximum histogram bin count for numeric profiles.
    /// Default: 10
    pub histogram_bins: usize,

    /// Replace missing cells with the column's median or mode.
    /// Default: true
    pub impute_missing: bool,

    /// Drop rows whose cleaned form repeats an earlier row.
    /// Default: true
    pub remove_duplicates: bool,

    /// Drop rows where every cell is blank.
    /// Default: true
    pub drop_empty_rows: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            categorical_cardinality_cap: DEFAULT_CATEGORICAL_CARDINALITY_CAP,
            type_sample_size: DEFAULT_TYPE_SAMPLE_SIZE,
            profile_sample_size: DEFAULT_PROFILE_SAMPLE_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            impute_missing: true,
            remove_duplicates: true,
            drop_empty_rows: true,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file and validate it.
    ///
    /// Any subset of fields may be present.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.numeric_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "numeric_threshold".to_string(),
                value: self.numeric_threshold,
            });
        }

        let sizes = [
            ("categorical_cardinality_cap", self.categorical_cardinality_cap),
            ("type_sample_size", self.type_sample_size),
            ("profile_sample_size", self.profile_sample_size),
            ("preview_rows", self.preview_rows),
            ("histogram_bins", self.histogram_bins),
        ];
        for (field, value) in sizes {
            if value == 0 {
                return Err(ConfigValidationError::ZeroSize(field.to_string()));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroSize(String),
}

/// Builder for [`EngineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    numeric_threshold: Option<f64>,
    categorical_cardinality_cap: Option<usize>,
    type_sample_size: Option<usize>,
    profile_sample_size: Option<usize>,
    preview_rows: Option<usize>,
    histogram_bins: Option<usize>,
    impute_missing: Option<bool>,
    remove_duplicates: Option<bool>,
    drop_empty_rows: Option<bool>,
}

impl EngineConfigBuilder {
    /// Set the numeric classification threshold (0.0 - 1.0).
    pub fn numeric_threshold(mut self, threshold: f64) -> Self {
        self.numeric_threshold = Some(threshold);
        self
    }

    /// Set the categorical cardinality cap.
    pub fn categorical_cardinality_cap(mut self, cap: usize) -> Self {
        self.categorical_cardinality_cap = Some(cap);
        self
    }

    /// Set how many leading rows the type inferencer examines.
    pub fn type_sample_size(mut self, size: usize) -> Self {
        self.type_sample_size = Some(size);
        self
    }

    /// Set how many leading rows the statistics profiler examines.
    pub fn profile_sample_size(mut self, size: usize) -> Self {
        self.profile_sample_size = Some(size);
        self
    }

    /// Set how many rows preview samples expose.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the maximum histogram bin count.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Enable or disable missing-value imputation.
    pub fn impute_missing(mut self, impute: bool) -> Self {
        self.impute_missing = Some(impute);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable empty row removal.
    pub fn drop_empty_rows(mut self, drop: bool) -> Self {
        self.drop_empty_rows = Some(drop);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EngineConfig` or an error if validation fails.
    pub fn build(self) -> Result<EngineConfig, ConfigValidationError> {
        let config = EngineConfig {
            numeric_threshold: self.numeric_threshold.unwrap_or(DEFAULT_NUMERIC_THRESHOLD),
            categorical_cardinality_cap: self
                .categorical_cardinality_cap
                .unwrap_or(DEFAULT_CATEGORICAL_CARDINALITY_CAP),
            type_sample_size: self.type_sample_size.unwrap_or(DEFAULT_TYPE_SAMPLE_SIZE),
            profile_sample_size: self
                .profile_sample_size
                .unwrap_or(DEFAULT_PROFILE_SAMPLE_SIZE),
            preview_rows: self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
            histogram_bins: self.histogram_bins.unwrap_or(DEFAULT_HISTOGRAM_BINS),
            impute_missing: self.impute_missing.unwrap_or(true),
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            drop_empty_rows: self.drop_empty_rows.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
