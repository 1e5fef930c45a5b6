//! Data profiling module for dataset analysis.
//!
//! This module provides functionality for profiling tables, including:
//! - Type inference for columns
//! - Validity classification (valid / missing / mismatched)
//! - Numeric statistics (mean, standard deviation, quartiles, histogram)
//! - Categorical statistics (unique count, most common value)

mod statistics;
mod type_inference;

pub use type_inference::{classify, infer_column_kinds};

pub(crate) use statistics::{median, mode};

use crate::config::EngineConfig;
use crate::parser::RawTable;
use crate::types::{ColumnKind, ColumnProfile};
use crate::utils::Cell;
use statistics::{categorical_summary, numeric_summary, percentage};
use tracing::debug;

/// Data profiler for per-column descriptive statistics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile every column over the first `sample_size` rows.
    ///
    /// Column kinds come from [`infer_column_kinds`], so they match what the
    /// row processor decides for the same table.
    pub fn profile(table: &RawTable, sample_size: usize, config: &EngineConfig) -> Vec<ColumnProfile> {
        let kinds = infer_column_kinds(table, config);
        Self::profile_with_kinds(table, &kinds, sample_size, config.histogram_bins)
    }

    /// Profile every column using kinds decided elsewhere.
    ///
    /// Used to profile a cleaned table with the kinds of the pass that
    /// produced it instead of re-inferring them.
    pub fn profile_with_kinds(
        table: &RawTable,
        kinds: &[ColumnKind],
        sample_size: usize,
        histogram_bins: usize,
    ) -> Vec<ColumnProfile> {
        let sample = table.head(sample_size);

        table
            .headers()
            .iter()
            .zip(kinds)
            .enumerate()
            .map(|(idx, (name, &kind))| {
                let cells = sample.iter().map(|row| row[idx].as_str());
                Self::profile_column(name, kind, cells, histogram_bins)
            })
            .collect()
    }

    fn profile_column<'a>(
        name: &str,
        kind: ColumnKind,
        cells: impl Iterator<Item = &'a str>,
        histogram_bins: usize,
    ) -> ColumnProfile {
        let mut total_count = 0;
        let mut missing_count = 0;
        let mut mismatched_count = 0;
        let mut numbers = Vec::new();
        let mut texts = Vec::new();

        for raw in cells {
            total_count += 1;
            let cell = Cell::resolve(raw, kind);
            if cell.is_mismatched(kind) {
                mismatched_count += 1;
                continue;
            }
            match cell {
                Cell::Missing => missing_count += 1,
                Cell::Numeric(v) => numbers.push(v),
                Cell::Text(s) => texts.push(s),
            }
        }

        let valid_count = total_count - missing_count - mismatched_count;
        debug!(
            "Profiled '{}' as {}: {} valid, {} missing, {} mismatched",
            name, kind, valid_count, missing_count, mismatched_count
        );

        let (numeric, categorical) = match kind {
            ColumnKind::Numeric => (numeric_summary(&numbers, histogram_bins), None),
            ColumnKind::Categorical | ColumnKind::Text => (None, categorical_summary(&texts)),
        };

        ColumnProfile {
            name: name.to_string(),
            kind,
            total_count,
            valid_count,
            missing_count,
            mismatched_count,
            valid_pct: percentage(valid_count, total_count),
            missing_pct: percentage(missing_count, total_count),
            mismatched_pct: percentage(mismatched_count, total_count),
            numeric,
            categorical,
        }
    }
}
