//! Data cleaning module for preprocessing datasets.
//!
//! This module provides the row processor shared by preview and apply:
//! 1. Dropping rows where every cell is blank
//! 2. Trimming cells and imputing missing ones
//! 3. Dropping rows whose cleaned form repeats an earlier row
//!
//! All three happen in one left-to-right pass. Surviving rows keep their
//! relative order.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::imputers::StatisticalImputer;
use crate::parser::RawTable;
use crate::profiler::infer_column_kinds;
use crate::types::{CleaningCounters, CleaningResult, ColumnChange};
use crate::utils::{is_blank, is_missing};
use std::collections::HashSet;
use tracing::{debug, info};

/// Separator for duplicate-detection keys.
const ROW_KEY_SEPARATOR: char = '\u{1f}';

/// Data cleaner for the single cleaning pass over a table.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean every row of `table`.
    ///
    /// Column kinds and fill values are decided once from the untouched
    /// table before any row is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptySource`] when the table has no data rows.
    pub fn process(table: &RawTable, config: &EngineConfig) -> Result<CleaningResult> {
        if table.row_count() == 0 {
            return Err(EngineError::EmptySource(
                "no data rows after the header".to_string(),
            ));
        }

        info!(
            "Cleaning {} rows x {} columns...",
            table.row_count(),
            table.column_count()
        );

        let kinds = infer_column_kinds(table, config);
        let plan = StatisticalImputer::plan(table, &kinds, config);
        for (name, column) in table.headers().iter().zip(&plan) {
            debug!(
                "Column '{}': {} ({:?} -> {:?})",
                name, column.kind, column.strategy, column.value
            );
        }

        let width = table.column_count();
        let mut counters = CleaningCounters::default();
        let mut missing_before = vec![0usize; width];
        let mut seen: HashSet<String> = HashSet::new();
        let mut cleaned_rows = Vec::with_capacity(table.row_count());

        for row in table.rows() {
            for (idx, cell) in row.iter().enumerate() {
                if is_missing(cell) {
                    missing_before[idx] += 1;
                }
            }

            if config.drop_empty_rows && row.iter().all(|cell| is_blank(cell)) {
                counters.empty_rows_removed += 1;
                continue;
            }

            let mut cleaned = Vec::with_capacity(width);
            for (cell, column) in row.iter().zip(&plan) {
                let trimmed = cell.trim();
                if is_missing(trimmed)
                    && let Some(value) = &column.value
                {
                    cleaned.push(value.clone());
                    counters.cells_imputed += 1;
                } else {
                    cleaned.push(trimmed.to_string());
                }
            }

            if config.remove_duplicates {
                let key = row_key(&cleaned);
                if !seen.insert(key) {
                    counters.duplicates_removed += 1;
                    continue;
                }
            }

            cleaned_rows.push(cleaned);
        }

        let column_changes = table
            .headers()
            .iter()
            .zip(plan)
            .enumerate()
            .map(|(idx, (name, column))| ColumnChange {
                name: name.clone(),
                kind: column.kind,
                missing_before: missing_before[idx],
                missing_after: cleaned_rows
                    .iter()
                    .filter(|row: &&Vec<String>| is_missing(&row[idx]))
                    .count(),
                imputation_strategy: column.strategy,
                imputation_value: column.value,
            })
            .collect();

        info!(
            "Cleaning complete: {} -> {} rows ({} removed: {} empty, {} duplicate; {} cells imputed)",
            table.row_count(),
            cleaned_rows.len(),
            counters.rows_removed(),
            counters.empty_rows_removed,
            counters.duplicates_removed,
            counters.cells_imputed
        );

        Ok(CleaningResult {
            headers: table.headers().to_vec(),
            cleaned_rows,
            original_row_count: table.row_count(),
            counters,
            column_changes,
        })
    }
}

fn row_key(cells: &[String]) -> String {
    let mut key = String::with_capacity(cells.iter().map(|c| c.len() + 1).sum());
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            key.push(ROW_KEY_SEPARATOR);
        }
        key.push_str(cell);
    }
    key
}
