//! Preview assembly: the non-persisting dry run.

use crate::cleaner::DataCleaner;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::parser::RawTable;
use crate::profiler::DataProfiler;
use crate::types::{ColumnKind, PreviewResult, TableSample, TableSnapshot};
use tracing::info;

/// Fixed description of the cleaning policy, in the order it is presented.
pub const PREPROCESSING_STEPS: [&str; 4] = [
    "Detect column types: numeric when most sampled values parse as numbers, otherwise categorical or text",
    "Impute missing values: median for numeric columns, most frequent value for categorical and text columns",
    "Remove duplicate rows, keeping the first occurrence",
    "Remove rows where every cell is empty",
];

/// Builds the before/after comparison shown ahead of an apply.
pub struct PreviewAssembler;

impl PreviewAssembler {
    /// Run the full cleaning pass over `table` and package the outcome.
    ///
    /// The pass covers every row, so `changes` and `column_changes` are
    /// exactly what an apply of the same table produces. Only the samples are
    /// truncated to `config.preview_rows`.
    pub fn assemble(table: &RawTable, config: &EngineConfig) -> Result<PreviewResult> {
        let result = DataCleaner::process(table, config)?;
        let kinds: Vec<ColumnKind> = result.column_changes.iter().map(|c| c.kind).collect();

        let original = snapshot(table, &kinds, config);
        let cleaned = RawTable::new(result.headers, result.cleaned_rows);
        let processed = snapshot(&cleaned, &kinds, config);

        info!(
            "Preview ready: {} -> {} rows",
            original.row_count, processed.row_count
        );

        Ok(PreviewResult {
            original,
            processed,
            changes: result.counters,
            column_changes: result.column_changes,
            steps: PREPROCESSING_STEPS.iter().map(|s| s.to_string()).collect(),
        })
    }
}

fn snapshot(table: &RawTable, kinds: &[ColumnKind], config: &EngineConfig) -> TableSnapshot {
    TableSnapshot {
        row_count: table.row_count(),
        column_count: table.column_count(),
        sample: TableSample {
            headers: table.headers().to_vec(),
            rows: table.head(config.preview_rows).to_vec(),
        },
        profiles: DataProfiler::profile_with_kinds(
            table,
            kinds,
            config.profile_sample_size,
            config.histogram_bins,
        ),
    }
}
