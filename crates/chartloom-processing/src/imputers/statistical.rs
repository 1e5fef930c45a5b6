//! Statistical imputation: median for numeric columns, mode for the rest.
//!
//! Fill values are computed from the untouched source column before any row
//! is rewritten, so imputing early rows never shifts the value used for
//! later ones.

use crate::config::EngineConfig;
use crate::parser::RawTable;
use crate::profiler::{median, mode};
use crate::types::{ColumnKind, ImputationStrategy};
use crate::utils::{Cell, format_number};

/// Fill value used for a numeric column with no numeric values.
pub const NUMERIC_FALLBACK: f64 = 0.0;

/// Fill value used for a categorical or text column with no values.
pub const CATEGORICAL_FALLBACK: &str = "Unknown";

/// How one column's missing cells will be filled during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnImputation {
    pub kind: ColumnKind,
    pub strategy: ImputationStrategy,
    /// Stringified fill value, `None` when imputation is disabled.
    pub value: Option<String>,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute the fill value for every column of `table`.
    ///
    /// `kinds` must be the kinds decided for this pass, one per header.
    pub fn plan(
        table: &RawTable,
        kinds: &[ColumnKind],
        config: &EngineConfig,
    ) -> Vec<ColumnImputation> {
        kinds
            .iter()
            .enumerate()
            .map(|(idx, &kind)| {
                if !config.impute_missing {
                    return ColumnImputation {
                        kind,
                        strategy: ImputationStrategy::Disabled,
                        value: None,
                    };
                }
                let (strategy, value) = Self::imputation_value(kind, table.column(idx));
                ColumnImputation {
                    kind,
                    strategy,
                    value: Some(value),
                }
            })
            .collect()
    }

    /// Fill value for a column of `kind` given its raw cells.
    ///
    /// Numeric columns get the median of their numeric values (mismatched
    /// text is ignored); other columns get the mode of their trimmed values.
    /// Columns with nothing to summarize get a constant fallback.
    pub fn imputation_value<'a>(
        kind: ColumnKind,
        cells: impl Iterator<Item = &'a str>,
    ) -> (ImputationStrategy, String) {
        let resolved = cells.map(|raw| Cell::resolve(raw, kind));

        match kind {
            ColumnKind::Numeric => {
                let numbers: Vec<f64> = resolved
                    .filter_map(|cell| match cell {
                        Cell::Numeric(v) => Some(v),
                        _ => None,
                    })
                    .collect();
                match median(&numbers) {
                    Some(m) => (ImputationStrategy::Median, format_number(m)),
                    None => (
                        ImputationStrategy::Constant,
                        format_number(NUMERIC_FALLBACK),
                    ),
                }
            }
            ColumnKind::Categorical | ColumnKind::Text => {
                let texts: Vec<&str> = resolved
                    .filter_map(|cell| match cell {
                        Cell::Text(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                match mode(&texts) {
                    Some((value, _)) => (ImputationStrategy::Mode, value.to_string()),
                    None => (
                        ImputationStrategy::Constant,
                        CATEGORICAL_FALLBACK.to_string(),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::profiler::infer_column_kinds;

    fn plan_for(text: &str, config: &EngineConfig) -> Vec<ColumnImputation> {
        let table = parse(text).unwrap();
        let kinds = infer_column_kinds(&table, config);
        StatisticalImputer::plan(&table, &kinds, config)
    }

    #[test]
    fn test_numeric_median() {
        let (strategy, value) =
            StatisticalImputer::imputation_value(ColumnKind::Numeric, ["1", "", "1", "3"].into_iter());
        assert_eq!(strategy, ImputationStrategy::Median);
        assert_eq!(value, "1");
    }

    #[test]
    fn test_numeric_median_even_count() {
        let (_, value) =
            StatisticalImputer::imputation_value(ColumnKind::Numeric, ["1", "2", "NA"].into_iter());
        assert_eq!(value, "1.5");
    }

    #[test]
    fn test_numeric_median_ignores_mismatched_text() {
        let (_, value) = StatisticalImputer::imputation_value(
            ColumnKind::Numeric,
            ["10", "oops", "30", "20"].into_iter(),
        );
        assert_eq!(value, "20");
    }

    #[test]
    fn test_categorical_mode_first_seen_tie() {
        let (strategy, value) = StatisticalImputer::imputation_value(
            ColumnKind::Categorical,
            ["x", "y", ""].into_iter(),
        );
        assert_eq!(strategy, ImputationStrategy::Mode);
        assert_eq!(value, "x");
    }

    #[test]
    fn test_mode_uses_trimmed_values() {
        let (_, value) = StatisticalImputer::imputation_value(
            ColumnKind::Text,
            [" b", "a", "b "].into_iter(),
        );
        assert_eq!(value, "b");
    }

    #[test]
    fn test_fallbacks_for_empty_columns() {
        let (strategy, value) =
            StatisticalImputer::imputation_value(ColumnKind::Numeric, ["", "NaN"].into_iter());
        assert_eq!(strategy, ImputationStrategy::Constant);
        assert_eq!(value, "0");

        let (strategy, value) =
            StatisticalImputer::imputation_value(ColumnKind::Categorical, ["null"].into_iter());
        assert_eq!(strategy, ImputationStrategy::Constant);
        assert_eq!(value, CATEGORICAL_FALLBACK);
    }

    #[test]
    fn test_plan_covers_every_column() {
        let plan = plan_for("a,b,c\n1,x,\n,y,\n3,x,\n", &EngineConfig::default());
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].value.as_deref(), Some("2"));
        assert_eq!(plan[1].value.as_deref(), Some("x"));
        assert_eq!(plan[2].value.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_plan_disabled() {
        let config = EngineConfig::builder().impute_missing(false).build().unwrap();
        let plan = plan_for("a\n1\n\n2\n", &config);
        assert_eq!(plan[0].strategy, ImputationStrategy::Disabled);
        assert_eq!(plan[0].value, None);
    }
}
