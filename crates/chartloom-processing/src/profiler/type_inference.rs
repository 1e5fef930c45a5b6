//! Type inference logic for column analysis.
//!
//! Preview, apply, and profiling all classify columns through
//! [`infer_column_kinds`], so the same table always yields the same kinds.

use crate::config::EngineConfig;
use crate::parser::RawTable;
use crate::types::ColumnKind;
use crate::utils::{is_missing, is_numeric, normalize};
use std::collections::HashSet;

/// Classify a column from its values.
///
/// Looks at the first `config.type_sample_size` values and ignores missing
/// tokens among them. The column is numeric when the numeric ratio strictly
/// exceeds `config.numeric_threshold`; otherwise categorical when it has fewer
/// than `config.categorical_cardinality_cap` distinct normalized values;
/// otherwise text. A column with no non-missing values is categorical.
pub fn classify<'a, I>(values: I, config: &EngineConfig) -> ColumnKind
where
    I: IntoIterator<Item = &'a str>,
{
    let sample: Vec<&str> = values
        .into_iter()
        .take(config.type_sample_size)
        .filter(|v| !is_missing(v))
        .collect();

    if !sample.is_empty() {
        let numeric_count = sample.iter().filter(|v| is_numeric(v)).count();
        let ratio = numeric_count as f64 / sample.len() as f64;
        if ratio > config.numeric_threshold {
            return ColumnKind::Numeric;
        }
    }

    let distinct: HashSet<String> = sample.iter().map(|v| normalize(v)).collect();
    if distinct.len() < config.categorical_cardinality_cap {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

/// Classify every column of a table, in header order.
pub fn infer_column_kinds(table: &RawTable, config: &EngineConfig) -> Vec<ColumnKind> {
    (0..table.column_count())
        .map(|idx| classify(table.column(idx), config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_numeric_column() {
        let kind = classify(["1", "2.5", "-3", "4e2"], &config());
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_missing_tokens_excluded_from_ratio() {
        // 2 of 2 non-missing values are numeric.
        let kind = classify(["1", "", "NA", "null", "3"], &config());
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_mostly_numeric_with_noise_is_numeric() {
        let kind = classify(["1", "2", "3", "4", "oops"], &config());
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_ratio_at_threshold_is_not_numeric() {
        // 3 of 5 = 0.6, which does not exceed 0.6.
        let kind = classify(["1", "2", "3", "a", "b"], &config());
        assert_eq!(kind, ColumnKind::Categorical);
    }

    #[test]
    fn test_binary_flag_column_is_numeric() {
        // Cardinality is only consulted when the numeric ratio fails.
        let kind = classify(["0", "1", "1", "0", "1"], &config());
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_low_cardinality_text_is_categorical() {
        let kind = classify(["red", "Red ", "blue", "green", "red"], &config());
        assert_eq!(kind, ColumnKind::Categorical);
    }

    #[test]
    fn test_high_cardinality_text_is_text() {
        let values: Vec<String> = (0..30).map(|i| format!("comment {i}")).collect();
        let kind = classify(values.iter().map(String::as_str), &config());
        assert_eq!(kind, ColumnKind::Text);
    }

    #[test]
    fn test_cardinality_cap_is_exclusive() {
        let cfg = EngineConfig::builder()
            .categorical_cardinality_cap(3)
            .build()
            .unwrap();
        assert_eq!(classify(["a", "b"], &cfg), ColumnKind::Categorical);
        assert_eq!(classify(["a", "b", "c"], &cfg), ColumnKind::Text);
    }

    #[test]
    fn test_all_missing_column_is_categorical() {
        let kind = classify(["", "NaN", "n/a"], &config());
        assert_eq!(kind, ColumnKind::Categorical);
    }

    #[test]
    fn test_only_leading_sample_considered() {
        let cfg = EngineConfig::builder().type_sample_size(3).build().unwrap();
        // The trailing text never enters the sample.
        let kind = classify(["1", "2", "3", "x", "y", "z", "w"], &cfg);
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_infer_column_kinds_in_header_order() {
        let table = parse("a,b,c\n1,x,\n2,y,\n3,x,").unwrap();
        let kinds = infer_column_kinds(&table, &config());
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Categorical
            ]
        );
    }
}
