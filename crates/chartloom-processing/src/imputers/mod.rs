//! Missing value imputation module.
//!
//! Provides the median/mode policy used by the row processor.

mod statistical;

pub use statistical::{
    CATEGORICAL_FALLBACK, ColumnImputation, NUMERIC_FALLBACK, StatisticalImputer,
};
