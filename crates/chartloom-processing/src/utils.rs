//! Shared utilities for the preprocessing engine.
//!
//! This module owns the cell-level vocabulary every other component agrees
//! on: which literals count as missing, what a numeric literal looks like,
//! and how a raw cell resolves against its column kind.

use crate::types::ColumnKind;
use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Missing-Value Tokens
// =============================================================================

/// Literals (after trim and ASCII case folding) that count as missing.
pub const MISSING_TOKENS: [&str; 5] = ["", "null", "na", "n/a", "nan"];

/// Check if a cell is a missing-value marker.
///
/// # Example
///
/// ```rust,ignore
/// use chartloom_processing::utils::is_missing;
///
/// assert!(is_missing("  N/A "));
/// assert!(is_missing(""));
/// assert!(!is_missing("none"));
/// ```
pub fn is_missing(cell: &str) -> bool {
    let folded = cell.trim().to_ascii_lowercase();
    MISSING_TOKENS.iter().any(|&token| folded == token)
}

/// Check if a cell is blank after trimming.
#[inline]
pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

// =============================================================================
// Numeric Parsing
// =============================================================================

// Plain decimal literal with optional sign, fraction and exponent.
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$")
        .expect("Invalid regex: numeric literal")
});

/// Try to parse a cell as a finite number.
///
/// Only plain decimal literals qualify; `inf`, hex, and formatted values such
/// as `$12` or `1,200` are text.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if !NUMERIC_LITERAL.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check if a cell can be parsed as a number.
#[inline]
pub fn is_numeric(cell: &str) -> bool {
    parse_numeric(cell).is_some()
}

/// Format a number the way it is written back into a cell.
///
/// Whole numbers print without a fractional part (`3`, not `3.0`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{}", value)
}

/// Normalize a value for cardinality counting.
#[inline]
pub fn normalize(cell: &str) -> String {
    cell.trim().to_lowercase()
}

// =============================================================================
// Cell Resolution
// =============================================================================

/// A raw cell resolved against its column's kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// A missing-value token.
    Missing,
    /// A number in a numeric column.
    Numeric(f64),
    /// Anything else, trimmed.
    Text(&'a str),
}

impl<'a> Cell<'a> {
    /// Resolve a raw cell for a column of the given kind.
    ///
    /// Non-missing values in categorical and text columns are always `Text`,
    /// even when they look numeric.
    pub fn resolve(raw: &'a str, kind: ColumnKind) -> Self {
        if is_missing(raw) {
            return Cell::Missing;
        }
        let trimmed = raw.trim();
        match kind {
            ColumnKind::Numeric => match parse_numeric(trimmed) {
                Some(v) => Cell::Numeric(v),
                None => Cell::Text(trimmed),
            },
            ColumnKind::Categorical | ColumnKind::Text => Cell::Text(trimmed),
        }
    }

    /// Whether this cell is a value the column kind does not accept.
    pub fn is_mismatched(&self, kind: ColumnKind) -> bool {
        matches!((self, kind), (Cell::Text(_), ColumnKind::Numeric))
    }
}
