//! Delimited-text parsing.
//!
//! The reader is deliberately permissive: a double quote toggles quoting and
//! is never part of a value, a comma outside quotes ends a field, and every
//! field is trimmed. Nothing short of an empty input is an error.
//!
//! The writer in [`writer`] emits the persisted artifact with every field
//! quoted, which the reader turns back into the same cells.

mod writer;

pub use writer::{CONTENT_TYPE, to_delimited_text};

use crate::error::{EngineError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Parsed table of string cells.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, padding short rows with empty cells and truncating
    /// long ones.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Parse delimited text into a [`RawTable`].
///
/// Blank lines are skipped. The first remaining line is the header.
///
/// # Errors
///
/// Returns [`EngineError::Parse`] when no non-blank line remains.
pub fn parse(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| EngineError::Parse("input contains no header row".to_string()))?;
    let headers = normalize_headers(split_line(header_line));
    let rows: Vec<Vec<String>> = lines.map(split_line).collect();

    debug!(
        "Parsed {} columns and {} data rows",
        headers.len(),
        rows.len()
    );

    Ok(RawTable::new(headers, rows))
}

/// Split one line into trimmed fields.
///
/// Quotes toggle the in-quotes state and are dropped. A trailing comma yields
/// a trailing empty field.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Make header names non-empty and unique.
///
/// Blank names become `column_<n>` (1-based position); repeats get `_2`,
/// `_3`, ... suffixes.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            name
        };

        let mut candidate = base.clone();
        while seen.contains_key(&candidate) {
            let n = seen.entry(base.clone()).or_insert(1);
            *n += 1;
            candidate = format!("{}_{}", base, n);
        }
        seen.insert(candidate.clone(), 1);
        headers.push(candidate);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_table() {
        let table = parse("a,b\n1,x\n2,y\n").unwrap();
        assert_eq!(table.headers(), strings(&["a", "b"]).as_slice());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1], strings(&["2", "y"]));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let table = parse("\r\na,b\r\n\r\n1,2\r\n   \r\n3,4\r\n").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0], strings(&["1", "2"]));
    }

    #[test]
    fn test_parse_empty_input_is_error() {
        for input in ["", "\n\n", "   \n \r\n"] {
            let err = parse(input).unwrap_err();
            assert_eq!(err.error_code(), "PARSE_ERROR");
        }
    }

    #[test]
    fn test_header_only_parses_with_zero_rows() {
        let table = parse("a,b,c").unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_split_line_quotes_protect_commas() {
        assert_eq!(
            split_line(r#""Smith, John", 42 ,"NY""#),
            strings(&["Smith, John", "42", "NY"])
        );
    }

    #[test]
    fn test_split_line_trailing_comma() {
        assert_eq!(split_line("3,"), strings(&["3", ""]));
        assert_eq!(split_line(",,"), strings(&["", "", ""]));
    }

    #[test]
    fn test_split_line_mid_field_quote_toggles() {
        // The quote opens a quoted region that swallows the comma.
        assert_eq!(split_line(r#"ab"c,d"#), strings(&["abc,d"]));
    }

    #[test]
    fn test_short_rows_padded_long_rows_truncated() {
        let table = parse("a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.rows()[0], strings(&["1", "", ""]));
        assert_eq!(table.rows()[1], strings(&["1", "2", "3"]));
    }

    #[test]
    fn test_headers_normalized() {
        let table = parse("id,,name,name,id\n").unwrap();
        assert_eq!(
            table.headers(),
            strings(&["id", "column_2", "name", "name_2", "id_2"]).as_slice()
        );
    }

    #[test]
    fn test_byte_order_mark_stripped() {
        let table = parse("\u{feff}price,qty\n1,2").unwrap();
        assert_eq!(table.headers()[0], "price");
    }

    #[test]
    fn test_column_iterator_and_head() {
        let table = parse("a,b\n1,x\n2,y\n3,z").unwrap();
        let column: Vec<&str> = table.column(1).collect();
        assert_eq!(column, vec!["x", "y", "z"]);
        assert_eq!(table.head(2).len(), 2);
        assert_eq!(table.head(50).len(), 3);
    }
}
