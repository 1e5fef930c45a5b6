//! Serialization of a cleaned table back to the persisted artifact format.

use crate::error::{EngineError, Result};
use csv::{QuoteStyle, WriterBuilder};

/// Content type recorded for every artifact.
pub const CONTENT_TYPE: &str = "text/csv";

/// Write headers and rows as comma-separated text, header first, every field
/// double-quoted regardless of content.
pub fn to_delimited_text(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EngineError::Io(e.into_error()))
}
