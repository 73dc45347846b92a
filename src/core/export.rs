use crate::domain::model::{value_to_text, EnrichedRecord};
use crate::utils::error::{EtlError, Result};
use csv::{QuoteStyle, WriterBuilder};

pub const DEFAULT_EXPORT_FILENAME: &str = "results.csv";

/// Renders records as comma-joined rows under the first record's keys.
///
/// Values are written without quoting or escaping, so a value holding a comma
/// shifts its row. `null` and absent keys become empty cells.
pub fn export_csv(records: &[EnrichedRecord]) -> Result<String> {
    let first = records.first().ok_or(EtlError::EmptyExport)?;
    let headers: Vec<&str> = first.keys().collect();

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&headers)?;
    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| record.get(header).map(value_to_text).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("CSV export produced invalid UTF-8: {}", e),
    })?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

pub fn export_json(records: &[EnrichedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
