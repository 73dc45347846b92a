use crate::domain::model::RawRecord;
use crate::utils::error::Result;
use csv::{ReaderBuilder, StringRecord, Trim};

/// Decodes comma-delimited text into records keyed by the first line's headers.
///
/// Quotes are not special: a quoted field that contains a comma is split like
/// any other, shifting the columns after it. Lines with fewer fields than
/// headers leave the trailing keys as `None`, extra fields are dropped, and
/// whitespace-only lines are skipped.
pub fn decode_csv(text: &str) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut lines = Vec::new();
    for row in reader.records() {
        let row = row?;
        if !is_blank(&row) {
            lines.push(row);
        }
    }

    let mut lines = lines.into_iter();
    let headers: Vec<String> = match lines.next() {
        Some(header_row) => header_row.iter().map(str::to_string).collect(),
        None => return Ok(Vec::new()),
    };

    let records: Vec<RawRecord> = lines
        .map(|row| {
            let mut record = RawRecord::new();
            for (index, header) in headers.iter().enumerate() {
                record.insert(header.clone(), row.get(index).map(str::to_string));
            }
            record
        })
        .collect();

    tracing::debug!(
        "Decoded {} records with {} columns",
        records.len(),
        headers.len()
    );
    Ok(records)
}

fn is_blank(row: &StringRecord) -> bool {
    row.len() <= 1 && row.iter().all(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trims_headers_and_values() {
        let text = " CustomerID , Age ,Gender\n1, 30 ,Female\n2,41,Male\n";
        let records = decode_csv(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["CustomerID", "Age", "Gender"]);
        assert_eq!(records[0].get("Age"), Some("30"));
        assert_eq!(records[1].get("Gender"), Some("Male"));
    }

    #[test]
    fn test_decode_skips_blank_lines_and_handles_crlf() {
        let text = "a,b\r\n\r\n1,2\r\n   \r\n3,4\r\n";
        let records = decode_csv(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("b"), Some("2"));
        assert_eq!(records[1].get("a"), Some("3"));
    }

    #[test]
    fn test_short_line_leaves_missing_values() {
        let records = decode_csv("a,b,c\n1\n").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some("1"));
        assert!(records[0].contains_key("b"));
        assert_eq!(records[0].entry("c"), Some(&None));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let records = decode_csv("a,b\n1,2,3,4\n").unwrap();
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("b"), Some("2"));
    }

    #[test]
    fn test_quoted_comma_misaligns_columns() {
        let records = decode_csv("name,city\n\"Doe, John\",Lima\n").unwrap();

        assert_eq!(records[0].get("name"), Some("\"Doe"));
        assert_eq!(records[0].get("city"), Some("John\""));
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(decode_csv("").unwrap().is_empty());
        assert!(decode_csv("\n  \n").unwrap().is_empty());
        assert!(decode_csv("only,headers\n").unwrap().is_empty());
    }

    #[test]
    fn test_row_of_empty_fields_is_kept() {
        let records = decode_csv("a,b\n,\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some(""));
    }
}
