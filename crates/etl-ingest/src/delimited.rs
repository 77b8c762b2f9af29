//! Delimited text decoding into raw records.

use csv::ReaderBuilder;
use etl_model::{RawRecord, RawValue};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelimitedTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

pub(crate) fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

/// Parse delimited text with a header row.
///
/// `skip_rows` data rows after the header are discarded. Blank rows are
/// ignored, short rows are padded with nulls and cells beyond the header are
/// dropped. Empty cells become [`RawValue::Null`].
pub fn parse_delimited(
    text: &str,
    delimiter: u8,
    skip_rows: usize,
) -> Result<DelimitedTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(normalize_header).collect(),
        None => return Ok(DelimitedTable::default()),
    };

    let mut table = DelimitedTable {
        headers,
        records: Vec::new(),
    };
    let mut skipped = 0usize;
    for record in records {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if skipped < skip_rows {
            skipped += 1;
            continue;
        }
        let line = record.position().map(csv::Position::line).unwrap_or_default();
        let mut raw = RawRecord::new(line);
        for (idx, header) in table.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = match record.get(idx) {
                Some(cell) if !cell.trim().is_empty() => RawValue::Text(cell.to_string()),
                _ => RawValue::Null,
            };
            raw.push(header.clone(), value);
        }
        table.records.push(raw);
    }
    Ok(table)
}
