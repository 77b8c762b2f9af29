//! Reshapes raw records to a column spec.

use etl_model::{Cell, CellValue, ColumnSpec, NormalizedRecord, RawRecord, RawValue};

use crate::coerce::coerce;

/// Canonical form for header matching: BOM stripped, trimmed, lowercased.
pub fn header_key(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_lowercase()
}

/// Maps raw records onto one customer's column spec.
///
/// The lookup table of recognized source names is built once per spec.
#[derive(Debug)]
pub struct Normalizer<'a> {
    spec: &'a ColumnSpec,
    /// Per column, the accepted source header keys in priority order.
    sources: Vec<Vec<String>>,
}

impl<'a> Normalizer<'a> {
    pub fn new(spec: &'a ColumnSpec) -> Self {
        let sources = spec
            .columns()
            .iter()
            .map(|column| {
                let mut names: Vec<String> = Vec::new();
                for name in column.source_names().map(header_key) {
                    if !name.is_empty() && !names.contains(&name) {
                        names.push(name);
                    }
                }
                names
            })
            .collect();
        Self { spec, sources }
    }

    pub fn spec(&self) -> &ColumnSpec {
        self.spec
    }

    /// One cell per resolved column, in column order. Unknown fields are dropped.
    pub fn normalize(&self, raw: &RawRecord) -> NormalizedRecord {
        let fields: Vec<(String, &RawValue)> = raw
            .fields
            .iter()
            .map(|(name, value)| (header_key(name), value))
            .collect();

        let cells = self
            .spec
            .columns()
            .iter()
            .zip(&self.sources)
            .map(|(column, sources)| {
                let value = lookup(&fields, sources)
                    .map_or(CellValue::Null, |raw| coerce(raw, column.dtype));
                Cell {
                    key: column.key.clone(),
                    value,
                }
            })
            .collect();

        NormalizedRecord {
            line: raw.line,
            cells,
        }
    }

    pub fn normalize_all(&self, records: &[RawRecord]) -> Vec<NormalizedRecord> {
        let normalized: Vec<NormalizedRecord> =
            records.iter().map(|record| self.normalize(record)).collect();
        let invalid = normalized
            .iter()
            .map(|record| record.coercion_failures().count())
            .sum::<usize>();
        tracing::debug!(
            customer = self.spec.customer(),
            rows = normalized.len(),
            invalid_cells = invalid,
            "normalized records"
        );
        normalized
    }

    /// Source headers that feed no resolved column.
    pub fn unmapped_headers<'h>(&self, headers: &'h [String]) -> Vec<&'h str> {
        headers
            .iter()
            .filter(|header| {
                let key = header_key(header);
                !self.sources.iter().any(|names| names.contains(&key))
            })
            .map(String::as_str)
            .collect()
    }
}

/// First non-blank value among the accepted source names, in priority order.
/// Falls back to a blank match so the caller still sees the field as null.
fn lookup<'r>(fields: &[(String, &'r RawValue)], sources: &[String]) -> Option<&'r RawValue> {
    let mut blank = None;
    for source in sources {
        for (name, value) in fields {
            if name != source {
                continue;
            }
            if !value.is_blank() {
                return Some(*value);
            }
            blank.get_or_insert(*value);
        }
    }
    blank
}

/// Normalize a single record against `spec`.
pub fn normalize(raw: &RawRecord, spec: &ColumnSpec) -> NormalizedRecord {
    Normalizer::new(spec).normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_keys_ignore_case_bom_and_padding() {
        assert_eq!(header_key("\u{feff} Email "), "email");
        assert_eq!(header_key("VAT ID"), "vat id");
    }
}
