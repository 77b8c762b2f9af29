//! Cell formatting shared by the CSV and JSON builders.

use etl_model::{CellValue, ResolvedColumn};
use serde_json::value::{RawValue, to_raw_value};
use etl_transform::normalization::{format_date, format_fixed};

/// Float precision when a column declares none.
pub const DEFAULT_DECIMALS: u8 = 3;

pub(crate) fn decimals(column: &ResolvedColumn) -> u8 {
    column.decimals.unwrap_or(DEFAULT_DECIMALS)
}

/// Delimited-text form of a cell. Null, invalid and non-finite values are
/// empty.
pub(crate) fn text_cell(column: &ResolvedColumn, value: Option<&CellValue>) -> String {
    match value {
        Some(CellValue::Text(text)) => text.clone(),
        Some(CellValue::Int(number)) => number.to_string(),
        Some(CellValue::Float(number)) => format_fixed(*number, decimals(column)),
        Some(CellValue::Date(date)) => format_date(*date),
        Some(CellValue::Null | CellValue::Invalid(_)) | None => String::new(),
    }
}

/// JSON value for a cell. Floats are emitted as raw number literals so they
/// keep their fixed precision (`12.500`).
pub(crate) fn json_cell(
    column: &ResolvedColumn,
    value: Option<&CellValue>,
) -> Result<Box<RawValue>, serde_json::Error> {
    match value {
        Some(CellValue::Text(text)) => to_raw_value(text),
        Some(CellValue::Int(number)) => to_raw_value(number),
        Some(CellValue::Float(number)) if number.is_finite() => {
            RawValue::from_string(format_fixed(*number, decimals(column)))
        }
        Some(CellValue::Date(date)) => to_raw_value(&format_date(*date)),
        Some(CellValue::Float(_) | CellValue::Null | CellValue::Invalid(_)) | None => {
            RawValue::from_string("null".to_string())
        }
    }
}
