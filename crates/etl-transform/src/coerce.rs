use etl_model::{CellValue, CoercionFailure, DataType, RawValue};

use crate::normalization::{normalize_identifier, number_text, parse_date, parse_float, parse_int};

/// Coerce one raw value to `dtype`. Never fails: bad input becomes
/// [`CellValue::Invalid`], blank input becomes [`CellValue::Null`].
pub fn coerce(raw: &RawValue, dtype: DataType) -> CellValue {
    let text = match raw {
        RawValue::Null => return CellValue::Null,
        RawValue::Number(value) if dtype == DataType::Float && value.is_finite() => {
            return CellValue::Float(*value);
        }
        RawValue::Number(value) => number_text(*value),
        RawValue::Text(text) => text.trim().to_string(),
    };
    if text.is_empty() {
        return CellValue::Null;
    }

    let coerced = match dtype {
        DataType::String => Some(CellValue::Text(text.clone())),
        DataType::Int => parse_int(&text).map(CellValue::Int),
        DataType::Float => parse_float(&text).map(CellValue::Float),
        DataType::Date => parse_date(&text).map(CellValue::Date),
        DataType::Id => normalize_identifier(&text).map(CellValue::Text),
    };
    coerced.unwrap_or(CellValue::Invalid(CoercionFailure {
        raw: text,
        expected: dtype,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn text(value: &str) -> RawValue {
        RawValue::text(value)
    }

    #[test]
    fn blank_values_are_null() {
        for dtype in [DataType::String, DataType::Int, DataType::Date] {
            assert_eq!(coerce(&RawValue::Null, dtype), CellValue::Null);
            assert_eq!(coerce(&text("  "), dtype), CellValue::Null);
        }
    }

    #[test]
    fn coerces_each_type() {
        assert_eq!(
            coerce(&text(" ACME OY "), DataType::String),
            CellValue::Text("ACME OY".to_string())
        );
        assert_eq!(coerce(&text("12,0"), DataType::Int), CellValue::Int(12));
        assert_eq!(coerce(&text("1,5"), DataType::Float), CellValue::Float(1.5));
        assert_eq!(
            coerce(&text("31.12.2023"), DataType::Date),
            CellValue::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
        assert_eq!(
            coerce(&RawValue::Number(1234.0), DataType::Id),
            CellValue::Text("1234".to_string())
        );
        assert_eq!(
            coerce(&RawValue::Number(2.5), DataType::Float),
            CellValue::Float(2.5)
        );
    }

    #[test]
    fn bad_values_are_tagged_not_dropped() {
        assert_eq!(
            coerce(&text("n/a"), DataType::Float),
            CellValue::Invalid(CoercionFailure {
                raw: "n/a".to_string(),
                expected: DataType::Float,
            })
        );
        assert!(coerce(&text("12.5"), DataType::Int).is_invalid());
        assert!(coerce(&text("32.13.2024"), DataType::Date).is_invalid());
        assert!(coerce(&RawValue::Number(f64::NAN), DataType::Float).is_invalid());
    }
}
