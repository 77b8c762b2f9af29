//! Domain rules applied to well-typed, non-null cells.

use etl_model::{CellValue, ColumnRule};

/// Text form of a cell for text rules. Dates use ISO format.
fn cell_text(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Text(text) => Some(text.clone()),
        CellValue::Int(number) => Some(number.to_string()),
        CellValue::Float(number) => Some(number.to_string()),
        CellValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        CellValue::Null | CellValue::Invalid(_) => None,
    }
}

/// A single address: one `@`, non-empty local part, dotted domain, no
/// whitespace.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Apply `rule` to `value`. Returns the failure message, or `None` when the
/// rule passes or does not apply to the value's type.
pub fn check_rule(rule: &ColumnRule, value: &CellValue) -> Option<String> {
    if value.is_null() || value.is_invalid() {
        return None;
    }
    match rule {
        ColumnRule::NonNegative => {
            let number = value.as_f64()?;
            (number < 0.0).then(|| format!("must not be negative, got {number}"))
        }
        ColumnRule::Range { min, max } => {
            let number = value.as_f64()?;
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            (below || above).then(|| {
                let min = min.map_or_else(|| "-inf".to_string(), |v| v.to_string());
                let max = max.map_or_else(|| "inf".to_string(), |v| v.to_string());
                format!("{number} is outside [{min}, {max}]")
            })
        }
        ColumnRule::Email => {
            let text = cell_text(value)?;
            (!is_email(&text)).then(|| format!("{text:?} is not a valid email address"))
        }
        ColumnRule::Pattern(regex) => {
            let text = cell_text(value)?;
            (!regex.is_match(&text)).then(|| format!("{text:?} does not match {}", regex.as_str()))
        }
        ColumnRule::OneOf(values) => {
            let text = cell_text(value)?;
            (!values.contains(&text.trim().to_uppercase()))
                .then(|| format!("{text:?} is not an allowed value"))
        }
        ColumnRule::MaxLength(limit) => {
            let text = cell_text(value)?;
            let length = text.chars().count();
            (length > *limit).then(|| format!("length {length} exceeds {limit}"))
        }
        ColumnRule::Konserni(labels) => {
            let text = cell_text(value)?;
            (!labels.contains(text.trim()))
                .then(|| format!("{text:?} is not a concern of this customer"))
        }
    }
}
