use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::column::DataType;

/// An untyped scalar as read from a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Number(_) => false,
            RawValue::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// One source row: ordered mapping from source field name to raw value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    /// 1-based line number in the source file (0 when unknown).
    pub line: u64,
    pub fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Exact-name lookup; returns the first match.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Why a raw value could not be coerced to its column's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionFailure {
    pub raw: String,
    pub expected: DataType,
}

impl fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse {:?} as {}", self.raw, self.expected)
    }
}

/// A coerced cell of a normalized record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Invalid(CoercionFailure),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, CellValue::Invalid(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(value) => Some(*value as f64),
            CellValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub key: String,
    pub value: CellValue,
}

/// A raw record reshaped to a `ColumnSpec`: one cell per column key, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    pub line: u64,
    pub cells: Vec<Cell>,
}

impl NormalizedRecord {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|cell| cell.key == key)
            .map(|cell| &cell.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|cell| cell.key.as_str())
    }

    pub fn coercion_failures(&self) -> impl Iterator<Item = (&str, &CoercionFailure)> {
        self.cells.iter().filter_map(|cell| match &cell.value {
            CellValue::Invalid(failure) => Some((cell.key.as_str(), failure)),
            _ => None,
        })
    }
}
