use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown data type: {0}")]
    UnknownDataType(String),
    #[error("unknown file format: {0} (expected csv or json)")]
    UnknownFileFormat(String),
}

/// Pipeline-level error taxonomy.
///
/// `CoercionFailure` and `ValidationFailure` are row-level and recorded in
/// validation outcomes. `ValidationFailure` is also raised when a file has no
/// accepted rows at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigError,
    NotFound,
    DecodeError,
    CoercionFailure,
    ValidationFailure,
    PersistError,
    UploadError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::CoercionFailure => "CoercionFailure",
            ErrorKind::ValidationFailure => "ValidationFailure",
            ErrorKind::PersistError => "PersistError",
            ErrorKind::UploadError => "UploadError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
