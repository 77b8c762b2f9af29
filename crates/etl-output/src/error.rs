use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("unknown output encoding `{label}`")]
    UnknownEncoding { label: String },

    #[error("encoding {encoding} cannot be used for output")]
    UnsupportedEncoding { encoding: String },

    #[error("CSV delimiter {delimiter:?} must be a single ASCII character other than a quote or line break")]
    InvalidDelimiter { delimiter: char },

    #[error("row at line {line} has characters that cannot be encoded as {encoding}")]
    Unmappable { line: u64, encoding: String },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV row is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid container name `{container}`")]
    InvalidContainer { container: String },

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
