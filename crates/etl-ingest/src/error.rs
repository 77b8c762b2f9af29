use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no source file found in container {container}")]
    NotFound { container: String },

    #[error("invalid container name `{container}`")]
    InvalidContainer { container: String },

    #[error("unknown encoding label `{label}`")]
    UnknownEncoding { label: String },

    #[error("failed to decode {path} as {encoding}")]
    Decode { path: PathBuf, encoding: String },

    #[error("malformed delimited text in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means "nothing to process" rather than a broken file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestError::NotFound { .. })
    }
}
