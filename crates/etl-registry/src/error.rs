use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("customer {customer}: excluded column `{key}` is not a base or extra column")]
    UnknownExcludedColumn { customer: String, key: String },

    #[error("customer {customer}: extra column `{key}` collides with a base column")]
    ExtraColumnCollision { customer: String, key: String },

    #[error("customer {customer}: column `{key}` has unknown data type `{dtype}`")]
    UnknownDataType {
        customer: String,
        key: String,
        dtype: String,
    },

    #[error("customer {customer}: display name `{name}` is used by more than one column")]
    DuplicateDisplayName { customer: String, name: String },

    #[error("customer {customer}: konserni must contain at least one label")]
    EmptyKonserni { customer: String },

    #[error("customer {customer}: unknown file format `{format}` (expected csv or json)")]
    UnknownFileFormat { customer: String, format: String },

    #[error("customer {customer}: unknown file encoding `{encoding}`")]
    UnknownEncoding { customer: String, encoding: String },

    #[error("customer {customer}: CSV delimiter {delimiter:?} must be a single ASCII character other than a quote or line break")]
    InvalidDelimiter { customer: String, delimiter: char },

    #[error("customer {customer}: invalid rule on column `{key}`: {message}")]
    InvalidRule {
        customer: String,
        key: String,
        message: String,
    },

    #[error("customer name must not be empty")]
    EmptyName,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
