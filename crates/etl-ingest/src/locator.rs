use std::path::PathBuf;

use etl_model::RawRecord;

use crate::error::IngestError;

/// How source files are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    pub delimiter: u8,
    /// Encoding label used when the file carries no BOM.
    pub encoding: String,
    /// Data rows to discard after the header.
    pub skip_rows: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            encoding: "ISO-8859-1".to_string(),
            skip_rows: 0,
        }
    }
}

/// The newest raw file of a container, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub container: String,
    pub name: String,
    pub path: PathBuf,
    /// Name of the encoding the bytes were decoded with.
    pub encoding: String,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Finds and decodes the latest raw file of a tenant container.
pub trait SourceLocator: Send + Sync {
    fn fetch_latest(&self, container: &str) -> Result<SourceFile, IngestError>;

    /// Move a consumed file out of the way so the next run does not see it.
    fn archive(&self, file: &SourceFile) -> Result<(), IngestError>;
}
