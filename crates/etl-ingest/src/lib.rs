//! Source file ingestion: locating, decoding and parsing raw tenant files.

pub mod delimited;
pub mod encoding;
pub mod error;
pub mod fs;
pub mod locator;

pub use delimited::{DelimitedTable, parse_delimited};
pub use error::IngestError;
pub use fs::FsSourceLocator;
pub use locator::{SourceFile, SourceLocator, SourceOptions};
